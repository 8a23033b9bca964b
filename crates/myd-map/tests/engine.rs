use std::collections::BTreeSet;

use myd_map::{
    EffectiveRules, MatchConfig, MatchOutcome, MatchingEngine, SynonymTable, effective_rules,
};
use myd_model::{
    FieldRecord, ManualMapping, MappingMemory, MatchAlgorithm, MatchType, SkipRule, TableRules,
    TargetFieldRecord,
};

fn fields(names: &[&str]) -> Vec<FieldRecord> {
    names.iter().map(|name| FieldRecord::new(*name)).collect()
}

/// Targets as projected from a field list, carrying their ids.
fn structure_fields(pairs: &[(&str, &str)]) -> Vec<FieldRecord> {
    pairs
        .iter()
        .map(|(table, field)| FieldRecord::from(&TargetFieldRecord::new(table, field, "S_")))
        .collect()
}

fn engine() -> MatchingEngine<'static> {
    MatchingEngine::with_builtin_synonyms(MatchConfig::default()).expect("default config")
}

fn skip_rule(field: &str, comment: &str) -> SkipRule {
    SkipRule {
        source_field: field.to_string(),
        source_description: String::new(),
        skip: true,
        comment: comment.to_string(),
    }
}

fn manual(field: &str, target: &str) -> ManualMapping {
    ManualMapping {
        source_field: field.to_string(),
        source_description: String::new(),
        target: target.to_string(),
        target_description: "Name of bank".to_string(),
        comment: "Agreed mapping".to_string(),
    }
}

fn run(
    sources: &[FieldRecord],
    targets: &[FieldRecord],
    rules: &EffectiveRules,
) -> MatchOutcome {
    engine().run(sources, targets, rules).expect("run")
}

fn assert_no_double_assignment(outcome: &MatchOutcome) {
    let mut seen = BTreeSet::new();
    for result in &outcome.results {
        if let Some(target) = &result.target_field {
            assert!(seen.insert(target.clone()), "{target} assigned twice");
        }
    }
}

#[test]
fn exact_matches_and_unknown_source() {
    let sources = fields(&["BANKL", "BANKA", "UNKNOWNX"]);
    let targets = fields(&["BANKL", "BANKA"]);
    let outcome = run(&sources, &targets, &EffectiveRules::default());

    assert_eq!(outcome.results.len(), 3);
    let bankl = &outcome.results[0];
    assert_eq!(bankl.target_field.as_deref(), Some("BANKL"));
    assert_eq!(bankl.match_type, MatchType::Exact);
    assert!(bankl.confidence >= 0.95);

    let banka = &outcome.results[1];
    assert_eq!(banka.target_field.as_deref(), Some("BANKA"));
    assert_eq!(banka.match_type, MatchType::Exact);
    assert!(banka.confidence >= 0.95);

    let unknown = &outcome.results[2];
    assert_eq!(unknown.target_field, None);
    assert_eq!(unknown.match_type, MatchType::None);
    assert_eq!(unknown.confidence, 0.0);
    assert_eq!(unknown.reason, "No suitable match found");

    assert!(outcome.unmatched_targets.is_empty());
}

#[test]
fn exact_confidence_depends_on_descriptions() {
    let sources = vec![
        FieldRecord::new("BANKL").with_description("Bank  Key"),
        FieldRecord::new("BANKA").with_description("Bank name"),
    ];
    let targets = vec![
        FieldRecord::new("bankl").with_description("bank key"),
        FieldRecord::new("banka").with_description("Name of bank"),
    ];
    let outcome = run(&sources, &targets, &EffectiveRules::default());
    assert_eq!(outcome.results[0].confidence, 1.0);
    assert_eq!(outcome.results[1].confidence, 0.95);
    assert_eq!(outcome.results[0].target_field.as_deref(), Some("bankl"));
}

#[test]
fn synonym_match() {
    let sources = fields(&["klant"]);
    let targets = fields(&["customer"]);
    let outcome = run(&sources, &targets, &EffectiveRules::default());

    let result = &outcome.results[0];
    assert_eq!(result.match_type, MatchType::Synonym);
    assert_eq!(result.confidence, 0.85);
    assert_eq!(result.target_field.as_deref(), Some("customer"));
}

#[test]
fn synonym_is_tested_before_fuzzy_scoring() {
    // "klantx" scores 0.9 by similarity, but the synonym wins.
    let sources = fields(&["KLANT"]);
    let targets = fields(&["KLANTX", "CUSTOMER"]);
    let outcome = run(&sources, &targets, &EffectiveRules::default());
    assert_eq!(outcome.results[0].match_type, MatchType::Synonym);
    assert_eq!(outcome.results[0].target_field.as_deref(), Some("CUSTOMER"));
    assert_eq!(outcome.unmatched_targets, vec![0]);
}

#[test]
fn custom_synonym_table() {
    let table = SynonymTable::new([("blz", vec!["bankleitzahl"])]);
    let engine = MatchingEngine::new(MatchConfig::default(), &table).expect("engine");
    let outcome = engine
        .run(
            &fields(&["Bankleitzahl"]),
            &fields(&["BLZ"]),
            &EffectiveRules::default(),
        )
        .expect("run");
    assert_eq!(outcome.results[0].match_type, MatchType::Synonym);
}

#[test]
fn fuzzy_match_picks_best_candidate() {
    let sources = fields(&["BANKNAME"]);
    let targets = fields(&["BANKL", "BANKA"]);
    let outcome = run(&sources, &targets, &EffectiveRules::default());

    let result = &outcome.results[0];
    assert_eq!(result.match_type, MatchType::Fuzzy);
    assert_eq!(result.target_field.as_deref(), Some("BANKA"));
    assert_eq!(result.confidence, 0.775);
    assert_eq!(result.reason, "Fuzzy match (similarity: 0.78)");
    assert_eq!(result.algorithm, Some(MatchAlgorithm::JaroWinkler));
    assert_eq!(outcome.unmatched_targets, vec![0]);
}

#[test]
fn fuzzy_ties_go_to_first_target() {
    let sources = fields(&["ORT01"]);
    let targets = fields(&["ORT02", "ORT03"]);
    let outcome = run(&sources, &targets, &EffectiveRules::default());
    assert_eq!(outcome.results[0].target_field.as_deref(), Some("ORT02"));
    assert_eq!(outcome.unmatched_targets, vec![1]);
}

#[test]
fn fuzzy_respects_threshold() {
    let engine =
        MatchingEngine::with_builtin_synonyms(MatchConfig::with_threshold(0.9)).expect("engine");
    let outcome = engine
        .run(
            &fields(&["BANKNAME"]),
            &fields(&["BANKL", "BANKA"]),
            &EffectiveRules::default(),
        )
        .expect("run");
    assert_eq!(outcome.results[0].match_type, MatchType::None);
    assert_eq!(outcome.unmatched_targets, vec![0, 1]);
}

#[test]
fn disabled_fuzzy_runs_exact_only() {
    let config = MatchConfig {
        enabled: false,
        ..MatchConfig::default()
    };
    let engine = MatchingEngine::with_builtin_synonyms(config).expect("engine");
    let outcome = engine
        .run(
            &fields(&["BANKL", "KLANT", "BANKNAME"]),
            &fields(&["BANKL", "CUSTOMER", "BANKA"]),
            &EffectiveRules::default(),
        )
        .expect("run");
    assert_eq!(outcome.results[0].match_type, MatchType::Exact);
    assert_eq!(outcome.results[1].match_type, MatchType::None);
    assert_eq!(outcome.results[2].match_type, MatchType::None);
    assert!(outcome.audit.is_empty());
}

#[test]
fn skip_rule_only_appears_in_skip_log() {
    let rules = EffectiveRules {
        skip_rules: vec![skip_rule("MANDT", "Audit field")],
        manual_mappings: Vec::new(),
    };
    let sources = fields(&["MANDT", "BANKL", "XYZ"]);
    let targets = fields(&["MANDT", "BANKL"]);
    let outcome = run(&sources, &targets, &rules);

    assert_eq!(outcome.skipped.len(), 1);
    let skipped = &outcome.skipped[0];
    assert_eq!(skipped.source_field, "MANDT");
    assert_eq!(skipped.reason, "Audit field");
    assert_eq!(skipped.match_type, MatchType::CentralSkip);
    assert_eq!(skipped.target_field, None);

    assert!(outcome.results.iter().all(|r| r.source_field != "MANDT"));
    assert!(outcome.audit.iter().all(|r| r.source_field != "MANDT"));
    assert!(
        outcome
            .unmapped_sources()
            .all(|r| r.source_field != "MANDT")
    );
}

#[test]
fn coverage_is_over_original_sources() {
    let rules = EffectiveRules {
        skip_rules: vec![skip_rule("MANDT", "Audit field")],
        manual_mappings: Vec::new(),
    };
    let outcome = run(
        &fields(&["MANDT", "BANKL", "BANKA"]),
        &fields(&["BANKL", "BANKA"]),
        &rules,
    );
    assert_eq!(outcome.source_count, 3);
    assert_eq!(outcome.mapped_count(), 2);
    assert_eq!(format!("{:.1}", outcome.coverage_percent()), "66.7");
}

#[test]
fn table_rule_can_cancel_global_skip() {
    let mut memory = MappingMemory {
        global_skip_fields: vec![skip_rule("MANDT", "Audit field")],
        ..MappingMemory::default()
    };
    memory.table_specific.insert(
        "m140_bnka".to_string(),
        TableRules {
            skip_fields: vec![SkipRule {
                skip: false,
                ..skip_rule("mandt", "Needed for this table")
            }],
            manual_mappings: Vec::new(),
        },
    );
    let sources = fields(&["MANDT"]);
    let targets = fields(&["MANDT"]);

    let skipped = run(
        &sources,
        &targets,
        &effective_rules(Some(&memory), "m140", "knb1"),
    );
    assert_eq!(skipped.skipped.len(), 1);

    let kept = run(
        &sources,
        &targets,
        &effective_rules(Some(&memory), "m140", "bnka"),
    );
    assert!(kept.skipped.is_empty());
    assert_eq!(kept.results[0].match_type, MatchType::Exact);
}

#[test]
fn manual_target_is_never_reclaimed() {
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("BANKNAME", "S_BNKA#BANKA")],
    };
    let sources = fields(&["BANKNAME", "BANKA"]);
    let targets = fields(&["BANKL", "BANKA"]);
    let outcome = run(&sources, &targets, &rules);

    let pinned = &outcome.results[0];
    assert_eq!(pinned.match_type, MatchType::CentralManual);
    assert_eq!(pinned.target_field.as_deref(), Some("BANKA"));
    assert_eq!(pinned.confidence, 1.0);
    assert_eq!(pinned.reason, "Agreed mapping");
    assert_eq!(pinned.algorithm, Some(MatchAlgorithm::CentralMemory));
    assert_eq!(pinned.target_description.as_deref(), Some("Name of bank"));

    // BANKA cannot take its exact twin, so it falls through to fuzzy.
    let banka = &outcome.results[1];
    assert_eq!(banka.match_type, MatchType::Fuzzy);
    assert_eq!(banka.target_field.as_deref(), Some("BANKL"));

    // The near-duplicate shows up for review instead.
    assert_eq!(outcome.audit.len(), 1);
    assert_eq!(outcome.audit[0].source_field, "BANKA");
    assert_eq!(outcome.audit[0].target_field.as_deref(), Some("BANKA"));
    assert_eq!(outcome.audit[0].confidence, 1.0);
    assert!(outcome.unmatched_targets.is_empty());
}

#[test]
fn manual_target_by_internal_id() {
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("NAME", "BNKA.BANKA")],
    };
    let outcome = run(&fields(&["NAME"]), &fields(&["BANKA"]), &rules);
    assert_eq!(outcome.results[0].match_type, MatchType::CentralManual);
    assert!(outcome.unmatched_targets.is_empty());
}

#[test]
fn shared_field_name_across_structures_is_assigned_once_per_target() {
    let targets = structure_fields(&[("S_BNKA", "BANKL"), ("S_BNKA_EXT", "BANKL")]);
    let outcome = run(
        &fields(&["BANKL", "BANK_L"]),
        &targets,
        &EffectiveRules::default(),
    );
    assert_no_double_assignment(&outcome);
    let assigned: Vec<(MatchType, Option<&str>)> = outcome
        .results
        .iter()
        .map(|r| (r.match_type, r.target_field.as_deref()))
        .collect();
    assert_eq!(
        assigned,
        vec![
            (MatchType::Exact, Some("S_BNKA#BANKL")),
            (MatchType::Exact, Some("S_BNKA_EXT#BANKL")),
        ]
    );
    assert!(outcome.unmatched_targets.is_empty());
}

#[test]
fn duplicate_bare_targets_share_one_identity() {
    let outcome = run(
        &fields(&["BANKL", "BANK_L"]),
        &fields(&["BANKL", "BANKL"]),
        &EffectiveRules::default(),
    );
    assert_no_double_assignment(&outcome);
    assert_eq!(outcome.results[0].target_field.as_deref(), Some("BANKL"));
    assert_eq!(outcome.results[1].match_type, MatchType::None);
    // Neither copy is reported unmatched; its identity is taken.
    assert!(outcome.unmatched_targets.is_empty());
}

#[test]
fn qualified_manual_reference_pins_its_structure() {
    let targets = structure_fields(&[("S_BNKA", "BANKL"), ("S_BNKA_EXT", "BANKL")]);
    for reference in ["S_BNKA_EXT#BANKL", "bnka_ext.bankl"] {
        let rules = EffectiveRules {
            skip_rules: Vec::new(),
            manual_mappings: vec![manual("EXT_KEY", reference)],
        };
        let outcome = run(&fields(&["EXT_KEY", "BANKL"]), &targets, &rules);

        let pinned = &outcome.results[0];
        assert_eq!(pinned.match_type, MatchType::CentralManual);
        assert_eq!(pinned.target_field.as_deref(), Some("S_BNKA_EXT#BANKL"));
        let exact = &outcome.results[1];
        assert_eq!(exact.match_type, MatchType::Exact);
        assert_eq!(exact.target_field.as_deref(), Some("S_BNKA#BANKL"));
        assert!(outcome.unmatched_targets.is_empty(), "{reference}");
    }
}

#[test]
fn qualified_reference_to_other_structure_claims_nothing() {
    let targets = structure_fields(&[("S_BNKA", "BANKL")]);
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("EXT_KEY", "S_KNA1#BANKL")],
    };
    let outcome = run(&fields(&["EXT_KEY"]), &targets, &rules);
    assert_eq!(
        outcome.results[0].target_field.as_deref(),
        Some("S_KNA1#BANKL")
    );
    assert_eq!(outcome.unmatched_targets, vec![0]);
}

#[test]
fn bare_manual_reference_takes_first_free_structure() {
    let targets = structure_fields(&[("S_BNKA", "BANKL"), ("S_BNKA_EXT", "BANKL")]);
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("KEY1", "BANKL"), manual("KEY2", "BANKL")],
    };
    let outcome = run(&fields(&["KEY1", "KEY2"]), &targets, &rules);
    assert_eq!(
        outcome.results[0].target_field.as_deref(),
        Some("S_BNKA#BANKL")
    );
    assert_eq!(
        outcome.results[1].target_field.as_deref(),
        Some("S_BNKA_EXT#BANKL")
    );
    assert_no_double_assignment(&outcome);
}

#[test]
fn conflicting_manual_rules_keep_the_first() {
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("SRC1", "BANKA"), manual("SRC2", "BANKA")],
    };
    let outcome = run(&fields(&["SRC1", "SRC2"]), &fields(&["BANKA"]), &rules);
    assert_eq!(outcome.results[0].match_type, MatchType::CentralManual);
    assert_eq!(outcome.results[1].match_type, MatchType::None);
    assert_no_double_assignment(&outcome);
}

#[test]
fn manual_target_outside_target_set_is_still_reported() {
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("BANKNAME", "S_XXXX#NOPE")],
    };
    let outcome = run(&fields(&["BANKNAME"]), &fields(&["BANKL"]), &rules);
    assert_eq!(
        outcome.results[0].target_field.as_deref(),
        Some("S_XXXX#NOPE")
    );
    assert_eq!(outcome.unmatched_targets, vec![0]);
}

#[test]
fn later_manual_rule_wins() {
    let rules = EffectiveRules {
        skip_rules: Vec::new(),
        manual_mappings: vec![manual("BANKNAME", "BANKL"), manual("bank_name", "BANKA")],
    };
    let outcome = run(&fields(&["BANKNAME"]), &fields(&["BANKL", "BANKA"]), &rules);
    assert_eq!(outcome.results[0].target_field.as_deref(), Some("BANKA"));
    assert_eq!(outcome.unmatched_targets, vec![0]);
}

#[test]
fn exact_matches_are_audited_against_each_other() {
    let outcome = run(
        &fields(&["BANKL", "BANKA", "UNKNOWNX"]),
        &fields(&["BANKL", "BANKA"]),
        &EffectiveRules::default(),
    );
    let audited: Vec<(&str, Option<&str>)> = outcome
        .audit
        .iter()
        .map(|r| (r.source_field.as_str(), r.target_field.as_deref()))
        .collect();
    assert_eq!(
        audited,
        vec![("BANKL", Some("BANKA")), ("BANKA", Some("BANKL"))]
    );
    assert!(outcome.audit.iter().all(|r| r.match_type == MatchType::Audit));
    assert_eq!(
        outcome.audit[0].reason,
        "Fuzzy match to already claimed target (audit, similarity: 0.86)"
    );
}

#[test]
fn blank_source_names_never_match_exactly() {
    let outcome = run(
        &fields(&["--", "BANKL"]),
        &fields(&["", "BANKL"]),
        &EffectiveRules::default(),
    );
    assert_eq!(outcome.results[0].match_type, MatchType::None);
    assert_eq!(outcome.results[1].match_type, MatchType::Exact);
}

#[test]
fn empty_inputs() {
    let outcome = run(&[], &fields(&["BANKL"]), &EffectiveRules::default());
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.unmatched_targets, vec![0]);
    assert_eq!(outcome.coverage_percent(), 0.0);
}

#[test]
fn suggestions_are_ranked() {
    let engine = engine();
    let targets = fields(&["KLANT", "BANKL", "BANKA"]);
    let suggestions = engine.suggest(&FieldRecord::new("BANKNAME"), &targets);
    let ranked: Vec<&str> = suggestions
        .iter()
        .map(|s| s.target_field.as_str())
        .collect();
    assert_eq!(ranked, vec!["BANKA", "BANKL"]);
    assert_eq!(suggestions[0].target_index, 2);

    let limited = MatchingEngine::with_builtin_synonyms(MatchConfig {
        max_suggestions: 1,
        ..MatchConfig::default()
    })
    .expect("engine");
    assert_eq!(
        limited
            .suggest(&FieldRecord::new("BANKNAME"), &targets)
            .len(),
        1
    );
}

#[test]
fn mapping_lines_snapshot() {
    let rules = EffectiveRules {
        skip_rules: vec![skip_rule("MANDT", "Audit field")],
        manual_mappings: Vec::new(),
    };
    let outcome = run(
        &fields(&["MANDT", "BANKL", "BANKNAME", "KLANT", "UNKNOWNX"]),
        &fields(&["BANKL", "BANKA", "CUSTOMER"]),
        &rules,
    );
    assert_no_double_assignment(&outcome);
    insta::assert_snapshot!(outcome.mapping_lines().join("\n"), @r"
    BANKL: BANKL
    BANKNAME: BANKA
    KLANT: CUSTOMER
    # UNKNOWNX: # No suitable match found
    ");
    assert_eq!(outcome.audit.len(), 1);
    assert_eq!(outcome.audit[0].source_field, "BANKNAME");
}
