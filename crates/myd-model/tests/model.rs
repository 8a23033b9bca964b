use myd_model::{
    FieldRecord, MappingMemory, MatchAlgorithm, MatchResult, MatchType, TargetFieldRecord,
};

const MEMORY: &str = r#"
[[global_skip_fields]]
source_field = "MANDT"
source_description = "Client"
skip = true
comment = "Audit field"

[[global_manual_mappings]]
source_field = "BANKNAME"
source_description = "Name of bank"
target = "S_BNKA#BANKA"
target_description = "Name of financial institution"
comment = "Agreed with functional team"

[table_specific.m140_bnka]
skip_fields = [
    { source_field = "ERDAT", source_description = "Created on", skip = true, comment = "Technical" },
]
"#;

#[test]
fn memory_deserializes_from_toml() {
    let memory: MappingMemory = toml::from_str(MEMORY).expect("parse memory");
    assert_eq!(memory.global_skip_fields.len(), 1);
    assert_eq!(memory.global_skip_fields[0].comment, "Audit field");
    assert_eq!(memory.global_manual_mappings[0].target, "S_BNKA#BANKA");

    let table = memory.table_rules("m140", "bnka").expect("table rules");
    assert_eq!(table.skip_fields.len(), 1);
    assert!(table.manual_mappings.is_empty());
}

#[test]
fn memory_entry_missing_key_is_rejected() {
    let broken = r#"
[[global_skip_fields]]
source_field = "MANDT"
skip = true
comment = "no description"
"#;
    let parsed: Result<MappingMemory, _> = toml::from_str(broken);
    assert!(parsed.is_err());
}

#[test]
fn match_result_json_shape() {
    let result = MatchResult {
        source_field: "klant".to_string(),
        target_field: Some("customer".to_string()),
        confidence: 0.85,
        match_type: MatchType::Synonym,
        reason: "Synonym match".to_string(),
        algorithm: None,
        source_description: None,
        target_description: None,
    };
    let value = serde_json::to_value(&result).expect("serialize");
    assert_eq!(value["match_type"], "synonym");
    assert_eq!(value["target_field"], "customer");
    assert!(value.get("algorithm").is_none());

    let fuzzy = MatchResult {
        match_type: MatchType::Fuzzy,
        algorithm: Some(MatchAlgorithm::JaroWinkler),
        ..result
    };
    let value = serde_json::to_value(&fuzzy).expect("serialize");
    assert_eq!(value["algorithm"], "jaro_winkler");
}

#[test]
fn target_record_round_trips_through_json() {
    let mut record = TargetFieldRecord::new("S_BNKA", "BANKL", "S_");
    record.description = "Bank keys".to_string();
    record.length = "15".to_string();
    let json = serde_json::to_string(&record).expect("serialize");
    assert!(!json.contains("decimal"));
    let parsed: TargetFieldRecord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, record);
    assert_eq!(
        FieldRecord::from(&parsed),
        FieldRecord::new("BANKL")
            .with_description("Bank keys")
            .with_ids(["S_BNKA#BANKL", "BNKA.BANKL"])
    );
}
