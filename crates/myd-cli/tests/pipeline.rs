//! End-to-end runs of the three commands against a temporary project.

use std::fs;
use std::path::Path;

use myd_cli::artifacts::{ObjectList, SourceIndex, read_json};
use myd_cli::config::AppConfig;
use myd_cli::pipeline::{Project, index_source, index_target, map};
use myd_ingest::SourceLayout;
use myd_model::{ColumnKind, MatchType};
use tempfile::TempDir;

const TARGET_HEADER: [&str; 9] = [
    "Sheet Name",
    "Group Name",
    "Field Description",
    "Importance",
    "Type",
    "Length",
    "Decimal",
    "SAP Structure",
    "SAP Field",
];

const MEMORY: &str = r#"
[[global_skip_fields]]
source_field = "Legacy ID"
source_description = "Old system key"
skip = true
comment = "Not migrated"

[table_specific.m140_bnka]
manual_mappings = [
    { source_field = "Notes", source_description = "", target = "S_BNKA#SWIFT", comment = "Agreed in workshop" },
]
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn xml_row(values: &[&str]) -> String {
    let cells: String = values
        .iter()
        .map(|value| format!(r#"<Cell><Data ss:Type="String">{value}</Data></Cell>"#))
        .collect();
    format!("<Row>{cells}</Row>")
}

fn target_workbook() -> String {
    field_list(&[
        ["Bank", "Key", "Bank Key", "Mandatory", "Text", "15", "", "S_BNKA", "BANKL"],
        ["Bank", "Data", "Bank name", "Optional", "Text", "60", "", "S_BNKA", "BANKA"],
        ["Bank", "Data", "Bank country", "Mandatory", "Text", "3", "", "S_BNKA", "BANKS"],
        ["Bank", "Data", "SWIFT code", "Optional", "Text", "11", "", "S_BNKA", "SWIFT"],
        ["Customer", "Key", "Customer", "Mandatory", "Text", "10", "", "S_KNA1", "KUNNR"],
    ])
}

fn field_list(records: &[[&str; 9]]) -> String {
    let rows: Vec<String> = std::iter::once(xml_row(&TARGET_HEADER))
        .chain(records.iter().map(|record| xml_row(record)))
        .collect();
    format!(
        r#"<?xml version="1.0"?>
<Workbook xmlns="urn:schemas-microsoft-com:office:spreadsheet"
 xmlns:ss="urn:schemas-microsoft-com:office:spreadsheet">
 <Worksheet ss:Name="Field List"><Table>{}</Table></Worksheet>
</Workbook>"#,
        rows.concat()
    )
}

fn project_with_inputs() -> (TempDir, Project) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("data/01_source/index_source_m140_bnka.csv"),
        "BANKL,Legacy ID,Notes,ZZQX\nBNK001,42,,\nBNK002,43,,x\n",
    );
    write(
        &root.join("data/03_raw/index_target_m140_bnka.xml"),
        &target_workbook(),
    );
    write(&root.join("central_mapping_memory.toml"), MEMORY);
    let project = Project::new(root, &AppConfig::default());
    (dir, project)
}

#[test]
fn full_run_writes_all_artifacts() {
    let (_dir, project) = project_with_inputs();
    let config = AppConfig::default();

    let source = index_source(&project, &config, "m140", "bnka", false).unwrap();
    assert!(source.written);
    assert!(source.listed);
    assert_eq!(source.header_row, 1);
    let names: Vec<&str> = source.fields.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(names, vec!["BANKL", "Legacy ID", "Notes", "ZZQX"]);
    assert_eq!(source.fields[0].example, "BNK001");
    assert_eq!(source.fields[1].kind, ColumnKind::Integer);
    assert!(!source.fields[1].nullable);
    assert_eq!(source.fields[2].kind, ColumnKind::Empty);
    assert!(source.fields[2].nullable);

    let target = index_target(&project, &config, "m140", "bnka").unwrap();
    assert_eq!(target.variant_pattern, "S_BNKA");
    assert_eq!(target.total_records, 5);
    assert_eq!(target.fields.len(), 4);

    let report = map(&project, &config, "m140", "bnka").unwrap();
    assert!(report.output.ends_with("migrations/m140/bnka/mapping.json"));
    assert!(report.output.is_file());
    let document = &report.document;

    insta::assert_snapshot!(document.mapping_lines.join("\n"), @r"
    BANKL: S_BNKA#BANKL
    Notes: S_BNKA#SWIFT
    # ZZQX: # No suitable match found
    ");

    let stats = &document.metadata.stats;
    assert_eq!(stats.source_fields, 4);
    assert_eq!(stats.target_fields, 4);
    assert_eq!(stats.mapped, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.coverage_percent, 50.0);
    assert_eq!(stats.by_type.get(&MatchType::Exact), Some(&1));
    assert_eq!(stats.by_type.get(&MatchType::CentralManual), Some(&1));
    assert_eq!(stats.by_type.get(&MatchType::None), Some(&1));

    assert_eq!(
        document.mappings[0].internal_id.as_deref(),
        Some("BNKA.BANKL")
    );
    let manual = &document.mappings[1];
    assert_eq!(manual.source, "Notes");
    assert_eq!(manual.match_type, MatchType::CentralManual);
    assert_eq!(manual.internal_id.as_deref(), Some("BNKA.SWIFT"));
    assert_eq!(manual.reason, "Agreed in workshop");
    assert_eq!(document.mappings[0].confidence, 0.95);
    assert_eq!(manual.confidence, 1.0);

    assert_eq!(document.skipped_fields[0].source_field, "Legacy ID");
    assert_eq!(document.unmapped_sources.len(), 1);
    assert_eq!(document.unmapped_sources[0].source, "ZZQX");
    assert!(document.unmapped_sources[0].suggestions.is_empty());

    let unclaimed: Vec<&str> = document
        .unmatched_targets
        .iter()
        .map(|record| record.sap_field.as_str())
        .collect();
    assert_eq!(unclaimed, vec!["BANKA", "BANKS"]);

    let written: serde_json::Value = read_json(&report.output).unwrap();
    assert_eq!(written["metadata"]["stats"]["by_type"]["central_manual"], 1);
    assert_eq!(written["mappings"][0]["match_type"], "exact");
}

#[test]
fn structures_sharing_a_field_keep_separate_mappings() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("data/01_source/index_source_m140_bnka.csv"),
        "BANKL,BANK_L\nBNK001,BNK001\n",
    );
    write(
        &root.join("data/03_raw/index_target_m140_bnka.xml"),
        &field_list(&[
            ["Bank", "Key", "Bank Key", "Mandatory", "Text", "15", "", "S_BNKA", "BANKL"],
            ["Bank", "Ext", "Bank Key", "Optional", "Text", "15", "", "S_BNKA_EXT", "BANKL"],
        ]),
    );
    let config = AppConfig::default();
    let project = Project::new(root, &config);
    index_source(&project, &config, "m140", "bnka", false).unwrap();
    let target = index_target(&project, &config, "m140", "bnka").unwrap();
    assert_eq!(target.fields.len(), 2);

    let document = map(&project, &config, "m140", "bnka").unwrap().document;
    let assigned: Vec<(&str, Option<&str>)> = document
        .mappings
        .iter()
        .map(|entry| (entry.source.as_str(), entry.internal_id.as_deref()))
        .collect();
    assert_eq!(
        assigned,
        vec![
            ("BANKL", Some("BNKA.BANKL")),
            ("BANK_L", Some("BNKA_EXT.BANKL")),
        ]
    );
    assert!(document.unmatched_targets.is_empty());
}

#[test]
fn existing_source_index_needs_force() {
    let (_dir, project) = project_with_inputs();
    let config = AppConfig::default();
    let index_path = project.object_dir("m140", "bnka").join("index_source.json");

    index_source(&project, &config, "m140", "bnka", false).unwrap();
    fs::write(&index_path, "{}").unwrap();

    let again = index_source(&project, &config, "m140", "bnka", false).unwrap();
    assert!(!again.written);
    assert!(!again.listed);
    assert_eq!(fs::read_to_string(&index_path).unwrap(), "{}");

    let forced = index_source(&project, &config, "m140", "bnka", true).unwrap();
    assert!(forced.written);
    let index: SourceIndex = read_json(&index_path).unwrap();
    assert_eq!(index.source_fields.len(), 4);

    let list = ObjectList::load(&project.object_list_path());
    assert_eq!(list.entries.len(), 1);
    assert!(list.contains("m140", "bnka"));
}

#[test]
fn map_requires_both_indexes() {
    let (_dir, project) = project_with_inputs();
    let config = AppConfig::default();

    let err = map(&project, &config, "m140", "bnka").unwrap_err();
    assert!(err.to_string().contains("run index-source first"));

    index_source(&project, &config, "m140", "bnka", false).unwrap();
    let err = map(&project, &config, "m140", "bnka").unwrap_err();
    assert!(err.to_string().contains("run index-target first"));
}

#[test]
fn disabled_fuzzy_keeps_overrides_and_exact() {
    let (_dir, project) = project_with_inputs();
    let config = AppConfig::default().with_overrides(None, None, true);
    index_source(&project, &config, "m140", "bnka", false).unwrap();
    index_target(&project, &config, "m140", "bnka").unwrap();

    let report = map(&project, &config, "m140", "bnka").unwrap();
    let document = &report.document;
    assert!(!document.metadata.fuzzy_enabled);
    assert_eq!(document.metadata.stats.mapped, 2);
    assert!(document.audit_matches.is_empty());
}

#[test]
fn configured_source_layout_and_tabular_target() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("data/01_source/index_source_m140_bnka.csv"),
        "Bank master export,,\nBANKL,,BANKA\nBNK001,,First Bank\n",
    );
    write(
        &root.join("data/03_raw/index_target_m140_bnka.csv"),
        "Field Description,SAP Field,Length\nBank key,BANKL,15.0\nBank name,BANKA,60\n",
    );
    let config = AppConfig {
        source: Some(SourceLayout {
            sheet: "Sheet1".to_string(),
            header_row: 2,
            ignore_data_below: true,
        }),
        ..AppConfig::default()
    };
    let project = Project::new(root, &config);

    let source = index_source(&project, &config, "m140", "bnka", false).unwrap();
    assert_eq!(source.header_row, 2);
    let names: Vec<&str> = source.fields.iter().map(|f| f.field_name.as_str()).collect();
    assert_eq!(names, vec!["BANKL", "BANKA"]);
    assert!(source.fields.iter().all(|f| f.kind == ColumnKind::Empty));

    let target = index_target(&project, &config, "m140", "bnka").unwrap();
    assert!(target.target_file.ends_with("index_target_m140_bnka.csv"));
    assert_eq!(target.fields.len(), 2);
    assert_eq!(target.fields[0].transformer_id, "S_BNKA#BANKL");
    assert_eq!(target.fields[0].length, "15");

    let report = map(&project, &config, "m140", "bnka").unwrap();
    assert_eq!(report.document.metadata.stats.coverage_percent, 100.0);
}

#[test]
fn missing_source_file_lists_candidates() {
    let dir = TempDir::new().unwrap();
    let project = Project::new(dir.path(), &AppConfig::default());
    let err = index_source(&project, &AppConfig::default(), "m140", "bnka", false).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("index_source_m140_bnka.xlsx"));
    assert!(message.contains("index_source_m140_bnka.csv"));
}
