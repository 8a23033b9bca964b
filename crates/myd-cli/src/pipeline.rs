//! The three commands as library functions: locate inputs, run the readers
//! or the matcher, write the JSON artifacts.
//!
//! Directory layout, relative to the project root:
//!
//! ```text
//! <input>/01_source/index_source_<object>_<variant>.{xlsx,csv}
//! <input>/03_raw/index_target_<object>_<variant>.xml   (or .xlsx / .csv)
//! <output>/<object>/<variant>/{index_source,index_target,mapping}.json
//! <output>/object_list.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use myd_ingest::{
    SheetGrid, detect_header_row, filter_by_variant, first_non_empty_sheet, header_labels,
    profile_columns, read_header_grid, read_tabular_target_fields, read_target_fields,
    variant_pattern,
};
use myd_map::{MatchingEngine, SynonymTable, effective_rules, load_mapping_memory};
use myd_model::{FieldRecord, MatchType, SourceColumn, TargetFieldRecord};
use tracing::{debug, info, info_span, warn};

use crate::artifacts::{
    GENERATOR, INDEX_SOURCE_FILE, INDEX_TARGET_FILE, IndexMetadata, MAPPING_FILE, MappingDocument,
    MappingEntry, MappingMetadata, MappingStats, OBJECT_LIST_FILE, ObjectList, SourceIndex,
    SuggestionEntry, TargetIndex, UnmappedEntry, read_json, round_to, timestamp, write_json,
};
use crate::config::AppConfig;

const SOURCE_DIR: &str = "01_source";
const TARGET_DIR: &str = "03_raw";
const SOURCE_EXTENSIONS: [&str; 2] = ["xlsx", "csv"];
const TARGET_FALLBACK_EXTENSIONS: [&str; 2] = ["xlsx", "csv"];

/// Resolved input and output roots of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Project {
    pub fn new(root: &Path, config: &AppConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            input_dir: root.join(&config.input_dir),
            output_dir: root.join(&config.output_dir),
        }
    }

    /// Candidate source files in lookup order.
    pub fn source_candidates(&self, object: &str, variant: &str) -> Vec<PathBuf> {
        SOURCE_EXTENSIONS
            .iter()
            .map(|ext| {
                self.input_dir
                    .join(SOURCE_DIR)
                    .join(format!("index_source_{object}_{variant}.{ext}"))
            })
            .collect()
    }

    /// Candidate target files: the SpreadsheetML export first, then the
    /// tabular fallbacks.
    pub fn target_candidates(&self, object: &str, variant: &str) -> Vec<PathBuf> {
        let dir = self.input_dir.join(TARGET_DIR);
        let stem = format!("index_target_{object}_{variant}");
        let mut candidates = vec![dir.join(format!("{stem}.xml"))];
        candidates.extend(
            TARGET_FALLBACK_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{stem}.{ext}"))),
        );
        candidates
    }

    pub fn object_dir(&self, object: &str, variant: &str) -> PathBuf {
        self.output_dir.join(object).join(variant)
    }

    pub fn object_list_path(&self) -> PathBuf {
        self.output_dir.join(OBJECT_LIST_FILE)
    }
}

#[derive(Debug, Clone)]
pub struct IndexSourceReport {
    pub source_file: PathBuf,
    pub sheet: String,
    /// 1-based.
    pub header_row: usize,
    pub fields: Vec<SourceColumn>,
    pub output: PathBuf,
    /// False when an existing index was kept because `force` was off.
    pub written: bool,
    /// True when the object/variant pair was new to the object list.
    pub listed: bool,
}

#[derive(Debug, Clone)]
pub struct IndexTargetReport {
    pub target_file: PathBuf,
    pub variant_pattern: String,
    /// Records in the file before the variant filter.
    pub total_records: usize,
    pub fields: Vec<TargetFieldRecord>,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MapReport {
    pub output: PathBuf,
    pub document: MappingDocument,
}

/// Profiles the source header of `object`/`variant` into `index_source.json`.
pub fn index_source(
    project: &Project,
    config: &AppConfig,
    object: &str,
    variant: &str,
    force: bool,
) -> Result<IndexSourceReport> {
    check_key("object", object)?;
    check_key("variant", variant)?;
    let span = info_span!("index_source", object = %object, variant = %variant);
    let _guard = span.enter();

    let candidates = project.source_candidates(object, variant);
    let source_file = first_existing(&candidates)
        .ok_or_else(|| anyhow!("source file not found, tried: {}", join_paths(&candidates)))?;
    info!(path = %source_file.display(), "reading source header");

    let (grid, header_index) = load_source_grid(&source_file, config)?;
    let header = grid
        .rows
        .get(header_index)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if header_labels(header).is_empty() {
        bail!(
            "header row {} of sheet '{}' in {} has no labels",
            header_index + 1,
            grid.sheet,
            source_file.display()
        );
    }
    let data = grid.rows.get(header_index + 1..).unwrap_or_default();
    let fields = profile_columns(header, data);
    debug!(fields = fields.len(), data_rows = data.len(), "profiled source columns");

    let output = project.object_dir(object, variant).join(INDEX_SOURCE_FILE);
    let written = if output.exists() && !force {
        warn!(path = %output.display(), "source index exists, keeping it (use --force to overwrite)");
        false
    } else {
        let index = SourceIndex {
            metadata: IndexMetadata {
                object: object.to_string(),
                variant: variant.to_string(),
                source_file: source_file.display().to_string(),
                generated_at: timestamp(),
                generator: GENERATOR.to_string(),
                sheet: Some(grid.sheet.clone()),
                variant_pattern: None,
            },
            source_fields: fields.clone(),
        };
        write_json(&output, &index)?;
        info!(path = %output.display(), fields = fields.len(), "wrote source index");
        true
    };

    let list_path = project.object_list_path();
    let mut list = ObjectList::load(&list_path);
    let listed = list.record(object, variant, timestamp());
    if listed {
        write_json(&list_path, &list)?;
    }

    Ok(IndexSourceReport {
        source_file,
        sheet: grid.sheet,
        header_row: header_index + 1,
        fields,
        output,
        written,
        listed,
    })
}

/// Grid plus 0-based header index, from the configured layout or detected.
fn load_source_grid(path: &Path, config: &AppConfig) -> Result<(SheetGrid, usize)> {
    match &config.source {
        Some(layout) => Ok(read_header_grid(path, layout)?),
        None => {
            let grid = first_non_empty_sheet(path)?
                .ok_or_else(|| anyhow!("no sheet with data in {}", path.display()))?;
            let index = detect_header_row(&grid.rows)
                .ok_or_else(|| anyhow!("no header row in {}", path.display()))?;
            debug!(sheet = %grid.sheet, row = index + 1, "detected header row");
            Ok((grid, index))
        }
    }
}

/// Parses the target field list and writes the variant's fields to
/// `index_target.json`.
pub fn index_target(
    project: &Project,
    config: &AppConfig,
    object: &str,
    variant: &str,
) -> Result<IndexTargetReport> {
    check_key("object", object)?;
    check_key("variant", variant)?;
    let span = info_span!("index_target", object = %object, variant = %variant);
    let _guard = span.enter();

    let layout = config.target.layout();
    let pattern = variant_pattern(&layout.table_prefix, variant);
    let candidates = project.target_candidates(object, variant);
    let target_file = first_existing(&candidates)
        .ok_or_else(|| anyhow!("target file not found, tried: {}", join_paths(&candidates)))?;
    info!(path = %target_file.display(), "reading target fields");

    let is_xml = target_file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    let records = if is_xml {
        read_target_fields(&target_file, &layout)?
    } else {
        debug!("no SpreadsheetML export, using tabular field list");
        read_tabular_target_fields(&target_file, &pattern, &layout)?
    };
    let total_records = records.len();
    let fields = filter_by_variant(records, &layout.table_prefix, variant);
    if fields.is_empty() {
        warn!(pattern = %pattern, total = total_records, "no target fields match the variant");
    }

    let output = project.object_dir(object, variant).join(INDEX_TARGET_FILE);
    let index = TargetIndex {
        metadata: IndexMetadata {
            object: object.to_string(),
            variant: variant.to_string(),
            source_file: target_file.display().to_string(),
            generated_at: timestamp(),
            generator: GENERATOR.to_string(),
            sheet: Some(layout.worksheet.clone()),
            variant_pattern: Some(pattern.clone()),
        },
        target_fields: fields.clone(),
    };
    write_json(&output, &index)?;
    info!(path = %output.display(), fields = fields.len(), total = total_records, "wrote target index");

    Ok(IndexTargetReport {
        target_file,
        variant_pattern: pattern,
        total_records,
        fields,
        output,
    })
}

/// Matches the indexed source fields against the indexed target fields and
/// writes `mapping.json`.
pub fn map(project: &Project, config: &AppConfig, object: &str, variant: &str) -> Result<MapReport> {
    check_key("object", object)?;
    check_key("variant", variant)?;
    let span = info_span!("map", object = %object, variant = %variant);
    let _guard = span.enter();

    let dir = project.object_dir(object, variant);
    let source_index: SourceIndex = read_json(&dir.join(INDEX_SOURCE_FILE))
        .context("load source index (run index-source first)")?;
    let target_index: TargetIndex = read_json(&dir.join(INDEX_TARGET_FILE))
        .context("load target index (run index-target first)")?;

    let sources: Vec<FieldRecord> = source_index
        .source_fields
        .iter()
        .map(SourceColumn::to_field_record)
        .collect();
    let targets: Vec<FieldRecord> = target_index
        .target_fields
        .iter()
        .map(FieldRecord::from)
        .collect();

    let memory = load_mapping_memory(&project.root);
    let rules = effective_rules(memory.as_ref(), object, variant);
    debug!(
        skip_rules = rules.skip_rules.len(),
        manual_mappings = rules.manual_mappings.len(),
        "override rules"
    );

    let match_config = config.match_config();
    let engine = MatchingEngine::new(match_config.clone(), SynonymTable::builtin())
        .context("matching configuration")?;
    let outcome = engine.run(&sources, &targets, &rules)?;

    let mappings = outcome
        .mapped()
        .map(|result| {
            let record = result
                .target_field
                .as_deref()
                .and_then(|name| find_target(&target_index.target_fields, name));
            MappingEntry {
                source: result.source_field.clone(),
                target: result.target_field.clone().unwrap_or_default(),
                internal_id: record.map(|record| record.internal_id.clone()),
                transformer_id: record.map(|record| record.transformer_id.clone()),
                match_type: result.match_type,
                confidence: round_to(result.confidence, 3),
                algorithm: result.algorithm,
                reason: result.reason.clone(),
            }
        })
        .collect();

    let unmapped_sources = outcome
        .unmapped_sources()
        .filter(|result| result.match_type == MatchType::None)
        .map(|result| {
            let suggestions = if match_config.enabled {
                sources
                    .iter()
                    .find(|source| source.name == result.source_field)
                    .map(|source| engine.suggest(source, &targets))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|suggestion| SuggestionEntry {
                        target: suggestion.target_field,
                        score: round_to(suggestion.score.combined, 3),
                        explanation: suggestion.score.explain(),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            UnmappedEntry {
                source: result.source_field.clone(),
                reason: result.reason.clone(),
                suggestions,
            }
        })
        .collect();

    let unmatched_targets = outcome
        .unmatched_targets
        .iter()
        .filter_map(|&index| target_index.target_fields.get(index).cloned())
        .collect();

    let document = MappingDocument {
        metadata: MappingMetadata {
            object: object.to_string(),
            variant: variant.to_string(),
            generated_at: timestamp(),
            generator: GENERATOR.to_string(),
            fuzzy_enabled: match_config.enabled,
            fuzzy_threshold: match_config.threshold,
            stats: MappingStats::from_outcome(&outcome, targets.len()),
        },
        mappings,
        unmapped_sources,
        audit_matches: outcome.audit.clone(),
        skipped_fields: outcome.skipped.clone(),
        unmatched_targets,
        mapping_lines: outcome.mapping_lines(),
    };

    let output = dir.join(MAPPING_FILE);
    write_json(&output, &document)?;
    info!(
        path = %output.display(),
        mapped = document.metadata.stats.mapped,
        coverage = document.metadata.stats.coverage_percent,
        "wrote mapping"
    );
    Ok(MapReport { output, document })
}

/// Object and variant names become directory names.
fn check_key(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{kind} must not be empty");
    }
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        bail!("invalid {kind} '{value}'");
    }
    Ok(())
}

/// Target named by field, `TABLE#FIELD` or `TABLE.FIELD`.
/// Record a result's target names: by `transformer_id`, then `internal_id`,
/// then the bare field.
fn find_target<'t>(records: &'t [TargetFieldRecord], name: &str) -> Option<&'t TargetFieldRecord> {
    records
        .iter()
        .find(|record| record.transformer_id == name)
        .or_else(|| records.iter().find(|record| record.internal_id == name))
        .or_else(|| records.iter().find(|record| record.sap_field == name))
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
