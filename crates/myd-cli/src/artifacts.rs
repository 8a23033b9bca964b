//! JSON documents written under the output root.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use myd_map::MatchOutcome;
use myd_model::{MatchAlgorithm, MatchResult, MatchType, SourceColumn, TargetFieldRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const INDEX_SOURCE_FILE: &str = "index_source.json";
pub const INDEX_TARGET_FILE: &str = "index_target.json";
pub const MAPPING_FILE: &str = "mapping.json";
pub const OBJECT_LIST_FILE: &str = "object_list.json";

pub const GENERATOR: &str = concat!("transform-myd ", env!("CARGO_PKG_VERSION"));

/// Local time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub object: String,
    pub variant: String,
    pub source_file: String,
    pub generated_at: String,
    pub generator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_pattern: Option<String>,
}

/// `index_source.json`: profiled source columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceIndex {
    pub metadata: IndexMetadata,
    pub source_fields: Vec<SourceColumn>,
}

/// `index_target.json`: target fields of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetIndex {
    pub metadata: IndexMetadata,
    pub target_fields: Vec<TargetFieldRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingStats {
    pub source_fields: usize,
    pub target_fields: usize,
    pub mapped: usize,
    pub skipped: usize,
    pub unmapped: usize,
    pub audit: usize,
    pub unmatched_targets: usize,
    /// One decimal.
    pub coverage_percent: f64,
    pub by_type: BTreeMap<MatchType, usize>,
}

impl MappingStats {
    pub fn from_outcome(outcome: &MatchOutcome, target_fields: usize) -> Self {
        Self {
            source_fields: outcome.source_count,
            target_fields,
            mapped: outcome.mapped_count(),
            skipped: outcome.skipped.len(),
            unmapped: outcome.unmapped_sources().count(),
            audit: outcome.audit.len(),
            unmatched_targets: outcome.unmatched_targets.len(),
            coverage_percent: round_to(outcome.coverage_percent(), 1),
            by_type: outcome.counts_by_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingMetadata {
    pub object: String,
    pub variant: String,
    pub generated_at: String,
    pub generator: String,
    pub fuzzy_enabled: bool,
    pub fuzzy_threshold: f64,
    pub stats: MappingStats,
}

/// A primary result with a target, joined with the target record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer_id: Option<String>,
    pub match_type: MatchType,
    /// Three decimals.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<MatchAlgorithm>,
    pub reason: String,
}

/// Ranked alternatives for a source field that stayed unmapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionEntry {
    pub target: String,
    pub score: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmappedEntry {
    pub source: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<SuggestionEntry>,
}

/// `mapping.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    pub metadata: MappingMetadata,
    pub mappings: Vec<MappingEntry>,
    pub unmapped_sources: Vec<UnmappedEntry>,
    pub audit_matches: Vec<MatchResult>,
    pub skipped_fields: Vec<MatchResult>,
    pub unmatched_targets: Vec<TargetFieldRecord>,
    pub mapping_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub object: String,
    pub variant: String,
    pub added_at: String,
}

/// `object_list.json`: every object/variant pair indexed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectList {
    pub entries: Vec<ObjectEntry>,
}

impl ObjectList {
    /// Reads the list; a missing or unreadable file starts a new one.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match read_json(path) {
            Ok(list) => list,
            Err(err) => {
                warn!(path = %path.display(), "ignoring unreadable object list: {err:#}");
                Self::default()
            }
        }
    }

    pub fn contains(&self, object: &str, variant: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.object == object && entry.variant == variant)
    }

    /// Adds the pair unless present. Returns whether it was added.
    pub fn record(&mut self, object: &str, variant: &str, added_at: String) -> bool {
        if self.contains(object, variant) {
            return false;
        }
        self.entries.push(ObjectEntry {
            object: object.to_string(),
            variant: variant.to_string(),
            added_at,
        });
        true
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Pretty-prints `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut content = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    content.push('\n');
    fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))
}
