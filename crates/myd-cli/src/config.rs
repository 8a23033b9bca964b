//! Project configuration (`config.toml`).
//!
//! Every key is optional. A missing file means defaults; a file that cannot
//! be read or parsed is reported and ignored. Command-line flags are applied
//! on top by the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use myd_ingest::{SourceLayout, TargetColumn, TargetLayout};
use myd_map::MatchConfig;
use myd_map::config::{DEFAULT_MAX_SUGGESTIONS, DEFAULT_THRESHOLD};
use myd_model::field::DEFAULT_TABLE_PREFIX;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fuzzy_threshold: f64,
    pub max_suggestions: usize,
    pub disable_fuzzy: bool,
    /// Input root, relative to the project root.
    pub input_dir: PathBuf,
    /// Output root, relative to the project root.
    pub output_dir: PathBuf,
    /// Fixed source layout. Without it `index-source` detects the sheet and
    /// header row.
    pub source: Option<SourceLayout>,
    pub target: TargetSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_THRESHOLD,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            disable_fuzzy: false,
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("migrations"),
            source: None,
            target: TargetSection::default(),
        }
    }
}

/// `[target]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSection {
    pub worksheet_name: String,
    pub table_prefix: String,
    /// Logical column key -> header label, e.g. `sap_field = "SAP Field"`.
    pub header_match: BTreeMap<String, String>,
}

impl Default for TargetSection {
    fn default() -> Self {
        let layout = TargetLayout::default();
        Self {
            worksheet_name: layout.worksheet,
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            header_match: BTreeMap::new(),
        }
    }
}

impl TargetSection {
    /// Default layout with the configured overrides applied. Unknown column
    /// keys are reported and skipped.
    pub fn layout(&self) -> TargetLayout {
        let mut layout = TargetLayout {
            worksheet: self.worksheet_name.clone(),
            table_prefix: self.table_prefix.clone(),
            ..TargetLayout::default()
        };
        for (key, label) in &self.header_match {
            match TargetColumn::from_key(key) {
                Some(column) => layout = layout.with_label(column, label.clone()),
                None => warn!(key = %key, "ignoring unknown [target.header_match] column"),
            }
        }
        layout
    }
}

impl AppConfig {
    /// Loads `explicit`, or `config.toml` under `root` when no path is given.
    ///
    /// An explicit path that does not exist is an error; the implicit file is
    /// simply optional.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => root.join(CONFIG_FILENAME),
        };
        Ok(Self::load_or_default(&path))
    }

    /// Reads `path`, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        "failed to parse config file: {}, using defaults",
                        err.message()
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path.display(), "failed to read config file: {err}, using defaults");
                Self::default()
            }
        }
    }

    /// Applies command-line overrides; `None` keeps the file value.
    #[must_use]
    pub fn with_overrides(
        mut self,
        fuzzy_threshold: Option<f64>,
        max_suggestions: Option<usize>,
        disable_fuzzy: bool,
    ) -> Self {
        if let Some(threshold) = fuzzy_threshold {
            self.fuzzy_threshold = threshold;
        }
        if let Some(max) = max_suggestions {
            self.max_suggestions = max;
        }
        self.disable_fuzzy |= disable_fuzzy;
        self
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            enabled: !self.disable_fuzzy,
            threshold: self.fuzzy_threshold,
            max_suggestions: self.max_suggestions,
            ..MatchConfig::default()
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize configuration")
    }
}
