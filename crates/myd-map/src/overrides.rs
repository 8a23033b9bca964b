//! Override rules: loading the mapping memory file and resolving the
//! effective skip/manual rules for one object and variant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use myd_model::{ManualMapping, MappingMemory, SkipRule};
use tracing::{debug, warn};

use crate::error::{MappingError, Result};
use crate::normalize::normalize_name;

/// File name of the mapping memory.
pub const MEMORY_FILE_NAME: &str = "central_mapping_memory.toml";
/// Directory searched before the base directory itself.
const CONFIG_DIR: &str = "configs";

/// Skip rules and manual mappings in application order (global first,
/// table-specific appended).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveRules {
    pub skip_rules: Vec<SkipRule>,
    pub manual_mappings: Vec<ManualMapping>,
}

impl EffectiveRules {
    pub fn is_empty(&self) -> bool {
        self.skip_rules.is_empty() && self.manual_mappings.is_empty()
    }

    /// Skip rules keyed by normalized source field; the last rule for a
    /// field wins. Rules with `skip = false` stay in the map so they can
    /// cancel an earlier skip.
    pub fn skip_index(&self) -> BTreeMap<String, &SkipRule> {
        last_wins(&self.skip_rules, |rule| &rule.source_field)
    }

    /// Manual mappings keyed by normalized source field, last wins.
    pub fn manual_index(&self) -> BTreeMap<String, &ManualMapping> {
        last_wins(&self.manual_mappings, |mapping| &mapping.source_field)
    }
}

fn last_wins<'a, T>(items: &'a [T], key: impl Fn(&T) -> &str) -> BTreeMap<String, &'a T> {
    let mut index = BTreeMap::new();
    for item in items {
        let normalized = normalize_name(key(item));
        if normalized.is_empty() {
            continue;
        }
        index.insert(normalized, item);
    }
    index
}

/// Combines the global layer with the `{object}_{variant}` layer.
///
/// A missing memory or a missing table key contributes nothing.
pub fn effective_rules(
    memory: Option<&MappingMemory>,
    object: &str,
    variant: &str,
) -> EffectiveRules {
    let Some(memory) = memory else {
        return EffectiveRules::default();
    };

    let mut rules = EffectiveRules {
        skip_rules: memory.global_skip_fields.clone(),
        manual_mappings: memory.global_manual_mappings.clone(),
    };
    match memory.table_rules(object, variant) {
        Some(table) => {
            rules.skip_rules.extend(table.skip_fields.iter().cloned());
            rules
                .manual_mappings
                .extend(table.manual_mappings.iter().cloned());
        }
        None => debug!(
            key = %MappingMemory::table_key(object, variant),
            "no table-specific override rules"
        ),
    }
    rules
}

/// Locates the memory file: `configs/central_mapping_memory.toml` first,
/// then `central_mapping_memory.toml` under `base_dir`.
pub fn find_memory_file(base_dir: &Path) -> Option<PathBuf> {
    [
        base_dir.join(CONFIG_DIR).join(MEMORY_FILE_NAME),
        base_dir.join(MEMORY_FILE_NAME),
    ]
    .into_iter()
    .find(|path| path.is_file())
}

/// Parses memory file contents. `path` is only used in the error.
pub fn parse_mapping_memory(text: &str, path: &Path) -> Result<MappingMemory> {
    toml::from_str(text).map_err(|err| MappingError::OverrideRuleMalformed {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })
}

/// Reads and parses one memory file.
pub fn read_mapping_memory(path: &Path) -> Result<MappingMemory> {
    let text = std::fs::read_to_string(path).map_err(|source| MappingError::OverrideFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mapping_memory(&text, path)
}

/// Loads the memory file under `base_dir`, if any.
///
/// Unreadable or malformed files are logged and treated as absent, so
/// matching proceeds without overrides.
pub fn load_mapping_memory(base_dir: &Path) -> Option<MappingMemory> {
    let path = find_memory_file(base_dir)?;
    match read_mapping_memory(&path) {
        Ok(memory) => {
            debug!(
                path = %path.display(),
                global_skips = memory.global_skip_fields.len(),
                global_manual = memory.global_manual_mappings.len(),
                tables = memory.table_specific.len(),
                "loaded mapping memory"
            );
            Some(memory)
        }
        Err(err) => {
            warn!("{err}, continuing without override rules");
            None
        }
    }
}
