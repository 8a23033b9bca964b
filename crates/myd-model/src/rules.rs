//! Override rules ("central mapping memory").
//!
//! The memory file has a global layer and a table-specific layer keyed by
//! `{object}_{variant}`. Every entry field is required; a missing key fails
//! deserialization of the whole file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Excludes a source field from matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    pub source_field: String,
    pub source_description: String,
    pub skip: bool,
    pub comment: String,
}

/// Pins a source field to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualMapping {
    pub source_field: String,
    pub source_description: String,
    /// Target field name, `TABLE#FIELD` or `TABLE.FIELD`.
    pub target: String,
    #[serde(default)]
    pub target_description: String,
    pub comment: String,
}

/// Rules scoped to one object/variant pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRules {
    #[serde(default)]
    pub skip_fields: Vec<SkipRule>,
    #[serde(default)]
    pub manual_mappings: Vec<ManualMapping>,
}

/// Full override configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingMemory {
    #[serde(default)]
    pub global_skip_fields: Vec<SkipRule>,
    #[serde(default)]
    pub global_manual_mappings: Vec<ManualMapping>,
    #[serde(default)]
    pub table_specific: BTreeMap<String, TableRules>,
}

impl MappingMemory {
    /// Key used in `table_specific`.
    pub fn table_key(object: &str, variant: &str) -> String {
        format!("{object}_{variant}")
    }

    pub fn table_rules(&self, object: &str, variant: &str) -> Option<&TableRules> {
        self.table_specific.get(&Self::table_key(object, variant))
    }

    pub fn is_empty(&self) -> bool {
        self.global_skip_fields.is_empty()
            && self.global_manual_mappings.is_empty()
            && self.table_specific.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_key_format() {
        assert_eq!(MappingMemory::table_key("m140", "bnka"), "m140_bnka");
    }

    #[test]
    fn lookup_table_rules() {
        let mut memory = MappingMemory::default();
        assert!(memory.is_empty());
        memory.table_specific.insert(
            "m140_bnka".to_string(),
            TableRules {
                skip_fields: vec![SkipRule {
                    source_field: "ERDAT".to_string(),
                    source_description: "Created on".to_string(),
                    skip: true,
                    comment: "Not migrated".to_string(),
                }],
                manual_mappings: Vec::new(),
            },
        );
        assert!(memory.table_rules("m140", "bnka").is_some());
        assert!(memory.table_rules("m140", "knb1").is_none());
        assert!(!memory.is_empty());
    }
}
