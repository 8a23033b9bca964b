//! Source and target field records.

use serde::{Deserialize, Serialize};

/// Default prefix stripped from SAP structure names to get the internal table.
pub const DEFAULT_TABLE_PREFIX: &str = "S_";

/// A field on either side of the mapping: a name plus an optional description.
///
/// Source fields come straight from a tabular header row; target fields are
/// projected from [`TargetFieldRecord`] (name = `sap_field`, ids =
/// `transformer_id` then `internal_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Qualified identifiers, reported form first. Two targets may share a
    /// name but never an id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Identity reported as a match target: the first id, else the name.
    pub fn key(&self) -> &str {
        self.ids.first().map_or(self.name.as_str(), String::as_str)
    }

    /// True when `reference` equals one of the ids, ignoring ASCII case.
    pub fn has_id(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.ids.iter().any(|id| id.eq_ignore_ascii_case(reference))
    }

    /// Description as a string slice, empty when absent.
    pub fn description_str(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// One row of the target field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFieldRecord {
    pub sap_field: String,
    pub sap_table: String,
    pub internal_table: String,
    /// `{internal_table}.{sap_field}`
    pub internal_id: String,
    /// `{sap_table}#{sap_field}`
    pub transformer_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub length: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

impl TargetFieldRecord {
    /// Creates a record with derived identifiers and empty metadata.
    ///
    /// `table_prefix` is removed from the front of `sap_table` (once) to build
    /// the internal table name.
    pub fn new(sap_table: &str, sap_field: &str, table_prefix: &str) -> Self {
        let internal_table = internal_table_name(sap_table, table_prefix);
        Self {
            internal_id: format!("{internal_table}.{sap_field}"),
            transformer_id: format!("{sap_table}#{sap_field}"),
            sap_field: sap_field.to_string(),
            sap_table: sap_table.to_string(),
            internal_table,
            description: String::new(),
            group: String::new(),
            importance: String::new(),
            data_type: String::new(),
            length: String::new(),
            decimal: None,
            sheet_name: None,
        }
    }

    /// True when the importance column marks the field as required.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self.importance.trim().to_lowercase().as_str(),
            "mandatory" | "true" | "1" | "yes"
        )
    }

    /// Projection used by the matcher.
    pub fn to_field_record(&self) -> FieldRecord {
        FieldRecord {
            name: self.sap_field.clone(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            ids: vec![self.transformer_id.clone(), self.internal_id.clone()],
        }
    }
}

impl From<&TargetFieldRecord> for FieldRecord {
    fn from(record: &TargetFieldRecord) -> Self {
        record.to_field_record()
    }
}

/// Strips `prefix` from the start of `sap_table`.
pub fn internal_table_name(sap_table: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return sap_table.to_string();
    }
    sap_table
        .strip_prefix(prefix)
        .unwrap_or(sap_table)
        .to_string()
}

/// Coarse value kind inferred from a column's data cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Floating,
    Boolean,
    String,
    Mixed,
    Empty,
}

/// Profile of a source column, written by the `index-source` step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub field_name: String,
    #[serde(default)]
    pub field_description: Option<String>,
    #[serde(default)]
    pub example: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl SourceColumn {
    pub fn to_field_record(&self) -> FieldRecord {
        FieldRecord {
            name: self.field_name.clone(),
            description: self.field_description.clone(),
            ids: Vec::new(),
        }
    }
}
