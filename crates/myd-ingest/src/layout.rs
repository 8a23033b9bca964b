//! Where to find headers in source and target documents.

use myd_model::field::DEFAULT_TABLE_PREFIX;
use serde::{Deserialize, Serialize};

/// Source workbook layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Sheet to read. Ignored for CSV input.
    pub sheet: String,
    /// 1-based header row.
    pub header_row: usize,
    /// Stop after the header row instead of loading data rows.
    pub ignore_data_below: bool,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            sheet: "Sheet1".to_string(),
            header_row: 1,
            ignore_data_below: true,
        }
    }
}

/// Logical columns of a target field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetColumn {
    SheetName,
    GroupName,
    Description,
    Importance,
    Type,
    Length,
    Decimal,
    SapTable,
    SapField,
}

impl TargetColumn {
    pub const ALL: [TargetColumn; 9] = [
        Self::SheetName,
        Self::GroupName,
        Self::Description,
        Self::Importance,
        Self::Type,
        Self::Length,
        Self::Decimal,
        Self::SapTable,
        Self::SapField,
    ];

    /// Configuration key.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::SheetName => "sheet_name",
            Self::GroupName => "group_name",
            Self::Description => "description",
            Self::Importance => "importance",
            Self::Type => "type",
            Self::Length => "length",
            Self::Decimal => "decimal",
            Self::SapTable => "sap_table",
            Self::SapField => "sap_field",
        }
    }

    pub const fn default_label(&self) -> &'static str {
        match self {
            Self::SheetName => "Sheet Name",
            Self::GroupName => "Group Name",
            Self::Description => "Field Description",
            Self::Importance => "Importance",
            Self::Type => "Type",
            Self::Length => "Length",
            Self::Decimal => "Decimal",
            Self::SapTable => "SAP Structure",
            Self::SapField => "SAP Field",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.key() == key)
    }
}

/// Target (SpreadsheetML) field list layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    pub worksheet: String,
    /// Header label per logical column, in detection order.
    pub labels: Vec<(TargetColumn, String)>,
    /// Stripped from `sap_table` to form the internal table name.
    pub table_prefix: String,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self {
            worksheet: "Field List".to_string(),
            labels: TargetColumn::ALL
                .into_iter()
                .map(|column| (column, column.default_label().to_string()))
                .collect(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl TargetLayout {
    /// Replaces the label of `column`, appending it if not configured yet.
    #[must_use]
    pub fn with_label(mut self, column: TargetColumn, label: impl Into<String>) -> Self {
        let label = label.into();
        match self.labels.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = label,
            None => self.labels.push((column, label)),
        }
        self
    }

    pub fn label(&self, column: TargetColumn) -> Option<&str> {
        self.labels
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, label)| label.as_str())
    }

    pub fn expected_labels(&self) -> Vec<&str> {
        self.labels.iter().map(|(_, label)| label.as_str()).collect()
    }
}
