//! Target field lists delivered as plain CSV/XLSX tables instead of SpreadsheetML.

use std::path::Path;

use myd_model::TargetFieldRecord;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::layout::TargetLayout;
use crate::tabular::read_sheet;

const DEFAULT_DATA_TYPE: &str = "Text";
const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    SheetName,
    Group,
    Description,
    Importance,
    DataType,
    Length,
    Decimal,
    SapTable,
    SapField,
}

impl Column {
    const ALL: [Column; 9] = [
        Self::SheetName,
        Self::Group,
        Self::Description,
        Self::Importance,
        Self::DataType,
        Self::Length,
        Self::Decimal,
        Self::SapTable,
        Self::SapField,
    ];

    const fn key(self) -> &'static str {
        match self {
            Self::SheetName => "sheet_name",
            Self::Group => "field_group",
            Self::Description => "field_description",
            Self::Importance => "importance",
            Self::DataType => "data_type",
            Self::Length => "length",
            Self::Decimal => "decimal",
            Self::SapTable => "sap_table",
            Self::SapField => "sap_field",
        }
    }

    /// Accepted header spellings, most specific first.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::SheetName => &["Sheet Name", "sheet_name", "SheetName"],
            Self::Group => &["Group Name", "field_group", "Group", "FieldGroup"],
            Self::Description => &["Field Description", "field_description", "Description"],
            Self::Importance => &["Importance", "importance", "Mandatory"],
            Self::DataType => &["Type", "data_type", "DataType", "Data Type"],
            Self::Length => &["Length", "length"],
            Self::Decimal => &["Decimal", "decimal", "Decimals"],
            Self::SapTable => &["SAP Structure", "sap_table", "sap_structure", "Table"],
            Self::SapField => &["SAP Field", "sap_field", "Field"],
        }
    }

    /// Exact alias match first, then case-insensitive.
    fn locate(self, header: &[String]) -> Option<usize> {
        let aliases = self.aliases();
        aliases
            .iter()
            .find_map(|alias| header.iter().position(|cell| cell == alias))
            .or_else(|| {
                header.iter().position(|cell| {
                    aliases
                        .iter()
                        .any(|alias| cell.eq_ignore_ascii_case(alias))
                })
            })
    }
}

/// Reads target fields from the first row-headed table of `layout.worksheet`.
///
/// `field_description` and `sap_field` columns are required. Without a
/// structure column every field belongs to `variant`.
pub fn read_tabular_target_fields(
    path: &Path,
    variant: &str,
    layout: &TargetLayout,
) -> Result<Vec<TargetFieldRecord>> {
    let grid = read_sheet(path, &layout.worksheet, None)?;
    let Some((header, data)) = grid.rows.split_first() else {
        return Err(missing_column(Column::Description, path, &[]));
    };

    let columns: Vec<(Column, Option<usize>)> = Column::ALL
        .into_iter()
        .map(|column| (column, column.locate(header)))
        .collect();
    let index_of = |wanted: Column| {
        columns
            .iter()
            .find(|(column, _)| *column == wanted)
            .and_then(|(_, index)| *index)
    };
    for required in [Column::Description, Column::SapField] {
        if index_of(required).is_none() {
            return Err(missing_column(required, path, header));
        }
    }

    let mut records = Vec::new();
    for row in data {
        if row.iter().all(String::is_empty) {
            continue;
        }
        let value = |column: Column| {
            index_of(column)
                .and_then(|index| row.get(index))
                .map(String::as_str)
        };
        let text = |column: Column| value(column).unwrap_or_default().to_string();

        let sap_table = match value(Column::SapTable) {
            Some(table) => table.to_string(),
            None => variant.to_string(),
        };
        let mut record =
            TargetFieldRecord::new(&sap_table, &text(Column::SapField), &layout.table_prefix);
        record.description = text(Column::Description);
        record.importance = text(Column::Importance);
        record.group = value(Column::Group)
            .filter(|group| !group.is_empty())
            .unwrap_or(DEFAULT_GROUP)
            .to_string();
        record.data_type = value(Column::DataType)
            .unwrap_or(DEFAULT_DATA_TYPE)
            .to_string();
        record.length = normalize_length(&text(Column::Length));
        record.decimal = value(Column::Decimal)
            .filter(|decimal| !decimal.is_empty() && *decimal != "None")
            .map(str::to_string);
        record.sheet_name = Some(
            value(Column::SheetName)
                .unwrap_or(layout.worksheet.as_str())
                .to_string(),
        );
        records.push(record);
    }

    debug!(
        path = %path.display(),
        records = records.len(),
        "read tabular target fields"
    );
    Ok(records)
}

fn missing_column(column: Column, path: &Path, header: &[String]) -> IngestError {
    IngestError::RequiredColumnMissing {
        column: column.key().to_string(),
        path: path.to_path_buf(),
        available: header.join(", "),
    }
}

/// Whole-number lengths exported as floats (`"4.0"`) become `"4"`.
fn normalize_length(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => format!("{value:.0}"),
        _ => raw.to_string(),
    }
}
