//! Target field extraction from a located header row.

use std::collections::BTreeMap;
use std::path::Path;

use myd_model::TargetFieldRecord;
use tracing::debug;

use super::document::SpreadsheetDocument;
use super::header::find_header_row;
use crate::error::{IngestError, Result};
use crate::layout::{TargetColumn, TargetLayout};

impl SpreadsheetDocument {
    /// Extracts one [`TargetFieldRecord`] per data row of the layout's worksheet.
    ///
    /// Rows with no non-blank cell and rows missing both the SAP structure and
    /// the SAP field are skipped.
    pub fn parse_target_fields(&self, layout: &TargetLayout) -> Result<Vec<TargetFieldRecord>> {
        let worksheet = self.worksheet(&layout.worksheet)?;
        let expected = layout.expected_labels();
        let header_index =
            find_header_row(worksheet, &expected).ok_or_else(|| IngestError::HeaderNotFound {
                worksheet: worksheet.name.clone(),
                expected: expected.join(", "),
            })?;

        let header = worksheet.rows[header_index].dense();
        let columns = column_map(layout, &header);
        debug!(
            worksheet = %worksheet.name,
            header_row = header_index + 1,
            columns = columns.len(),
            "located target header row"
        );

        let mut records = Vec::new();
        for (offset, row) in worksheet.rows[header_index + 1..].iter().enumerate() {
            let cells = row.dense();
            let value = |column: TargetColumn| -> Option<String> {
                let index = *columns.get(&column)?;
                cells
                    .get(index)?
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            };

            if cells.iter().flatten().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let sap_table = value(TargetColumn::SapTable);
            let sap_field = value(TargetColumn::SapField);
            if sap_table.is_none() && sap_field.is_none() {
                debug!(
                    row = header_index + offset + 2,
                    "skipping row without SAP structure and field"
                );
                continue;
            }

            let mut record = TargetFieldRecord::new(
                sap_table.as_deref().unwrap_or_default(),
                sap_field.as_deref().unwrap_or_default(),
                &layout.table_prefix,
            );
            record.description = value(TargetColumn::Description).unwrap_or_default();
            record.group = value(TargetColumn::GroupName).unwrap_or_default();
            record.importance = value(TargetColumn::Importance).unwrap_or_default();
            record.data_type = value(TargetColumn::Type).unwrap_or_default();
            record.length = value(TargetColumn::Length).unwrap_or_default();
            record.decimal = value(TargetColumn::Decimal);
            record.sheet_name = value(TargetColumn::SheetName);
            records.push(record);
        }

        debug!(records = records.len(), "parsed target fields");
        Ok(records)
    }
}

/// Reads a SpreadsheetML file and extracts its target fields.
pub fn read_target_fields(path: &Path, layout: &TargetLayout) -> Result<Vec<TargetFieldRecord>> {
    SpreadsheetDocument::open(path)?.parse_target_fields(layout)
}

/// Column index for each configured label: the first header cell containing
/// the label (case-insensitive).
fn column_map(layout: &TargetLayout, header: &[Option<String>]) -> BTreeMap<TargetColumn, usize> {
    let header: Vec<Option<String>> = header
        .iter()
        .map(|cell| cell.as_deref().map(str::to_lowercase))
        .collect();
    layout
        .labels
        .iter()
        .filter_map(|(column, label)| {
            let label = label.to_lowercase();
            header
                .iter()
                .position(|cell| cell.as_deref().is_some_and(|text| text.contains(&label)))
                .map(|index| (*column, index))
        })
        .collect()
}
