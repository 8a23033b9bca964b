//! Dense row reconstruction and header row detection.

use super::document::{RawCell, RawRow, Worksheet};

/// Share of expected labels that must appear verbatim in a header row.
pub const EXACT_HEADER_RATIO: f64 = 0.8;
/// Share of expected labels that must appear as substrings (either way).
pub const PARTIAL_HEADER_RATIO: f64 = 0.7;

/// Expands sparse cells into a dense, 0-based row.
///
/// A cell with a 1-based `Index` jumps to that column, padding the gap with
/// `None`. An index that points backwards is ignored and the cell is placed
/// at the next column.
pub fn parse_row_cells(cells: &[RawCell]) -> Vec<Option<String>> {
    cells.iter().fold(Vec::with_capacity(cells.len()), |mut row, cell| {
        if let Some(index) = cell.index {
            let column = index.saturating_sub(1);
            if column > row.len() {
                row.resize(column, None);
            }
        }
        row.push(cell.value.clone());
        row
    })
}

impl RawRow {
    pub fn dense(&self) -> Vec<Option<String>> {
        parse_row_cells(&self.cells)
    }
}

/// Index (0-based) of the first row that looks like the header.
///
/// Comparison is case-insensitive on trimmed text. Rows with fewer cells
/// than `expected` labels are skipped. A row qualifies when at least 80% of
/// `expected` labels match a cell exactly, or at least 70% match partially
/// (label contains the cell text or the cell text contains the label).
/// Empty `expected` never matches.
pub fn find_header_row<S: AsRef<str>>(worksheet: &Worksheet, expected: &[S]) -> Option<usize> {
    if expected.is_empty() {
        return None;
    }
    let expected: Vec<String> = expected.iter().map(|label| fold(label.as_ref())).collect();
    let required = expected.len() as f64;

    worksheet.rows.iter().position(|row| {
        let cells = row.dense();
        if cells.len() < expected.len() {
            return false;
        }
        let actual: Vec<String> = cells
            .iter()
            .map(|cell| cell.as_deref().map(fold).unwrap_or_default())
            .collect();
        let (exact, partial) = count_matches(&expected, &actual);
        exact as f64 >= required * EXACT_HEADER_RATIO
            || partial as f64 >= required * PARTIAL_HEADER_RATIO
    })
}

fn count_matches(expected: &[String], actual: &[String]) -> (usize, usize) {
    let exact = expected
        .iter()
        .filter(|label| actual.iter().any(|cell| cell == *label))
        .count();
    let partial = expected
        .iter()
        .filter(|label| {
            actual
                .iter()
                .filter(|cell| !cell.is_empty())
                .any(|cell| cell.contains(label.as_str()) || label.contains(cell.as_str()))
        })
        .count();
    (exact, partial)
}

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}
