//! Header and column readers for tabular sources (CSV and XLSX).

mod csv;
mod xlsx;

use std::path::Path;

use myd_model::{ColumnKind, SourceColumn};
use tracing::{debug, warn};

use self::xlsx::Workbook;
use crate::error::{IngestError, Result};
use crate::layout::SourceLayout;

/// Supported tabular file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Xlsx,
}

impl TabularFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx" | "xlsm") => Ok(Self::Xlsx),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Cell text of one sheet. Cells are trimmed; rows keep their own width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    pub sheet: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetGrid {
    fn new(sheet: &str, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.iter().map(|cell| normalize_cell(cell)).collect())
            .collect();
        Self {
            sheet: sheet.to_string(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(String::is_empty)
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Reads `sheet` up to row `row_limit` (1-based, inclusive).
///
/// CSV files have a single unnamed sheet, so `sheet` is ignored for them.
pub fn read_sheet(path: &Path, sheet: &str, row_limit: Option<usize>) -> Result<SheetGrid> {
    ensure_exists(path)?;
    let rows = match TabularFormat::from_path(path)? {
        TabularFormat::Csv => self::csv::read_rows(path, row_limit)?,
        TabularFormat::Xlsx => Workbook::open(path)?.read_rows(sheet, row_limit)?,
    };
    Ok(SheetGrid::new(sheet, rows))
}

/// Sheet names in workbook order. A CSV file reports its file stem.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    ensure_exists(path)?;
    match TabularFormat::from_path(path)? {
        TabularFormat::Csv => Ok(vec![csv_sheet_name(path)]),
        TabularFormat::Xlsx => Ok(Workbook::open(path)?.sheet_names()),
    }
}

fn csv_sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// First sheet holding at least one non-empty cell, or `None`.
pub fn first_non_empty_sheet(path: &Path) -> Result<Option<SheetGrid>> {
    ensure_exists(path)?;
    match TabularFormat::from_path(path)? {
        TabularFormat::Csv => {
            let grid = SheetGrid::new(&csv_sheet_name(path), self::csv::read_rows(path, None)?);
            Ok((!grid.is_empty()).then_some(grid))
        }
        TabularFormat::Xlsx => {
            let mut workbook = Workbook::open(path)?;
            for name in workbook.sheet_names() {
                let grid = SheetGrid::new(&name, workbook.read_rows(&name, None)?);
                if !grid.is_empty() {
                    return Ok(Some(grid));
                }
                debug!(sheet = %name, "skipping empty sheet");
            }
            Ok(None)
        }
    }
}

/// Non-empty labels of the declared header row.
///
/// With `ignore_data_below` set, rows after the header are never read.
/// Blank header cells are dropped with a warning.
pub fn read_headers(path: &Path, layout: &SourceLayout) -> Result<Vec<String>> {
    let (grid, index) = read_header_grid(path, layout)?;
    Ok(header_labels(&grid.rows[index]))
}

/// Sheet of `layout` plus the 0-based index of its declared header row,
/// which is guaranteed to lie inside the grid.
///
/// With `ignore_data_below` set, the grid ends at the header row.
pub fn read_header_grid(path: &Path, layout: &SourceLayout) -> Result<(SheetGrid, usize)> {
    let limit = layout.ignore_data_below.then_some(layout.header_row);
    let grid = read_sheet(path, &layout.sheet, limit)?;
    let index = layout
        .header_row
        .checked_sub(1)
        .filter(|index| *index < grid.rows.len())
        .ok_or_else(|| IngestError::HeaderRowMissing {
            path: path.to_path_buf(),
            sheet: layout.sheet.clone(),
            row: layout.header_row,
        })?;
    Ok((grid, index))
}

/// Drops blank cells from a header row, warning about each one.
pub fn header_labels(header: &[String]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            if label.is_empty() {
                warn!(column = index + 1, "empty header cell");
                None
            } else {
                Some(label.clone())
            }
        })
        .collect()
}

/// Index (0-based) of the first row with at least one non-empty cell.
pub fn detect_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter()
        .position(|row| row.iter().any(|cell| !cell.trim().is_empty()))
}

/// Profiles every column with a non-empty header over the rows below it.
pub fn profile_columns(header: &[String], data: &[Vec<String>]) -> Vec<SourceColumn> {
    header
        .iter()
        .enumerate()
        .filter(|(_, label)| !label.trim().is_empty())
        .map(|(index, label)| {
            let values: Vec<&str> = data
                .iter()
                .map(|row| row.get(index).map_or("", |cell| cell.trim()))
                .collect();
            let present: Vec<&str> = values.iter().copied().filter(|v| !v.is_empty()).collect();
            SourceColumn {
                field_name: label.trim().to_string(),
                field_description: None,
                example: present.first().map(|v| (*v).to_string()).unwrap_or_default(),
                kind: infer_kind(&present),
                nullable: present.is_empty() || present.len() < values.len(),
            }
        })
        .collect()
}

fn infer_kind(values: &[&str]) -> ColumnKind {
    values
        .iter()
        .map(|value| classify(value))
        .reduce(|acc, kind| match (acc, kind) {
            (a, b) if a == b => a,
            (ColumnKind::Integer, ColumnKind::Floating)
            | (ColumnKind::Floating, ColumnKind::Integer) => ColumnKind::Floating,
            _ => ColumnKind::Mixed,
        })
        .unwrap_or(ColumnKind::Empty)
}

fn classify(value: &str) -> ColumnKind {
    if value.parse::<i64>().is_ok() {
        ColumnKind::Integer
    } else if value.parse::<f64>().is_ok() {
        ColumnKind::Floating
    } else if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        ColumnKind::Boolean
    } else {
        ColumnKind::String
    }
}
