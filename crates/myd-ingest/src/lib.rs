#![deny(unsafe_code)]

//! Readers for both sides of a field mapping.
//!
//! Source fields come from the header row of a CSV or XLSX file
//! ([`read_headers`]); target fields come from a SpreadsheetML field list
//! ([`read_target_fields`]) or, as a fallback, from a plain table
//! ([`read_tabular_target_fields`]).

pub mod error;
pub mod fallback;
pub mod layout;
pub mod spreadsheetml;
pub mod tabular;
pub mod variant;
mod xml;

pub use error::{IngestError, Result};
pub use fallback::read_tabular_target_fields;
pub use layout::{SourceLayout, TargetColumn, TargetLayout};
pub use spreadsheetml::{
    RawCell, RawRow, SPREADSHEET_NS, SpreadsheetDocument, Worksheet, find_header_row,
    parse_row_cells, read_target_fields,
};
pub use tabular::{
    SheetGrid, TabularFormat, detect_header_row, first_non_empty_sheet, header_labels,
    profile_columns, read_header_grid, read_headers, read_sheet, sheet_names,
};
pub use variant::{filter_by_variant, variant_pattern};
