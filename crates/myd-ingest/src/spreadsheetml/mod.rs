//! SpreadsheetML (Excel 2003 XML) target field lists.
//!
//! The document is read into worksheets of sparse rows, then a header row is
//! located by label matching and every following row becomes a
//! [`myd_model::TargetFieldRecord`].

mod document;
mod fields;
mod header;

pub use document::{RawCell, RawRow, SPREADSHEET_NS, SpreadsheetDocument, Worksheet};
pub use fields::read_target_fields;
pub use header::{EXACT_HEADER_RATIO, PARTIAL_HEADER_RATIO, find_header_row, parse_row_cells};
