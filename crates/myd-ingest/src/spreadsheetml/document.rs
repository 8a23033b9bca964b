//! SpreadsheetML document model and reader.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::xml::{attribute, push_reference, utf8};

/// Namespace of Excel 2003 XML spreadsheets.
pub const SPREADSHEET_NS: &str = "urn:schemas-microsoft-com:office:spreadsheet";

/// A `Cell` as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    /// 1-based `ss:Index`, present on sparse layouts.
    pub index: Option<usize>,
    /// Text of the `Data` child; `None` without one.
    pub value: Option<String>,
}

impl RawCell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            index: None,
            value: Some(value.into()),
        }
    }

    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// A `Row` with its cells in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worksheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// Parsed `Workbook`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetDocument {
    origin: String,
    pub worksheets: Vec<Worksheet>,
}

impl SpreadsheetDocument {
    /// Reads and parses a document from disk.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IngestError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&text, path.display().to_string())
    }

    /// Parses document text. `origin` names the input in errors.
    pub fn parse_str(xml: &str, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let worksheets = read_worksheets(xml, &origin)?;
        debug!(
            origin = %origin,
            worksheets = worksheets.len(),
            "parsed SpreadsheetML document"
        );
        Ok(Self { origin, worksheets })
    }

    /// Where the document came from (path or caller-provided label).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// First worksheet whose `Name` equals `name`.
    pub fn find_worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|sheet| sheet.name == name)
    }

    /// Like [`Self::find_worksheet`], failing with `WorksheetNotFound`.
    pub fn worksheet(&self, name: &str) -> Result<&Worksheet> {
        self.find_worksheet(name)
            .ok_or_else(|| IngestError::WorksheetNotFound {
                name: name.to_string(),
                origin: self.origin.clone(),
            })
    }
}

/// Open elements the reader is inside of.
#[derive(Default)]
struct Cursor {
    sheet: Option<Worksheet>,
    row: Option<RawRow>,
    cell: Option<RawCell>,
    /// Element depth inside `Data` (0 = outside).
    data_depth: usize,
    data_text: String,
}

fn read_worksheets(xml: &str, origin: &str) -> Result<Vec<Worksheet>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut worksheets = Vec::new();
    let mut cursor = Cursor::default();

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|err| IngestError::xml(origin, err))?;
        let in_spreadsheet_ns =
            matches!(ns, ResolveResult::Bound(Namespace(ns)) if ns == SPREADSHEET_NS.as_bytes());

        match event {
            Event::Start(start) => {
                if cursor.data_depth > 0 {
                    // Formatting markup (e.g. html:Font) nested in Data.
                    cursor.data_depth += 1;
                    continue;
                }
                if !in_spreadsheet_ns {
                    continue;
                }
                match start.local_name().as_ref() {
                    b"Worksheet" => {
                        let name = attribute(&start, b"Name", origin)?.unwrap_or_default();
                        cursor.sheet = Some(Worksheet {
                            name,
                            rows: Vec::new(),
                        });
                    }
                    b"Row" if cursor.sheet.is_some() => cursor.row = Some(RawRow::default()),
                    b"Cell" if cursor.row.is_some() => {
                        let index = attribute(&start, b"Index", origin)?
                            .map(|raw| parse_index(&raw, origin))
                            .transpose()?;
                        cursor.cell = Some(RawCell { index, value: None });
                    }
                    b"Data" if cursor.cell.is_some() => {
                        cursor.data_depth = 1;
                        cursor.data_text.clear();
                    }
                    _ => {}
                }
            }
            Event::End(end) => {
                if cursor.data_depth > 1 {
                    cursor.data_depth -= 1;
                    continue;
                }
                if cursor.data_depth == 1 {
                    cursor.data_depth = 0;
                    if let Some(cell) = cursor.cell.as_mut() {
                        let text = std::mem::take(&mut cursor.data_text);
                        cell.value = (!text.is_empty()).then_some(text);
                    }
                    continue;
                }
                if !in_spreadsheet_ns {
                    continue;
                }
                match end.local_name().as_ref() {
                    b"Cell" => {
                        if let (Some(cell), Some(row)) = (cursor.cell.take(), cursor.row.as_mut()) {
                            row.cells.push(cell);
                        }
                    }
                    b"Row" => {
                        if let (Some(row), Some(sheet)) = (cursor.row.take(), cursor.sheet.as_mut()) {
                            sheet.rows.push(row);
                        }
                    }
                    b"Worksheet" => worksheets.extend(cursor.sheet.take()),
                    _ => {}
                }
            }
            Event::Text(text) if cursor.data_depth > 0 => {
                cursor.data_text.push_str(utf8(&text, origin)?);
            }
            Event::CData(data) if cursor.data_depth > 0 => {
                cursor.data_text.push_str(utf8(&data, origin)?);
            }
            Event::GeneralRef(reference) if cursor.data_depth > 0 => {
                push_reference(&mut cursor.data_text, &reference, origin)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(worksheets)
}

fn parse_index(raw: &str, origin: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|index| *index > 0)
        .ok_or_else(|| IngestError::xml(origin, format!("invalid cell index '{raw}'")))
}
