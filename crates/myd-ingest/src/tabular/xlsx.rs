//! Reader for the worksheet cells of an XLSX (Office Open XML) workbook.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{IngestError, Result};
use crate::xml::{attribute, push_reference, utf8};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// An opened workbook with its sheet directory and shared strings loaded.
pub(crate) struct Workbook {
    path: PathBuf,
    archive: ZipArchive<File>,
    /// (sheet name, part path) in workbook order.
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
}

impl Workbook {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| IngestError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let workbook = read_part(&mut archive, path, WORKBOOK_PART)?.ok_or_else(|| {
            IngestError::Archive {
                path: path.to_path_buf(),
                source: ZipError::FileNotFound,
            }
        })?;
        let declared = parse_workbook(&workbook, &part_origin(path, WORKBOOK_PART))?;
        let targets = match read_part(&mut archive, path, RELS_PART)? {
            Some(rels) => parse_relationships(&rels, &part_origin(path, RELS_PART))?,
            None => BTreeMap::new(),
        };
        let sheets = declared
            .into_iter()
            .enumerate()
            .map(|(position, (name, rel_id))| {
                let part = rel_id
                    .and_then(|id| targets.get(&id))
                    .map(|target| resolve_target(target))
                    .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));
                (name, part)
            })
            .collect();

        let shared_strings = match read_part(&mut archive, path, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml, &part_origin(path, SHARED_STRINGS_PART))?,
            None => Vec::new(),
        };

        debug!(
            path = %path.display(),
            shared_strings = shared_strings.len(),
            "opened workbook"
        );
        Ok(Self {
            path: path.to_path_buf(),
            archive,
            sheets,
            shared_strings,
        })
    }

    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Cell text of `sheet`, one vector per row, up to row `limit` (1-based).
    pub(crate) fn read_rows(&mut self, sheet: &str, limit: Option<usize>) -> Result<Vec<Vec<String>>> {
        let part = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, part)| part.clone())
            .ok_or_else(|| IngestError::WorksheetNotFound {
                name: sheet.to_string(),
                origin: self.path.display().to_string(),
            })?;
        let xml = read_part(&mut self.archive, &self.path, &part)?.ok_or_else(|| {
            IngestError::Archive {
                path: self.path.clone(),
                source: ZipError::FileNotFound,
            }
        })?;
        parse_sheet(
            &xml,
            &part_origin(&self.path, &part),
            &self.shared_strings,
            limit,
        )
    }
}

fn read_part(archive: &mut ZipArchive<File>, path: &Path, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(IngestError::Archive {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(text))
}

fn part_origin(path: &Path, part: &str) -> String {
    format!("{}:{part}", path.display())
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn xml_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;
    reader
}

/// `(name, relationship id)` for every `<sheet>`.
fn parse_workbook(xml: &str, origin: &str) -> Result<Vec<(String, Option<String>)>> {
    let mut reader = xml_reader(xml);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|err| IngestError::xml(origin, err))? {
            Event::Start(start) if start.local_name().as_ref() == b"sheet" => {
                let name = attribute(&start, b"name", origin)?.unwrap_or_default();
                let rel_id = attribute(&start, b"id", origin)?;
                sheets.push((name, rel_id));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str, origin: &str) -> Result<BTreeMap<String, String>> {
    let mut reader = xml_reader(xml);
    let mut targets = BTreeMap::new();
    loop {
        match reader.read_event().map_err(|err| IngestError::xml(origin, err))? {
            Event::Start(start) if start.local_name().as_ref() == b"Relationship" => {
                let id = attribute(&start, b"Id", origin)?;
                let target = attribute(&start, b"Target", origin)?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Plain text of every `<si>`, skipping phonetic runs.
fn parse_shared_strings(xml: &str, origin: &str) -> Result<Vec<String>> {
    let mut reader = xml_reader(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut phonetic_depth = 0usize;
    let mut in_text = false;
    loop {
        match reader.read_event().map_err(|err| IngestError::xml(origin, err))? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => phonetic_depth += 1,
                b"t" => in_text = phonetic_depth == 0 && current.is_some(),
                _ => {}
            },
            Event::End(end) => match end.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(text) if in_text => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(utf8(&text, origin)?);
                }
            }
            Event::CData(data) if in_text => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(utf8(&data, origin)?);
                }
            }
            Event::GeneralRef(reference) if in_text => {
                if let Some(buf) = current.as_mut() {
                    push_reference(buf, &reference, origin)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

struct PendingCell {
    column: usize,
    kind: Option<String>,
    text: String,
}

impl PendingCell {
    fn resolve(self, shared: &[String], origin: &str) -> Result<String> {
        match self.kind.as_deref() {
            Some("s") => self
                .text
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared.get(index))
                .cloned()
                .ok_or_else(|| {
                    IngestError::xml(
                        origin,
                        format!("invalid shared string index '{}'", self.text),
                    )
                }),
            Some("b") => Ok(match self.text.trim() {
                "1" => "true".to_string(),
                "0" => "false".to_string(),
                other => other.to_string(),
            }),
            _ => Ok(self.text),
        }
    }
}

fn parse_sheet(
    xml: &str,
    origin: &str,
    shared: &[String],
    limit: Option<usize>,
) -> Result<Vec<Vec<String>>> {
    let mut reader = xml_reader(xml);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Option<usize> = None;
    let mut cell: Option<PendingCell> = None;
    let mut capture = false;

    loop {
        match reader.read_event().map_err(|err| IngestError::xml(origin, err))? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"row" => {
                    let number = match attribute(&start, b"r", origin)? {
                        Some(raw) => raw
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .filter(|number| *number > 0)
                            .ok_or_else(|| {
                                IngestError::xml(origin, format!("invalid row number '{raw}'"))
                            })?,
                        None => rows.len() + 1,
                    };
                    if limit.is_some_and(|limit| number > limit) {
                        break;
                    }
                    if rows.len() < number {
                        rows.resize(number, Vec::new());
                    }
                    current_row = Some(number - 1);
                }
                b"c" => {
                    let Some(row) = current_row.and_then(|index| rows.get(index)) else {
                        continue;
                    };
                    let column = match attribute(&start, b"r", origin)? {
                        Some(reference) => column_index(&reference).ok_or_else(|| {
                            IngestError::xml(origin, format!("invalid cell reference '{reference}'"))
                        })?,
                        None => row.len(),
                    };
                    cell = Some(PendingCell {
                        column,
                        kind: attribute(&start, b"t", origin)?,
                        text: String::new(),
                    });
                }
                b"v" | b"t" if cell.is_some() => capture = true,
                _ => {}
            },
            Event::End(end) => match end.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let column = pending.column;
                        let value = pending.resolve(shared, origin)?;
                        if let Some(row) = current_row.and_then(|index| rows.get_mut(index)) {
                            if row.len() <= column {
                                row.resize(column + 1, String::new());
                            }
                            row[column] = value;
                        }
                    }
                }
                b"row" => current_row = None,
                _ => {}
            },
            Event::Text(text) if capture => {
                if let Some(pending) = cell.as_mut() {
                    pending.text.push_str(utf8(&text, origin)?);
                }
            }
            Event::CData(data) if capture => {
                if let Some(pending) = cell.as_mut() {
                    pending.text.push_str(utf8(&data, origin)?);
                }
            }
            Event::GeneralRef(reference) if capture => {
                if let Some(pending) = cell.as_mut() {
                    push_reference(&mut pending.text, &reference, origin)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

/// 0-based column of an A1-style reference (`"AB12"` -> 27).
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<char> = reference
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .collect();
    if letters.is_empty() {
        return None;
    }
    letters
        .iter()
        .try_fold(0usize, |acc, letter| {
            let digit = (letter.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
            acc.checked_mul(26)?.checked_add(digit)
        })
        .map(|number| number - 1)
}
