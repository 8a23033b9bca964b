//! Error types for source and target ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading source headers or target field lists.
///
/// All variants are fatal for the run that hit them.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input path does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parse Errors ===
    /// Malformed XML (SpreadsheetML document or XLSX part).
    #[error("malformed XML in {origin}: {message}")]
    Xml { origin: String, message: String },

    /// Unreadable CSV.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// XLSX container could not be opened or is missing a part.
    #[error("failed to read workbook {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// File extension is neither CSV nor XLSX.
    #[error("unsupported file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    // === Structural Errors ===
    /// Named worksheet is absent.
    #[error("worksheet '{name}' not found in {origin}")]
    WorksheetNotFound { name: String, origin: String },

    /// No row matched enough of the expected header labels.
    #[error("header row not found in worksheet '{worksheet}' (expected: {expected})")]
    HeaderNotFound { worksheet: String, expected: String },

    /// Declared header row is outside the sheet, or the sheet is empty.
    #[error("header row {row} not present in sheet '{sheet}' of {path}")]
    HeaderRowMissing {
        path: PathBuf,
        sheet: String,
        row: usize,
    },

    /// Essential column absent in a tabular target field list.
    #[error("required column '{column}' not found in {path} (available: {available})")]
    RequiredColumnMissing {
        column: String,
        path: PathBuf,
        available: String,
    },
}

impl IngestError {
    pub(crate) fn xml(origin: impl Into<String>, message: impl ToString) -> Self {
        Self::Xml {
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
