use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{IngestError, Result};

/// Reads up to `limit` records. Rows keep their original width.
pub(crate) fn read_rows(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<String>>> {
    let csv_error = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|limit| rows.len() >= limit) {
            break;
        }
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
