//! Error types for matching operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from override loading, configuration and scoring.
#[derive(Debug, Error)]
pub enum MappingError {
    /// An override entry is missing a required key or has the wrong type.
    ///
    /// Recovered by callers: the whole memory file is ignored.
    #[error("malformed override rules in {path}: {message}")]
    OverrideRuleMalformed { path: PathBuf, message: String },

    /// The override file exists but could not be read.
    #[error("failed to read override file {path}: {source}")]
    OverrideFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A computed similarity left `[0, 1]`.
    #[error("confidence {value} for '{source_field}' -> '{target_field}' is outside [0, 1]")]
    ConfidenceOutOfRange {
        source_field: String,
        target_field: String,
        value: f64,
    },

    /// Matching configuration failed validation.
    #[error("invalid match configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MappingError::ConfidenceOutOfRange {
            source_field: "BANKL".to_string(),
            target_field: "BANKA".to_string(),
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "confidence 1.5 for 'BANKL' -> 'BANKA' is outside [0, 1]"
        );
    }
}
