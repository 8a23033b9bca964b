//! Match results produced by the matching engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a source field was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Synonym,
    Fuzzy,
    CentralSkip,
    CentralManual,
    Audit,
    None,
}

impl MatchType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Synonym => "synonym",
            Self::Fuzzy => "fuzzy",
            Self::CentralSkip => "central_skip",
            Self::CentralManual => "central_manual",
            Self::Audit => "audit",
            Self::None => "none",
        }
    }

    /// Whether results of this type must carry a target.
    pub const fn requires_target(&self) -> bool {
        !matches!(self, Self::None | Self::CentralSkip)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring algorithm behind a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAlgorithm {
    Levenshtein,
    JaroWinkler,
    Combined,
    CentralMemory,
}

impl MatchAlgorithm {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Levenshtein => "levenshtein",
            Self::JaroWinkler => "jaro_winkler",
            Self::Combined => "combined",
            Self::CentralMemory => "central_memory",
        }
    }
}

impl fmt::Display for MatchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one source field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_field: String,
    pub target_field: Option<String>,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub match_type: MatchType,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<MatchAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_description: Option<String>,
}

impl MatchResult {
    /// True when the result assigns a target (skips and misses do not).
    pub fn is_mapped(&self) -> bool {
        self.target_field.is_some()
    }

    /// Line used in generated mapping files.
    pub fn mapping_line(&self) -> String {
        match &self.target_field {
            Some(target) => format!("{}: {}", self.source_field, target),
            None => format!("# {}: # {}", self.source_field, self.reason),
        }
    }
}
