//! Matching configuration.

use serde::{Deserialize, Serialize};

use crate::error::{MappingError, Result};

/// Minimum similarity for fuzzy and audit matches.
pub const DEFAULT_THRESHOLD: f64 = 0.6;
/// Suggestions listed per unmapped source field.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;
/// Rounding slack for the weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Tunables for the synonym, fuzzy and audit phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Runs the synonym, fuzzy and audit phases. Exact and override phases
    /// always run.
    pub enabled: bool,
    /// Minimum similarity in `[0, 1]`.
    pub threshold: f64,
    pub max_suggestions: usize,
    pub levenshtein_weight: f64,
    pub jaro_winkler_weight: f64,
    pub use_levenshtein: bool,
    pub use_jaro_winkler: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_THRESHOLD,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            levenshtein_weight: 0.5,
            jaro_winkler_weight: 0.5,
            use_levenshtein: true,
            use_jaro_winkler: true,
        }
    }
}

impl MatchConfig {
    /// Default configuration with a different threshold.
    #[must_use]
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Levenshtein weight after the per-algorithm toggle.
    pub fn effective_levenshtein_weight(&self) -> f64 {
        if self.use_levenshtein {
            self.levenshtein_weight
        } else {
            0.0
        }
    }

    /// Jaro-Winkler weight after the per-algorithm toggle.
    pub fn effective_jaro_winkler_weight(&self) -> f64 {
        if self.use_jaro_winkler {
            self.jaro_winkler_weight
        } else {
            0.0
        }
    }

    /// Checks ranges and that the enabled weights carry a positive total of
    /// at most one, which keeps every weighted score inside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(invalid(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        for (name, weight) in [
            ("levenshtein_weight", self.levenshtein_weight),
            ("jaro_winkler_weight", self.jaro_winkler_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number")));
            }
        }
        let total = self.effective_levenshtein_weight() + self.effective_jaro_winkler_weight();
        if total <= 0.0 {
            return Err(invalid(
                "no similarity algorithm enabled with a positive weight".to_string(),
            ));
        }
        if total > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(invalid(format!(
                "enabled similarity weights sum to {total}, more than 1"
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> MappingError {
    MappingError::InvalidConfig { message }
}
