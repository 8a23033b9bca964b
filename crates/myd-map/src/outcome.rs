//! Result set of one matching run.

use std::collections::BTreeMap;

use myd_model::{FieldRecord, MatchResult, MatchType};
use serde::Serialize;

/// Everything one [`MatchingEngine::run`](crate::MatchingEngine::run)
/// produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// One result per non-skipped source field, in source order.
    pub results: Vec<MatchResult>,
    /// Near-misses against targets claimed by manual or exact matches.
    pub audit: Vec<MatchResult>,
    /// Skip log.
    pub skipped: Vec<MatchResult>,
    /// Positions (in the target input) of targets no result claimed.
    pub unmatched_targets: Vec<usize>,
    /// Number of source fields handed to the run, skipped ones included.
    pub source_count: usize,
}

impl MatchOutcome {
    /// Primary results that carry a target.
    pub fn mapped(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|result| result.is_mapped())
    }

    /// Primary results without a target.
    pub fn unmapped_sources(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|result| !result.is_mapped())
    }

    pub fn mapped_count(&self) -> usize {
        self.mapped().count()
    }

    /// Mapped share of all original source fields, in percent. `0.0` for an
    /// empty run.
    pub fn coverage_percent(&self) -> f64 {
        if self.source_count == 0 {
            return 0.0;
        }
        self.mapped_count() as f64 / self.source_count as f64 * 100.0
    }

    /// Primary results counted per match type.
    pub fn counts_by_type(&self) -> BTreeMap<MatchType, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.match_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_of(&self, match_type: MatchType) -> usize {
        self.results
            .iter()
            .filter(|result| result.match_type == match_type)
            .count()
    }

    /// `source: target` / `# source: # reason` lines in result order.
    pub fn mapping_lines(&self) -> Vec<String> {
        self.results.iter().map(MatchResult::mapping_line).collect()
    }

    /// Resolves [`Self::unmatched_targets`] against the target input.
    pub fn unmatched<'t>(&self, targets: &'t [FieldRecord]) -> Vec<&'t FieldRecord> {
        self.unmatched_targets
            .iter()
            .filter_map(|&index| targets.get(index))
            .collect()
    }
}
