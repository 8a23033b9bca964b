//! Phased matching engine.
//!
//! A run moves one [`MatchState`] through fixed phases: skip, manual,
//! exact, synonym/fuzzy, no-match, audit. Targets live in an arena of
//! slots keyed by [`FieldRecord::key`]; a key is claimed at most once, so
//! later phases only see what earlier phases left over.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use myd_model::{FieldRecord, MatchAlgorithm, MatchResult, MatchType};
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::{MappingError, Result};
use crate::normalize::{normalize_description_opt, normalize_name};
use crate::outcome::MatchOutcome;
use crate::overrides::EffectiveRules;
use crate::similarity::{jaro_winkler_similarity, levenshtein_similarity};
use crate::synonyms::SynonymTable;

const OVERRIDE_CONFIDENCE: f64 = 1.0;
const EXACT_CONFIDENCE: f64 = 1.0;
/// Exact name match whose descriptions are missing or differ.
const EXACT_NAME_ONLY_CONFIDENCE: f64 = 0.95;
const SYNONYM_CONFIDENCE: f64 = 0.85;
const NAME_WEIGHT: f64 = 0.7;
const DESCRIPTION_WEIGHT: f64 = 0.3;
/// Algorithm contributions closer than this are reported as `combined`.
const ALGORITHM_TIE_EPSILON: f64 = 1e-9;

const EXACT_REASON: &str = "Exact match on normalized field name";
const SYNONYM_REASON: &str = "Synonym match";
const NO_MATCH_REASON: &str = "No suitable match found";

/// Similarity of two normalized strings under one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// Raw Levenshtein similarity (`0.0` when disabled).
    pub levenshtein: f64,
    /// Raw Jaro-Winkler similarity (`0.0` when disabled).
    pub jaro_winkler: f64,
    /// Weighted sum of the enabled algorithms.
    pub weighted: f64,
    levenshtein_part: f64,
    jaro_winkler_part: f64,
}

impl Similarity {
    /// Algorithm that contributed more to [`Self::weighted`].
    pub fn algorithm(&self) -> MatchAlgorithm {
        dominant_algorithm(self.levenshtein_part, self.jaro_winkler_part)
    }
}

/// Fuzzy score of one source/target pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyScore {
    pub name: Similarity,
    /// Present only when both sides have a description.
    pub description: Option<Similarity>,
    /// `0.7 * name + 0.3 * description`, or the name similarity alone.
    pub combined: f64,
}

impl FuzzyScore {
    /// Algorithm that dominated the combined score.
    pub fn algorithm(&self) -> MatchAlgorithm {
        match self.description {
            Some(description) => dominant_algorithm(
                NAME_WEIGHT * self.name.levenshtein_part
                    + DESCRIPTION_WEIGHT * description.levenshtein_part,
                NAME_WEIGHT * self.name.jaro_winkler_part
                    + DESCRIPTION_WEIGHT * description.jaro_winkler_part,
            ),
            None => self.name.algorithm(),
        }
    }

    /// Human-readable breakdown, e.g. `name: 92%; description: 80%; combined: 88%`.
    pub fn explain(&self) -> String {
        let mut parts = vec![format!("name: {:.0}%", self.name.weighted * 100.0)];
        if let Some(description) = self.description {
            parts.push(format!("description: {:.0}%", description.weighted * 100.0));
        }
        parts.push(format!("combined: {:.0}%", self.combined * 100.0));
        parts.join("; ")
    }
}

/// A ranked candidate target for one source field.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// Position in the target input.
    pub target_index: usize,
    pub target_field: String,
    pub score: FuzzyScore,
}

fn dominant_algorithm(levenshtein: f64, jaro_winkler: f64) -> MatchAlgorithm {
    if (levenshtein - jaro_winkler).abs() < ALGORITHM_TIE_EPSILON {
        MatchAlgorithm::Combined
    } else if levenshtein > jaro_winkler {
        MatchAlgorithm::Levenshtein
    } else {
        MatchAlgorithm::JaroWinkler
    }
}

/// Field part of a manual target reference (`TABLE#FIELD`, `TABLE.FIELD`
/// or a bare field name).
fn target_field_part(reference: &str) -> &str {
    reference.rsplit(['#', '.']).next().unwrap_or(reference)
}

fn checked_confidence(source: &str, target: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MappingError::ConfidenceOutOfRange {
            source_field: source.to_string(),
            target_field: target.to_string(),
            value,
        })
    }
}

/// A field with its normalized name and description.
#[derive(Debug)]
struct Normalized<'r> {
    record: &'r FieldRecord,
    name: String,
    description: String,
}

impl<'r> Normalized<'r> {
    fn new(record: &'r FieldRecord) -> Self {
        Self {
            record,
            name: normalize_name(&record.name),
            description: normalize_description_opt(record.description.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimPhase {
    Manual,
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, Copy)]
struct Claim {
    source: usize,
    phase: ClaimPhase,
}

#[derive(Debug)]
struct TargetSlot<'r> {
    field: Normalized<'r>,
    claim: Option<Claim>,
}

#[derive(Debug)]
enum Resolution {
    Pending,
    Skipped(MatchResult),
    Resolved(MatchResult),
}

#[derive(Debug)]
struct MatchState<'r> {
    sources: Vec<Normalized<'r>>,
    resolutions: Vec<Resolution>,
    slots: Vec<TargetSlot<'r>>,
    claimed_keys: BTreeSet<&'r str>,
    audit: Vec<MatchResult>,
}

impl<'r> MatchState<'r> {
    fn new(sources: &'r [FieldRecord], targets: &'r [FieldRecord]) -> Self {
        Self {
            sources: sources.iter().map(Normalized::new).collect(),
            resolutions: sources.iter().map(|_| Resolution::Pending).collect(),
            slots: targets
                .iter()
                .map(|record| TargetSlot {
                    field: Normalized::new(record),
                    claim: None,
                })
                .collect(),
            claimed_keys: BTreeSet::new(),
            audit: Vec::new(),
        }
    }

    fn pending(&self) -> Vec<usize> {
        self.resolutions
            .iter()
            .enumerate()
            .filter(|(_, resolution)| matches!(resolution, Resolution::Pending))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// A slot is available while neither it nor a slot with the same key
    /// has been claimed.
    fn is_available(&self, slot: usize) -> bool {
        let slot = &self.slots[slot];
        slot.claim.is_none() && !self.claimed_keys.contains(slot.field.record.key())
    }

    fn available(&self) -> impl Iterator<Item = (usize, &TargetSlot<'r>)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.is_available(*idx))
    }

    fn first_available(&self, name: &str) -> Option<usize> {
        self.available()
            .find(|(_, slot)| slot.field.name == name)
            .map(|(idx, _)| idx)
    }

    /// Slots a manual target reference can resolve to, in target order.
    ///
    /// A qualified reference (`TABLE#FIELD` or `TABLE.FIELD`) must equal one
    /// of a target's ids; targets without ids are compared on its field
    /// part. A bare reference compares names.
    fn referenced_slots(&self, reference: &str) -> Vec<usize> {
        let reference = reference.trim();
        let qualified = reference.contains(['#', '.']);
        let field = normalize_name(target_field_part(reference));
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                let record = slot.field.record;
                if qualified && !record.ids.is_empty() {
                    record.has_id(reference)
                } else {
                    !field.is_empty() && slot.field.name == field
                }
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    fn claim(&mut self, slot: usize, source: usize, phase: ClaimPhase) {
        let record = self.slots[slot].field.record;
        self.claimed_keys.insert(record.key());
        self.slots[slot].claim = Some(Claim { source, phase });
    }

    fn resolve(&mut self, source: usize, result: MatchResult) {
        self.resolutions[source] = Resolution::Resolved(result);
    }

    fn count_claims(&self, phase: ClaimPhase) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.claim.is_some_and(|claim| claim.phase == phase))
            .count()
    }

    fn into_outcome(self) -> MatchOutcome {
        let source_count = self.sources.len();
        let unmatched_targets = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !self.claimed_keys.contains(slot.field.record.key()))
            .map(|(idx, _)| idx)
            .collect();

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        for resolution in self.resolutions {
            match resolution {
                Resolution::Skipped(result) => skipped.push(result),
                Resolution::Resolved(result) => results.push(result),
                // The no-match phase resolves everything still pending.
                Resolution::Pending => {}
            }
        }

        MatchOutcome {
            results,
            audit: self.audit,
            skipped,
            unmatched_targets,
            source_count,
        }
    }
}

/// Resolves source fields to target fields.
///
/// # Example
///
/// ```
/// use myd_map::{EffectiveRules, MatchConfig, MatchingEngine, SynonymTable};
/// use myd_model::{FieldRecord, MatchType};
///
/// let engine = MatchingEngine::new(MatchConfig::default(), SynonymTable::builtin()).unwrap();
/// let sources = vec![FieldRecord::new("klant")];
/// let targets = vec![FieldRecord::new("customer")];
/// let outcome = engine.run(&sources, &targets, &EffectiveRules::default()).unwrap();
/// assert_eq!(outcome.results[0].match_type, MatchType::Synonym);
/// ```
#[derive(Debug, Clone)]
pub struct MatchingEngine<'a> {
    config: MatchConfig,
    synonyms: &'a SynonymTable,
}

impl<'a> MatchingEngine<'a> {
    /// Creates an engine after validating `config`.
    pub fn new(config: MatchConfig, synonyms: &'a SynonymTable) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, synonyms })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Weighted similarity of two already-normalized strings.
    pub fn similarity(&self, a: &str, b: &str) -> Similarity {
        let levenshtein = if self.config.use_levenshtein {
            levenshtein_similarity(a, b)
        } else {
            0.0
        };
        let jaro_winkler = if self.config.use_jaro_winkler {
            jaro_winkler_similarity(a, b)
        } else {
            0.0
        };

        let levenshtein_part = self.config.effective_levenshtein_weight() * levenshtein;
        let jaro_winkler_part = self.config.effective_jaro_winkler_weight() * jaro_winkler;
        Similarity {
            levenshtein,
            jaro_winkler,
            weighted: levenshtein_part + jaro_winkler_part,
            levenshtein_part,
            jaro_winkler_part,
        }
    }

    /// Fuzzy score of a raw source/target pair.
    pub fn score(&self, source: &FieldRecord, target: &FieldRecord) -> FuzzyScore {
        self.score_normalized(&Normalized::new(source), &Normalized::new(target))
    }

    fn score_normalized(&self, source: &Normalized<'_>, target: &Normalized<'_>) -> FuzzyScore {
        let name = self.similarity(&source.name, &target.name);
        if source.description.is_empty() || target.description.is_empty() {
            return FuzzyScore {
                name,
                description: None,
                combined: name.weighted,
            };
        }
        let description = self.similarity(&source.description, &target.description);
        FuzzyScore {
            name,
            description: Some(description),
            combined: NAME_WEIGHT * name.weighted + DESCRIPTION_WEIGHT * description.weighted,
        }
    }

    /// Top `max_suggestions` targets for `source` at or above the
    /// threshold, best first; equal scores keep target order.
    pub fn suggest(&self, source: &FieldRecord, targets: &[FieldRecord]) -> Vec<Suggestion> {
        let source = Normalized::new(source);
        let mut suggestions: Vec<Suggestion> = targets
            .iter()
            .enumerate()
            .map(|(target_index, target)| Suggestion {
                target_index,
                target_field: target.key().to_string(),
                score: self.score_normalized(&source, &Normalized::new(target)),
            })
            .filter(|suggestion| suggestion.score.combined >= self.config.threshold)
            .collect();
        suggestions.sort_by(|a, b| {
            b.score
                .combined
                .partial_cmp(&a.score.combined)
                .unwrap_or(Ordering::Equal)
        });
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    /// Runs all phases over the inputs.
    ///
    /// Primary results follow source order; targets are considered in
    /// input order, so the earliest target wins every tie. Fails only when
    /// a computed confidence leaves `[0, 1]`.
    pub fn run(
        &self,
        sources: &[FieldRecord],
        targets: &[FieldRecord],
        rules: &EffectiveRules,
    ) -> Result<MatchOutcome> {
        let state = MatchState::new(sources, targets);
        let state = self.skip_phase(state, rules);
        let state = self.manual_phase(state, rules);
        let state = self.exact_phase(state);
        let state = if self.config.enabled {
            self.fuzzy_phase(state)?
        } else {
            state
        };
        let state = self.no_match_phase(state);
        let state = if self.config.enabled {
            self.audit_phase(state)?
        } else {
            state
        };

        let outcome = state.into_outcome();
        info!(
            sources = outcome.source_count,
            mapped = outcome.mapped_count(),
            skipped = outcome.skipped.len(),
            audit = outcome.audit.len(),
            unmatched_targets = outcome.unmatched_targets.len(),
            coverage = outcome.coverage_percent(),
            "matching finished"
        );
        Ok(outcome)
    }

    fn skip_phase<'r>(&self, mut state: MatchState<'r>, rules: &EffectiveRules) -> MatchState<'r> {
        let skips = rules.skip_index();
        if skips.is_empty() {
            return state;
        }

        let mut count = 0usize;
        for idx in 0..state.sources.len() {
            let source = &state.sources[idx];
            let Some(rule) = skips.get(&source.name).filter(|rule| rule.skip) else {
                continue;
            };
            let result = MatchResult {
                source_field: source.record.name.clone(),
                target_field: None,
                confidence: OVERRIDE_CONFIDENCE,
                match_type: MatchType::CentralSkip,
                reason: rule.comment.clone(),
                algorithm: Some(MatchAlgorithm::CentralMemory),
                source_description: source.record.description.clone(),
                target_description: None,
            };
            state.resolutions[idx] = Resolution::Skipped(result);
            count += 1;
        }
        debug!(count, "skip phase");
        state
    }

    fn manual_phase<'r>(
        &self,
        mut state: MatchState<'r>,
        rules: &EffectiveRules,
    ) -> MatchState<'r> {
        let manuals = rules.manual_index();
        if manuals.is_empty() {
            return state;
        }

        let mut unresolved = BTreeSet::new();
        for idx in state.pending() {
            let source = &state.sources[idx];
            let Some(mapping) = manuals.get(&source.name) else {
                continue;
            };

            let candidates = state.referenced_slots(&mapping.target);
            let slot = candidates
                .iter()
                .copied()
                .find(|&slot| state.is_available(slot));
            let target_field = match slot {
                Some(slot) => state.slots[slot].field.record.key().to_string(),
                None if !candidates.is_empty() => {
                    warn!(
                        source = %source.record.name,
                        target = %mapping.target,
                        "manual mapping target already claimed, rule ignored"
                    );
                    continue;
                }
                None => {
                    if !unresolved.insert(normalize_name(&mapping.target)) {
                        warn!(
                            source = %source.record.name,
                            target = %mapping.target,
                            "manual mapping target already assigned, rule ignored"
                        );
                        continue;
                    }
                    debug!(
                        source = %source.record.name,
                        target = %mapping.target,
                        "manual mapping target not in target set"
                    );
                    mapping.target.clone()
                }
            };

            let result = MatchResult {
                source_field: source.record.name.clone(),
                target_field: Some(target_field),
                confidence: OVERRIDE_CONFIDENCE,
                match_type: MatchType::CentralManual,
                reason: mapping.comment.clone(),
                algorithm: Some(MatchAlgorithm::CentralMemory),
                source_description: source.record.description.clone(),
                target_description: (!mapping.target_description.is_empty())
                    .then(|| mapping.target_description.clone()),
            };
            if let Some(slot) = slot {
                state.claim(slot, idx, ClaimPhase::Manual);
            }
            state.resolve(idx, result);
        }
        debug!(count = state.count_claims(ClaimPhase::Manual), "manual phase");
        state
    }

    fn exact_phase<'r>(&self, mut state: MatchState<'r>) -> MatchState<'r> {
        for idx in state.pending() {
            let source = &state.sources[idx];
            if source.name.is_empty() {
                continue;
            }
            let Some(slot) = state.first_available(&source.name) else {
                continue;
            };
            let target = &state.slots[slot].field;
            let descriptions_match = !source.description.is_empty()
                && !target.description.is_empty()
                && source.description == target.description;
            let result = MatchResult {
                source_field: source.record.name.clone(),
                target_field: Some(target.record.key().to_string()),
                confidence: if descriptions_match {
                    EXACT_CONFIDENCE
                } else {
                    EXACT_NAME_ONLY_CONFIDENCE
                },
                match_type: MatchType::Exact,
                reason: EXACT_REASON.to_string(),
                algorithm: None,
                source_description: source.record.description.clone(),
                target_description: target.record.description.clone(),
            };
            state.claim(slot, idx, ClaimPhase::Exact);
            state.resolve(idx, result);
        }
        debug!(count = state.count_claims(ClaimPhase::Exact), "exact phase");
        state
    }

    fn fuzzy_phase<'r>(&self, mut state: MatchState<'r>) -> Result<MatchState<'r>> {
        for idx in state.pending() {
            let source = &state.sources[idx];
            if source.name.is_empty() {
                continue;
            }

            let synonym = state.available().find(|(_, slot)| {
                !slot.field.name.is_empty()
                    && self.synonyms.is_synonym_match(&source.name, &slot.field.name)
            });
            if let Some((slot, target)) = synonym {
                let result = MatchResult {
                    source_field: source.record.name.clone(),
                    target_field: Some(target.field.record.key().to_string()),
                    confidence: SYNONYM_CONFIDENCE,
                    match_type: MatchType::Synonym,
                    reason: SYNONYM_REASON.to_string(),
                    algorithm: None,
                    source_description: source.record.description.clone(),
                    target_description: target.field.record.description.clone(),
                };
                state.claim(slot, idx, ClaimPhase::Fuzzy);
                state.resolve(idx, result);
                continue;
            }

            let mut best: Option<(usize, FuzzyScore)> = None;
            for (slot, target) in state.available() {
                if target.field.name.is_empty() {
                    continue;
                }
                let score = self.score_normalized(source, &target.field);
                if score.combined < self.config.threshold {
                    continue;
                }
                if best.is_none_or(|(_, current)| score.combined > current.combined) {
                    best = Some((slot, score));
                }
            }
            let Some((slot, score)) = best else {
                continue;
            };

            let target = &state.slots[slot].field;
            let confidence =
                checked_confidence(&source.record.name, target.record.key(), score.combined)?;
            let result = MatchResult {
                source_field: source.record.name.clone(),
                target_field: Some(target.record.key().to_string()),
                confidence,
                match_type: MatchType::Fuzzy,
                reason: format!("Fuzzy match (similarity: {confidence:.2})"),
                algorithm: Some(score.algorithm()),
                source_description: source.record.description.clone(),
                target_description: target.record.description.clone(),
            };
            state.claim(slot, idx, ClaimPhase::Fuzzy);
            state.resolve(idx, result);
        }
        debug!(count = state.count_claims(ClaimPhase::Fuzzy), "synonym/fuzzy phase");
        Ok(state)
    }

    fn no_match_phase<'r>(&self, mut state: MatchState<'r>) -> MatchState<'r> {
        let pending = state.pending();
        for &idx in &pending {
            let source = &state.sources[idx];
            let result = MatchResult {
                source_field: source.record.name.clone(),
                target_field: None,
                confidence: 0.0,
                match_type: MatchType::None,
                reason: NO_MATCH_REASON.to_string(),
                algorithm: None,
                source_description: source.record.description.clone(),
                target_description: None,
            };
            state.resolve(idx, result);
        }
        debug!(count = pending.len(), "no-match phase");
        state
    }

    /// Compares every non-skipped source against targets claimed by manual
    /// or exact matches (other than its own) and records the best hit.
    fn audit_phase<'r>(&self, mut state: MatchState<'r>) -> Result<MatchState<'r>> {
        let anchors: Vec<(usize, Claim)> = state
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.claim.map(|claim| (idx, claim)))
            .filter(|(_, claim)| matches!(claim.phase, ClaimPhase::Manual | ClaimPhase::Exact))
            .collect();
        if anchors.is_empty() {
            return Ok(state);
        }

        let mut audit = Vec::new();
        for (idx, resolution) in state.resolutions.iter().enumerate() {
            if matches!(resolution, Resolution::Skipped(_)) {
                continue;
            }
            let source = &state.sources[idx];
            if source.name.is_empty() {
                continue;
            }

            let mut best: Option<(usize, Similarity)> = None;
            for &(slot, claim) in &anchors {
                if claim.source == idx {
                    continue;
                }
                let similarity = self.similarity(&source.name, &state.slots[slot].field.name);
                if similarity.weighted < self.config.threshold {
                    continue;
                }
                if best.is_none_or(|(_, current)| similarity.weighted > current.weighted) {
                    best = Some((slot, similarity));
                }
            }
            let Some((slot, similarity)) = best else {
                continue;
            };

            let target = &state.slots[slot].field;
            let confidence =
                checked_confidence(&source.record.name, target.record.key(), similarity.weighted)?;
            audit.push(MatchResult {
                source_field: source.record.name.clone(),
                target_field: Some(target.record.key().to_string()),
                confidence,
                match_type: MatchType::Audit,
                reason: format!(
                    "Fuzzy match to already claimed target (audit, similarity: {confidence:.2})"
                ),
                algorithm: Some(similarity.algorithm()),
                source_description: source.record.description.clone(),
                target_description: target.record.description.clone(),
            });
        }
        debug!(count = audit.len(), "audit phase");
        state.audit = audit;
        Ok(state)
    }
}

impl MatchingEngine<'static> {
    /// Engine over the built-in synonym vocabulary.
    pub fn with_builtin_synonyms(config: MatchConfig) -> Result<Self> {
        Self::new(config, SynonymTable::builtin())
    }
}
