#![deny(unsafe_code)]

//! Field matching: resolves source field names to target field definitions.
//!
//! The pipeline runs in fixed phases (skip, manual, exact, synonym/fuzzy,
//! no-match, audit). See [`MatchingEngine::run`].

pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod outcome;
pub mod overrides;
pub mod similarity;
pub mod synonyms;

pub use config::MatchConfig;
pub use engine::{FuzzyScore, MatchingEngine, Similarity, Suggestion};
pub use error::{MappingError, Result};
pub use normalize::{normalize_description, normalize_name};
pub use outcome::MatchOutcome;
pub use overrides::{
    EffectiveRules, MEMORY_FILE_NAME, effective_rules, find_memory_file, load_mapping_memory,
    parse_mapping_memory, read_mapping_memory,
};
pub use similarity::{
    jaro_similarity, jaro_winkler_similarity, levenshtein_distance, levenshtein_similarity,
};
pub use synonyms::SynonymTable;
