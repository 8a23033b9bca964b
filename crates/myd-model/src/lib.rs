#![deny(unsafe_code)]

//! Shared records for the field resolution pipeline.
//!
//! Parsers produce [`FieldRecord`]s and [`TargetFieldRecord`]s, the override
//! layer is described by [`MappingMemory`], and the matcher emits
//! [`MatchResult`]s. All types are plain data and serialize with serde.

pub mod field;
pub mod matching;
pub mod rules;

pub use field::{ColumnKind, FieldRecord, SourceColumn, TargetFieldRecord};
pub use matching::{MatchAlgorithm, MatchResult, MatchType};
pub use rules::{ManualMapping, MappingMemory, SkipRule, TableRules};
