//! Shared data model for attack-surface drift analysis.
//!
//! Collectors snapshot system objects (files, services, registry keys, …),
//! diff them between runs, and hand each diff to the rule analyzer as a
//! [`CompareResult`]. This crate holds that model plus the dynamic-value
//! plumbing the analyzer reads fields through: dotted-path resolution and
//! scalar/pair extraction over `serde_json::Value`.

pub mod compare;
pub mod extract;
pub mod field;

pub use compare::{ChangeType, CompareId, CompareResult, Platform, ResultType, Verdict};
pub use extract::{extract, Extracted};
pub use field::resolve;
