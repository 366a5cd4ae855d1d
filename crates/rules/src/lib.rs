//! Rules-driven classification of attack-surface drift.
//!
//! Evaluates [`CompareResult`]s — diffs of one collected system object
//! between two snapshots — against a JSON catalog of security-analysis
//! rules. This crate provides:
//!
//! - JSON rule schema with serde deserialization
//! - per-clause predicates over dotted field paths
//! - a flat boolean expression language composing labeled clauses
//! - a static catalog validator with structured violations
//! - a thread-safe [`Analyzer`] facade with per-result clause memoization
//!
//! [`CompareResult`]: driftwatch_core::CompareResult

pub mod analyzer;
pub mod evaluator;
pub mod loader;
pub mod schema;
pub mod validation;

pub use analyzer::Analyzer;
pub use evaluator::Collation;
pub use schema::{Clause, Operation, Rule, RuleFile};
pub use validation::{validate_rule_file, ValidationResult};
