//! Rule evaluation: clause predicates plus the boolean expression language.
//!
//! A rule with an `Expression` is evaluated by the expression walker over
//! its labeled clauses; a rule without one is the AND of its clauses in
//! declaration order. Either way individual clause verdicts are memoized
//! per (compare result, clause) in a concurrent cache, so an expression
//! that names a label twice does not re-evaluate the predicate.

mod clause;
mod expression;

use dashmap::DashMap;

use driftwatch_core::{CompareId, CompareResult};

use crate::schema::{Clause, Rule};

pub use clause::{analyze_clause, Collation};

pub(crate) use clause::parse_timestamp;

/// Position of one clause within a loaded catalog: (rule index, clause index).
pub type ClauseKey = (u32, u32);

/// Memoized clause verdicts keyed by compare-result identity and clause.
///
/// Insertions are race-tolerant: the predicate is pure over its inputs, so
/// a lost update just recomputes the same value.
pub type ClauseCache = DashMap<(CompareId, ClauseKey), bool>;

/// Evaluate `rule` against `result`, memoizing clause verdicts in `cache`.
///
/// Total: malformed expressions and clause faults evaluate to false rather
/// than failing. A rule with no clauses and no expression matches.
pub fn apply_rule(
    rule: &Rule,
    rule_idx: u32,
    result: &CompareResult,
    cache: &ClauseCache,
    collation: Collation,
) -> bool {
    match &rule.expression {
        Some(expr) => expression::evaluate(expr, rule, rule_idx, result, cache, collation),
        // Implicit AND, left to right, short-circuiting.
        None => rule.clauses.iter().enumerate().all(|(idx, clause)| {
            cached_clause(rule_idx, idx as u32, clause, result, cache, collation)
        }),
    }
}

/// Clause evaluation through the memo cache.
pub(crate) fn cached_clause(
    rule_idx: u32,
    clause_idx: u32,
    clause: &Clause,
    result: &CompareResult,
    cache: &ClauseCache,
    collation: Collation,
) -> bool {
    let key = (result.id, (rule_idx, clause_idx));
    if let Some(hit) = cache.get(&key) {
        return *hit;
    }
    let value = clause::analyze_clause(clause, result, collation);
    cache.insert(key, value);
    value
}
