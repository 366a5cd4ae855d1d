//! Boolean expression walker over labeled clauses.
//!
//! The language is flat: tokens combine strictly left to right with NO
//! operator precedence — `A OR B AND C` reads as `(A OR B) AND C`.
//! Parentheses are the only grouping mechanism and may attach to
//! neighboring tokens (`(B OR C)` tokenizes as `(B`, `OR`, `C)`). Rule
//! authors should lean on them rather than precedence intuition.

use driftwatch_core::CompareResult;
use tracing::warn;

use crate::schema::{operate, BoolOperator, Rule};

use super::{cached_clause, ClauseCache, Collation};

/// Everything one expression walk needs besides the tokens themselves.
struct ExprContext<'a> {
    rule: &'a Rule,
    rule_idx: u32,
    result: &'a CompareResult,
    cache: &'a ClauseCache,
    collation: Collation,
}

/// Evaluate a rule's expression against a compare result.
///
/// Malformed expressions (which the validator rejects up front) evaluate
/// to false rather than failing.
pub(super) fn evaluate(
    expression: &str,
    rule: &Rule,
    rule_idx: u32,
    result: &CompareResult,
    cache: &ClauseCache,
    collation: Collation,
) -> bool {
    let tokens: Vec<&str> = expression.split_whitespace().collect();
    let ctx = ExprContext { rule, rule_idx, result, cache, collation };
    walk(&tokens, &ctx).unwrap_or(false)
}

/// Left-to-right fold over one token span. `None` means malformed (unknown
/// or ambiguous label, unbalanced group) and poisons the whole expression.
fn walk(tokens: &[&str], ctx: &ExprContext<'_>) -> Option<bool> {
    let mut current = false;
    // The first atom binds as `false OR atom`.
    let mut pending = BoolOperator::Or;
    let mut invert_next = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if let Some(op) = BoolOperator::parse(token) {
            if op == BoolOperator::Not {
                invert_next = true;
            } else {
                pending = op;
            }
            i += 1;
            continue;
        }

        // An atom is next. Skip it entirely when the accumulator already
        // decides the combination; skipped atoms are not evaluated and
        // therefore never cached.
        if let Some(forced) = short_circuit(pending, current) {
            current = forced;
            invert_next = false;
            i = if token.starts_with('(') { group_end(tokens, i)? + 1 } else { i + 1 };
            continue;
        }

        let value = if token.starts_with('(') {
            let end = group_end(tokens, i)?;
            let inner = strip_group(&tokens[i..=end]);
            let inner_refs: Vec<&str> = inner.iter().map(String::as_str).collect();
            i = end + 1;
            walk(&inner_refs, ctx)?
        } else {
            i += 1;
            lookup_and_eval(token.trim_matches(|c| c == '(' || c == ')'), ctx)?
        };

        current = operate(pending, current, if invert_next { !value } else { value });
        invert_next = false;
    }
    Some(current)
}

/// Forced accumulator value when the pending operator no longer depends on
/// the next atom.
fn short_circuit(pending: BoolOperator, current: bool) -> Option<bool> {
    match pending {
        BoolOperator::And if !current => Some(false),
        BoolOperator::Nor if current => Some(false),
        BoolOperator::Or if current => Some(true),
        BoolOperator::Nand if !current => Some(true),
        _ => None,
    }
}

/// Index of the token closing the group opening at `start`: parens are
/// counted across tokens until the closes catch up with the opens.
fn group_end(tokens: &[&str], start: usize) -> Option<usize> {
    let mut opens = 0usize;
    let mut closes = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(start) {
        opens += token.matches('(').count();
        closes += token.matches(')').count();
        if closes >= opens {
            return Some(idx);
        }
    }
    warn!("expression group never closes");
    None
}

/// Clone a group span, dropping one `(` from its first token and one `)`
/// from its last. Tokens emptied by the stripping (a lone `(` or `)`)
/// disappear.
fn strip_group(span: &[&str]) -> Vec<String> {
    let mut inner: Vec<String> = span.iter().map(|token| token.to_string()).collect();
    if let Some(first) = inner.first_mut() {
        if let Some(stripped) = first.strip_prefix('(') {
            *first = stripped.to_string();
        }
    }
    if let Some(last) = inner.last_mut() {
        if let Some(stripped) = last.strip_suffix(')') {
            *last = stripped.to_string();
        }
    }
    inner.retain(|token| !token.is_empty());
    inner
}

/// Resolve a bare variable to its unique clause and evaluate it through
/// the memo cache. Zero or multiple clauses with the label poisons the
/// whole expression.
fn lookup_and_eval(label: &str, ctx: &ExprContext<'_>) -> Option<bool> {
    let mut found = None;
    for (idx, clause) in ctx.rule.clauses.iter().enumerate() {
        if clause.label.as_deref() == Some(label) {
            if found.is_some() {
                warn!(label, rule = %ctx.rule.name, "label is bound to multiple clauses");
                return None;
            }
            found = Some((idx, clause));
        }
    }
    let Some((idx, clause)) = found else {
        warn!(label, rule = %ctx.rule.name, "expression references an unknown label");
        return None;
    };
    Some(cached_clause(
        ctx.rule_idx,
        idx as u32,
        clause,
        ctx.result,
        ctx.cache,
        ctx.collation,
    ))
}
