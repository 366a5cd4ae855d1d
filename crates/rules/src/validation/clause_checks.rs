//! Clause-level checks: labels and operand shapes.

use std::collections::HashSet;

use super::ValidationResult;
use crate::schema::{Clause, Operation, Rule};

pub(super) fn validate_clauses(rule: &Rule, prefix: &str, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (idx, clause) in rule.clauses.iter().enumerate() {
        let path = format!("{prefix}clauses[{idx}]");
        if let Some(label) = &clause.label {
            if !seen.insert(label.as_str()) {
                result.error(
                    format!("{path}.label"),
                    format!("duplicate clause label '{label}' in rule '{}'", rule.name),
                );
            }
            if label.contains([' ', '(', ')']) {
                result.error(
                    format!("{path}.label"),
                    format!("label '{label}' may not contain spaces or parentheses"),
                );
            }
        }
        validate_operands(clause, &path, result);
    }

    // Labels are all-or-nothing within a rule; an expression needs all.
    let labeled = rule.clauses.iter().filter(|c| c.label.is_some()).count();
    if labeled != 0 && labeled != rule.clauses.len() {
        result.error(
            format!("{prefix}clauses"),
            format!(
                "rule '{}' labels {labeled} of {} clauses; labels must be all present or all absent",
                rule.name,
                rule.clauses.len()
            ),
        );
    }
    if rule.expression.is_some() && labeled != rule.clauses.len() {
        result.error(
            format!("{prefix}clauses"),
            format!("rule '{}' has an expression, so every clause needs a label", rule.name),
        );
    }
}

/// Per-operation operand shape, per the operation table.
fn validate_operands(clause: &Clause, path: &str, result: &mut ValidationResult) {
    let op = clause.operation;
    let data = clause.data.as_deref().unwrap_or(&[]);
    let has_data = !data.is_empty();
    let has_dict = !clause.dict_data.as_deref().unwrap_or(&[]).is_empty();

    match op {
        Operation::Eq | Operation::Neq | Operation::EndsWith | Operation::StartsWith => {
            require_data(op, has_data, path, result);
            forbid_dict(op, has_dict, path, result);
        }
        Operation::Regex => {
            require_data(op, has_data, path, result);
            forbid_dict(op, has_dict, path, result);
            for (idx, pattern) in data.iter().enumerate() {
                if let Err(e) = regex::Regex::new(pattern) {
                    result.error(
                        format!("{path}.data[{idx}]"),
                        format!("invalid regex '{pattern}': {e}"),
                    );
                }
            }
        }
        Operation::Contains | Operation::ContainsAny => {
            if has_data == has_dict {
                result.error(
                    format!("{path}.data"),
                    format!("operation {op} requires exactly one of Data and DictData"),
                );
            }
        }
        Operation::Gt | Operation::Lt => {
            forbid_dict(op, has_dict, path, result);
            if data.len() != 1 || data[0].trim().parse::<i64>().is_err() {
                result.error(
                    format!("{path}.data"),
                    format!("operation {op} requires a single integer operand"),
                );
            }
        }
        Operation::IsBefore | Operation::IsAfter => {
            forbid_dict(op, has_dict, path, result);
            if data.len() != 1 || crate::evaluator::parse_timestamp(&data[0]).is_none() {
                result.error(
                    format!("{path}.data"),
                    format!("operation {op} requires a single parseable timestamp operand"),
                );
            }
        }
        Operation::IsNull | Operation::IsTrue | Operation::IsExpired | Operation::WasModified => {
            if has_data || has_dict {
                result.error(
                    format!("{path}.data"),
                    format!("operation {op} takes no operands"),
                );
            }
        }
        Operation::DoesNotContain | Operation::DoesNotContainAll => {
            result.error(
                format!("{path}.operation"),
                format!("operation {op} is reserved but not supported"),
            );
        }
    }
}

fn require_data(op: Operation, has_data: bool, path: &str, result: &mut ValidationResult) {
    if !has_data {
        result.error(format!("{path}.data"), format!("operation {op} requires Data"));
    }
}

fn forbid_dict(op: Operation, has_dict: bool, path: &str, result: &mut ValidationResult) {
    if has_dict {
        result.error(
            format!("{path}.dict_data"),
            format!("operation {op} does not take DictData"),
        );
    }
}
