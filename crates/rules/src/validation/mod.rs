//! Static rule-catalog validation with structured violations.
//!
//! Checks clause operand shapes against their operations and parses the
//! boolean expression surface syntax without evaluating anything.
//! Violations accumulate as path + message pairs; validation never fails
//! hard — consumers decide whether a flawed catalog halts deployment.

mod clause_checks;
mod expression_checks;

pub(crate) mod fuzzy;

use serde::{Deserialize, Serialize};

use crate::schema::{Rule, RuleFile};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// A single violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"rules[2].clauses[0].data"`.
    pub path: String,
    pub message: String,
    /// Optional "did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { valid: true, errors: Vec::new() }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    /// Render every violation as a plain human-readable string.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| match &e.suggestion {
                Some(s) => format!("{}: {} ({})", e.path, e.message, s),
                None => format!("{}: {}", e.path, e.message),
            })
            .collect()
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a single rule.
pub fn validate_rule(rule: &Rule) -> ValidationResult {
    let mut result = ValidationResult::new();
    validate_rule_at(rule, "", &mut result);
    result
}

/// Validate a whole catalog.
pub fn validate_rule_file(file: &RuleFile) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (idx, rule) in file.rules.iter().enumerate() {
        validate_rule_at(rule, &format!("rules[{idx}]."), &mut result);
    }
    result
}

fn validate_rule_at(rule: &Rule, prefix: &str, result: &mut ValidationResult) {
    clause_checks::validate_clauses(rule, prefix, result);
    expression_checks::validate_expression(rule, prefix, result);
}
