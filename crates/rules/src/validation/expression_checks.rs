//! Expression surface-syntax checks: a small parser over the token stream.
//!
//! The grammar being enforced:
//!
//! ```text
//! expr     := atom (operator atom)*
//! atom     := '('* ('NOT')? label ')'*
//! operator := 'AND' | 'OR' | 'XOR' | 'NAND' | 'NOR'
//! label    := [^ ()]+
//! ```
//!
//! Parentheses may span tokens: any contiguous `(` prefix opens groups and
//! any contiguous `)` suffix closes them. Nothing else may carry parens.

use std::collections::HashSet;

use super::{fuzzy, ValidationResult};
use crate::schema::{BoolOperator, Rule};

pub(super) fn validate_expression(rule: &Rule, prefix: &str, result: &mut ValidationResult) {
    let Some(expression) = rule.expression.as_deref() else {
        return;
    };
    let path = format!("{prefix}expression");

    // Parenthesis balance over the whole string.
    let mut depth = 0i64;
    for ch in expression.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        result.error(&path, format!("unbalanced parentheses in '{expression}'"));
    }

    let tokens: Vec<&str> = expression.split_whitespace().collect();
    if tokens.is_empty() {
        result.error(&path, "expression is empty");
        return;
    }

    let declared: Vec<&str> = rule
        .clauses
        .iter()
        .filter_map(|c| c.label.as_deref())
        .collect();
    let mut referenced: HashSet<&str> = HashSet::new();

    // Tokens must alternate variable / operator, opening and closing on a
    // variable. NOT occupies a variable slot as a prefix.
    let mut expecting_variable = true;
    let mut previous_was_not = false;

    for token in &tokens {
        if expecting_variable {
            // A free-standing `(` only opens groups; the variable follows.
            if token.chars().all(|c| c == '(') {
                continue;
            }
            let (core, has_close) = match token_shape(token) {
                Ok(shape) => shape,
                Err(message) => {
                    result.error(&path, message);
                    continue;
                }
            };
            if core == "NOT" {
                if has_close {
                    result.error(&path, format!("NOT may not carry a closing parenthesis in '{token}'"));
                }
                if previous_was_not {
                    result.error(&path, "consecutive NOT tokens");
                }
                previous_was_not = true;
                // Still waiting for the variable this NOT applies to.
            } else {
                referenced.insert(core);
                if !declared.contains(&core) {
                    match fuzzy::fuzzy_match(core, &declared) {
                        Some(candidate) => result.error_with_suggestion(
                            &path,
                            format!("unknown label '{core}'"),
                            format!("did you mean '{candidate}'?"),
                        ),
                        None => result.error(&path, format!("unknown label '{core}'")),
                    }
                }
                previous_was_not = false;
                expecting_variable = false;
            }
        } else {
            // A free-standing `)` closes the group the last variable sat in.
            if token.chars().all(|c| c == ')') {
                continue;
            }
            match BoolOperator::parse(token) {
                Some(BoolOperator::Not) => {
                    result.error(&path, "NOT is a unary prefix, not a binary operator");
                    expecting_variable = true;
                }
                Some(_) => expecting_variable = true,
                None => {
                    result.error(&path, format!("expected an operator, found '{token}'"));
                }
            }
        }
    }
    if expecting_variable {
        result.error(&path, "expression must end with a variable");
    }

    // Binding runs both ways: every declared label must be referenced.
    for label in &declared {
        if !referenced.contains(label) {
            result.error(
                &path,
                format!("clause label '{label}' is never referenced by the expression"),
            );
        }
    }
}

/// Split a token into its paren-stripped core, rejecting parens anywhere
/// but a contiguous `(` prefix and `)` suffix. Returns the core and
/// whether a `)` suffix was present.
fn token_shape(token: &str) -> Result<(&str, bool), String> {
    let inner = token.trim_start_matches('(');
    let core = inner.trim_end_matches(')');
    if core.contains(['(', ')']) {
        return Err(format!("misplaced parenthesis in token '{token}'"));
    }
    if core.is_empty() {
        return Err(format!("token '{token}' has no variable"));
    }
    Ok((core, inner.len() != core.len()))
}

#[cfg(test)]
mod tests {
    use super::super::validate_rule;
    use crate::schema::Rule;

    fn labeled_rule(expression: &str) -> Rule {
        serde_json::from_str(&format!(
            r#"{{
                "Name": "t", "Flag": "WARNING", "ResultType": "FILE",
                "Clauses": [
                    {{ "Field": "a", "Operation": "IS_TRUE", "Label": "A" }},
                    {{ "Field": "b", "Operation": "IS_TRUE", "Label": "B" }},
                    {{ "Field": "c", "Operation": "IS_TRUE", "Label": "C" }}
                ],
                "Expression": "{expression}"
            }}"#
        ))
        .unwrap()
    }

    fn messages(expression: &str) -> Vec<String> {
        validate_rule(&labeled_rule(expression)).messages()
    }

    #[test]
    fn well_formed_expressions_pass() {
        for expression in [
            "A AND B AND C",
            "A AND (B OR NOT C)",
            "( A OR B ) AND C",
            "((A OR B) AND (C OR B))",
            "NOT A OR (B XOR C)",
            "A NAND (B NOR C)",
        ] {
            let result = validate_rule(&labeled_rule(expression));
            assert!(result.valid, "'{expression}' should pass: {:?}", result.messages());
        }
    }

    #[test]
    fn unbalanced_parentheses_are_reported() {
        assert!(messages("A AND (B OR C")
            .iter()
            .any(|m| m.contains("unbalanced parentheses")));
        assert!(messages("A AND B) OR (C")
            .iter()
            .any(|m| m.contains("unbalanced parentheses")));
    }

    #[test]
    fn consecutive_not_is_rejected() {
        assert!(messages("NOT NOT A OR B OR C")
            .iter()
            .any(|m| m.contains("consecutive NOT")));
    }

    #[test]
    fn not_with_closing_paren_is_rejected() {
        assert!(messages("(A OR NOT) AND B AND C")
            .iter()
            .any(|m| m.contains("NOT may not carry")));
    }

    #[test]
    fn not_as_binary_operator_is_rejected() {
        assert!(messages("A NOT B AND C")
            .iter()
            .any(|m| m.contains("unary prefix")));
    }

    #[test]
    fn alternation_violations_are_reported() {
        assert!(messages("A B AND C")
            .iter()
            .any(|m| m.contains("expected an operator")));
        assert!(messages("A AND B AND C AND")
            .iter()
            .any(|m| m.contains("end with a variable")));
    }

    #[test]
    fn parens_inside_a_token_are_rejected() {
        assert!(messages("A(B AND C")
            .iter()
            .any(|m| m.contains("misplaced parenthesis")));
    }

    #[test]
    fn unknown_labels_get_fuzzy_suggestions() {
        let result = validate_rule(&labeled_rule("A AND B AND D"));
        assert!(!result.valid);
        // D is unknown; C goes unreferenced.
        assert!(result.errors.iter().any(|e| e.message.contains("unknown label 'D'")));
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("'C' is never referenced")));
    }

    #[test]
    fn typo_gets_a_suggestion() {
        let rule: Rule = serde_json::from_str(
            r#"{
                "Name": "t", "Flag": "WARNING", "ResultType": "FILE",
                "Clauses": [
                    { "Field": "a", "Operation": "IS_TRUE", "Label": "SIGNED" },
                    { "Field": "b", "Operation": "IS_TRUE", "Label": "TEMP" }
                ],
                "Expression": "SIGNED AND TEMPP"
            }"#,
        )
        .unwrap();
        let result = validate_rule(&rule);
        let err = result
            .errors
            .iter()
            .find(|e| e.message.contains("unknown label"))
            .unwrap();
        assert_eq!(err.suggestion.as_deref(), Some("did you mean 'TEMP'?"));
    }
}
