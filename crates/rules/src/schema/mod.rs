//! Rule catalog schema with serde deserialization.
//!
//! Rule files are canonical JSON: PascalCase member names,
//! SCREAMING_SNAKE_CASE enum tags. See `data/rules/examples/` for complete
//! files. The boolean connectives of the expression mini-language live here
//! too, next to the types they operate on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use driftwatch_core::{ChangeType, CompareResult, Platform, ResultType, Verdict};

// ── Clauses ─────────────────────────────────────────────────────────

/// Predicate operations a clause can apply to a resolved field.
///
/// `DOES_NOT_CONTAIN` and `DOES_NOT_CONTAIN_ALL` are reserved tags: they
/// deserialize so catalogs mentioning them still load, but validation
/// rejects them and evaluation treats them as never matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Eq,
    Neq,
    Contains,
    ContainsAny,
    EndsWith,
    StartsWith,
    Gt,
    Lt,
    Regex,
    IsNull,
    IsTrue,
    IsBefore,
    IsAfter,
    IsExpired,
    WasModified,
    DoesNotContain,
    DoesNotContainAll,
}

impl Operation {
    /// Wire-format tag, as it appears in rule files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Eq => "EQ",
            Operation::Neq => "NEQ",
            Operation::Contains => "CONTAINS",
            Operation::ContainsAny => "CONTAINS_ANY",
            Operation::EndsWith => "ENDS_WITH",
            Operation::StartsWith => "STARTS_WITH",
            Operation::Gt => "GT",
            Operation::Lt => "LT",
            Operation::Regex => "REGEX",
            Operation::IsNull => "IS_NULL",
            Operation::IsTrue => "IS_TRUE",
            Operation::IsBefore => "IS_BEFORE",
            Operation::IsAfter => "IS_AFTER",
            Operation::IsExpired => "IS_EXPIRED",
            Operation::WasModified => "WAS_MODIFIED",
            Operation::DoesNotContain => "DOES_NOT_CONTAIN",
            Operation::DoesNotContainAll => "DOES_NOT_CONTAIN_ALL",
        }
    }

    /// Reserved tags deserialize but cannot be evaluated.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Operation::DoesNotContain | Operation::DoesNotContainAll)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single predicate over a dotted field path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Clause {
    /// Dotted path into the collected object, e.g. `"signature.issuer"`.
    pub field: String,
    pub operation: Operation,
    /// Scalar operands. Required shape depends on the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    /// Key/value operands for the mapping forms of CONTAINS / CONTAINS_ANY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_data: Option<Vec<(String, String)>>,
    /// Atom name this clause is bound to in the rule's expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ── Rules ───────────────────────────────────────────────────────────

/// A named, severity-carrying composition of clauses for one result type.
///
/// Without an `Expression` the rule fires when every clause holds; with one
/// it fires when the expression over the clause labels holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Rule {
    pub name: String,
    #[serde(default, rename = "Desc")]
    pub description: String,
    /// Verdict reported when the rule fires.
    #[serde(rename = "Flag")]
    pub flag: Verdict,
    pub result_type: ResultType,
    /// Platforms the rule applies to; absent means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,
    /// Change types the rule applies to; absent means all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_types: Option<Vec<ChangeType>>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl Rule {
    /// Candidate check: does this rule even apply to `result` on `platform`?
    pub fn applies_to(&self, platform: Platform, result: &CompareResult) -> bool {
        self.result_type == result.result_type
            && self
                .platforms
                .as_ref()
                .map_or(true, |platforms| platforms.contains(&platform))
            && self
                .change_types
                .as_ref()
                .map_or(true, |changes| changes.contains(&result.change_type))
    }
}

/// A full rule catalog: per-result-type default verdicts plus rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RuleFile {
    /// Verdict floor per result type when no matched rule raises it higher.
    #[serde(default)]
    pub default_levels: HashMap<ResultType, Verdict>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

// ── Boolean connectives ─────────────────────────────────────────────

/// Connectives of the expression mini-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Not,
}

impl BoolOperator {
    /// Parse an exact expression token. Anything else is a variable.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "AND" => Some(BoolOperator::And),
            "OR" => Some(BoolOperator::Or),
            "XOR" => Some(BoolOperator::Xor),
            "NAND" => Some(BoolOperator::Nand),
            "NOR" => Some(BoolOperator::Nor),
            "NOT" => Some(BoolOperator::Not),
            _ => None,
        }
    }
}

/// Combine two operands. `NOT` is unary and never reaches this table in
/// well-formed input; it negates `a` for totality.
pub fn operate(op: BoolOperator, a: bool, b: bool) -> bool {
    match op {
        BoolOperator::And => a && b,
        BoolOperator::Or => a || b,
        BoolOperator::Xor => a ^ b,
        BoolOperator::Nand => !(a && b),
        BoolOperator::Nor => !(a || b),
        BoolOperator::Not => !a,
    }
}
