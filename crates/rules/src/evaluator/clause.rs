//! Single-clause predicate evaluation.
//!
//! A clause reads one dotted field from both sides of a compare result,
//! normalizes the values into scalar and pair views, and applies its
//! operation. Evaluation is total: missing fields, unparseable operands,
//! and invalid patterns log and evaluate to false.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use driftwatch_core::{extract, resolve, ChangeType, CompareResult, Extracted};

use crate::schema::{Clause, Operation};

// ── Collation ───────────────────────────────────────────────────────

/// How STARTS_WITH / ENDS_WITH compare text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Collation {
    /// Byte-for-byte comparison.
    #[default]
    CaseSensitive,
    /// Unicode-lowercased comparison.
    CaseInsensitive,
}

impl Collation {
    fn starts_with(self, s: &str, prefix: &str) -> bool {
        match self {
            Collation::CaseSensitive => s.starts_with(prefix),
            Collation::CaseInsensitive => s.to_lowercase().starts_with(&prefix.to_lowercase()),
        }
    }

    fn ends_with(self, s: &str, suffix: &str) -> bool {
        match self {
            Collation::CaseSensitive => s.ends_with(suffix),
            Collation::CaseInsensitive => s.to_lowercase().ends_with(&suffix.to_lowercase()),
        }
    }
}

// ── Regex cache ─────────────────────────────────────────────────────

/// Compiled patterns keyed by the joined alternation. `None` marks a
/// pattern that failed to compile and never matches.
static REGEX_CACHE: OnceLock<DashMap<String, Option<Regex>>> = OnceLock::new();

fn regex_cache() -> &'static DashMap<String, Option<Regex>> {
    REGEX_CACHE.get_or_init(DashMap::new)
}

// ── Clause evaluation ───────────────────────────────────────────────

/// Evaluate one clause against a compare result.
pub fn analyze_clause(clause: &Clause, result: &CompareResult, collation: Collation) -> bool {
    // Created objects have no pre-image, deleted ones no post-image.
    let after = match result.change_type {
        ChangeType::Created | ChangeType::Modified => {
            resolve(result.compare.as_ref(), &clause.field)
        }
        ChangeType::Deleted => None,
    };
    let before = match result.change_type {
        ChangeType::Deleted | ChangeType::Modified => resolve(result.base.as_ref(), &clause.field),
        ChangeType::Created => None,
    };

    let mut views = extract(before);
    let after_views = extract(after);
    views.scalars.extend(after_views.scalars);
    views.pairs.extend(after_views.pairs);

    // Only consulted to pick the CONTAINS reading for scalar vs. list fields.
    let type_holder = before.or(after);

    let data = clause.data.as_deref().unwrap_or(&[]);
    let dict_data = clause.dict_data.as_deref().unwrap_or(&[]);

    match clause.operation {
        Operation::Eq => data.iter().any(|d| scalar_match(&views, d)),
        Operation::Neq => !data.iter().any(|d| scalar_match(&views, d)),
        Operation::Contains => contains(&views, type_holder, data, dict_data, Quantifier::All),
        Operation::ContainsAny => contains(&views, type_holder, data, dict_data, Quantifier::Any),
        Operation::StartsWith => views
            .scalars
            .iter()
            .flatten()
            .any(|s| data.iter().any(|d| collation.starts_with(s, d))),
        Operation::EndsWith => views
            .scalars
            .iter()
            .flatten()
            .any(|s| data.iter().any(|d| collation.ends_with(s, d))),
        Operation::Gt => integer_compare(&views, data, clause, |value, operand| value > operand),
        Operation::Lt => integer_compare(&views, data, clause, |value, operand| value < operand),
        Operation::Regex => regex_match(&views, data),
        Operation::IsNull => views.scalars.iter().all(Option::is_none),
        Operation::IsTrue => views
            .scalars
            .iter()
            .flatten()
            .any(|s| s.trim().eq_ignore_ascii_case("true")),
        Operation::IsBefore => temporal_compare(&views, data, |value, operand| value < operand),
        Operation::IsAfter => temporal_compare(&views, data, |value, operand| value > operand),
        Operation::IsExpired => {
            let now = Utc::now();
            views
                .scalars
                .iter()
                .flatten()
                .filter_map(|s| parse_timestamp(s))
                .any(|stamp| stamp < now)
        }
        Operation::WasModified => result.change_type == ChangeType::Modified && before != after,
        Operation::DoesNotContain | Operation::DoesNotContainAll => {
            warn!(
                operation = %clause.operation,
                field = %clause.field,
                "reserved operation reached evaluation; treating as no match"
            );
            false
        }
    }
}

fn scalar_match(views: &Extracted, operand: &str) -> bool {
    views.scalars.iter().any(|s| s.as_deref() == Some(operand))
}

enum Quantifier {
    All,
    Any,
}

/// The three readings of CONTAINS / CONTAINS_ANY: pair entries against a
/// mapping view, scalar membership against a list field, or substring
/// against a scalar string field.
fn contains(
    views: &Extracted,
    type_holder: Option<&Value>,
    data: &[String],
    dict_data: &[(String, String)],
    quantifier: Quantifier,
) -> bool {
    if !views.pairs.is_empty() {
        let hit = |(key, value): &(String, String)| {
            views.pairs.iter().any(|(k, v)| k == key && v == value)
        };
        return match quantifier {
            Quantifier::All => dict_data.iter().all(hit),
            Quantifier::Any => dict_data.iter().any(hit),
        };
    }
    match type_holder {
        Some(Value::Array(_)) => {
            let hit =
                |d: &String| views.scalars.iter().any(|s| s.as_deref() == Some(d.as_str()));
            match quantifier {
                Quantifier::All => data.iter().all(hit),
                Quantifier::Any => data.iter().any(hit),
            }
        }
        Some(Value::String(_)) => {
            // The absent diff side contributes a null scalar; the field's
            // actual string is the first non-null one.
            let Some(first) = views.scalars.iter().flatten().next() else {
                return false;
            };
            match quantifier {
                Quantifier::All => data.iter().all(|d| first.contains(d.as_str())),
                Quantifier::Any => data.iter().any(|d| first.contains(d.as_str())),
            }
        }
        _ => {
            debug!("CONTAINS against a value that is neither mapping, list, nor string");
            false
        }
    }
}

fn integer_compare(
    views: &Extracted,
    data: &[String],
    clause: &Clause,
    cmp: impl Fn(i64, i64) -> bool,
) -> bool {
    let Some(operand) = data.first().and_then(|d| d.trim().parse::<i64>().ok()) else {
        warn!(
            operation = %clause.operation,
            field = %clause.field,
            "integer comparison operand is missing or unparseable"
        );
        return false;
    };
    views
        .scalars
        .iter()
        .flatten()
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .any(|value| cmp(value, operand))
}

fn temporal_compare(
    views: &Extracted,
    data: &[String],
    cmp: impl Fn(DateTime<Utc>, DateTime<Utc>) -> bool,
) -> bool {
    let operands: Vec<DateTime<Utc>> = data.iter().filter_map(|d| parse_timestamp(d)).collect();
    views
        .scalars
        .iter()
        .flatten()
        .filter_map(|s| parse_timestamp(s))
        .any(|value| operands.iter().any(|operand| cmp(value, *operand)))
}

fn regex_match(views: &Extracted, data: &[String]) -> bool {
    if data.is_empty() {
        return false;
    }
    let pattern = data.join("|");
    let entry = regex_cache()
        .entry(pattern.clone())
        .or_insert_with(|| match Regex::new(&pattern) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "invalid regex in clause; caching never-match sentinel");
                None
            }
        });
    match entry.value() {
        Some(compiled) => views.scalars.iter().flatten().any(|s| compiled.is_match(s)),
        None => false,
    }
}

/// Lenient timestamp parsing: RFC 3339 first, then common naive formats
/// (assumed UTC).
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(s) {
        return Some(stamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(s, format) {
            return Some(stamp.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
