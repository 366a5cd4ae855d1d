//! Normalization of resolved field values into operand views.
//!
//! The clause evaluator never pattern-matches JSON shapes itself; it works
//! from two flat views of a resolved value: a scalar list and a
//! key/value-pair list. At most one view is populated for any given value.

use serde_json::Value;
use tracing::debug;

/// Flattened views of a resolved field value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    /// Scalar view. A null (or unresolved) value contributes a single `None`.
    pub scalars: Vec<Option<String>>,
    /// Key/value-pair view, for mapping-shaped values.
    pub pairs: Vec<(String, String)>,
}

/// Normalize `value` into its scalar and pair views.
///
/// - absent/null → one `None` scalar
/// - list of strings → those strings
/// - mapping of string → string, or string → list of strings → pairs
/// - list of `[key, value]` string pairs → pairs
/// - bare scalar → its string form (empty strings contribute nothing)
///
/// Anything else is unextractable and yields the empty views with a debug
/// log, keeping evaluation total.
pub fn extract(value: Option<&Value>) -> Extracted {
    let mut out = Extracted::default();
    let Some(value) = value else {
        out.scalars.push(None);
        return out;
    };

    match value {
        // resolve() normalizes nulls away, but stay total for direct callers.
        Value::Null => out.scalars.push(None),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            out.scalars
                .extend(items.iter().map(|item| item.as_str().map(str::to_owned)));
        }
        Value::Array(items) if items.iter().all(is_string_pair) => {
            for item in items {
                if let Some([Value::String(k), Value::String(v)]) =
                    item.as_array().map(Vec::as_slice)
                {
                    out.pairs.push((k.clone(), v.clone()));
                }
            }
        }
        Value::Object(map) if map.values().all(Value::is_string) => {
            for (key, item) in map {
                if let Value::String(v) = item {
                    out.pairs.push((key.clone(), v.clone()));
                }
            }
        }
        Value::Object(map) if map.values().all(is_string_array) => {
            for (key, items) in map {
                let Value::Array(items) = items else { continue };
                for item in items {
                    if let Value::String(v) = item {
                        out.pairs.push((key.clone(), v.clone()));
                    }
                }
            }
        }
        Value::String(s) if !s.is_empty() => out.scalars.push(Some(s.clone())),
        Value::String(_) => {}
        Value::Bool(b) => out.scalars.push(Some(b.to_string())),
        Value::Number(n) => out.scalars.push(Some(n.to_string())),
        other => {
            debug!(value = %other, "field value has no scalar or pair form");
        }
    }
    out
}

fn is_string_pair(value: &Value) -> bool {
    value
        .as_array()
        .map(|items| items.len() == 2 && items.iter().all(Value::is_string))
        .unwrap_or(false)
}

fn is_string_array(value: &Value) -> bool {
    value
        .as_array()
        .map(|items| items.iter().all(Value::is_string))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scalars(value: &Value) -> Vec<Option<String>> {
        extract(Some(value)).scalars
    }

    fn pairs(value: &Value) -> Vec<(String, String)> {
        extract(Some(value)).pairs
    }

    #[test]
    fn absent_value_yields_one_null_scalar() {
        let out = extract(None);
        assert_eq!(out.scalars, vec![None]);
        assert!(out.pairs.is_empty());
    }

    #[test]
    fn string_list_becomes_scalars() {
        let v = json!(["a", "b", "c"]);
        assert_eq!(
            scalars(&v),
            vec![Some("a".into()), Some("b".into()), Some("c".into())]
        );
        assert!(pairs(&v).is_empty());
    }

    #[test]
    fn string_map_becomes_pairs() {
        let v = json!({"x": "1", "y": "2"});
        let mut got = pairs(&v);
        got.sort();
        assert_eq!(got, vec![("x".into(), "1".into()), ("y".into(), "2".into())]);
    }

    #[test]
    fn map_of_string_lists_flattens() {
        let v = json!({"x": ["1", "2"], "y": ["3"]});
        let mut got = pairs(&v);
        got.sort();
        assert_eq!(
            got,
            vec![
                ("x".into(), "1".into()),
                ("x".into(), "2".into()),
                ("y".into(), "3".into()),
            ]
        );
    }

    #[test]
    fn pair_list_becomes_pairs() {
        let v = json!([["x", "1"], ["y", "3"]]);
        assert_eq!(pairs(&v), vec![("x".into(), "1".into()), ("y".into(), "3".into())]);
    }

    #[test]
    fn bare_scalars_stringify() {
        assert_eq!(scalars(&json!("root")), vec![Some("root".into())]);
        assert_eq!(scalars(&json!(4096)), vec![Some("4096".into())]);
        assert_eq!(scalars(&json!(true)), vec![Some("true".into())]);
    }

    #[test]
    fn empty_string_contributes_nothing() {
        assert!(scalars(&json!("")).is_empty());
    }

    #[test]
    fn mixed_shapes_are_degenerate() {
        let out = extract(Some(&json!({"x": "1", "y": 2})));
        assert!(out.scalars.is_empty());
        assert!(out.pairs.is_empty());
    }
}
