//! Dotted-path field access over dynamic snapshot values.
//!
//! Collectors serialize each collected object to a [`serde_json::Value`];
//! rules address fields inside it with dotted paths like
//! `"signature.issuer"` or `"listeners.0.port"`. Resolution is total:
//! anything unreachable comes back as `None`, never a panic.

use serde_json::Value;
use tracing::debug;

/// Resolve `path` against `root`, one dot-separated segment at a time.
///
/// Per segment: object member lookup (case-sensitive), or array element
/// lookup when the segment parses as a non-negative integer. JSON `null`
/// normalizes to `None`. A segment that cannot be applied to the current
/// value (missing member, index out of range, scalar mid-path) ends the
/// walk with `None` and a debug log.
pub fn resolve<'a>(root: Option<&'a Value>, path: &str) -> Option<&'a Value> {
    let mut current = root?;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => {
                    debug!(path, segment, "field path names a missing member");
                    return None;
                }
            },
            Value::Array(items) => {
                match segment.parse::<usize>().ok().and_then(|index| items.get(index)) {
                    Some(value) => value,
                    None => {
                        debug!(path, segment, "field path names a missing element");
                        return None;
                    }
                }
            }
            _ => {
                debug!(path, segment, "field path descends into a scalar");
                return None;
            }
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}
