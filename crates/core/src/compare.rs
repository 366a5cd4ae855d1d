//! Compare-result data model: what the collectors hand to the analyzer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Host operating system a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Windows,
    Linux,
    Macos,
    Unknown,
}

impl Platform {
    /// Detect the platform of the running host.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Macos
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Windows => write!(f, "WINDOWS"),
            Platform::Linux => write!(f, "LINUX"),
            Platform::Macos => write!(f, "MACOS"),
            Platform::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Which side(s) of a snapshot diff are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Created,
    Modified,
    Deleted,
}

/// Category of collected object a compare result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    File,
    Registry,
    Service,
    Port,
    User,
    Group,
    Certificate,
    Driver,
    Process,
}

impl std::fmt::Display for ResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultType::File => write!(f, "FILE"),
            ResultType::Registry => write!(f, "REGISTRY"),
            ResultType::Service => write!(f, "SERVICE"),
            ResultType::Port => write!(f, "PORT"),
            ResultType::User => write!(f, "USER"),
            ResultType::Group => write!(f, "GROUP"),
            ResultType::Certificate => write!(f, "CERTIFICATE"),
            ResultType::Driver => write!(f, "DRIVER"),
            ResultType::Process => write!(f, "PROCESS"),
        }
    }
}

/// Ordered severity a matched rule attaches to a compare result.
///
/// Derives `Ord` on declaration order, so `NONE < INFORMATION < VERBOSE <
/// WARNING < ERROR`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    #[default]
    None,
    Information,
    Verbose,
    Warning,
    Error,
}

/// Opaque per-instance identity used to key evaluation caches.
///
/// Fresh on construction and on deserialization, so two results decoded
/// from the same bytes still carry distinct cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompareId(Uuid);

impl CompareId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompareId {
    fn default() -> Self {
        Self::new()
    }
}

/// The diff of a single collected object between two snapshots.
///
/// `base` is the pre-image (absent when the object was created), `compare`
/// the post-image (absent when it was deleted). `analysis` and
/// `matched_rules` are written by the analyzer; everything else comes from
/// the collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompareResult {
    #[serde(skip)]
    pub id: CompareId,
    pub result_type: ResultType,
    pub change_type: ChangeType,
    /// The collected object's own key, e.g. a file path or service name.
    pub identity: String,
    #[serde(default)]
    pub base: Option<Value>,
    #[serde(default)]
    pub compare: Option<Value>,
    #[serde(default)]
    pub analysis: Verdict,
    #[serde(default)]
    pub matched_rules: Vec<String>,
}

impl CompareResult {
    /// A diff for an object present only in the new snapshot.
    pub fn created(result_type: ResultType, identity: impl Into<String>, compare: Value) -> Self {
        Self::new(result_type, ChangeType::Created, identity, None, Some(compare))
    }

    /// A diff for an object present in both snapshots with differences.
    pub fn modified(
        result_type: ResultType,
        identity: impl Into<String>,
        base: Value,
        compare: Value,
    ) -> Self {
        Self::new(result_type, ChangeType::Modified, identity, Some(base), Some(compare))
    }

    /// A diff for an object present only in the old snapshot.
    pub fn deleted(result_type: ResultType, identity: impl Into<String>, base: Value) -> Self {
        Self::new(result_type, ChangeType::Deleted, identity, Some(base), None)
    }

    fn new(
        result_type: ResultType,
        change_type: ChangeType,
        identity: impl Into<String>,
        base: Option<Value>,
        compare: Option<Value>,
    ) -> Self {
        Self {
            id: CompareId::new(),
            result_type,
            change_type,
            identity: identity.into(),
            base,
            compare,
            analysis: Verdict::None,
            matched_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verdict_ordering() {
        assert!(Verdict::None < Verdict::Information);
        assert!(Verdict::Information < Verdict::Verbose);
        assert!(Verdict::Verbose < Verdict::Warning);
        assert!(Verdict::Warning < Verdict::Error);
        assert_eq!(Verdict::default(), Verdict::None);
    }

    #[test]
    fn wire_tags_are_screaming_snake() {
        assert_eq!(serde_json::to_string(&Verdict::Information).unwrap(), "\"INFORMATION\"");
        assert_eq!(serde_json::to_string(&ChangeType::Created).unwrap(), "\"CREATED\"");
        assert_eq!(serde_json::to_string(&ResultType::Registry).unwrap(), "\"REGISTRY\"");
        assert_eq!(serde_json::to_string(&Platform::Macos).unwrap(), "\"MACOS\"");
    }

    #[test]
    fn current_platform_is_detected() {
        let p = Platform::current();
        assert!(matches!(
            p,
            Platform::Windows | Platform::Linux | Platform::Macos | Platform::Unknown
        ));
    }

    #[test]
    fn constructors_populate_the_right_sides() {
        let created = CompareResult::created(ResultType::File, "/tmp/x", json!({"a": 1}));
        assert!(created.base.is_none());
        assert!(created.compare.is_some());

        let deleted = CompareResult::deleted(ResultType::File, "/tmp/x", json!({"a": 1}));
        assert!(deleted.base.is_some());
        assert!(deleted.compare.is_none());
    }

    #[test]
    fn deserialized_results_get_distinct_identities() {
        let raw = r#"{
            "ResultType": "FILE",
            "ChangeType": "CREATED",
            "Identity": "/usr/local/bin/tool",
            "Compare": {"path": "/usr/local/bin/tool"}
        }"#;
        let a: CompareResult = serde_json::from_str(raw).unwrap();
        let b: CompareResult = serde_json::from_str(raw).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.analysis, Verdict::None);
        assert!(a.matched_rules.is_empty());
    }
}
