//! The analyzer facade: candidate selection, rule evaluation, verdicts.

use std::path::Path;

use dashmap::DashMap;
use tracing::debug;

use driftwatch_core::{CompareResult, Platform, Verdict};

use crate::evaluator::{apply_rule, ClauseCache, Collation};
use crate::loader;
use crate::schema::{Rule, RuleFile};
use crate::validation::{validate_rule_file, ValidationResult};

/// Evaluates compare results against a fixed rule catalog.
///
/// The catalog is immutable after construction; [`analyze`](Self::analyze)
/// takes `&self` and may be called concurrently for distinct compare
/// results. Clause verdicts are memoized per compare result and purged
/// when its analysis completes.
pub struct Analyzer {
    platform: Platform,
    config: RuleFile,
    collation: Collation,
    clause_cache: ClauseCache,
}

impl Analyzer {
    /// Analyzer over an already-parsed catalog.
    pub fn new(platform: Platform, config: RuleFile) -> Self {
        Self {
            platform,
            config,
            collation: Collation::default(),
            clause_cache: DashMap::new(),
        }
    }

    /// Analyzer over the catalog embedded in the binary.
    pub fn with_default_rules(platform: Platform) -> Self {
        Self::new(platform, loader::default_rules())
    }

    /// Analyzer over a rule file on disk. Load failures degrade to the
    /// empty catalog: subsequent analyze calls match nothing.
    pub fn from_path(platform: Platform, path: &Path) -> Self {
        Self::new(platform, loader::load_file_lossy(path))
    }

    /// Collation used by the prefix/suffix operations.
    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn rules(&self) -> &[Rule] {
        &self.config.rules
    }

    /// Classify one compare result, returning the rules that fired in
    /// declaration order.
    ///
    /// Resets then fills `result.analysis` and `result.matched_rules`. The
    /// analysis verdict starts at the result type's default level and is
    /// raised to the highest flag among matched rules.
    pub fn analyze(&self, result: &mut CompareResult) -> Vec<&Rule> {
        result.analysis = Verdict::None;
        result.matched_rules.clear();

        let mut verdict = self
            .config
            .default_levels
            .get(&result.result_type)
            .copied()
            .unwrap_or(Verdict::None);

        let mut matched = Vec::new();
        for (idx, rule) in self.config.rules.iter().enumerate() {
            if !rule.applies_to(self.platform, result) {
                continue;
            }
            if apply_rule(rule, idx as u32, result, &self.clause_cache, self.collation) {
                debug!(rule = %rule.name, identity = %result.identity, "rule matched");
                result.matched_rules.push(rule.name.clone());
                if rule.flag > verdict {
                    verdict = rule.flag;
                }
                matched.push(rule);
            }
        }
        result.analysis = verdict;

        // Best-effort purge: this result's identity will not be seen again.
        self.clause_cache.retain(|(id, _), _| *id != result.id);

        matched
    }

    /// Run the static validator over the whole catalog.
    pub fn verify_rules(&self) -> ValidationResult {
        validate_rule_file(&self.config)
    }
}
