//! Rule-catalog loading: embedded default catalog or JSON files on disk.
//!
//! Loading is deliberately forgiving at the analyzer boundary: a missing or
//! corrupt file degrades to the empty catalog (with a warn log) so a bad
//! deployment cannot take analysis down with it. [`load_file`] is the
//! strict variant for callers that want the error.

mod error;

pub use error::{Result, RuleError};

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::schema::RuleFile;

/// Rule catalog compiled into the binary.
const DEFAULT_RULES: &str = include_str!("../../assets/default_rules.json");

/// Parse one JSON rule file, strictly.
pub fn load_file(path: &Path) -> Result<RuleFile> {
    let contents = fs::read_to_string(path)?;
    let file: RuleFile = serde_json::from_str(&contents)?;
    info!(path = %path.display(), rules = file.rules.len(), "loaded rule file");
    Ok(file)
}

/// Parse one JSON rule file; failures yield the empty catalog.
pub fn load_file_lossy(path: &Path) -> RuleFile {
    match load_file(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to load rule file; continuing with empty catalog"
            );
            RuleFile::default()
        }
    }
}

/// The rule catalog embedded in the binary.
pub fn default_rules() -> RuleFile {
    match serde_json::from_str(DEFAULT_RULES) {
        Ok(file) => file,
        Err(e) => {
            warn!(error = %e, "embedded default catalog failed to parse");
            RuleFile::default()
        }
    }
}
