use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structured soft-failure bundle of one scan run.
///
/// Everything here accumulates without aborting other items; nothing below
/// the whole-run level is fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Lines the scanner could not classify, as `path:line: message`.
    pub parse_warnings: Vec<String>,

    /// Soft I/O failures while reading individual items.
    pub read_errors: Vec<String>,

    /// Packages excluded from the corpus (unreadable, corrupt, bad name,
    /// missing manifest).
    pub invalid_packages: Vec<String>,

    /// Duplicate package copies that were dropped in favor of another.
    pub duplicate_packages: Vec<String>,

    /// Referenced package names with no available package; feeds
    /// remote-fetch tooling.
    pub unresolved_packages: BTreeSet<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_warning(&mut self, origin: &str, line: usize, message: &str) {
        log::warn!("{origin}:{line}: {message}");
        self.parse_warnings.push(format!("{origin}:{line}: {message}"));
    }

    pub fn read_error(&mut self, origin: &str, message: &str) {
        log::warn!("Failed to read {origin}: {message}");
        self.read_errors.push(format!("{origin}: {message}"));
    }

    pub fn invalid_package(&mut self, location: &str, reason: &str) {
        log::warn!("Excluding invalid package {location}: {reason}");
        self.invalid_packages.push(format!("{location}: {reason}"));
    }

    pub fn duplicate_package(&mut self, dropped: &str, kept: &str) {
        log::warn!("Duplicate package {dropped} (keeping {kept})");
        self.duplicate_packages.push(format!("{dropped} (kept {kept})"));
    }

    pub fn unresolved_package(&mut self, name: &str) {
        self.unresolved_packages.insert(name.to_string());
    }
}
