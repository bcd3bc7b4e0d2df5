//! Per-file lint results and their merge

use crate::diagnostic::{Diagnostic, Severity};
use std::collections::BTreeMap;

/// Result of linting one or more files
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// Files read and handed to a plugin
    pub files_processed: usize,

    /// Files that failed to tokenize or parse
    pub files_unlinted: usize,

    /// Environment failure that stopped the run (unreadable input)
    pub fatal: Option<String>,
}

impl LintResult {
    /// Merge another result into this one. The first fatal error wins.
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.files_processed += other.files_processed;
        self.files_unlinted += other.files_unlinted;
        if self.fatal.is_none() {
            self.fatal = other.fatal;
        }
    }

    /// Order diagnostics by file, offset, then rule id
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    /// Drop diagnostics below a severity
    pub fn filter_threshold(&mut self, threshold: Severity) {
        self.diagnostics.retain(|d| d.severity.reaches(threshold));
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Number of diagnostics per rule id
    pub fn count_by_rule(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for diag in &self.diagnostics {
            *counts.entry(diag.rule_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Check if result is clean (no diagnostics left after filtering)
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.fatal.is_none()
    }

    /// Get exit code (0 = clean, 1 = diagnostics reported, 2 = fatal error)
    pub fn exit_code(&self) -> i32 {
        if self.fatal.is_some() {
            2
        } else if !self.diagnostics.is_empty() {
            1
        } else {
            0
        }
    }
}
