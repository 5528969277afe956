//! Unified diagnostics infrastructure for tracking non-fatal issues during a solve.
//!
//! This module provides a common interface for collecting warnings and errors
//! during lock evaluation, eligibility filtering, and solving. It supports:
//!
//! - Severity levels (Warning, Error)
//! - Categories for grouping issues (lock, eligibility, solver, balance, etc.)
//! - Optional entity references (e.g., "Account A-104", "Rep R-9")
//! - Serialization for JSON output
//!
//! # Example
//!
//! ```
//! use terr_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//!
//! diag.add_warning("eligibility", "account has no eligible rep");
//! diag.add_error_with_entity("solver", "capacity infeasible", "Rep R-9");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the solve continued (e.g. a lock was released, a balance penalty softened).
    Warning,
    /// Could not complete for one account/rep (e.g. no eligible rep, infeasible capacity).
    Error,
}

/// A single diagnostic issue encountered during a solve.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "lock", "eligibility", "solver", "balance").
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        Ok(())
    }
}

/// Collection of diagnostic issues accumulated during a solve.
///
/// This is the primary container returned as part of `SolveResult`. It never gates
/// correctness: a `Diagnostics` with errors in it still sits alongside a fully
/// consistent `SolveResult` (see `SolveResult::warnings` in `terr_algo`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.issues
            .push(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Warning)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let warnings = self.warning_count();
        let errors = self.error_count();
        match (warnings, errors) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (0, e) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (w, e) => format!(
                "{} warning{}, {} error{}",
                w,
                if w == 1 { "" } else { "s" },
                e,
                if e == 1 { "" } else { "s" }
            ),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_counts() {
        let mut diag = Diagnostics::new();
        diag.add_warning("lock", "released capacity-bound lock");
        diag.add_error("eligibility", "no eligible rep");
        diag.add_warning("solver", "softened balance penalty");

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_issues());
        assert!(diag.has_errors());
        assert!(diag.has_warnings());
    }

    #[test]
    fn test_diagnostics_serialization() {
        let mut diag = Diagnostics::new();
        diag.add_warning_with_entity("lock", "backfill target missing", "A-104");
        diag.add_error_with_entity("eligibility", "strategic pool empty", "A-9");

        let json = serde_json::to_string_pretty(&diag).unwrap();
        assert!(json.contains("\"warning\""));
        assert!(json.contains("\"entity\": \"A-104\""));
    }

    #[test]
    fn test_diagnostic_issue_display() {
        let issue = DiagnosticIssue::new(Severity::Error, "eligibility", "no eligible rep")
            .with_entity("A-14");

        let display = format!("{}", issue);
        assert!(display.contains("error"));
        assert!(display.contains("eligibility"));
        assert!(display.contains("A-14"));
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = Diagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.add_warning("lock", "warning");
        assert_eq!(diag.summary(), "1 warning");

        diag.add_error("solver", "error");
        assert_eq!(diag.summary(), "1 warning, 1 error");

        diag.add_warning("lock", "another warning");
        assert_eq!(diag.summary(), "2 warnings, 1 error");
    }

    #[test]
    fn test_issues_by_category() {
        let mut diag = Diagnostics::new();
        diag.add_warning("lock", "lock warning");
        diag.add_warning("eligibility", "eligibility warning");
        diag.add_error("lock", "lock error");

        let lock_issues: Vec<_> = diag.issues_by_category("lock").collect();
        assert_eq!(lock_issues.len(), 2);

        let eligibility_issues: Vec<_> = diag.issues_by_category("eligibility").collect();
        assert_eq!(eligibility_issues.len(), 1);
    }

    #[test]
    fn test_diagnostics_merge() {
        let mut diag1 = Diagnostics::new();
        diag1.add_warning("lock", "warning 1");

        let mut diag2 = Diagnostics::new();
        diag2.add_error("solver", "error 1");

        diag1.merge(diag2);
        assert_eq!(diag1.warning_count(), 1);
        assert_eq!(diag1.error_count(), 1);
    }
}
