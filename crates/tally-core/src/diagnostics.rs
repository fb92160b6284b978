//! Per-issue and per-project diagnostics.
//!
//! Engine components never fail a whole batch. Anything that could not be
//! computed is reported here and the rest of the batch proceeds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorCode;
use crate::model::IssueRef;

/// What a diagnostic applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticScope {
    Issue { issue: IssueRef },
    Project { project: String },
}

/// A single isolated failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub scope: DiagnosticScope,
    pub code: ErrorCode,
    pub detail: String,
}

impl Diagnostic {
    #[must_use]
    pub fn issue(issue: &IssueRef, code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            scope: DiagnosticScope::Issue {
                issue: issue.clone(),
            },
            code,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn project(project: &str, code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            scope: DiagnosticScope::Project {
                project: project.to_string(),
            },
            code,
            detail: detail.into(),
        }
    }

    /// The issue this diagnostic names, if any.
    #[must_use]
    pub const fn issue_ref(&self) -> Option<&IssueRef> {
        match &self.scope {
            DiagnosticScope::Issue { issue } => Some(issue),
            DiagnosticScope::Project { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            DiagnosticScope::Issue { issue } => {
                write!(f, "{} {} [{issue}]: {}", self.code, self.code.message(), self.detail)
            }
            DiagnosticScope::Project { project } => {
                write!(f, "{} {} [{project}]: {}", self.code, self.code.message(), self.detail)
            }
        }
    }
}

/// Remove repeated diagnostics while keeping first-seen order.
///
/// Parallel fan-out can report the same project-level problem once per
/// issue; callers usually want it once.
#[must_use]
pub fn dedup_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = std::collections::HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert((d.scope.clone(), d.code, d.detail.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_scope() {
        let issue = IssueRef::new("T-1", "ALPHA");
        let d = Diagnostic::issue(&issue, ErrorCode::MalformedTimestamp, "bad date 'x'");
        let text = d.to_string();
        assert!(text.starts_with("E2001"));
        assert!(text.contains("ALPHA/T-1"));
        assert!(text.contains("bad date"));
        assert_eq!(d.issue_ref(), Some(&issue));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = Diagnostic::project("ALPHA", ErrorCode::MissingClassification, "none");
        let b = Diagnostic::project("BETA", ErrorCode::MissingClassification, "none");
        let out = dedup_diagnostics(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(out, vec![a, b]);
    }
}
