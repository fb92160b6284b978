//! Per-project field classification.
//!
//! One [`FieldClassification`] answers every "what does this raw value
//! mean for project P" question the engine asks: which statuses are closed,
//! which is the implicit open value, which count as completion, which are
//! excluded from tracking, and how defects are filtered. A
//! [`ClassificationSet`] maps project keys to classifications and is passed
//! explicitly to every component.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default open value used when a project has no classification.
pub const DEFAULT_OPEN_VALUE: &str = "Open";

/// Compare two raw field values the way the tracker does: trimmed and
/// ASCII-case-insensitive.
#[must_use]
pub fn same_value(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Whether `value` matches any member of `set` under [`same_value`].
#[must_use]
pub fn contains_value<'a, I>(set: I, value: &str) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    set.into_iter().any(|member| same_value(member, value))
}

/// Error returned when a classification violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("open default '{value}' is also listed as a closed value")]
    OpenDefaultIsClosed { value: String },

    #[error("open default must not be empty")]
    EmptyOpenDefault,
}

/// Rejection rule: a defect in `status` with a resolution in
/// `excluded_resolutions` is not a real defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionRule {
    pub status: String,
    #[serde(default)]
    pub excluded_resolutions: BTreeSet<String>,
}

/// Defect-filtering rules for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectRules {
    /// Priorities whose defects are dropped. Empty means keep all.
    #[serde(default)]
    pub excluded_priorities: BTreeSet<String>,
    /// Root causes a defect must match at least one of. Empty means keep all.
    #[serde(default)]
    pub included_root_causes: BTreeSet<String>,
    #[serde(default)]
    pub rejection: Option<RejectionRule>,
    /// Priority → max same-priority defects per story that are tolerated
    /// (and therefore not counted).
    #[serde(default)]
    pub priority_tolerance: BTreeMap<String, u32>,
}

/// How raw field values of one project are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldClassification {
    /// Value an issue holds before any status change, and the value blank
    /// statuses normalize to.
    #[serde(default = "default_open_value")]
    pub open_default: String,
    #[serde(default)]
    pub closed: BTreeSet<String>,
    /// Statuses that count as "done" for completion-cycle dedup. Falls back
    /// to `closed` when empty.
    #[serde(default)]
    pub completion: BTreeSet<String>,
    /// Statuses not tracked in cumulative flow.
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    #[serde(default)]
    pub reopen: Option<String>,
    #[serde(default)]
    pub defects: DefectRules,
}

impl Default for FieldClassification {
    fn default() -> Self {
        Self {
            open_default: default_open_value(),
            closed: BTreeSet::new(),
            completion: BTreeSet::new(),
            excluded: BTreeSet::new(),
            reopen: None,
            defects: DefectRules::default(),
        }
    }
}

impl FieldClassification {
    pub fn new<I, S>(open_default: impl Into<String>, closed: I) -> Result<Self, ClassificationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let classification = Self {
            open_default: open_default.into(),
            closed: closed.into_iter().map(Into::into).collect(),
            ..Self::default()
        };
        classification.validate()?;
        Ok(classification)
    }

    #[must_use]
    pub fn with_completion<I, S>(mut self, completion: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completion = completion.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_excluded<I, S>(mut self, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = excluded.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_reopen(mut self, reopen: impl Into<String>) -> Self {
        self.reopen = Some(reopen.into());
        self
    }

    #[must_use]
    pub fn with_defect_rules(mut self, defects: DefectRules) -> Self {
        self.defects = defects;
        self
    }

    /// Check the closed set and open default are disjoint.
    pub fn validate(&self) -> Result<(), ClassificationError> {
        if self.open_default.trim().is_empty() {
            return Err(ClassificationError::EmptyOpenDefault);
        }
        if contains_value(&self.closed, &self.open_default) {
            return Err(ClassificationError::OpenDefaultIsClosed {
                value: self.open_default.clone(),
            });
        }
        Ok(())
    }

    /// Blank values normalize to the open default; others are trimmed.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.open_default.clone()
        } else {
            trimmed.to_string()
        }
    }

    #[must_use]
    pub fn is_closed(&self, value: &str) -> bool {
        contains_value(&self.closed, value)
    }

    #[must_use]
    pub fn is_excluded(&self, value: &str) -> bool {
        contains_value(&self.excluded, value)
    }

    #[must_use]
    pub fn is_completion(&self, value: &str) -> bool {
        if self.completion.is_empty() {
            self.is_closed(value)
        } else {
            contains_value(&self.completion, value)
        }
    }

    #[must_use]
    pub fn is_reopen(&self, value: &str) -> bool {
        self.reopen
            .as_deref()
            .is_some_and(|reopen| same_value(reopen, value))
    }
}

/// Project key → classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSet {
    #[serde(default)]
    pub projects: BTreeMap<String, FieldClassification>,
}

impl ClassificationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>, fc: FieldClassification) -> Self {
        self.projects.insert(project.into(), fc);
        self
    }

    pub fn insert(&mut self, project: impl Into<String>, fc: FieldClassification) {
        self.projects.insert(project.into(), fc);
    }

    #[must_use]
    pub fn get(&self, project: &str) -> Option<&FieldClassification> {
        self.projects.get(project)
    }

    /// Validate every project, returning the first offender.
    pub fn validate(&self) -> Result<(), (String, ClassificationError)> {
        for (project, fc) in &self.projects {
            fc.validate().map_err(|err| (project.clone(), err))?;
        }
        Ok(())
    }
}

fn default_open_value() -> String {
    DEFAULT_OPEN_VALUE.to_string()
}
