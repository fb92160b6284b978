use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::{TimestampError, parse_timestamp};

/// Immutable identity of an issue: its tracker key plus owning project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    /// Tracker key, e.g. `T-1`.
    pub number: String,
    /// Owning project identifier, e.g. `ALPHA`.
    pub project: String,
}

impl IssueRef {
    #[must_use]
    pub fn new(number: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            project: project.into(),
        }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.number)
    }
}

/// One raw entry of an issue's status log, as exported by the tracker.
///
/// `timestamp` is kept as text until [`IssueHistory::resolve`] so a bad
/// value can be attributed to its issue instead of failing deserialization
/// of the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeEvent {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub timestamp: String,
}

impl StatusChangeEvent {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Read-only input record: identity, status log, creation time and static
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueHistory {
    pub issue: IssueRef,
    #[serde(default)]
    pub log: Vec<StatusChangeEvent>,
    pub created: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub root_causes: Vec<String>,
}

/// Error resolving an [`IssueHistory`] into typed timestamps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{issue}: {field}: {source}")]
pub struct ResolveError {
    pub issue: IssueRef,
    /// `created` or `log[<index>]`.
    pub field: String,
    #[source]
    pub source: TimestampError,
}

/// A status change with a parsed timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub from: String,
    pub to: String,
    pub at: DateTime<Utc>,
}

/// An [`IssueHistory`] whose timestamps parsed and whose log is sorted.
///
/// The log is non-decreasing in `at`. Events sharing a timestamp keep their
/// export order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedHistory {
    pub issue: IssueRef,
    pub events: Vec<ResolvedEvent>,
    pub created: DateTime<Utc>,
    pub priority: Option<String>,
    pub root_causes: Vec<String>,
}

impl IssueHistory {
    #[must_use]
    pub fn new(issue: IssueRef, created: impl Into<String>) -> Self {
        Self {
            issue,
            log: Vec::new(),
            created: created.into(),
            priority: None,
            root_causes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_event(mut self, event: StatusChangeEvent) -> Self {
        self.log.push(event);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    #[must_use]
    pub fn with_root_causes<I, S>(mut self, root_causes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_causes = root_causes.into_iter().map(Into::into).collect();
        self
    }

    /// Parse every timestamp and sort the log ascending.
    ///
    /// The first unparsable timestamp fails the whole issue; callers turn
    /// that into a per-issue diagnostic.
    pub fn resolve(&self) -> Result<ResolvedHistory, ResolveError> {
        let created = parse_timestamp(&self.created).map_err(|source| ResolveError {
            issue: self.issue.clone(),
            field: "created".to_string(),
            source,
        })?;

        let mut events = self
            .log
            .iter()
            .enumerate()
            .map(|(idx, event)| {
                parse_timestamp(&event.timestamp)
                    .map(|at| ResolvedEvent {
                        from: event.from.clone(),
                        to: event.to.clone(),
                        at,
                    })
                    .map_err(|source| ResolveError {
                        issue: self.issue.clone(),
                        field: format!("log[{idx}]"),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Stable: same-instant events keep export order, so "last event of
        // the day wins" stays deterministic.
        events.sort_by_key(|event| event.at);

        Ok(ResolvedHistory {
            issue: self.issue.clone(),
            events,
            created,
            priority: self.priority.clone(),
            root_causes: self.root_causes.clone(),
        })
    }
}
