//! Defect reopen detection.
//!
//! A reopen is an entry into the project's reopen status after the issue
//! has been closed. For each reopen inside the window we emit one
//! [`ReopenTransition`] whose `closed_at` is the earliest timestamp still
//! recorded across the closed statuses.
//!
//! The closed-status map is overwritten on repeat entry of the same status,
//! never accumulated, so a closure from an earlier, already superseded
//! cycle does not stretch the dwell time. It is not cleared by a reopen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use tally_core::model::{ClassificationSet, IssueHistory, IssueRef, ResolvedHistory, same_value};
use tally_core::time::{hours_between, working_days_between};
use tally_core::{Diagnostic, ErrorCode};
use tracing::{debug, instrument, warn};

use crate::batch::{BatchOptions, fan_out};

/// Inclusive detection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReopenWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReopenWindow {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// One closed → reopened transition. `reopened_at > closed_at` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReopenTransition {
    pub issue: IssueRef,
    pub closed_at: DateTime<Utc>,
    pub reopened_at: DateTime<Utc>,
    pub dwell_hours: f64,
}

/// Detect reopen transitions in one issue's log.
///
/// A reopen with no recorded closure is ignored: the issue was never closed
/// in the observed data.
#[must_use]
pub fn detect(
    history: &ResolvedHistory,
    window: ReopenWindow,
    closed_values: &BTreeSet<String>,
    reopen_value: &str,
) -> Vec<ReopenTransition> {
    let mut last_closed: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
    let mut transitions = Vec::new();

    for event in &history.events {
        if event.at > window.end {
            break;
        }

        if let Some(closed) = closed_values.iter().find(|c| same_value(c, &event.to)) {
            last_closed.insert(closed.as_str(), event.at);
            continue;
        }

        if !same_value(&event.to, reopen_value) || !window.contains(event.at) {
            continue;
        }

        let Some(closed_at) = last_closed.values().min().copied() else {
            continue;
        };
        if event.at <= closed_at {
            continue;
        }

        transitions.push(ReopenTransition {
            issue: history.issue.clone(),
            closed_at,
            reopened_at: event.at,
            dwell_hours: hours_between(closed_at, event.at),
        });
    }

    transitions
}

/// Batch detection result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReopenOutput {
    pub transitions: Vec<ReopenTransition>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Detect reopens across many issues, one unit per issue, using each
/// project's closed and reopen values.
#[instrument(skip_all, fields(issues = histories.len()))]
pub fn detect_all(
    histories: &[IssueHistory],
    classifications: &ClassificationSet,
    window: ReopenWindow,
    options: &BatchOptions,
) -> ReopenOutput {
    let results = fan_out(histories, options, |raw| {
        let Some(fc) = classifications.get(&raw.issue.project) else {
            return Err(Diagnostic::issue(
                &raw.issue,
                ErrorCode::MissingClassification,
                format!("project '{}' has no classification; no reopens detected", raw.issue.project),
            ));
        };
        let Some(reopen_value) = fc.reopen.as_deref() else {
            return Ok(Vec::new());
        };

        match raw.resolve() {
            Ok(history) => Ok(detect(&history, window, &fc.closed, reopen_value)),
            Err(err) => {
                warn!(issue = %raw.issue, error = %err, "skipping issue with malformed timestamp");
                Err(Diagnostic::issue(
                    &raw.issue,
                    ErrorCode::MalformedTimestamp,
                    err.to_string(),
                ))
            }
        }
    });

    let mut output = ReopenOutput::default();
    for (raw, result) in histories.iter().zip(results) {
        match result {
            Ok(Ok(transitions)) => output.transitions.extend(transitions),
            Ok(Err(diagnostic)) => output.diagnostics.push(diagnostic),
            Err(code) => output
                .diagnostics
                .push(Diagnostic::issue(&raw.issue, code, "issue not processed")),
        }
    }

    debug!(
        transitions = output.transitions.len(),
        diagnostics = output.diagnostics.len(),
        "reopen detection finished"
    );
    output
}

/// Aggregate dwell statistics over a set of transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReopenSummary {
    pub transitions: usize,
    pub reopened_issues: usize,
    pub total_dwell_hours: f64,
    pub mean_dwell_hours: Option<f64>,
    pub median_dwell_hours: Option<f64>,
    pub max_dwell_hours: Option<f64>,
    /// Mean dwell counted in Monday–Friday days.
    pub mean_dwell_working_days: Option<f64>,
}

impl ReopenSummary {
    #[must_use]
    pub fn from_transitions(transitions: &[ReopenTransition]) -> Self {
        let reopened_issues = transitions
            .iter()
            .map(|t| &t.issue)
            .collect::<BTreeSet<_>>()
            .len();

        let mut dwell: Vec<f64> = transitions.iter().map(|t| t.dwell_hours).collect();
        dwell.sort_by(f64::total_cmp);
        let total_dwell_hours: f64 = dwell.iter().sum();

        #[allow(clippy::cast_precision_loss)]
        let count = dwell.len() as f64;
        let mean_dwell_hours = (!dwell.is_empty()).then(|| total_dwell_hours / count);
        let max_dwell_hours = dwell.last().copied();
        let median_dwell_hours = median(&dwell);

        let working_days: u32 = transitions
            .iter()
            .map(|t| working_days_between(t.closed_at.date_naive(), t.reopened_at.date_naive()))
            .sum();
        let mean_dwell_working_days =
            (!transitions.is_empty()).then(|| f64::from(working_days) / count);

        Self {
            transitions: transitions.len(),
            reopened_issues,
            total_dwell_hours,
            mean_dwell_hours,
            median_dwell_hours,
            max_dwell_hours,
            mean_dwell_working_days,
        }
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}
