//! Completion-cycle minimum dates for issues duplicated across sprints.
//!
//! Overlapping sprint selections can list the same completed issue more
//! than once. Velocity must count an issue once per completion cycle, not
//! once per window, so for every duplicated issue we compute the earliest
//! "done" timestamp of each cycle.
//!
//! # Algorithm
//!
//! 1. Keep only log entries whose status is completion-eligible.
//! 2. Scan forward, tracking `status → earliest timestamp` for the open
//!    cycle.
//! 3. When a status repeats inside the open cycle, the issue has been
//!    reopened and completed again: emit the minimum of the working set as
//!    that cycle's close date, clear it, and start the next cycle with the
//!    repeating entry.
//! 4. When the scan ends, emit the minimum of whatever is left.
//!
//! A reopen before any completion leaves the working set empty, so the
//! truncated leading cycle emits nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tally_core::model::{ClassificationSet, FieldClassification, IssueHistory, IssueRef, ResolvedHistory};
use tally_core::{Diagnostic, ErrorCode};
use tracing::{debug, instrument, warn};

use crate::batch::{BatchOptions, fan_out};

/// project → issue keys listed by more than one overlapping selection.
pub type DuplicateSet = BTreeMap<String, BTreeSet<String>>;

/// A project+sprint selection handed over by the hierarchy filter.
///
/// `issues` are the keys counted as completed in that sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintSelection {
    pub project: String,
    pub sprint: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl SprintSelection {
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Source of issue histories for the resolver.
pub trait HistoryLookup {
    fn history(&self, project: &str, number: &str) -> Option<&IssueHistory>;
}

impl<S: std::hash::BuildHasher> HistoryLookup for HashMap<IssueRef, IssueHistory, S> {
    fn history(&self, project: &str, number: &str) -> Option<&IssueHistory> {
        self.get(&IssueRef::new(number, project))
    }
}

impl HistoryLookup for BTreeMap<IssueRef, IssueHistory> {
    fn history(&self, project: &str, number: &str) -> Option<&IssueHistory> {
        self.get(&IssueRef::new(number, project))
    }
}

impl HistoryLookup for [IssueHistory] {
    fn history(&self, project: &str, number: &str) -> Option<&IssueHistory> {
        self.iter()
            .find(|h| h.issue.project == project && h.issue.number == number)
    }
}

/// project → issue → ordered cycle minimums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionCycles {
    by_project: BTreeMap<String, BTreeMap<String, Vec<DateTime<Utc>>>>,
}

impl CompletionCycles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, issue: &IssueRef, minimums: Vec<DateTime<Utc>>) {
        self.by_project
            .entry(issue.project.clone())
            .or_default()
            .insert(issue.number.clone(), minimums);
    }

    #[must_use]
    pub fn get(&self, project: &str, number: &str) -> Option<&[DateTime<Utc>]> {
        self.by_project
            .get(project)
            .and_then(|issues| issues.get(number))
            .map(Vec::as_slice)
    }

    /// Calendar dates on which a cycle of `issue` completed.
    #[must_use]
    pub fn completion_days(&self, issue: &IssueRef) -> BTreeSet<NaiveDate> {
        self.get(&issue.project, &issue.number)
            .map(|mins| mins.iter().map(DateTime::date_naive).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_project.values().all(BTreeMap::is_empty)
    }

    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, BTreeMap<String, Vec<DateTime<Utc>>>> {
        &self.by_project
    }
}

/// Resolver output plus the issues and projects it had to leave out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveOutput {
    pub cycles: CompletionCycles,
    pub diagnostics: Vec<Diagnostic>,
}

/// Earliest completion timestamp of each completion cycle in the log.
#[must_use]
pub fn cycle_minimums(history: &ResolvedHistory, fc: &FieldClassification) -> Vec<DateTime<Utc>> {
    let mut minimums = Vec::new();
    let mut working: BTreeMap<String, DateTime<Utc>> = BTreeMap::new();

    for event in history.events.iter().filter(|e| fc.is_completion(&e.to)) {
        let status = event.to.trim().to_lowercase();
        if working.contains_key(&status) {
            minimums.extend(working.values().min().copied());
            working.clear();
        }
        working.entry(status).or_insert(event.at);
    }

    minimums.extend(working.values().min().copied());
    minimums
}

/// Find issues listed by more than one overlapping selection of a project.
#[must_use]
pub fn find_duplicates(selections: &[SprintSelection]) -> DuplicateSet {
    let mut windows: BTreeMap<(&str, &str), Vec<&SprintSelection>> = BTreeMap::new();
    for selection in selections {
        let unique: BTreeSet<&String> = selection.issues.iter().collect();
        for issue in unique {
            windows
                .entry((selection.project.as_str(), issue.as_str()))
                .or_default()
                .push(selection);
        }
    }

    let mut duplicates = DuplicateSet::new();
    for ((project, issue), selections) in windows {
        let overlapping = selections
            .iter()
            .enumerate()
            .any(|(i, a)| selections[i + 1..].iter().any(|b| a.overlaps(b)));
        if overlapping {
            duplicates
                .entry(project.to_string())
                .or_default()
                .insert(issue.to_string());
        }
    }
    duplicates
}

fn resolve_project<L>(
    project: &str,
    issues: &BTreeSet<String>,
    lookup: &L,
    classifications: &ClassificationSet,
) -> (Vec<(IssueRef, Vec<DateTime<Utc>>)>, Vec<Diagnostic>)
where
    L: HistoryLookup + ?Sized,
{
    let Some(fc) = classifications.get(project) else {
        return (
            Vec::new(),
            vec![Diagnostic::project(
                project,
                ErrorCode::MissingClassification,
                "no completion statuses configured; duplicates not resolved",
            )],
        );
    };

    let mut resolved = Vec::new();
    let mut diagnostics = Vec::new();

    for number in issues {
        let issue = IssueRef::new(number.as_str(), project);
        let Some(history) = lookup.history(project, number) else {
            diagnostics.push(Diagnostic::issue(
                &issue,
                ErrorCode::MissingHistory,
                "listed as duplicate but no history was supplied",
            ));
            continue;
        };

        match history.resolve() {
            Ok(history) => resolved.push((issue, cycle_minimums(&history, fc))),
            Err(err) => {
                warn!(%issue, error = %err, "skipping issue with malformed timestamp");
                diagnostics.push(Diagnostic::issue(
                    &issue,
                    ErrorCode::MalformedTimestamp,
                    err.to_string(),
                ));
            }
        }
    }

    (resolved, diagnostics)
}

/// Resolve cycle minimums for every duplicated issue, one unit per project.
#[instrument(skip_all, fields(projects = duplicates.len()))]
pub fn resolve<L>(
    duplicates: &DuplicateSet,
    lookup: &L,
    classifications: &ClassificationSet,
    options: &BatchOptions,
) -> ResolveOutput
where
    L: HistoryLookup + Sync + ?Sized,
{
    let units: Vec<(&String, &BTreeSet<String>)> = duplicates.iter().collect();
    let results = fan_out(&units, options, |(project, issues)| {
        resolve_project(project, issues, lookup, classifications)
    });

    let mut output = ResolveOutput::default();
    for ((project, _), result) in units.iter().zip(results) {
        match result {
            Ok((resolved, diagnostics)) => {
                for (issue, minimums) in resolved {
                    output.cycles.insert(&issue, minimums);
                }
                output.diagnostics.extend(diagnostics);
            }
            Err(code) => output.diagnostics.push(Diagnostic::project(
                project,
                code,
                "project not processed",
            )),
        }
    }

    debug!(
        diagnostics = output.diagnostics.len(),
        "completion cycles resolved"
    );
    output
}
