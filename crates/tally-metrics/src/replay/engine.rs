//! Day-by-day replay of status logs.
//!
//! # Algorithm
//!
//! Each issue is replayed independently:
//!
//! 1. An empty log gets one synthetic entry: the project's open default at
//!    the creation timestamp.
//! 2. [`segments`] walks the sorted log with a small state machine and
//!    produces contiguous date ranges, each holding the value in force at
//!    the end of every day in it. Events before `range_start` collapse into
//!    one carried value; events on the same day collapse to the last one.
//! 3. The status variant writes each segment's dates under its status and
//!    stops at the first closed segment. The field variant writes the
//!    issue's static field value for every non-closed segment.
//! 4. Per-issue partial indices are unioned into one [`DateFieldIndex`].
//!
//! Weekends are not skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use tally_core::model::{
    ClassificationSet, Defect, FieldClassification, IssueHistory, IssueRef, ResolvedEvent,
    ResolvedHistory,
};
use tally_core::time::{dates_inclusive, day_of};
use tally_core::{Diagnostic, ErrorCode};
use tracing::{debug, instrument, trace, warn};

use super::index::DateFieldIndex;
use crate::batch::{BatchOptions, fan_out};
use crate::cycles::CompletionCycles;
use crate::defects::{FilterRules, canonical_root_cause, exclude};

/// Field value used when the selected attribute is missing.
pub const UNDEFINED_FIELD_VALUE: &str = "Undefined";

/// Static attribute the by-field replay groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSelector {
    Priority,
    /// First root cause, canonicalized.
    RootCause,
}

impl FieldSelector {
    #[must_use]
    pub fn value_of(self, history: &ResolvedHistory) -> String {
        let raw = match self {
            Self::Priority => history.priority.as_deref().map(str::trim).map(str::to_string),
            Self::RootCause => history
                .root_causes
                .iter()
                .map(|rca| canonical_root_cause(rca))
                .find(|rca| !rca.is_empty()),
        };
        raw.filter(|value| !value.is_empty())
            .unwrap_or_else(|| UNDEFINED_FIELD_VALUE.to_string())
    }
}

/// A contiguous run of dates sharing one end-of-day value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
    pub value: String,
}

/// Replay walk state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// No event seen yet.
    Unstarted,
    /// Only pre-range events seen; `value` is carried to `range_start`.
    Carried { value: String },
    /// `value` has held since `day`.
    Active { day: NaiveDate, value: String },
}

/// One transition rule per (state, event position) pair. Returns the next
/// state and, when a day boundary was crossed, the value that held from
/// the previous boundary.
fn step(
    cursor: Cursor,
    date: NaiveDate,
    value: String,
    range_start: NaiveDate,
) -> (Cursor, Option<(NaiveDate, String)>) {
    match cursor {
        _ if date < range_start => (Cursor::Carried { value }, None),
        Cursor::Unstarted => (Cursor::Active { day: date, value }, None),
        Cursor::Carried { .. } if date == range_start => (Cursor::Active { day: date, value }, None),
        Cursor::Carried { value: carried } => (
            Cursor::Active { day: date, value },
            Some((range_start, carried)),
        ),
        Cursor::Active { day, .. } if date == day => (Cursor::Active { day, value }, None),
        Cursor::Active { day, value: prev } => {
            (Cursor::Active { day: date, value }, Some((day, prev)))
        }
    }
}

/// Contiguous end-of-day segments for one issue within `[range_start, today]`.
///
/// Values are normalized through `fc` (blank → open default). Events after
/// `today` are ignored.
#[must_use]
pub fn segments(
    history: &ResolvedHistory,
    fc: &FieldClassification,
    range_start: NaiveDate,
    today: NaiveDate,
) -> Vec<Segment> {
    if range_start > today {
        return Vec::new();
    }

    let synthetic;
    let events: &[ResolvedEvent] = if history.events.is_empty() {
        synthetic = [ResolvedEvent {
            from: String::new(),
            to: fc.open_default.clone(),
            at: history.created,
        }];
        &synthetic
    } else {
        &history.events
    };

    let mut boundaries: Vec<(NaiveDate, String)> = Vec::new();
    let mut cursor = Cursor::Unstarted;
    for event in events {
        let date = day_of(event.at);
        if date > today {
            break;
        }
        let (next, closed_run) = step(cursor, date, fc.normalize(&event.to), range_start);
        boundaries.extend(closed_run);
        cursor = next;
    }

    match cursor {
        Cursor::Unstarted => {}
        Cursor::Carried { value } => boundaries.push((range_start, value)),
        Cursor::Active { day, value } => boundaries.push((day, value)),
    }

    let mut out = Vec::with_capacity(boundaries.len());
    let mut iter = boundaries.into_iter().peekable();
    while let Some((start, value)) = iter.next() {
        let end = iter
            .peek()
            .and_then(|(next_start, _)| next_start.pred_opt())
            .unwrap_or(today);
        out.push(Segment { start, end, value });
    }
    out
}

/// Optional constraints applied to a replay request.
#[derive(Debug, Clone, Default)]
pub struct ReplayRequest<'a> {
    pub range_start: Option<NaiveDate>,
    pub today: Option<NaiveDate>,
    pub options: BatchOptions,
    /// Replay only issues whose defect record survives the filter pipeline.
    pub defect_scope: Option<(&'a [Defect], &'a FilterRules)>,
    /// Completion-cycle minimums; a day on which a cycle completed resolves
    /// closed even when the status is not in the closed set.
    pub completion_cycles: Option<&'a CompletionCycles>,
}

impl<'a> ReplayRequest<'a> {
    #[must_use]
    pub fn new(range_start: NaiveDate, today: NaiveDate) -> Self {
        Self {
            range_start: Some(range_start),
            today: Some(today),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_defect_scope(mut self, defects: &'a [Defect], rules: &'a FilterRules) -> Self {
        self.defect_scope = Some((defects, rules));
        self
    }

    #[must_use]
    pub fn with_completion_cycles(mut self, cycles: &'a CompletionCycles) -> Self {
        self.completion_cycles = Some(cycles);
        self
    }

    fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.range_start.zip(self.today)
    }
}

/// Replay result plus per-issue diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOutput {
    pub index: DateFieldIndex,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
enum Variant {
    Status,
    Field(FieldSelector),
}

struct IssueContext<'a> {
    fc: &'a FieldClassification,
    completion_days: BTreeSet<NaiveDate>,
}

impl IssueContext<'_> {
    fn resolves_closed(&self, segment_value: &str, date: NaiveDate) -> bool {
        self.fc.is_closed(segment_value) || self.completion_days.contains(&date)
    }
}

fn replay_issue(
    history: &ResolvedHistory,
    ctx: &IssueContext<'_>,
    range_start: NaiveDate,
    today: NaiveDate,
    variant: Variant,
) -> DateFieldIndex {
    let mut partial = DateFieldIndex::new();
    let key = history.issue.to_string();
    let field_value = match variant {
        Variant::Field(selector) => Some(selector.value_of(history)),
        Variant::Status => None,
    };

    'segments: for segment in segments(history, ctx.fc, range_start, today) {
        if ctx.fc.is_excluded(&segment.value) {
            continue;
        }
        for date in dates_inclusive(segment.start, segment.end) {
            if ctx.resolves_closed(&segment.value, date) {
                match variant {
                    Variant::Status => break 'segments,
                    Variant::Field(_) => continue,
                }
            }
            let value = field_value.as_deref().unwrap_or(&segment.value);
            partial.insert(value, date, &key);
        }
    }

    trace!(issue = %history.issue, values = partial.values().count(), "issue replayed");
    partial
}

/// Issues admitted by the request's defect scope, deduplicated by identity.
fn admitted<'h>(issues: &'h [IssueHistory], request: &ReplayRequest<'_>) -> Vec<&'h IssueHistory> {
    let allowed: Option<HashSet<IssueRef>> = request.defect_scope.map(|(defects, rules)| {
        exclude(defects, rules)
            .into_iter()
            .map(|defect| defect.issue)
            .collect()
    });

    let mut seen: HashSet<&IssueRef> = HashSet::new();
    let mut units = Vec::with_capacity(issues.len());
    for history in issues {
        let in_scope = allowed
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&history.issue));
        if in_scope && seen.insert(&history.issue) {
            units.push(history);
        }
    }
    units
}

fn run(
    issues: &[IssueHistory],
    classifications: &ClassificationSet,
    request: &ReplayRequest<'_>,
    variant: Variant,
) -> ReplayOutput {
    let Some((range_start, today)) = request.bounds() else {
        return ReplayOutput::default();
    };

    let fallback = FieldClassification::default();
    let units = admitted(issues, request);

    let results = fan_out(&units, &request.options, |raw| {
        let mut diagnostics = Vec::new();
        let fc = classifications.get(&raw.issue.project).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::project(
                &raw.issue.project,
                ErrorCode::MissingClassification,
                "no classification; replayed with defaults",
            ));
            &fallback
        });

        let history = match raw.resolve() {
            Ok(history) => history,
            Err(err) => {
                warn!(issue = %raw.issue, error = %err, "dropping issue with malformed timestamp");
                diagnostics.push(Diagnostic::issue(
                    &raw.issue,
                    ErrorCode::MalformedTimestamp,
                    err.to_string(),
                ));
                return (DateFieldIndex::new(), diagnostics);
            }
        };

        let ctx = IssueContext {
            fc,
            completion_days: request
                .completion_cycles
                .map(|cycles| cycles.completion_days(&history.issue))
                .unwrap_or_default(),
        };
        (replay_issue(&history, &ctx, range_start, today, variant), diagnostics)
    });

    let mut output = ReplayOutput::default();
    let mut partials = Vec::with_capacity(units.len());
    for (raw, result) in units.iter().zip(results) {
        match result {
            Ok((partial, diagnostics)) => {
                partials.push(partial);
                output.diagnostics.extend(diagnostics);
            }
            Err(code) => output
                .diagnostics
                .push(Diagnostic::issue(&raw.issue, code, "issue not replayed")),
        }
    }
    output.index = partials.into_iter().fold(DateFieldIndex::new(), DateFieldIndex::union);
    output.diagnostics = tally_core::diagnostics::dedup_diagnostics(output.diagnostics);

    debug!(
        issues = units.len(),
        values = output.index.values().count(),
        diagnostics = output.diagnostics.len(),
        "replay finished"
    );
    output
}

/// Replay every issue's status log into a status → date → issues index.
#[instrument(skip_all, fields(issues = issues.len()))]
#[must_use]
pub fn replay_by_status(
    issues: &[IssueHistory],
    classifications: &ClassificationSet,
    request: &ReplayRequest<'_>,
) -> ReplayOutput {
    run(issues, classifications, request, Variant::Status)
}

/// Replay every issue into a field value → date → issues index, where the
/// field is a static attribute chosen by `selector`.
#[instrument(skip_all, fields(issues = issues.len(), field = ?selector))]
#[must_use]
pub fn replay_by_field(
    issues: &[IssueHistory],
    classifications: &ClassificationSet,
    request: &ReplayRequest<'_>,
    selector: FieldSelector,
) -> ReplayOutput {
    run(issues, classifications, request, Variant::Field(selector))
}
