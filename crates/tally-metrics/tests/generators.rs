#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use tally_core::model::{Defect, IssueHistory, IssueRef, RejectionRule, StatusChangeEvent};
use tally_metrics::defects::FilterRules;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn epoch_day(offset: i64) -> NaiveDate {
    (epoch() + Duration::days(offset)).date_naive()
}

pub fn arb_status() -> impl Strategy<Value = String> + Clone {
    prop_oneof![
        Just("Open"),
        Just("In Progress"),
        Just("Review"),
        Just("Done"),
        Just("Reopened"),
        Just("Closed"),
    ]
    .prop_map(str::to_string)
}

pub fn arb_open_status() -> impl Strategy<Value = String> + Clone {
    prop_oneof![Just("Open"), Just("In Progress"), Just("Review"), Just("Reopened")]
        .prop_map(str::to_string)
}

/// `(hour offset from epoch, status)` pairs, sorted by offset.
pub fn arb_entries<S>(
    status: S,
    max_hours: i64,
    len: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<(i64, String)>>
where
    S: Strategy<Value = String> + Clone,
{
    prop::collection::vec((0..max_hours, status), len).prop_map(|mut entries| {
        entries.sort_by_key(|(hours, _)| *hours);
        entries
    })
}

pub fn history_from(number: &str, entries: &[(i64, String)]) -> IssueHistory {
    entries.iter().fold(
        IssueHistory::new(IssueRef::new(number, "ALPHA"), epoch().to_rfc3339()),
        |history, (hours, status)| {
            let at = epoch() + Duration::hours(*hours);
            history.with_event(StatusChangeEvent::new("", status.as_str(), at.to_rfc3339()))
        },
    )
}

pub const PROJECTS: [&str; 2] = ["ALPHA", "BETA"];

pub fn arb_defect() -> impl Strategy<Value = Defect> {
    (
        prop::sample::select(PROJECTS.to_vec()),
        0u32..40,
        prop::option::of(prop_oneof![
            Just("Critical"),
            Just("High"),
            Just("Medium"),
            Just("Low")
        ]),
        prop::collection::vec(
            prop_oneof![Just("code"), Just("Coding"), Just("Environment"), Just("Data")],
            0..3,
        ),
        prop_oneof![Just("Open"), Just("Rejected"), Just("Closed")],
        prop::option::of(prop_oneof![Just("Duplicate"), Just("Fixed")]),
        prop::collection::vec(prop_oneof![Just("S-1"), Just("S-2"), Just("S-3")], 0..3),
    )
        .prop_map(|(project, n, priority, rcas, status, resolution, stories)| {
            let mut defect = Defect::new(IssueRef::new(format!("D-{n}"), project))
                .with_root_causes(rcas)
                .with_status(status)
                .linked_to(stories);
            defect.priority = priority.map(str::to_string);
            defect.resolution = resolution.map(str::to_string);
            defect
        })
}

/// One project's share of a [`FilterRules`].
#[derive(Debug, Clone)]
pub struct ProjectRules {
    priorities: BTreeSet<&'static str>,
    rcas: BTreeSet<&'static str>,
    reject: bool,
    tolerance: BTreeMap<&'static str, u32>,
}

pub fn arb_project_rules() -> impl Strategy<Value = ProjectRules> {
    (
        prop::collection::btree_set(prop_oneof![Just("critical"), Just("low")], 0..3),
        prop::collection::btree_set(prop_oneof![Just("code issue"), Just("data")], 0..3),
        any::<bool>(),
        prop::collection::btree_map(
            prop_oneof![Just("Critical"), Just("High"), Just("Medium")],
            0u32..6,
            0..4,
        ),
    )
        .prop_map(|(priorities, rcas, reject, tolerance)| ProjectRules {
            priorities,
            rcas,
            reject,
            tolerance,
        })
}

/// Independent rules for every project in [`PROJECTS`].
pub fn arb_rules() -> impl Strategy<Value = FilterRules> {
    (arb_project_rules(), arb_project_rules()).prop_map(|(alpha, beta)| {
        let mut rules = FilterRules::default();
        for (project, part) in PROJECTS.iter().zip([alpha, beta]) {
            let project = (*project).to_string();
            rules.priority_exclusions.insert(
                project.clone(),
                part.priorities.into_iter().map(str::to_string).collect(),
            );
            rules
                .rca_inclusions
                .insert(project.clone(), part.rcas.into_iter().map(str::to_string).collect());
            if part.reject {
                rules.rejection_rules.insert(
                    project.clone(),
                    RejectionRule {
                        status: "Rejected".to_string(),
                        excluded_resolutions: ["Duplicate".to_string()].into(),
                    },
                );
            }
            rules.priority_tolerance.insert(
                project,
                part.tolerance.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            );
        }
        rules
    })
}
