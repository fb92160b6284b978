//! Sprint velocity with overlapping-sprint duplicates counted once per cycle.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use tally_core::model::IssueRef;
use tracing::debug;

use crate::cycles::{CompletionCycles, DuplicateSet, SprintSelection, find_duplicates};

/// Velocity of one project+sprint selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintVelocity {
    pub project: String,
    pub sprint: String,
    /// Distinct issues the selection listed as completed.
    pub committed_issues: usize,
    /// Issues credited to this sprint after duplicate resolution.
    pub counted_issues: usize,
    /// Story points of the credited issues.
    pub points: f64,
}

/// Selections credited with each duplicated issue, by selection position.
///
/// Every cycle minimum goes to exactly one selection: the earliest-starting
/// one of its project that lists the issue and whose window contains the
/// minimum, ties broken by input order.
fn credited_selections(
    selections: &[SprintSelection],
    duplicates: &DuplicateSet,
    cycles: &CompletionCycles,
) -> HashSet<(usize, IssueRef)> {
    let mut credited = HashSet::new();
    for (project, issues) in duplicates {
        for number in issues {
            let Some(minimums) = cycles.get(project, number) else {
                continue;
            };
            for at in minimums {
                let owner = selections
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| &s.project == project && s.issues.contains(number))
                    .filter(|(_, s)| s.contains(*at))
                    .min_by_key(|(idx, s)| (s.start, *idx))
                    .map(|(idx, _)| idx);
                if let Some(idx) = owner {
                    credited.insert((idx, IssueRef::new(number.as_str(), project.as_str())));
                }
            }
        }
    }
    credited
}

/// Compute velocity per selection.
///
/// An issue listed by overlapping selections is credited once per
/// completion cycle, to the earliest-starting selection whose window holds
/// the cycle's minimum. Duplicates the resolver could not handle (no
/// entry in `cycles`) keep the raw count. Issues without an estimate count
/// as zero points.
#[must_use]
pub fn dedup_velocity(
    selections: &[SprintSelection],
    points: &HashMap<IssueRef, f64>,
    cycles: &CompletionCycles,
) -> Vec<SprintVelocity> {
    let duplicates = find_duplicates(selections);
    let owned = credited_selections(selections, &duplicates, cycles);

    selections
        .iter()
        .enumerate()
        .map(|(idx, selection)| {
            let duplicated = duplicates.get(&selection.project);
            let listed: BTreeSet<&String> = selection.issues.iter().collect();

            let credited: Vec<IssueRef> = listed
                .iter()
                .map(|number| IssueRef::new(number.as_str(), selection.project.as_str()))
                .filter(|issue| {
                    if !duplicated.is_some_and(|set| set.contains(&issue.number)) {
                        return true;
                    }
                    if cycles.get(&issue.project, &issue.number).is_none() {
                        return true;
                    }
                    owned.contains(&(idx, issue.clone()))
                })
                .collect();

            let total: f64 = credited
                .iter()
                .filter_map(|issue| points.get(issue))
                .sum();

            debug!(
                project = %selection.project,
                sprint = %selection.sprint,
                listed = listed.len(),
                credited = credited.len(),
                "velocity computed"
            );

            SprintVelocity {
                project: selection.project.clone(),
                sprint: selection.sprint.clone(),
                committed_issues: listed.len(),
                counted_issues: credited.len(),
                points: total,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn selection(sprint: &str, start: u32, end: u32, issues: &[&str]) -> SprintSelection {
        SprintSelection {
            project: "ALPHA".to_string(),
            sprint: sprint.to_string(),
            start: ts(start, 0),
            end: ts(end, 23),
            issues: issues.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn points() -> HashMap<IssueRef, f64> {
        HashMap::from([
            (IssueRef::new("S-1", "ALPHA"), 3.0),
            (IssueRef::new("S-2", "ALPHA"), 5.0),
        ])
    }

    #[test]
    fn duplicate_is_credited_to_the_sprint_holding_its_cycle() {
        let selections = [
            selection("s1", 1, 10, &["S-1", "S-2"]),
            selection("s2", 8, 20, &["S-1"]),
        ];
        let mut cycles = CompletionCycles::new();
        cycles.insert(&IssueRef::new("S-1", "ALPHA"), vec![ts(12, 9)]);

        let out = dedup_velocity(&selections, &points(), &cycles);
        assert_eq!(out[0].committed_issues, 2);
        assert_eq!(out[0].counted_issues, 1);
        assert!((out[0].points - 5.0).abs() < f64::EPSILON);
        assert_eq!(out[1].counted_issues, 1);
        assert!((out[1].points - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn two_cycles_credit_both_sprints() {
        let selections = [
            selection("s1", 1, 10, &["S-1"]),
            selection("s2", 8, 20, &["S-1"]),
        ];
        let mut cycles = CompletionCycles::new();
        cycles.insert(&IssueRef::new("S-1", "ALPHA"), vec![ts(3, 0), ts(15, 0)]);

        let out = dedup_velocity(&selections, &points(), &cycles);
        assert_eq!(out[0].counted_issues, 1);
        assert_eq!(out[1].counted_issues, 1);
    }

    #[test]
    fn cycle_inside_the_overlap_is_credited_once() {
        let selections = [
            selection("s1", 1, 10, &["S-1"]),
            selection("s2", 8, 20, &["S-1"]),
        ];
        let mut cycles = CompletionCycles::new();
        cycles.insert(&IssueRef::new("S-1", "ALPHA"), vec![ts(9, 12)]);

        let out = dedup_velocity(&selections, &points(), &cycles);
        let counted: Vec<usize> = out.iter().map(|v| v.counted_issues).collect();
        assert_eq!(counted, vec![1, 0]);
        let total: f64 = out.iter().map(|v| v.points).sum();
        assert!((total - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overlap_goes_to_the_earliest_start_regardless_of_order() {
        let selections = [
            selection("late", 8, 20, &["S-1"]),
            selection("early", 1, 10, &["S-1"]),
        ];
        let mut cycles = CompletionCycles::new();
        cycles.insert(&IssueRef::new("S-1", "ALPHA"), vec![ts(9, 12)]);

        let out = dedup_velocity(&selections, &points(), &cycles);
        assert_eq!(out[0].counted_issues, 0);
        assert_eq!(out[1].counted_issues, 1);
    }

    #[test]
    fn unresolved_duplicate_keeps_raw_count() {
        let selections = [
            selection("s1", 1, 10, &["S-1", "S-1"]),
            selection("s2", 8, 20, &["S-1"]),
        ];
        let out = dedup_velocity(&selections, &points(), &CompletionCycles::new());
        assert_eq!(out[0].committed_issues, 1);
        assert_eq!(out[0].counted_issues, 1);
        assert_eq!(out[1].counted_issues, 1);
    }
}
