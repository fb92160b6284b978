//! Quality KPI ratios over engine outputs.
//!
//! Every ratio is a percentage in `[0, 100]` (density excepted) and is
//! `None` when its denominator is zero, so "no data" never reads as 0%.
//! Defect counts passed in here are expected to come from
//! [`crate::defects::exclude`].

use std::collections::BTreeSet;

use tally_core::model::Defect;

fn percentage(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = numerator as f64 / denominator as f64;
    Some(ratio * 100.0)
}

/// Reopened defects as a share of closed defects.
#[must_use]
pub fn defect_reopen_rate(reopened_issue_count: usize, closed_defect_count: usize) -> Option<f64> {
    percentage(reopened_issue_count, closed_defect_count)
}

/// Defects raised per hundred completed stories.
#[must_use]
pub fn defect_injection_rate(defect_count: usize, completed_story_count: usize) -> Option<f64> {
    percentage(defect_count, completed_story_count)
}

/// Defects per completed story point.
#[must_use]
pub fn defect_density(defect_count: usize, completed_story_points: f64) -> Option<f64> {
    if !completed_story_points.is_finite() || completed_story_points <= 0.0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let defects = defect_count as f64;
    Some(defects / completed_story_points)
}

/// Defects that escaped to a later stage as a share of all defects.
#[must_use]
pub fn defect_seepage_rate(escaped_defect_count: usize, total_defect_count: usize) -> Option<f64> {
    percentage(escaped_defect_count, total_defect_count)
}

/// Share of completed stories with no linked defect.
#[must_use]
pub fn first_time_pass_rate(completed_stories: &[String], defects: &[Defect]) -> Option<f64> {
    let stories: BTreeSet<&str> = completed_stories.iter().map(String::as_str).collect();
    let with_defects: BTreeSet<&str> = defects
        .iter()
        .flat_map(|defect| defect.linked_stories.iter().map(String::as_str))
        .filter(|story| stories.contains(story))
        .collect();
    percentage(stories.len() - with_defects.len(), stories.len())
}
