//! Defect exclusion rules.
//!
//! Three filters compose with AND:
//!
//! 1. **Rejection**: status equals the project's rejection status and the
//!    resolution is one of its excluded resolutions.
//! 2. **Priority/RCA**: priority not excluded, and at least one root cause
//!    included. An empty rule set keeps everything.
//! 3. **Count tolerance**: a defect is dropped when every story it links to
//!    has no more same-priority defects than the project tolerates.
//!
//! Filters 1 and 2 are per-defect predicates. Filter 3 counts only the
//! defects that survived them, which keeps [`exclude`] idempotent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tally_core::model::{
    ClassificationSet, Defect, RejectionRule, contains_value, same_value,
};
use tracing::{debug, instrument};

use super::rca::canonical_root_cause;

/// Filter rules keyed by project. Projects with no entry pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub priority_exclusions: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub rca_inclusions: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub rejection_rules: BTreeMap<String, RejectionRule>,
    #[serde(default)]
    pub priority_tolerance: BTreeMap<String, BTreeMap<String, u32>>,
}

impl FilterRules {
    /// Collect the defect rules of every classified project.
    #[must_use]
    pub fn from_classifications(classifications: &ClassificationSet) -> Self {
        let mut rules = Self::default();
        for (project, fc) in &classifications.projects {
            let defects = &fc.defects;
            if !defects.excluded_priorities.is_empty() {
                rules
                    .priority_exclusions
                    .insert(project.clone(), defects.excluded_priorities.clone());
            }
            if !defects.included_root_causes.is_empty() {
                rules
                    .rca_inclusions
                    .insert(project.clone(), defects.included_root_causes.clone());
            }
            if let Some(rejection) = &defects.rejection {
                rules.rejection_rules.insert(project.clone(), rejection.clone());
            }
            if !defects.priority_tolerance.is_empty() {
                rules
                    .priority_tolerance
                    .insert(project.clone(), defects.priority_tolerance.clone());
            }
        }
        rules
    }

    fn tolerance(&self, project: &str, priority: &str) -> Option<u32> {
        self.priority_tolerance.get(project).and_then(|by_priority| {
            by_priority
                .iter()
                .find(|(key, _)| same_value(key, priority))
                .map(|(_, tolerance)| *tolerance)
        })
    }
}

/// Whether the defect survives the rejection rule of its project.
#[must_use]
pub fn passes_rejection(defect: &Defect, rules: &FilterRules) -> bool {
    let Some(rule) = rules.rejection_rules.get(&defect.issue.project) else {
        return true;
    };

    let rejected_status = same_value(&defect.status, &rule.status);
    let excluded_resolution = defect
        .resolution
        .as_deref()
        .is_some_and(|resolution| contains_value(&rule.excluded_resolutions, resolution));

    !(rejected_status && excluded_resolution)
}

/// Whether the defect survives the priority and root-cause rules.
#[must_use]
pub fn passes_priority_rca(defect: &Defect, rules: &FilterRules) -> bool {
    let project = defect.issue.project.as_str();

    let priority_ok = match rules.priority_exclusions.get(project) {
        Some(excluded) if !excluded.is_empty() => !defect
            .priority
            .as_deref()
            .is_some_and(|priority| contains_value(excluded, priority)),
        _ => true,
    };

    let rca_ok = match rules.rca_inclusions.get(project) {
        Some(included) if !included.is_empty() => {
            let wanted: BTreeSet<String> =
                included.iter().map(|rca| canonical_root_cause(rca)).collect();
            defect
                .root_causes
                .iter()
                .any(|rca| wanted.contains(&canonical_root_cause(rca)))
        }
        _ => true,
    };

    priority_ok && rca_ok
}

/// (project, story key) → lower-cased priority → number of linked defects.
///
/// Tolerance is configured per project, so a story's counts are kept apart
/// for each project that links defects to it.
type StoryPriorityCounts = HashMap<(String, String), HashMap<String, u32>>;

fn story_priority_counts(defects: &[&Defect]) -> StoryPriorityCounts {
    let mut counts = StoryPriorityCounts::new();
    for defect in defects {
        let Some(priority) = defect.priority.as_deref() else {
            continue;
        };
        let priority = priority.trim().to_lowercase();
        let stories: BTreeSet<&String> = defect.linked_stories.iter().collect();
        for story in stories {
            *counts
                .entry((defect.issue.project.clone(), story.clone()))
                .or_default()
                .entry(priority.clone())
                .or_default() += 1;
        }
    }
    counts
}

fn within_tolerance(defect: &Defect, counts: &StoryPriorityCounts, rules: &FilterRules) -> bool {
    let Some(priority) = defect.priority.as_deref() else {
        return false;
    };
    let Some(tolerance) = rules.tolerance(&defect.issue.project, priority) else {
        return false;
    };
    if defect.linked_stories.is_empty() {
        return false;
    }

    let priority = priority.trim().to_lowercase();
    defect.linked_stories.iter().all(|story| {
        let count = counts
            .get(&(defect.issue.project.clone(), story.clone()))
            .and_then(|by_priority| by_priority.get(&priority))
            .copied()
            .unwrap_or(0);
        count <= tolerance
    })
}

/// Apply every filter and return the surviving defects in input order.
#[instrument(skip_all, fields(defects = defects.len()))]
#[must_use]
pub fn exclude(defects: &[Defect], rules: &FilterRules) -> Vec<Defect> {
    let candidates: Vec<&Defect> = defects
        .iter()
        .filter(|defect| passes_rejection(defect, rules) && passes_priority_rca(defect, rules))
        .collect();

    let counts = story_priority_counts(&candidates);

    let kept: Vec<Defect> = candidates
        .into_iter()
        .filter(|defect| !within_tolerance(defect, &counts, rules))
        .cloned()
        .collect();

    debug!(kept = kept.len(), dropped = defects.len() - kept.len(), "defect filter applied");
    kept
}
