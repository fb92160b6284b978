use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Cumulative-flow index: field value → ISO date → issue keys.
///
/// Issue keys are project-qualified (`project/number`, the `IssueRef`
/// display form), so equal numbers from different projects stay distinct.
///
/// Built by union of per-issue partial indices. Each partial comes from one
/// issue's replay and holds at most one value per date, so the union never
/// places an issue under two values for the same date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateFieldIndex {
    buckets: BTreeMap<String, BTreeMap<NaiveDate, BTreeSet<String>>>,
}

impl DateFieldIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `issue` under `value` on `date`.
    pub fn insert(&mut self, value: &str, date: NaiveDate, issue: &str) {
        self.buckets
            .entry(value.to_string())
            .or_default()
            .entry(date)
            .or_default()
            .insert(issue.to_string());
    }

    /// Merge `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (value, dates) in other.buckets {
            let target = self.buckets.entry(value).or_default();
            for (date, issues) in dates {
                target.entry(date).or_default().extend(issues);
            }
        }
    }

    /// Owned union, for use as a fold/reduce step.
    #[must_use]
    pub fn union(mut self, other: Self) -> Self {
        if self.buckets.len() < other.buckets.len() {
            let mut other = other;
            other.merge(self);
            return other;
        }
        self.merge(other);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Field values present in the index, in sorted order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Issues holding `value` on `date`.
    #[must_use]
    pub fn issues_on(&self, value: &str, date: NaiveDate) -> Option<&BTreeSet<String>> {
        self.buckets.get(value).and_then(|dates| dates.get(&date))
    }

    /// Per-date issue counts for one value (the trend series a chart plots).
    #[must_use]
    pub fn count_series(&self, value: &str) -> BTreeMap<NaiveDate, usize> {
        self.buckets
            .get(value)
            .map(|dates| {
                dates
                    .iter()
                    .map(|(date, issues)| (*date, issues.len()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value `issue` holds on `date`, if it appears at all.
    #[must_use]
    pub fn value_of(&self, issue: &str, date: NaiveDate) -> Option<&str> {
        self.buckets.iter().find_map(|(value, dates)| {
            dates
                .get(&date)
                .is_some_and(|issues| issues.contains(issue))
                .then_some(value.as_str())
        })
    }

    /// Every `(value, issues)` pair recorded for `date`.
    pub fn on_date(&self, date: NaiveDate) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.buckets
            .iter()
            .filter_map(move |(value, dates)| dates.get(&date).map(|issues| (value.as_str(), issues)))
    }

    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, BTreeMap<NaiveDate, BTreeSet<String>>> {
        &self.buckets
    }
}
