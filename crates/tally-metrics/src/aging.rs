//! Open-ticket aging by field value.
//!
//! Reads one date column of a [`DateFieldIndex`] and buckets each issue
//! present on that date by its age since creation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use tally_core::model::IssueHistory;
use tally_core::time::{day_of, parse_timestamp};
use tracing::debug;

use crate::replay::DateFieldIndex;

/// Age ranges in days, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "0-7")]
    UpToWeek,
    #[serde(rename = "8-15")]
    UpToTwoWeeks,
    #[serde(rename = "16-30")]
    UpToMonth,
    #[serde(rename = "31-60")]
    UpToTwoMonths,
    #[serde(rename = "61-90")]
    UpToQuarter,
    #[serde(rename = "90+")]
    OverQuarter,
}

impl AgeBucket {
    pub const ALL: [Self; 6] = [
        Self::UpToWeek,
        Self::UpToTwoWeeks,
        Self::UpToMonth,
        Self::UpToTwoMonths,
        Self::UpToQuarter,
        Self::OverQuarter,
    ];

    #[must_use]
    pub const fn for_age(days: i64) -> Self {
        match days {
            ..=7 => Self::UpToWeek,
            8..=15 => Self::UpToTwoWeeks,
            16..=30 => Self::UpToMonth,
            31..=60 => Self::UpToTwoMonths,
            61..=90 => Self::UpToQuarter,
            _ => Self::OverQuarter,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToWeek => "0-7",
            Self::UpToTwoWeeks => "8-15",
            Self::UpToMonth => "16-30",
            Self::UpToTwoMonths => "31-60",
            Self::UpToQuarter => "61-90",
            Self::OverQuarter => "90+",
        }
    }
}

/// field value → bucket → issue count.
pub type AgingReport = BTreeMap<String, BTreeMap<AgeBucket, usize>>;

/// Bucket every issue present in `index` on `as_of` by age since creation.
///
/// Issues without a parsable creation timestamp are skipped; replay already
/// reported them.
#[must_use]
pub fn age_buckets(index: &DateFieldIndex, histories: &[IssueHistory], as_of: NaiveDate) -> AgingReport {
    let created: HashMap<String, NaiveDate> = histories
        .iter()
        .filter_map(|h| {
            parse_timestamp(&h.created)
                .ok()
                .map(|ts| (h.issue.to_string(), day_of(ts)))
        })
        .collect();

    let mut report = AgingReport::new();
    for (value, issues) in index.on_date(as_of) {
        let buckets = report.entry(value.to_string()).or_default();
        for issue in issues {
            let Some(created_on) = created.get(issue) else {
                continue;
            };
            let age = (as_of - *created_on).num_days();
            *buckets.entry(AgeBucket::for_age(age)).or_default() += 1;
        }
    }

    debug!(%as_of, values = report.len(), "aging computed");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::model::IssueRef;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(AgeBucket::for_age(0), AgeBucket::UpToWeek);
        assert_eq!(AgeBucket::for_age(7), AgeBucket::UpToWeek);
        assert_eq!(AgeBucket::for_age(8), AgeBucket::UpToTwoWeeks);
        assert_eq!(AgeBucket::for_age(30), AgeBucket::UpToMonth);
        assert_eq!(AgeBucket::for_age(90), AgeBucket::UpToQuarter);
        assert_eq!(AgeBucket::for_age(91), AgeBucket::OverQuarter);
        assert_eq!(AgeBucket::for_age(-1), AgeBucket::UpToWeek);
    }

    #[test]
    fn buckets_issues_present_on_date() {
        let mut index = DateFieldIndex::new();
        index.insert("Open", day(3, 1), "ALPHA/T-1");
        index.insert("Open", day(3, 1), "ALPHA/T-2");
        index.insert("In Progress", day(3, 1), "ALPHA/T-3");
        index.insert("Open", day(2, 1), "ALPHA/T-4");

        let histories = vec![
            IssueHistory::new(IssueRef::new("T-1", "ALPHA"), "2024-02-28"),
            IssueHistory::new(IssueRef::new("T-2", "ALPHA"), "2023-11-01"),
            IssueHistory::new(IssueRef::new("T-3", "ALPHA"), "2024-02-10T12:00:00Z"),
            IssueHistory::new(IssueRef::new("T-4", "ALPHA"), "2024-01-01"),
        ];

        let report = age_buckets(&index, &histories, day(3, 1));
        assert_eq!(report["Open"][&AgeBucket::UpToWeek], 1);
        assert_eq!(report["Open"][&AgeBucket::OverQuarter], 1);
        assert_eq!(report["In Progress"][&AgeBucket::UpToMonth], 1);
        assert_eq!(report.values().flat_map(BTreeMap::values).sum::<usize>(), 3);
    }

    #[test]
    fn creation_date_is_looked_up_per_project() {
        let mut index = DateFieldIndex::new();
        index.insert("Open", day(3, 1), "BETA/T-1");

        let histories = vec![
            IssueHistory::new(IssueRef::new("T-1", "ALPHA"), "2024-02-28"),
            IssueHistory::new(IssueRef::new("T-1", "BETA"), "2023-11-01"),
        ];

        let report = age_buckets(&index, &histories, day(3, 1));
        assert_eq!(report["Open"].get(&AgeBucket::OverQuarter), Some(&1));
        assert_eq!(report["Open"].get(&AgeBucket::UpToWeek), None);
    }

    #[test]
    fn labels_match_serde_names() {
        for bucket in AgeBucket::ALL {
            let json = serde_json::to_string(&bucket).expect("serialize");
            assert_eq!(json, format!("\"{}\"", bucket.label()));
        }
    }
}
