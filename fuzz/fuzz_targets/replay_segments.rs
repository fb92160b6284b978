#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use tally_core::model::{FieldClassification, IssueHistory, IssueRef, StatusChangeEvent};
use tally_metrics::replay::segments;

// Each line is `<timestamp>\t<status>`; the first line is the creation date.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut lines = text.lines();
    let Some(created) = lines.next() else {
        return;
    };

    let history = lines
        .filter_map(|line| line.split_once('\t'))
        .fold(
            IssueHistory::new(IssueRef::new("F-1", "FUZZ"), created),
            |history, (at, status)| history.with_event(StatusChangeEvent::new("", status, at)),
        );
    let Ok(history) = history.resolve() else {
        return;
    };

    let fc = FieldClassification::default();
    let (Some(start), Some(today)) = (
        NaiveDate::from_ymd_opt(2020, 1, 1),
        NaiveDate::from_ymd_opt(2030, 12, 31),
    ) else {
        return;
    };

    let out = segments(&history, &fc, start, today);
    for pair in out.windows(2) {
        assert!(pair[0].end < pair[1].start);
    }
    for segment in &out {
        assert!(start <= segment.start && segment.start <= segment.end && segment.end <= today);
    }
});
