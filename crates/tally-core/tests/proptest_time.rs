use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use tally_core::time::{dates_inclusive, is_weekend, parse_timestamp, working_days_between};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn rfc3339_output_parses_back(secs in 0i64..4_000_000_000) {
        let ts = Utc.timestamp_opt(secs, 0).unwrap();
        prop_assert_eq!(parse_timestamp(&ts.to_rfc3339()), Ok(ts));
    }

    #[test]
    fn working_days_never_exceed_calendar_days(a in 0i64..800, len in 0i64..800) {
        let start = base() + Duration::days(a);
        let end = start + Duration::days(len);
        let working = i64::from(working_days_between(start, end));
        prop_assert!(working <= len);
        prop_assert_eq!(working_days_between(end, start), 0);
    }

    #[test]
    fn full_weeks_have_five_working_days(a in 0i64..800, weeks in 0i64..50) {
        let start = base() + Duration::days(a);
        let end = start + Duration::weeks(weeks);
        prop_assert_eq!(i64::from(working_days_between(start, end)), weeks * 5);
    }

    #[test]
    fn working_days_are_additive(a in 0i64..400, b in 0i64..200, c in 0i64..200) {
        let start = base() + Duration::days(a);
        let mid = start + Duration::days(b);
        let end = mid + Duration::days(c);
        prop_assert_eq!(
            working_days_between(start, end),
            working_days_between(start, mid) + working_days_between(mid, end)
        );
    }

    #[test]
    fn working_days_match_a_day_walk(a in 0i64..400, len in 0i64..60) {
        let start = base() + Duration::days(a);
        let end = start + Duration::days(len);
        let walked = dates_inclusive(start, end)
            .skip(1)
            .filter(|day| !is_weekend(*day))
            .count();
        prop_assert_eq!(working_days_between(start, end) as usize, walked);
    }
}
