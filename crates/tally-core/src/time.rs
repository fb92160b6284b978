//! Timestamp parsing and calendar arithmetic.
//!
//! Issue-tracker exports are inconsistent about timestamp formats, so
//! [`parse_timestamp`] accepts the handful of shapes seen in practice and
//! normalizes all of them to UTC. Everything downstream works on
//! `DateTime<Utc>` for ordering and on the UTC calendar date for day
//! bucketing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc, Weekday};

/// Naive datetime layouts accepted in addition to RFC 3339.
///
/// Naive values carry no offset and are interpreted as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Error returned when a raw timestamp cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// The input was empty or whitespace only.
    #[error("timestamp is empty")]
    Empty,

    /// The input matched none of the accepted layouts.
    #[error("unrecognised timestamp '{raw}'")]
    Unrecognised {
        /// The offending input, trimmed.
        raw: String,
    },
}

/// Parse a raw timestamp into UTC.
///
/// Accepted layouts, tried in order:
///
/// 1. RFC 3339 (`2024-01-03T10:15:00Z`, `2024-01-03T10:15:00+05:30`)
/// 2. Naive `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC)
/// 3. Naive `YYYY-MM-DD HH:MM:SS[.fff]` (UTC)
/// 4. Date-only `YYYY-MM-DD` (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err(TimestampError::Unrecognised {
        raw: trimmed.to_string(),
    })
}

/// The UTC calendar date a timestamp falls on.
#[must_use]
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Iterate every date in `[start, end]`, inclusive on both ends.
///
/// Yields nothing when `start > end`. Weekends are included.
pub fn dates_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Elapsed hours from `from` to `to` (negative if `to` precedes `from`).
#[must_use]
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta: TimeDelta = to - from;
    #[allow(clippy::cast_precision_loss)]
    let millis = delta.num_milliseconds() as f64;
    millis / 1_000.0 / SECONDS_PER_HOUR
}

/// Whether the date is a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Count Monday–Friday dates in the half-open range `(start, end]`.
///
/// Returns 0 when `end <= start`. This is the day count used by velocity
/// and dwell KPIs; replay never skips weekends.
#[must_use]
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }

    let count = start
        .iter_days()
        .skip(1)
        .take_while(|day| *day <= end)
        .filter(|day| !is_weekend(*day))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-01-03T10:15:00+02:00").expect("parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 3, 8, 15, 0).unwrap());
    }

    #[test]
    fn parses_naive_layouts_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 3, 10, 15, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-03T10:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-03 10:15:00").unwrap(), expected);
        assert_eq!(parse_timestamp(" 2024-01-03 10:15:00.000 ").unwrap(), expected);
    }

    #[test]
    fn parses_date_only_as_midnight() {
        let ts = parse_timestamp("2024-01-03").expect("parse");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_and_empty() {
        assert_eq!(parse_timestamp("   "), Err(TimestampError::Empty));
        assert!(matches!(
            parse_timestamp("03/01/2024"),
            Err(TimestampError::Unrecognised { .. })
        ));
        assert!(parse_timestamp("2024-02-30").is_err());
    }

    #[test]
    fn offset_can_move_the_calendar_day() {
        let ts = parse_timestamp("2024-01-03T01:00:00+05:00").expect("parse");
        assert_eq!(day_of(ts), date(2024, 1, 2));
    }

    #[test]
    fn dates_inclusive_covers_both_ends() {
        let days: Vec<_> = dates_inclusive(date(2024, 1, 30), date(2024, 2, 2)).collect();
        assert_eq!(
            days,
            vec![date(2024, 1, 30), date(2024, 1, 31), date(2024, 2, 1), date(2024, 2, 2)]
        );
        assert_eq!(dates_inclusive(date(2024, 1, 2), date(2024, 1, 1)).count(), 0);
    }

    #[test]
    fn hours_between_is_fractional() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 6, 30, 0).unwrap();
        assert!((hours_between(a, b) - 30.5).abs() < f64::EPSILON);
        assert!(hours_between(b, a) < 0.0);
    }

    #[test]
    fn working_days_skip_weekends() {
        // 2024-01-05 is a Friday, 2024-01-08 a Monday.
        assert_eq!(working_days_between(date(2024, 1, 5), date(2024, 1, 8)), 1);
        assert_eq!(working_days_between(date(2024, 1, 1), date(2024, 1, 12)), 9);
        assert_eq!(working_days_between(date(2024, 1, 8), date(2024, 1, 8)), 0);
        assert_eq!(working_days_between(date(2024, 1, 8), date(2024, 1, 1)), 0);
    }
}
