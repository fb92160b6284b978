#![no_main]

use chrono::Datelike;
use libfuzzer_sys::fuzz_target;
use tally_core::time::parse_timestamp;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(ts) = parse_timestamp(raw) else {
        return;
    };
    // RFC 3339 output is only four-digit-year safe.
    if (0..=9999).contains(&ts.year()) {
        assert_eq!(parse_timestamp(&ts.to_rfc3339()), Ok(ts));
    }
});
