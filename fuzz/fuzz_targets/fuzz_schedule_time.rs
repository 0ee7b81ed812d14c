//! Fuzz target: `parse_time_of_day` and `CalendarTime::parse`
//!
//! Both parsers take untrusted text from the control surface.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - An accepted appointment renders back to exactly five `HH:MM` chars
//! - An accepted calendar time is always valid
//!
//! cargo fuzz run fuzz_schedule_time

#![no_main]

use cupwarmer::adapters::time::CalendarTime;
use cupwarmer::scheduler::parse_time_of_day;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(at) = parse_time_of_day(text) {
        assert!(at.hour() < 24 && at.minute() < 60);
        let shown = at.to_string();
        assert_eq!(shown.len(), 5);
        assert_eq!(parse_time_of_day(&shown), Ok(at));
    }

    if let Ok(t) = CalendarTime::parse(text) {
        assert!(t.is_valid(), "accepted invalid calendar time {t}");
    }
});
