// src/validate/rta.rs

//! Parsing of the `RTAComplete.txt` completion stamp.
//!
//! The first line looks like:
//!
//! ```text
//! RTA 2.4.11 completed on 5/20/2017 9:47:13 PM
//! ```

use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// Month/day/year with a 12-hour clock, single-digit fields allowed.
pub const RTA_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Parse the completion time out of the file contents.
///
/// Returns `None` for an empty file, a first line without `"on "`, or a
/// timestamp that doesn't match [`RTA_TIMESTAMP_FORMAT`].
pub fn parse_rta_complete(contents: &str) -> Option<NaiveDateTime> {
    let first = contents.lines().next()?.trim();
    let (_, stamp) = first.rsplit_once("on ")?;
    NaiveDateTime::parse_from_str(stamp.trim(), RTA_TIMESTAMP_FORMAT).ok()
}

/// True iff strictly more than `window` has elapsed between `completed` and
/// `now`. A completion time in the future never passes.
pub fn quiescence_elapsed(completed: NaiveDateTime, now: NaiveDateTime, window: Duration) -> bool {
    let Ok(window) = TimeDelta::from_std(window) else {
        return false;
    };
    now.signed_duration_since(completed) > window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    #[test]
    fn parses_instrument_stamp() {
        let got = parse_rta_complete("RTA 2.4.11 completed on 5/20/2017 9:47:13 PM\n");
        assert_eq!(got, Some(at(2017, 5, 20, 21, 47, 13)));
    }

    #[test]
    fn parses_zero_padded_morning_stamp() {
        let got = parse_rta_complete("RTA 2.4.11 completed on 08/09/2017 12:05:00 AM");
        assert_eq!(got, Some(at(2017, 8, 9, 0, 5, 0)));
    }

    #[test]
    fn uses_last_on_occurrence() {
        let got = parse_rta_complete("on on completed on 1/2/2018 1:02:03 PM");
        assert_eq!(got, Some(at(2018, 1, 2, 13, 2, 3)));
    }

    #[test]
    fn only_first_line_counts() {
        assert_eq!(parse_rta_complete("garbage\nRTA completed on 1/2/2018 1:02:03 PM"), None);
    }

    #[test]
    fn malformed_contents_yield_none() {
        assert_eq!(parse_rta_complete(""), None);
        assert_eq!(parse_rta_complete("RTA 2.4.11 finished"), None);
        assert_eq!(parse_rta_complete("RTA completed on yesterday"), None);
        assert_eq!(parse_rta_complete("RTA completed on 13/40/2017 9:47:13 PM"), None);
    }

    #[test]
    fn quiescence_boundary_is_exclusive() {
        let now = at(2017, 5, 20, 23, 17, 13);
        let window = Duration::from_secs(5400);
        let exactly = now - TimeDelta::seconds(5400);
        let one_more = now - TimeDelta::seconds(5401);

        assert!(!quiescence_elapsed(exactly, now, window));
        assert!(quiescence_elapsed(one_more, now, window));
    }

    #[test]
    fn future_completion_never_passes() {
        let now = at(2017, 5, 20, 12, 0, 0);
        let later = at(2017, 5, 21, 12, 0, 0);
        assert!(!quiescence_elapsed(later, now, Duration::from_secs(5400)));
    }

    #[test]
    fn windows_longer_than_a_day_count_whole_days() {
        let now = at(2017, 5, 22, 12, 0, 0);
        let completed = at(2017, 5, 20, 12, 0, 0);
        assert!(quiescence_elapsed(completed, now, Duration::from_secs(5400)));
        assert!(!quiescence_elapsed(completed, now, Duration::from_secs(3 * 24 * 3600)));
    }
}
