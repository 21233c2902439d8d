// src/clock.rs

//! Wall-clock access.
//!
//! `RTAComplete.txt` stamps are written in the instrument's local time with
//! no zone, so everything here works in naive local time.

use std::fmt::Debug;

use chrono::{Local, NaiveDateTime};

/// Format used for marker payloads, backups and per-run log file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;

    /// `now()` rendered with [`TIMESTAMP_FORMAT`].
    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant. Used by tests and dry runs that need
/// reproducible quiescence decisions.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamp_uses_dashed_format() {
        let at = NaiveDate::from_ymd_opt(2017, 8, 9)
            .and_then(|d| d.and_hms_opt(21, 7, 3))
            .unwrap();
        assert_eq!(FixedClock(at).timestamp(), "2017-08-09-21-07-03");
    }
}
