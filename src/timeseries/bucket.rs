//! Calendar bucket arithmetic
//!
//! Producers bucket raw event timestamps on the way in; the store itself
//! records the caller's bucket timestamp as given and never re-buckets.
//! All arithmetic is UTC. Weeks start on Monday (ISO).

use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Granularity of a time-series bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarInterval {
    Hour,
    Day,
    Week,
    Month,
}

impl CalendarInterval {
    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarInterval::Hour => "HOUR",
            CalendarInterval::Day => "DAY",
            CalendarInterval::Week => "WEEK",
            CalendarInterval::Month => "MONTH",
        }
    }
}

/// Floors a timestamp to the start of its bucket.
///
/// Returns `None` only when the timestamp is outside the representable
/// calendar range.
pub fn bucket_start_millis(timestamp_millis: i64, interval: CalendarInterval) -> Option<i64> {
    let at = Utc.timestamp_millis_opt(timestamp_millis).single()?;
    let date = at.date_naive();

    let floored = match interval {
        CalendarInterval::Hour => date.and_hms_opt(at.hour(), 0, 0)?,
        CalendarInterval::Day => date.and_hms_opt(0, 0, 0)?,
        CalendarInterval::Week => {
            let days_into_week = i64::from(at.weekday().num_days_from_monday());
            (date - Duration::days(days_into_week)).and_hms_opt(0, 0, 0)?
        }
        CalendarInterval::Month => date.with_day(1)?.and_hms_opt(0, 0, 0)?,
    };

    Some(floored.and_utc().timestamp_millis())
}
