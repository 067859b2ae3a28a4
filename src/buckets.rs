//! Calendar arithmetic for monthly archive buckets
//!
//! All functions are pure and operate on UTC instants. A run computes its
//! retention cutoff with [`subtract_months`] and then tiles the range between
//! the oldest message of a mailbox and that cutoff into half-open,
//! month-aligned [`Bucket`]s with [`tile`].

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, Utc};
use std::fmt;

use crate::error::{ArchiveError, Result};

/// A half-open UTC interval `[start, end)`.
///
/// `start` is always the first instant of a calendar month. `end` is the
/// first instant of the following month, except for the last bucket of a
/// tiling which is clipped to the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Bucket {
    /// Whether `instant` falls inside the bucket
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Start formatted the way the mail store expects it
    pub fn start_iso(&self) -> String {
        format_iso(self.start)
    }

    /// End formatted the way the mail store expects it
    pub fn end_iso(&self) -> String {
        format_iso(self.end)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Formats an instant as ISO-8601 with second precision and a `Z` suffix
pub fn format_iso(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Subtracts `months` calendar months from `instant`.
///
/// The time of day is kept. When the day of month does not exist in the
/// target month it is clamped to that month's last day, so 2024-03-31 minus
/// one month is 2024-02-29.
pub fn subtract_months(instant: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    instant.checked_sub_months(Months::new(months)).ok_or_else(|| {
        ArchiveError::Config(format!(
            "subtracting {} months from {} leaves the representable date range",
            months,
            format_iso(instant)
        ))
    })
}

/// Truncates `instant` to 00:00:00 UTC on the first day of its month
pub fn month_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    let first = instant.date_naive() - Days::new(u64::from(instant.day0()));
    first.and_time(NaiveTime::MIN).and_utc()
}

/// First instant of the month following the one `instant` falls in.
///
/// Returns `None` only at the upper end of chrono's date range.
pub fn next_month(instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    month_start(instant).checked_add_months(Months::new(1))
}

/// Tiles `[month_start(oldest), cutoff)` into monthly buckets.
///
/// The sequence is empty when `oldest >= cutoff`.
pub fn tile(oldest: DateTime<Utc>, cutoff: DateTime<Utc>) -> MonthlyBuckets {
    MonthlyBuckets {
        cursor: if oldest < cutoff {
            month_start(oldest)
        } else {
            cutoff
        },
        cutoff,
    }
}

/// Iterator returned by [`tile`]
#[derive(Debug, Clone)]
pub struct MonthlyBuckets {
    cursor: DateTime<Utc>,
    cutoff: DateTime<Utc>,
}

impl Iterator for MonthlyBuckets {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        if self.cursor >= self.cutoff {
            return None;
        }

        let end = next_month(self.cursor).map_or(self.cutoff, |next| next.min(self.cutoff));
        let bucket = Bucket {
            start: self.cursor,
            end,
        };
        self.cursor = end;
        Some(bucket)
    }
}
