//! Inclusive calendar date ranges

use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SummaryError, SummaryResult};

/// An inclusive range of calendar days
///
/// Every timestamp falling on `start`, `end` or any day in between is in range.
/// Timestamps are compared by their UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range from `start` to `end`, both inclusive
    pub fn new(start: NaiveDate, end: NaiveDate) -> SummaryResult<Self> {
        if start > end {
            return Err(SummaryError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single day
    #[must_use]
    pub const fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The current UTC day
    #[must_use]
    pub fn today() -> Self {
        Self::single_day(Utc::now().date_naive())
    }

    /// The day before `today`
    #[must_use]
    pub fn previous_day(today: NaiveDate) -> Self {
        Self::single_day(today.checked_sub_days(Days::new(1)).unwrap_or(today))
    }

    /// Everything up to and including `today`
    #[must_use]
    pub fn until(today: NaiveDate) -> Self {
        Self {
            start: NaiveDate::MIN,
            end: today,
        }
    }

    /// First day of the range
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `timestamp` falls on a day within the range
    #[must_use]
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
