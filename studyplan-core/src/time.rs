//! Calendar primitives: day-granularity dates, weekdays, and inclusive date ranges.
//!
//! Dates are timezone-naive. The only place a timezone matters is when the
//! caller decides what "today" is, see [`today_in`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A calendar day, e.g. `2026-02-20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ValueError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| ValueError::InvalidCalendarDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Shift by whole days (negative moves backwards). Saturates at chrono's bounds.
    pub fn add_days(&self, days: i64) -> Self {
        let bound = if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN };
        Self(self.0.checked_add_signed(Duration::days(days)).unwrap_or(bound))
    }

    /// Signed number of days from `self` to `other` (positive when `other` is later).
    pub fn days_until(&self, other: CalendarDate) -> i64 {
        (other.0 - self.0).num_days()
    }

    pub fn weekday(&self) -> Weekday {
        Weekday::from(self.0.weekday())
    }
}

impl FromStr for CalendarDate {
    type Err = ValueError;

    /// Accepts `YYYY-MM-DD`, optionally followed by a `T...` time part which is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day_part = match s.split_once('T') {
            Some((day, _)) => day,
            None => s,
        };
        NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValueError::InvalidCalendarDate(s.to_string()))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Resolve "today" for a learner living in the IANA timezone `tz`.
pub fn today_in(tz: &str, now: DateTime<Utc>) -> Result<CalendarDate, ValueError> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| ValueError::InvalidTimezone(tz.to_string()))?;
    Ok(CalendarDate(now.with_timezone(&tz).date_naive()))
}

/// Serialized as its lowercase English name, also when used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl From<CalendarDate> for Weekday {
    fn from(date: CalendarDate) -> Self {
        date.weekday()
    }
}

impl FromStr for Weekday {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ValueError::InvalidWeekday(s.to_string()))
    }
}

impl TryFrom<String> for Weekday {
    type Error = ValueError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.as_str().to_string()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Inclusive `[start, end]` span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: CalendarDate,
    end: CalendarDate,
}

impl DateRange {
    pub fn new(start: CalendarDate, end: CalendarDate) -> Result<Self, ValueError> {
        if start > end {
            return Err(ValueError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> CalendarDate {
        self.start
    }

    pub fn end(&self) -> CalendarDate {
        self.end
    }

    /// Number of days covered, both ends included.
    pub fn day_count(&self) -> i64 {
        self.start.days_until(self.end) + 1
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        let start = self.start;
        (0..self.day_count()).map(move |offset| start.add_days(offset))
    }
}
