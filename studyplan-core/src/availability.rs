//! Minute spans and the learner's weekly study availability.

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::time::Weekday;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Whole minutes within a single day, always in `0..=1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct TimespanInMinutes(u32);

impl TimespanInMinutes {
    pub fn new(minutes: i64) -> Result<Self, ValueError> {
        if !(0..=i64::from(MINUTES_PER_DAY)).contains(&minutes) {
            return Err(ValueError::InvalidMinutes(minutes));
        }
        Ok(Self(minutes as u32))
    }

    pub fn from_hours(hours: i64) -> Result<Self, ValueError> {
        if !(0..=24).contains(&hours) {
            return Err(ValueError::InvalidHours(hours));
        }
        Ok(Self(hours as u32 * 60))
    }

    /// Clamp any integer into the valid span.
    pub fn saturating(minutes: i64) -> Self {
        Self(minutes.clamp(0, i64::from(MINUTES_PER_DAY)) as u32)
    }

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn max() -> Self {
        Self(MINUTES_PER_DAY)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Two hours: the effort of a freshly created task and the availability of an
/// unspecified weekday.
impl Default for TimespanInMinutes {
    fn default() -> Self {
        Self(2 * 60)
    }
}

impl Add for TimespanInMinutes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self((self.0 + rhs.0).min(MINUTES_PER_DAY))
    }
}

impl Sub for TimespanInMinutes {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for TimespanInMinutes {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::empty(), |acc, t| acc + t)
    }
}

impl TryFrom<i64> for TimespanInMinutes {
    type Error = ValueError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<TimespanInMinutes> for u32 {
    fn from(span: TimespanInMinutes) -> Self {
        span.0
    }
}

/// Minutes the learner declared free for study, per weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyAvailability(BTreeMap<Weekday, TimespanInMinutes>);

impl StudyAvailability {
    pub fn new(days: impl IntoIterator<Item = (Weekday, TimespanInMinutes)>) -> Self {
        Self(days.into_iter().collect())
    }

    /// Same span on every day of the week.
    pub fn uniform(span: TimespanInMinutes) -> Self {
        Self::new(Weekday::ALL.into_iter().map(|d| (d, span)))
    }

    pub fn set(&mut self, day: Weekday, span: TimespanInMinutes) {
        self.0.insert(day, span);
    }

    /// Declared span for `day`; an undeclared day counts as the default two hours.
    pub fn for_day(&self, day: Weekday) -> TimespanInMinutes {
        self.0.get(&day).copied().unwrap_or_default()
    }

    pub fn weekly_total_minutes(&self) -> u32 {
        Weekday::ALL.iter().map(|d| self.for_day(*d).minutes()).sum()
    }
}

/// Weekdays get two hours, weekends are free.
impl Default for StudyAvailability {
    fn default() -> Self {
        Self::new(Weekday::ALL.into_iter().map(|d| {
            let span = match d {
                Weekday::Saturday | Weekday::Sunday => TimespanInMinutes::empty(),
                _ => TimespanInMinutes::default(),
            };
            (d, span)
        }))
    }
}
