//! Recurring calendar positions used to key reliability statistics.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// How finely timestamps are bucketed into recurring slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotGranularity {
    /// `(weekday, hour)`: 168 slots per week.
    Hour,
    /// `(weekday, hour, minute bucket)`; `minutes` must divide 60.
    MinuteBucket { minutes: u32 },
}

impl Default for SlotGranularity {
    fn default() -> Self {
        Self::MinuteBucket { minutes: 15 }
    }
}

impl SlotGranularity {
    /// Map a timestamp onto its recurring slot.
    pub fn slot_for(&self, timestamp: DateTime<Utc>) -> TimeSlotKey {
        let minute_bucket = match *self {
            Self::Hour => None,
            Self::MinuteBucket { minutes } => {
                let minutes = minutes.max(1);
                Some(((timestamp.minute() / minutes) * minutes) as u8)
            }
        };
        TimeSlotKey {
            weekday: timestamp.weekday(),
            hour: timestamp.hour() as u8,
            minute_bucket,
        }
    }

    /// Number of distinct slots in one week.
    pub fn slots_per_week(&self) -> usize {
        match *self {
            Self::Hour => 7 * 24,
            Self::MinuteBucket { minutes } => 7 * 24 * (60 / minutes.max(1) as usize),
        }
    }
}

/// A recurring calendar position such as "Tuesday 14:15".
///
/// Two timestamps on different dates share a key when they fall on the same
/// weekday, hour and (optionally) minute bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlotKey {
    pub weekday: Weekday,
    pub hour: u8,
    /// Start minute of the bucket, absent for hourly slots.
    pub minute_bucket: Option<u8>,
}

impl TimeSlotKey {
    fn sort_key(&self) -> (u32, u8, Option<u8>) {
        (self.weekday.num_days_from_monday(), self.hour, self.minute_bucket)
    }
}

impl Ord for TimeSlotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for TimeSlotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeSlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minute_bucket {
            Some(minute) => write!(f, "{} {:02}:{:02}", self.weekday, self.hour, minute),
            None => write!(f, "{} {:02}h", self.weekday, self.hour),
        }
    }
}
