//! Time and timestamp helpers.
//!
//! Device time is the local wall-clock reported by the device clock, so
//! timestamps are naive (no offset). Weekday and time-of-day filtering is
//! done against that same wall-clock.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Local device date-time used for transitions, acknowledgments and filtering.
pub type Timestamp = NaiveDateTime;

/// Return the current local device time.
#[must_use]
pub fn now() -> Timestamp {
    chrono::Local::now().naive_local()
}

/// Timestamp as carried by acknowledgment requests.
///
/// Only [`DateTime`](Self::DateTime) can be compared against stored
/// transition timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EventTimeStamp {
    Time(NaiveTime),
    SequenceNumber(u16),
    DateTime(Timestamp),
}

impl EventTimeStamp {
    /// The date-time payload, if this is a date-time timestamp.
    #[must_use]
    pub fn as_date_time(&self) -> Option<Timestamp> {
        match self {
            Self::DateTime(ts) => Some(*ts),
            Self::Time(_) | Self::SequenceNumber(_) => None,
        }
    }
}

/// Seven-bit day mask, bit 0 = Monday .. bit 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaysOfWeek(u8);

impl DaysOfWeek {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0x7F);
    pub const WEEKDAYS: Self = Self(0x1F);
    pub const WEEKEND: Self = Self(0x60);

    /// Build from a raw mask; bits above the seventh are dropped.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7F)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn from_days(days: &[Weekday]) -> Self {
        days.iter().fold(Self::NONE, |acc, day| acc.with(*day))
    }

    #[must_use]
    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | (1 << day.num_days_from_monday()))
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

impl Default for DaysOfWeek {
    fn default() -> Self {
        Self::ALL
    }
}

/// Whether `time` lies inside `[from, to]`, both ends inclusive.
///
/// A window whose start is after its end is empty.
#[must_use]
pub fn in_window(time: NaiveTime, from: NaiveTime, to: NaiveTime) -> bool {
    from <= time && time <= to
}

/// Weekday of a device timestamp.
#[must_use]
pub fn weekday(ts: Timestamp) -> Weekday {
    ts.date().weekday()
}
