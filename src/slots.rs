//! The weekly time grid.
//!
//! Defines the canonical, ordered set of weekly time slots that indexes
//! all availability and assignment data. A slot is a 15-minute raster
//! position; a session starts on a slot and spans three consecutive
//! positions (45 minutes).
//!
//! # Time Model
//! Times are minutes since midnight on a Monday–Friday week. The
//! operating window (default 07:00–20:00) and the raster are carried by
//! `SlotGrid`; everything derived from the grid is a pure function of its
//! configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raster granularity in minutes.
pub const RASTER_MIN: u16 = 15;

/// Session length in minutes (three raster ticks).
pub const SESSION_MIN: u16 = 45;

/// A weekday of the planning week (Monday through Friday).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl Weekday {
    /// All weekdays in planning order.
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    /// Position within the week (Mon = 0 .. Fri = 4).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A raster position of the week: weekday plus start time.
///
/// Total order: weekday ascending, then start time ascending. Serialized
/// as `{ "weekday": "Mon", "start_time": "08:00" }`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeSlot {
    /// Day of the week.
    pub weekday: Weekday,
    /// Minutes since midnight.
    #[serde(rename = "start_time", with = "hhmm")]
    pub start_min: u16,
}

impl TimeSlot {
    /// Creates a new time slot.
    pub fn new(weekday: Weekday, start_min: u16) -> Self {
        Self { weekday, start_min }
    }

    /// Parses a slot from a `"HH:MM"` start time.
    pub fn from_hhmm(weekday: Weekday, start: &str) -> Option<Self> {
        parse_hhmm(start).map(|start_min| Self { weekday, start_min })
    }

    /// Start time formatted as `"HH:MM"`.
    pub fn hhmm(&self) -> String {
        format_hhmm(self.start_min)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.hhmm())
    }
}

/// Parses a `"HH:MM"` time into minutes since midnight.
pub fn parse_hhmm(s: &str) -> Option<u16> {
    let (h, m) = s.split_once(':')?;
    let h: u16 = h.parse().ok()?;
    let m: u16 = m.parse().ok()?;
    if h >= 24 || m >= 60 {
        return None;
    }
    Some(h * 60 + m)
}

/// Formats minutes since midnight as `"HH:MM"`.
pub fn format_hhmm(min: u16) -> String {
    format!("{:02}:{:02}", min / 60, min % 60)
}

mod hhmm {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(min: &u16, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*min))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hhmm(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{s}', expected HH:MM")))
    }
}

/// The weekly slot grid: operating window plus raster.
///
/// Produces the finite, deterministic sequence of raster ticks and
/// session-start slots for the week, and the earliness index used by the
/// objective. Pure value type; no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    /// Operating window start, minutes since midnight.
    day_start_min: u16,
    /// Operating window end, minutes since midnight (exclusive).
    day_end_min: u16,
    /// Raster granularity in minutes.
    raster_min: u16,
}

impl Default for SlotGrid {
    /// 07:00–20:00 on a 15-minute raster.
    fn default() -> Self {
        Self {
            day_start_min: 7 * 60,
            day_end_min: 20 * 60,
            raster_min: RASTER_MIN,
        }
    }
}

impl SlotGrid {
    /// Creates a grid with the given operating window and raster.
    pub fn new(day_start_min: u16, day_end_min: u16, raster_min: u16) -> Self {
        Self {
            day_start_min,
            day_end_min,
            raster_min,
        }
    }

    /// Raster granularity in minutes.
    #[inline]
    pub fn raster_min(&self) -> u16 {
        self.raster_min
    }

    /// Operating window as `(start, end)` minutes since midnight.
    #[inline]
    pub fn day_window(&self) -> (u16, u16) {
        (self.day_start_min, self.day_end_min)
    }

    /// Whether a slot is raster-aligned and inside the operating window.
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        slot.start_min >= self.day_start_min
            && slot.start_min + self.raster_min <= self.day_end_min
            && (slot.start_min - self.day_start_min) % self.raster_min == 0
    }

    /// Raster ticks per session.
    #[inline]
    pub fn ticks_per_session(&self) -> u16 {
        SESSION_MIN / self.raster_min
    }

    /// All raster ticks of the week, in slot order.
    pub fn raster_ticks(&self) -> Vec<TimeSlot> {
        let mut ticks = Vec::new();
        for day in Weekday::ALL {
            let mut t = self.day_start_min;
            while t + self.raster_min <= self.day_end_min {
                ticks.push(TimeSlot::new(day, t));
                t += self.raster_min;
            }
        }
        ticks
    }

    /// All slots at which a session may start, in slot order.
    pub fn session_starts(&self) -> Vec<TimeSlot> {
        let mut starts = Vec::new();
        for day in Weekday::ALL {
            let mut t = self.day_start_min;
            while t + SESSION_MIN <= self.day_end_min {
                starts.push(TimeSlot::new(day, t));
                t += self.raster_min;
            }
        }
        starts
    }

    /// Number of session-start slots per day.
    fn starts_per_day(&self) -> usize {
        let span = self.day_end_min.saturating_sub(self.day_start_min);
        if span < SESSION_MIN {
            return 0;
        }
        ((span - SESSION_MIN) / self.raster_min) as usize + 1
    }

    /// Number of session-start slots in the week.
    pub fn session_start_count(&self) -> usize {
        self.starts_per_day() * Weekday::ALL.len()
    }

    /// Position of a start slot within the week-ordered start sequence.
    ///
    /// Returns `None` if the slot is not a legal session start (off the
    /// raster, outside the window, or too late to fit a full session).
    pub fn start_index(&self, slot: &TimeSlot) -> Option<usize> {
        if !self.contains(slot) || slot.start_min + SESSION_MIN > self.day_end_min {
            return None;
        }
        let within_day = ((slot.start_min - self.day_start_min) / self.raster_min) as usize;
        Some(slot.weekday.index() * self.starts_per_day() + within_day)
    }

    /// The raster ticks occupied by a session starting at `start`.
    ///
    /// Returns `None` if the session would not fit inside the window.
    pub fn session_ticks(&self, start: &TimeSlot) -> Option<Vec<TimeSlot>> {
        if self.start_index(start).is_none() {
            return None;
        }
        Some(
            (0..self.ticks_per_session())
                .map(|i| TimeSlot::new(start.weekday, start.start_min + i * self.raster_min))
                .collect(),
        )
    }
}
