//! Teacher model.
//!
//! A teacher offers weekly session capacity: one session per occupied
//! raster window, shared by two children only when they form a declared
//! tandem.

use serde::{Deserialize, Serialize};

use super::Availability;
use crate::slots::Weekday;

/// A teacher that can hold sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique teacher identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Free raster ticks.
    pub availability: Availability,
}

impl Teacher {
    /// Creates a new teacher with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            availability: Availability::new(),
        }
    }

    /// Sets the teacher name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the availability.
    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    /// Adds an availability window `[start_min, end_min)` on a weekday.
    pub fn with_window(mut self, weekday: Weekday, start_min: u16, end_min: u16) -> Self {
        self.availability = self.availability.with_window(weekday, start_min, end_min);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_builder() {
        let t = Teacher::new("t1")
            .with_name("Anna")
            .with_window(Weekday::Mon, 8 * 60, 10 * 60);
        assert_eq!(t.id, "t1");
        assert_eq!(t.name, "Anna");
        assert_eq!(t.availability.len(), 8);
    }

    #[test]
    fn test_teacher_without_availability() {
        let t = Teacher::new("t2");
        assert!(t.availability.is_empty());
    }
}
