//! Child model.
//!
//! A child receives exactly one weekly session. Soft preferences carried
//! here: an ordered teacher preference list (only the first entry earns
//! objective credit) and an early-scheduling flag.

use serde::{Deserialize, Serialize};

use super::Availability;
use crate::slots::Weekday;

/// A child to be assigned one weekly session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    /// Unique child identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Free raster ticks.
    pub availability: Availability,
    /// Preferred teacher IDs, most preferred first. May be empty.
    #[serde(default)]
    pub preferred_teachers: Vec<String>,
    /// Whether early slots should be preferred for this child.
    #[serde(default)]
    pub early_preferred: bool,
}

impl Child {
    /// Creates a new child with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            availability: Availability::new(),
            preferred_teachers: Vec::new(),
            early_preferred: false,
        }
    }

    /// Sets the child name.
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

    /// Appends a preferred teacher (order of calls is preference order).
    pub fn with_preferred_teacher(mut self, teacher_id: impl Into<String>) -> Self {
        self.preferred_teachers.push(teacher_id.into());
        self
    }

    /// Sets the early-scheduling preference.
    pub fn with_early_preference(mut self, early_preferred: bool) -> Self {
        self.early_preferred = early_preferred;
        self
    }

    /// The top teacher preference, if any.
    pub fn first_preference(&self) -> Option<&str> {
        self.preferred_teachers.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_builder() {
        let c = Child::new("c1")
            .with_name("Mia")
            .with_window(Weekday::Tue, 9 * 60, 10 * 60)
            .with_preferred_teacher("t2")
            .with_preferred_teacher("t1")
            .with_early_preference(true);
        assert_eq!(c.id, "c1");
        assert_eq!(c.first_preference(), Some("t2"));
        assert_eq!(c.preferred_teachers, vec!["t2", "t1"]);
        assert!(c.early_preferred);
    }

    #[test]
    fn test_child_defaults() {
        let c = Child::new("c2");
        assert!(c.preferred_teachers.is_empty());
        assert_eq!(c.first_preference(), None);
        assert!(!c.early_preferred);
    }
}
