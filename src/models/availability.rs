//! Availability model.
//!
//! The set of raster ticks at which an entity (teacher or child) is free.
//! A session may *start* at a tick only if that tick and the following
//! two raster positions are all free; `allows_start` folds this rule in
//! against a `SlotGrid`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::slots::{SlotGrid, TimeSlot, Weekday, RASTER_MIN};

/// Free raster ticks of one entity, kept in slot order.
///
/// Serialized transparently as the ordered list of ticks, matching the
/// `{weekday, start_time}` pair set exchanged with collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Availability {
    slots: BTreeSet<TimeSlot>,
}

impl Availability {
    /// Creates an empty availability (entity is never free).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single free tick.
    pub fn with_slot(mut self, slot: TimeSlot) -> Self {
        self.slots.insert(slot);
        self
    }

    /// Adds every tick of the half-open window `[start_min, end_min)`.
    ///
    /// Mirrors the `(start, end)` per-day window entry format used by the
    /// data-entry collaborator; the window is stepped on the 15-minute
    /// raster.
    pub fn with_window(mut self, weekday: Weekday, start_min: u16, end_min: u16) -> Self {
        let mut t = start_min;
        while t + RASTER_MIN <= end_min {
            self.slots.insert(TimeSlot::new(weekday, t));
            t += RASTER_MIN;
        }
        self
    }

    /// Whether no tick is free.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of free ticks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether a specific tick is free.
    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.slots.contains(slot)
    }

    /// Iterates the free ticks in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    /// Whether a full session starting at `start` fits: the start must be
    /// a legal grid start and all occupied ticks must be free.
    pub fn allows_start(&self, grid: &SlotGrid, start: &TimeSlot) -> bool {
        match grid.session_ticks(start) {
            Some(ticks) => ticks.iter().all(|t| self.contains(t)),
            None => false,
        }
    }

    /// All ticks at which a full session may start, in slot order.
    pub fn start_slots(&self, grid: &SlotGrid) -> Vec<TimeSlot> {
        self.slots
            .iter()
            .filter(|s| self.allows_start(grid, s))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_expands_to_ticks() {
        let av = Availability::new().with_window(Weekday::Mon, 8 * 60, 9 * 60);
        assert_eq!(av.len(), 4); // 08:00, 08:15, 08:30, 08:45
        assert!(av.contains(&TimeSlot::new(Weekday::Mon, 480)));
        assert!(av.contains(&TimeSlot::new(Weekday::Mon, 525)));
        assert!(!av.contains(&TimeSlot::new(Weekday::Mon, 540)));
    }

    #[test]
    fn test_allows_start_needs_three_ticks() {
        let grid = SlotGrid::default();
        // Exactly one session: 08:00–08:45
        let av = Availability::new().with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45);
        assert!(av.allows_start(&grid, &TimeSlot::new(Weekday::Mon, 480)));
        // 08:15 would need the 08:45 tick
        assert!(!av.allows_start(&grid, &TimeSlot::new(Weekday::Mon, 495)));
    }

    #[test]
    fn test_start_slots_in_order() {
        let grid = SlotGrid::default();
        let av = Availability::new()
            .with_window(Weekday::Tue, 9 * 60, 10 * 60)
            .with_window(Weekday::Mon, 8 * 60, 9 * 60);
        let starts = av.start_slots(&grid);
        assert_eq!(
            starts,
            vec![
                TimeSlot::new(Weekday::Mon, 480),
                TimeSlot::new(Weekday::Mon, 495),
                TimeSlot::new(Weekday::Tue, 540),
                TimeSlot::new(Weekday::Tue, 555),
            ]
        );
    }

    #[test]
    fn test_disjoint_ticks_do_not_allow_start() {
        let grid = SlotGrid::default();
        let av = Availability::new()
            .with_slot(TimeSlot::new(Weekday::Mon, 480))
            .with_slot(TimeSlot::new(Weekday::Mon, 510));
        // Missing the 08:15 tick in between
        assert!(!av.allows_start(&grid, &TimeSlot::new(Weekday::Mon, 480)));
        assert!(av.start_slots(&grid).is_empty());
    }

    #[test]
    fn test_empty_availability() {
        let av = Availability::new();
        assert!(av.is_empty());
        assert!(av.start_slots(&SlotGrid::default()).is_empty());
    }
}
