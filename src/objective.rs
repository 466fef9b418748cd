//! The weighted objective over candidate assignments.
//!
//! Builds the scalar score a complete assignment is awarded, as a
//! weighted sum of independently computable terms. The same predicates
//! drive the search (incrementally) and the violation analysis
//! (read-only), so the two can never disagree.
//!
//! # Term semantics
//!
//! - **Preferred teacher**: only the FIRST listed preference earns the
//!   weight; lower-ranked preferences earn nothing.
//! - **Early slot**: linear earliness `1 − start_index / last_index`
//!   over the week-ordered session starts, for early-preferring children.
//! - **Tandem**: the weight once per tandem whose members share one
//!   joint session.
//! - **Teacher pause**: the weight once per consecutive same-day session
//!   pair of a teacher with at least one free raster tick between them.
//!   Back-to-back pairs are unrewarded, never penalized.
//! - **Preserve**: the weight once per child keeping its previous-plan
//!   placement exactly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Assignment, Child, PreviousPlan, Tandem, WeightConfig};
use crate::slots::{SlotGrid, TimeSlot, Weekday, SESSION_MIN};

/// Score function of one solve invocation.
///
/// Borrows the run's weights, grid, and previous plan; holds no mutable
/// state.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    weights: &'a WeightConfig,
    grid: &'a SlotGrid,
    previous: Option<&'a PreviousPlan>,
}

/// Per-term score totals of a complete assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Total preferred-teacher credit.
    pub preferred_teacher: f64,
    /// Total early-slot credit.
    pub early_slot: f64,
    /// Total tandem credit.
    pub tandem: f64,
    /// Total teacher-pause credit.
    pub pause: f64,
    /// Total preserve-existing-plan credit.
    pub preserve: f64,
}

impl ScoreBreakdown {
    /// Sum of all terms.
    pub fn total(&self) -> f64 {
        self.preferred_teacher + self.early_slot + self.tandem + self.pause + self.preserve
    }
}

impl<'a> Objective<'a> {
    /// Creates the objective for one run.
    pub fn new(
        weights: &'a WeightConfig,
        grid: &'a SlotGrid,
        previous: Option<&'a PreviousPlan>,
    ) -> Self {
        Self {
            weights,
            grid,
            previous,
        }
    }

    /// The run's weights.
    pub fn weights(&self) -> &WeightConfig {
        self.weights
    }

    /// Whether two session starts on the same day are back-to-back.
    #[inline]
    pub fn back_to_back(prev_start: u16, next_start: u16) -> bool {
        next_start == prev_start + SESSION_MIN
    }

    /// Normalized earliness of a start slot: 1.0 for the week's first
    /// start, 0.0 for the last, linear in between.
    pub fn earliness(&self, slot: &TimeSlot) -> f64 {
        let count = self.grid.session_start_count();
        let Some(index) = self.grid.start_index(slot) else {
            return 0.0;
        };
        if count <= 1 {
            return 1.0;
        }
        1.0 - index as f64 / (count - 1) as f64
    }

    /// Credit for assigning `child` to `teacher_id` (top preference only).
    pub fn preferred_teacher_gain(&self, child: &Child, teacher_id: &str) -> f64 {
        if child.first_preference() == Some(teacher_id) {
            self.weights.preferred_teacher
        } else {
            0.0
        }
    }

    /// Early-slot credit for `child` at `slot`.
    pub fn earliness_gain(&self, child: &Child, slot: &TimeSlot) -> f64 {
        if child.early_preferred {
            self.weights.priority_early_slot * self.earliness(slot)
        } else {
            0.0
        }
    }

    /// Stability credit for `child` keeping its previous placement.
    pub fn preserve_gain(&self, child_id: &str, teacher_id: &str, slot: &TimeSlot) -> f64 {
        match self.previous.and_then(|p| p.get(child_id)) {
            Some(prev) if prev.teacher_id == teacher_id && prev.slot == *slot => {
                self.weights.preserve_existing_plan
            }
            _ => 0.0,
        }
    }

    /// All per-child credit for one placement (preferred + early +
    /// preserve). Tandem and pause credit depend on other placements and
    /// are accounted separately.
    pub fn placement_gain(&self, child: &Child, teacher_id: &str, slot: &TimeSlot) -> f64 {
        self.preferred_teacher_gain(child, teacher_id)
            + self.earliness_gain(child, slot)
            + self.preserve_gain(&child.id, teacher_id, slot)
    }

    /// Credit per fulfilled tandem.
    #[inline]
    pub fn tandem_gain(&self) -> f64 {
        self.weights.tandem_fulfilled
    }

    /// Pause credit of one teacher-day, given its sorted session starts.
    ///
    /// Each consecutive pair with at least one free raster tick between
    /// the sessions earns the weight once.
    pub fn pause_gain_for_day(&self, sorted_starts: &[u16]) -> f64 {
        let gap = SESSION_MIN + self.grid.raster_min();
        sorted_starts
            .windows(2)
            .filter(|w| w[1] >= w[0] + gap)
            .count() as f64
            * self.weights.teacher_pause_respected
    }

    /// Per-term score totals of a complete assignment list.
    pub fn breakdown(
        &self,
        assignments: &[Assignment],
        children: &[Child],
        tandems: &[Tandem],
    ) -> ScoreBreakdown {
        let child_by_id: HashMap<&str, &Child> =
            children.iter().map(|c| (c.id.as_str(), c)).collect();
        let assignment_of: HashMap<&str, &Assignment> = assignments
            .iter()
            .map(|a| (a.child_id.as_str(), a))
            .collect();

        let mut breakdown = ScoreBreakdown::default();

        for a in assignments {
            let Some(child) = child_by_id.get(a.child_id.as_str()) else {
                continue;
            };
            breakdown.preferred_teacher += self.preferred_teacher_gain(child, &a.teacher_id);
            breakdown.early_slot += self.earliness_gain(child, &a.slot);
            breakdown.preserve += self.preserve_gain(&child.id, &a.teacher_id, &a.slot);
        }

        for tandem in tandems {
            if let (Some(a), Some(b)) = (
                assignment_of.get(tandem.child_a.as_str()),
                assignment_of.get(tandem.child_b.as_str()),
            ) {
                if a.teacher_id == b.teacher_id && a.slot == b.slot {
                    breakdown.tandem += self.tandem_gain();
                }
            }
        }

        // Distinct session starts per teacher-day; a joint tandem session
        // appears once even though two assignments share it. Ordered map:
        // the summation order must not depend on hash state.
        let mut day_starts: BTreeMap<(&str, Weekday), BTreeSet<u16>> = BTreeMap::new();
        for a in assignments {
            day_starts
                .entry((a.teacher_id.as_str(), a.slot.weekday))
                .or_default()
                .insert(a.slot.start_min);
        }
        for starts in day_starts.values() {
            let sorted: Vec<u16> = starts.iter().copied().collect();
            breakdown.pause += self.pause_gain_for_day(&sorted);
        }

        breakdown
    }
}
