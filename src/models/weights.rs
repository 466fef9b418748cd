//! Optimization weight configuration.
//!
//! Five named, non-negative weights, one per soft goal. Zero disables a
//! goal; the values need not sum to anything. Range checks happen in
//! input validation, not here.

use serde::{Deserialize, Serialize};

/// Weights of the soft goals, combined into the scalar objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Credit for assigning a child to its first-listed preferred teacher.
    #[serde(default)]
    pub preferred_teacher: f64,
    /// Credit scale for early slots of early-preferring children.
    #[serde(default)]
    pub priority_early_slot: f64,
    /// Credit per tandem scheduled as one joint session.
    #[serde(default)]
    pub tandem_fulfilled: f64,
    /// Credit per teacher-day gap between consecutive sessions.
    #[serde(default)]
    pub teacher_pause_respected: f64,
    /// Credit per child keeping its previous-plan placement.
    #[serde(default)]
    pub preserve_existing_plan: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            preferred_teacher: 5.0,
            priority_early_slot: 3.0,
            tandem_fulfilled: 4.0,
            teacher_pause_respected: 1.0,
            preserve_existing_plan: 10.0,
        }
    }
}

impl WeightConfig {
    /// All weights zero (every soft goal disabled).
    pub fn zeroed() -> Self {
        Self {
            preferred_teacher: 0.0,
            priority_early_slot: 0.0,
            tandem_fulfilled: 0.0,
            teacher_pause_respected: 0.0,
            preserve_existing_plan: 0.0,
        }
    }

    /// Sets the preferred-teacher weight.
    pub fn with_preferred_teacher(mut self, weight: f64) -> Self {
        self.preferred_teacher = weight;
        self
    }

    /// Sets the early-slot weight.
    pub fn with_priority_early_slot(mut self, weight: f64) -> Self {
        self.priority_early_slot = weight;
        self
    }

    /// Sets the tandem weight.
    pub fn with_tandem_fulfilled(mut self, weight: f64) -> Self {
        self.tandem_fulfilled = weight;
        self
    }

    /// Sets the teacher-pause weight.
    pub fn with_teacher_pause_respected(mut self, weight: f64) -> Self {
        self.teacher_pause_respected = weight;
        self
    }

    /// Sets the preserve-existing-plan weight.
    pub fn with_preserve_existing_plan(mut self, weight: f64) -> Self {
        self.preserve_existing_plan = weight;
        self
    }

    /// Field names and values, for validation and reporting.
    pub fn named_fields(&self) -> [(&'static str, f64); 5] {
        [
            ("preferred_teacher", self.preferred_teacher),
            ("priority_early_slot", self.priority_early_slot),
            ("tandem_fulfilled", self.tandem_fulfilled),
            ("teacher_pause_respected", self.teacher_pause_respected),
            ("preserve_existing_plan", self.preserve_existing_plan),
        ]
    }
}
