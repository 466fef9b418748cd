//! Plan (solution) model.
//!
//! A plan is the produced weekly assignment: one `(teacher, slot)` per
//! assigned child, a solve status, the wall-clock runtime, the total
//! objective score, the unmet-goal violations, and the change report
//! against the previous plan. Children absent from the assignment list
//! are unassigned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::slots::TimeSlot;

/// A `(teacher, slot)` placement, without the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Assigned teacher ID.
    pub teacher_id: String,
    /// Session start slot.
    #[serde(flatten)]
    pub slot: TimeSlot,
}

impl Placement {
    /// Creates a new placement.
    pub fn new(teacher_id: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            slot,
        }
    }
}

/// A child-teacher-slot assignment.
///
/// Serialized flat as `{child_id, teacher_id, weekday, start_time}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned child ID.
    pub child_id: String,
    /// Assigned teacher ID.
    pub teacher_id: String,
    /// Session start slot.
    #[serde(flatten)]
    pub slot: TimeSlot,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(child_id: impl Into<String>, teacher_id: impl Into<String>, slot: TimeSlot) -> Self {
        Self {
            child_id: child_id.into(),
            teacher_id: teacher_id.into(),
            slot,
        }
    }

    /// The placement part (teacher and slot).
    pub fn placement(&self) -> Placement {
        Placement::new(self.teacher_id.clone(), self.slot)
    }
}

/// Solution quality of a finished solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Search space exhausted; no better assignment exists.
    Optimal,
    /// Best assignment found before the deadline or cancellation;
    /// optimality unproven.
    Feasible,
    /// No child could be assigned.
    NoSolution,
}

/// The prior run's assignments, used for the stability goal and the
/// change report. Passed in explicitly; the engine keeps no ambient
/// previous-plan state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviousPlan {
    assignments: BTreeMap<String, Placement>,
}

impl PreviousPlan {
    /// Creates an empty previous plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a prior assignment.
    pub fn with_assignment(
        mut self,
        child_id: impl Into<String>,
        teacher_id: impl Into<String>,
        slot: TimeSlot,
    ) -> Self {
        self.assignments
            .insert(child_id.into(), Placement::new(teacher_id, slot));
        self
    }

    /// The prior placement of a child, if any.
    pub fn get(&self, child_id: &str) -> Option<&Placement> {
        self.assignments.get(child_id)
    }

    /// Iterates prior assignments in child-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Placement)> {
        self.assignments.iter()
    }

    /// Whether no prior assignment is recorded.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Number of prior assignments.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }
}

/// A reported unmet soft goal or unassigned entity in a final plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation classification.
    pub kind: ViolationKind,
    /// IDs of the involved entities.
    pub subjects: Vec<String>,
    /// Human-readable description.
    pub detail: String,
}

/// Classification of violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A child received no session.
    UnassignedChild,
    /// A child was not assigned to its first-listed preferred teacher.
    PreferredTeacherUnmet,
    /// An early-preferring child was assigned an afternoon slot.
    EarlyPreferenceUnmet,
    /// A tandem's members do not share one joint session.
    TandemUnfulfilled,
    /// A teacher has two back-to-back sessions with no break.
    TeacherPauseViolated,
}

impl Violation {
    /// A child received no session.
    pub fn unassigned_child(child_id: impl Into<String>) -> Self {
        let child_id = child_id.into();
        Self {
            kind: ViolationKind::UnassignedChild,
            detail: format!("Child '{child_id}' could not be assigned a session"),
            subjects: vec![child_id],
        }
    }

    /// A child missed its first-listed preferred teacher.
    pub fn preferred_teacher_unmet(
        child_id: impl Into<String>,
        wanted: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let child_id = child_id.into();
        let wanted = wanted.into();
        let actual = actual.into();
        Self {
            kind: ViolationKind::PreferredTeacherUnmet,
            detail: format!(
                "Child '{child_id}' prefers teacher '{wanted}' but is assigned to '{actual}'"
            ),
            subjects: vec![child_id, wanted],
        }
    }

    /// An early-preferring child got an afternoon slot.
    pub fn early_preference_unmet(child_id: impl Into<String>, slot: &TimeSlot) -> Self {
        let child_id = child_id.into();
        Self {
            kind: ViolationKind::EarlyPreferenceUnmet,
            detail: format!("Child '{child_id}' prefers early slots but is assigned {slot}"),
            subjects: vec![child_id],
        }
    }

    /// A tandem was not scheduled as one joint session.
    pub fn tandem_unfulfilled(
        tandem_id: impl Into<String>,
        child_a: impl Into<String>,
        child_b: impl Into<String>,
    ) -> Self {
        let tandem_id = tandem_id.into();
        let child_a = child_a.into();
        let child_b = child_b.into();
        Self {
            kind: ViolationKind::TandemUnfulfilled,
            detail: format!(
                "Tandem '{tandem_id}' ('{child_a}' and '{child_b}') does not share a joint session"
            ),
            subjects: vec![tandem_id, child_a, child_b],
        }
    }

    /// Two consecutive sessions of a teacher are back-to-back.
    pub fn teacher_pause_violated(
        teacher_id: impl Into<String>,
        first: &TimeSlot,
        second: &TimeSlot,
    ) -> Self {
        let teacher_id = teacher_id.into();
        Self {
            kind: ViolationKind::TeacherPauseViolated,
            detail: format!(
                "Teacher '{teacher_id}' has back-to-back sessions at {} and {}",
                first, second
            ),
            subjects: vec![teacher_id],
        }
    }
}

/// Change classification of one child between two plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Same teacher and slot as before.
    Unchanged,
    /// Different teacher or slot.
    Changed,
    /// Newly assigned.
    Added,
    /// Previously assigned, now unassigned.
    Removed,
}

/// One child's change entry versus the previous plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// The child this entry describes.
    pub child_id: String,
    /// Change classification.
    pub kind: DiffKind,
    /// Prior placement, absent for `Added`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Placement>,
    /// New placement, absent for `Removed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Placement>,
}

/// A complete solve result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Assignments, sorted by child ID. Absent child = unassigned.
    pub assignments: Vec<Assignment>,
    /// Solution quality.
    pub status: SolveStatus,
    /// Wall-clock solve duration.
    pub runtime: Duration,
    /// Total objective score of the assignment.
    pub score: f64,
    /// Unmet soft goals and unassigned entities, in diagnosis order.
    pub violations: Vec<Violation>,
    /// Change report against the previous plan, in child-ID order.
    pub diff: Vec<DiffEntry>,
}

impl Plan {
    /// The assignment of a child, if any.
    pub fn assignment_for(&self, child_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.child_id == child_id)
    }

    /// Whether a child is assigned.
    pub fn is_assigned(&self, child_id: &str) -> bool {
        self.assignment_for(child_id).is_some()
    }

    /// All assignments of a teacher, in slot order.
    pub fn assignments_for_teacher(&self, teacher_id: &str) -> Vec<&Assignment> {
        let mut list: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.teacher_id == teacher_id)
            .collect();
        list.sort_by_key(|a| a.slot);
        list
    }

    /// Number of assigned children.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Converts this plan into a `PreviousPlan` for the next solve.
    pub fn to_previous(&self) -> PreviousPlan {
        let mut previous = PreviousPlan::new();
        for a in &self.assignments {
            previous = previous.with_assignment(a.child_id.clone(), a.teacher_id.clone(), a.slot);
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::Weekday;

    fn sample_plan() -> Plan {
        Plan {
            assignments: vec![
                Assignment::new("c1", "t1", TimeSlot::new(Weekday::Mon, 480)),
                Assignment::new("c2", "t1", TimeSlot::new(Weekday::Mon, 540)),
                Assignment::new("c3", "t2", TimeSlot::new(Weekday::Tue, 600)),
            ],
            status: SolveStatus::Optimal,
            runtime: Duration::from_millis(12),
            score: 8.0,
            violations: Vec::new(),
            diff: Vec::new(),
        }
    }

    #[test]
    fn test_assignment_lookup() {
        let plan = sample_plan();
        assert_eq!(plan.assignment_for("c1").unwrap().teacher_id, "t1");
        assert!(plan.assignment_for("c9").is_none());
        assert!(plan.is_assigned("c3"));
        assert_eq!(plan.assignment_count(), 3);
    }

    #[test]
    fn test_assignments_for_teacher_sorted() {
        let plan = sample_plan();
        let t1 = plan.assignments_for_teacher("t1");
        assert_eq!(t1.len(), 2);
        assert!(t1[0].slot < t1[1].slot);
    }

    #[test]
    fn test_to_previous_round_trip() {
        let plan = sample_plan();
        let prev = plan.to_previous();
        assert_eq!(prev.len(), 3);
        let p = prev.get("c2").unwrap();
        assert_eq!(p.teacher_id, "t1");
        assert_eq!(p.slot, TimeSlot::new(Weekday::Mon, 540));
    }

    #[test]
    fn test_assignment_serde_is_flat() {
        let a = Assignment::new("c1", "t1", TimeSlot::new(Weekday::Mon, 480));
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["child_id"], "c1");
        assert_eq!(json["teacher_id"], "t1");
        assert_eq!(json["weekday"], "Mon");
        assert_eq!(json["start_time"], "08:00");
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_value(SolveStatus::Optimal).unwrap(),
            "OPTIMAL"
        );
        assert_eq!(
            serde_json::to_value(SolveStatus::Feasible).unwrap(),
            "FEASIBLE"
        );
        assert_eq!(
            serde_json::to_value(SolveStatus::NoSolution).unwrap(),
            "NO_SOLUTION"
        );
    }

    #[test]
    fn test_violation_kind_serde_names() {
        assert_eq!(
            serde_json::to_value(ViolationKind::UnassignedChild).unwrap(),
            "unassigned_child"
        );
        assert_eq!(
            serde_json::to_value(ViolationKind::TandemUnfulfilled).unwrap(),
            "tandem_unfulfilled"
        );
    }

    #[test]
    fn test_violation_factories() {
        let v = Violation::unassigned_child("c1");
        assert_eq!(v.kind, ViolationKind::UnassignedChild);
        assert_eq!(v.subjects, vec!["c1"]);

        let v = Violation::preferred_teacher_unmet("c1", "t1", "t2");
        assert_eq!(v.kind, ViolationKind::PreferredTeacherUnmet);
        assert!(v.detail.contains("'t1'"));
        assert!(v.detail.contains("'t2'"));

        let v = Violation::tandem_unfulfilled("pair1", "c1", "c2");
        assert_eq!(v.subjects, vec!["pair1", "c1", "c2"]);
    }
}
