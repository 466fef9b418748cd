//! Violation diagnosis for a finished plan.
//!
//! Re-reads a final assignment against the same predicates the objective
//! scores with, and enumerates every unmet soft or structural goal as a
//! `Violation`. Pure function of the plan and the domain records; no
//! re-solving, no mutation, callable on any stored plan.
//!
//! # Ordering
//! Violations are reported kind by kind (unassigned children, unmet
//! teacher preferences, unmet early preferences, unfulfilled tandems,
//! missing teacher pauses), each kind sorted by subject ID.

use crate::models::{Child, Plan, Tandem, Teacher, Violation};
use crate::objective::Objective;

/// Slots starting at or after noon do not satisfy an early preference.
const MIDDAY_MIN: u16 = 12 * 60;

/// Enumerates every unmet goal of a finished plan.
pub fn explain(
    plan: &Plan,
    teachers: &[Teacher],
    children: &[Child],
    tandems: &[Tandem],
) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut sorted_children: Vec<&Child> = children.iter().collect();
    sorted_children.sort_by(|a, b| a.id.cmp(&b.id));

    // Unassigned children
    for child in &sorted_children {
        if !plan.is_assigned(&child.id) {
            violations.push(Violation::unassigned_child(child.id.clone()));
        }
    }

    // Preferred teacher unmet (top preference only, like the objective)
    for child in &sorted_children {
        let Some(assignment) = plan.assignment_for(&child.id) else {
            continue;
        };
        if let Some(wanted) = child.first_preference() {
            if wanted != assignment.teacher_id {
                violations.push(Violation::preferred_teacher_unmet(
                    child.id.clone(),
                    wanted,
                    assignment.teacher_id.clone(),
                ));
            }
        }
    }

    // Early preference unmet
    for child in &sorted_children {
        if !child.early_preferred {
            continue;
        }
        let Some(assignment) = plan.assignment_for(&child.id) else {
            continue;
        };
        if assignment.slot.start_min >= MIDDAY_MIN {
            violations.push(Violation::early_preference_unmet(
                child.id.clone(),
                &assignment.slot,
            ));
        }
    }

    // Unfulfilled tandems
    let mut sorted_tandems: Vec<&Tandem> = tandems.iter().collect();
    sorted_tandems.sort_by(|a, b| a.id.cmp(&b.id));
    for tandem in sorted_tandems {
        let a = plan.assignment_for(&tandem.child_a);
        let b = plan.assignment_for(&tandem.child_b);
        let fulfilled = matches!(
            (a, b),
            (Some(a), Some(b)) if a.teacher_id == b.teacher_id && a.slot == b.slot
        );
        if !fulfilled {
            violations.push(Violation::tandem_unfulfilled(
                tandem.id.clone(),
                tandem.child_a.clone(),
                tandem.child_b.clone(),
            ));
        }
    }

    // Back-to-back teacher sessions
    let mut sorted_teachers: Vec<&Teacher> = teachers.iter().collect();
    sorted_teachers.sort_by(|a, b| a.id.cmp(&b.id));
    for teacher in sorted_teachers {
        let sessions = plan.assignments_for_teacher(&teacher.id);
        // A joint tandem session appears twice; collapse duplicates.
        let mut slots: Vec<_> = sessions.iter().map(|a| a.slot).collect();
        slots.dedup();
        for pair in slots.windows(2) {
            if pair[0].weekday == pair[1].weekday
                && Objective::back_to_back(pair[0].start_min, pair[1].start_min)
            {
                violations.push(Violation::teacher_pause_violated(
                    teacher.id.clone(),
                    &pair[0],
                    &pair[1],
                ));
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, SolveStatus, ViolationKind};
    use crate::slots::{TimeSlot, Weekday};
    use std::time::Duration;

    fn plan_with(assignments: Vec<Assignment>) -> Plan {
        Plan {
            assignments,
            status: SolveStatus::Optimal,
            runtime: Duration::ZERO,
            score: 0.0,
            violations: Vec::new(),
            diff: Vec::new(),
        }
    }

    #[test]
    fn test_unassigned_children_sorted() {
        let plan = plan_with(vec![]);
        let children = vec![Child::new("c2"), Child::new("c1")];
        let violations = explain(&plan, &[], &children, &[]);

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].subjects, vec!["c1"]);
        assert_eq!(violations[1].subjects, vec!["c2"]);
        assert!(violations
            .iter()
            .all(|v| v.kind == ViolationKind::UnassignedChild));
    }

    #[test]
    fn test_preferred_teacher_unmet_top_preference_only() {
        let slot = TimeSlot::new(Weekday::Mon, 480);
        let plan = plan_with(vec![
            Assignment::new("c1", "t2", slot),
            Assignment::new("c2", "t2", TimeSlot::new(Weekday::Mon, 540)),
        ]);
        let children = vec![
            // Top preference t1 unmet
            Child::new("c1")
                .with_preferred_teacher("t1")
                .with_preferred_teacher("t2"),
            // Top preference t2 met
            Child::new("c2").with_preferred_teacher("t2"),
        ];
        let violations = explain(&plan, &[], &children, &[]);

        let unmet: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::PreferredTeacherUnmet)
            .collect();
        assert_eq!(unmet.len(), 1);
        assert_eq!(unmet[0].subjects, vec!["c1", "t1"]);
    }

    #[test]
    fn test_early_preference_unmet_at_noon() {
        let plan = plan_with(vec![
            Assignment::new("c1", "t1", TimeSlot::new(Weekday::Mon, 12 * 60)),
            Assignment::new("c2", "t1", TimeSlot::new(Weekday::Mon, 11 * 60)),
        ]);
        let children = vec![
            Child::new("c1").with_early_preference(true),
            Child::new("c2").with_early_preference(true),
        ];
        let violations = explain(&plan, &[], &children, &[]);

        let unmet: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::EarlyPreferenceUnmet)
            .collect();
        assert_eq!(unmet.len(), 1);
        assert_eq!(unmet[0].subjects, vec!["c1"]);
    }

    #[test]
    fn test_tandem_unfulfilled_when_split() {
        let plan = plan_with(vec![
            Assignment::new("c1", "t1", TimeSlot::new(Weekday::Mon, 480)),
            Assignment::new("c2", "t1", TimeSlot::new(Weekday::Mon, 540)),
        ]);
        let children = vec![Child::new("c1"), Child::new("c2")];
        let tandems = vec![Tandem::new("pair1", "c1", "c2")];
        let violations = explain(&plan, &[], &children, &tandems);

        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::TandemUnfulfilled
                && v.subjects == vec!["pair1", "c1", "c2"]));
    }

    #[test]
    fn test_tandem_fulfilled_reports_nothing() {
        let slot = TimeSlot::new(Weekday::Mon, 480);
        let plan = plan_with(vec![
            Assignment::new("c1", "t1", slot),
            Assignment::new("c2", "t1", slot),
        ]);
        let children = vec![Child::new("c1"), Child::new("c2")];
        let tandems = vec![Tandem::new("pair1", "c1", "c2")];
        let violations = explain(&plan, &[], &children, &tandems);

        assert!(!violations
            .iter()
            .any(|v| v.kind == ViolationKind::TandemUnfulfilled));
    }

    #[test]
    fn test_partially_assigned_tandem_is_unfulfilled() {
        let plan = plan_with(vec![Assignment::new(
            "c1",
            "t1",
            TimeSlot::new(Weekday::Mon, 480),
        )]);
        let children = vec![Child::new("c1"), Child::new("c2")];
        let tandems = vec![Tandem::new("pair1", "c1", "c2")];
        let violations = explain(&plan, &[], &children, &tandems);

        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::TandemUnfulfilled));
    }

    #[test]
    fn test_back_to_back_sessions_flagged() {
        let plan = plan_with(vec![
            Assignment::new("c1", "t1", TimeSlot::new(Weekday::Mon, 480)),
            Assignment::new("c2", "t1", TimeSlot::new(Weekday::Mon, 525)), // 08:45
            Assignment::new("c3", "t1", TimeSlot::new(Weekday::Mon, 600)), // gap
        ]);
        let teachers = vec![Teacher::new("t1")];
        let violations = explain(&plan, &teachers, &[], &[]);

        let pauses: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::TeacherPauseViolated)
            .collect();
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses[0].subjects, vec!["t1"]);
        assert!(pauses[0].detail.contains("08:00"));
        assert!(pauses[0].detail.contains("08:45"));
    }

    #[test]
    fn test_joint_tandem_session_is_one_session_for_pauses() {
        // c1+c2 share 08:00; the duplicate slot must not read as
        // back-to-back with itself or inflate pair counts.
        let slot = TimeSlot::new(Weekday::Mon, 480);
        let plan = plan_with(vec![
            Assignment::new("c1", "t1", slot),
            Assignment::new("c2", "t1", slot),
            Assignment::new("c3", "t1", TimeSlot::new(Weekday::Mon, 525)),
        ]);
        let teachers = vec![Teacher::new("t1")];
        let violations = explain(&plan, &teachers, &[], &[]);

        let pauses: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == ViolationKind::TeacherPauseViolated)
            .collect();
        assert_eq!(pauses.len(), 1);
    }

    #[test]
    fn test_kind_order_is_stable() {
        let plan = plan_with(vec![Assignment::new(
            "c1",
            "t2",
            TimeSlot::new(Weekday::Mon, 13 * 60),
        )]);
        let teachers = vec![Teacher::new("t2")];
        let children = vec![
            Child::new("c1")
                .with_preferred_teacher("t1")
                .with_early_preference(true),
            Child::new("c2"),
        ];
        let tandems = vec![Tandem::new("pair1", "c1", "c2")];
        let violations = explain(&plan, &teachers, &children, &tandems);

        let kinds: Vec<ViolationKind> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::UnassignedChild,
                ViolationKind::PreferredTeacherUnmet,
                ViolationKind::EarlyPreferenceUnmet,
                ViolationKind::TandemUnfulfilled,
            ]
        );
    }
}
