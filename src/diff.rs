//! Change classification against a previous plan.
//!
//! Compares a new plan's assignments with the prior run's, classifying
//! every child present on either side as `unchanged`, `changed`,
//! `added`, or `removed`. Pure function; feeds the change report (the
//! stability *score* is the objective's preserve term, computed from the
//! same placements).

use std::collections::BTreeSet;

use crate::models::{DiffEntry, DiffKind, Plan, PreviousPlan};

/// Classifies every child present in either plan, in child-ID order.
pub fn diff(plan: &Plan, previous: &PreviousPlan) -> Vec<DiffEntry> {
    let mut ids: BTreeSet<&str> = previous.iter().map(|(id, _)| id.as_str()).collect();
    ids.extend(plan.assignments.iter().map(|a| a.child_id.as_str()));

    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        let old = previous.get(id).cloned();
        let new = plan.assignment_for(id).map(|a| a.placement());
        let entry = match (old, new) {
            (Some(old), Some(new)) if old == new => DiffEntry {
                child_id: id.to_string(),
                kind: DiffKind::Unchanged,
                old: Some(old),
                new: Some(new),
            },
            (Some(old), Some(new)) => DiffEntry {
                child_id: id.to_string(),
                kind: DiffKind::Changed,
                old: Some(old),
                new: Some(new),
            },
            (None, Some(new)) => DiffEntry {
                child_id: id.to_string(),
                kind: DiffKind::Added,
                old: None,
                new: Some(new),
            },
            (Some(old), None) => DiffEntry {
                child_id: id.to_string(),
                kind: DiffKind::Removed,
                old: Some(old),
                new: None,
            },
            (None, None) => continue,
        };
        entries.push(entry);
    }
    entries
}
