//! Constraint encoding: the feasible decision space.
//!
//! Translates domain records and the slot grid into the set of legal
//! atomic decisions: for each child, the `(teacher, slot)` pairs at which
//! a session may start with both parties free across all three occupied
//! raster positions. Structural exclusions (a teacher already committed
//! elsewhere) are decided by the search, not precomputed here.
//!
//! Sessions are tagged occupancy variants rather than boolean flags, so
//! the hard-constraint checks stay total over cases: a session holds one
//! child, or a declared tandem pair.

use std::collections::HashMap;

use crate::models::{Child, Tandem, Teacher};
use crate::objective::Objective;
use crate::slots::{SlotGrid, TimeSlot, SESSION_MIN};

/// One legal atomic decision: a child may start a session here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Teacher index into the encoded teacher slice.
    pub teacher: usize,
    /// Session start slot.
    pub slot: TimeSlot,
    /// Static per-child score gain of this placement (preferred +
    /// earliness + preserve terms).
    pub gain: f64,
}

/// Who occupies a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupants {
    /// One child.
    Single(usize),
    /// A declared tandem pair.
    Tandem(usize, usize),
}

impl Occupants {
    /// Child indices in this session.
    pub fn children(&self) -> Vec<usize> {
        match *self {
            Occupants::Single(c) => vec![c],
            Occupants::Tandem(a, b) => vec![a, b],
        }
    }

    /// Number of occupants (1 or 2).
    pub fn count(&self) -> usize {
        match self {
            Occupants::Single(_) => 1,
            Occupants::Tandem(_, _) => 2,
        }
    }
}

/// A committed session of the search state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Session {
    /// Teacher index.
    pub teacher: usize,
    /// Start slot.
    pub slot: TimeSlot,
    /// Occupancy variant.
    pub occupants: Occupants,
}

impl Session {
    /// Whether two sessions of the same teacher share an occupied raster
    /// position.
    pub fn overlaps(&self, other: &Session) -> bool {
        self.teacher == other.teacher
            && self.slot.weekday == other.slot.weekday
            && self.slot.start_min.abs_diff(other.slot.start_min) < SESSION_MIN
    }
}

/// The encoded decision space of one solve invocation.
pub struct CandidateSpace<'a> {
    /// Teachers, in input order.
    pub teachers: &'a [Teacher],
    /// Children, in input order.
    pub children: &'a [Child],
    /// Tandems, in input order.
    pub tandems: &'a [Tandem],
    /// Legal candidates per child index, in exploration order
    /// (descending static gain, ties by teacher ID then slot).
    pub candidates: Vec<Vec<Candidate>>,
    /// Tandem partner per child index.
    pub partner: Vec<Option<usize>>,
    /// Tandem index per child index.
    pub tandem_of: Vec<Option<usize>>,
    /// Member child indices per tandem index (None if a member is
    /// unknown; rejected by validation before solving).
    pub tandem_members: Vec<Option<(usize, usize)>>,
    /// Maximum static gain per child index (0.0 when no candidate).
    pub best_gain: Vec<f64>,
    teacher_index: HashMap<&'a str, usize>,
    child_index: HashMap<&'a str, usize>,
}

impl<'a> CandidateSpace<'a> {
    /// Encodes the legal decision space.
    pub fn encode(
        teachers: &'a [Teacher],
        children: &'a [Child],
        tandems: &'a [Tandem],
        grid: &SlotGrid,
        objective: &Objective<'_>,
    ) -> Self {
        let teacher_index: HashMap<&str, usize> = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        let child_index: HashMap<&str, usize> = children
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        // Tandem wiring
        let mut partner = vec![None; children.len()];
        let mut tandem_of = vec![None; children.len()];
        let mut tandem_members = Vec::with_capacity(tandems.len());
        for (ti, tandem) in tandems.iter().enumerate() {
            let a = child_index.get(tandem.child_a.as_str()).copied();
            let b = child_index.get(tandem.child_b.as_str()).copied();
            if let (Some(a), Some(b)) = (a, b) {
                partner[a] = Some(b);
                partner[b] = Some(a);
                tandem_of[a] = Some(ti);
                tandem_of[b] = Some(ti);
                tandem_members.push(Some((a, b)));
            } else {
                tandem_members.push(None);
            }
        }

        // Session starts each teacher actually offers
        let teacher_starts: Vec<Vec<TimeSlot>> = teachers
            .iter()
            .map(|t| t.availability.start_slots(grid))
            .collect();

        let mut candidates = Vec::with_capacity(children.len());
        let mut best_gain = Vec::with_capacity(children.len());
        for (ci, child) in children.iter().enumerate() {
            let mut list = Vec::new();
            for (ti, starts) in teacher_starts.iter().enumerate() {
                for slot in starts {
                    if child.availability.allows_start(grid, slot) {
                        let gain = objective.placement_gain(child, &teachers[ti].id, slot);
                        list.push(Candidate {
                            teacher: ti,
                            slot: *slot,
                            gain,
                        });
                    }
                }
            }

            // Exploration order: best static gain first; within equal
            // gain the tandem's preferred teacher, then teacher ID, then
            // slot. Final tie-breaking between equal-score solutions is
            // handled by the incumbent comparison, not here.
            let hinted = tandem_of[ci]
                .and_then(|ti| tandems[ti].preferred_teacher.as_deref())
                .and_then(|id| teacher_index.get(id).copied());
            list.sort_by(|a, b| {
                b.gain
                    .total_cmp(&a.gain)
                    .then_with(|| {
                        let a_hint = Some(a.teacher) == hinted;
                        let b_hint = Some(b.teacher) == hinted;
                        b_hint.cmp(&a_hint)
                    })
                    .then_with(|| teachers[a.teacher].id.cmp(&teachers[b.teacher].id))
                    .then_with(|| a.slot.cmp(&b.slot))
            });

            best_gain.push(
                list.iter()
                    .map(|c| c.gain)
                    .fold(0.0, f64::max),
            );
            candidates.push(list);
        }

        Self {
            teachers,
            children,
            tandems,
            candidates,
            partner,
            tandem_of,
            tandem_members,
            best_gain,
            teacher_index,
            child_index,
        }
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Total number of legal decisions.
    pub fn candidate_count(&self) -> usize {
        self.candidates.iter().map(Vec::len).sum()
    }

    /// Child index by ID.
    pub fn child_idx(&self, id: &str) -> Option<usize> {
        self.child_index.get(id).copied()
    }

    /// Teacher index by ID.
    pub fn teacher_idx(&self, id: &str) -> Option<usize> {
        self.teacher_index.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeightConfig;
    use crate::slots::Weekday;

    fn encode_space<'a>(
        teachers: &'a [Teacher],
        children: &'a [Child],
        tandems: &'a [Tandem],
        weights: &'a WeightConfig,
        grid: &'a SlotGrid,
    ) -> CandidateSpace<'a> {
        let objective = Objective::new(weights, grid, None);
        CandidateSpace::encode(teachers, children, tandems, grid, &objective)
    }

    #[test]
    fn test_candidates_require_both_parties_free() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::default();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 9 * 60)];
        // Child free only for the first of the teacher's two start slots
        let children = vec![Child::new("c1").with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45)];

        let space = encode_space(&teachers, &children, &[], &weights, &grid);
        assert_eq!(space.candidates[0].len(), 1);
        assert_eq!(space.candidates[0][0].slot, TimeSlot::new(Weekday::Mon, 480));
        assert_eq!(space.candidate_count(), 1);
    }

    #[test]
    fn test_no_overlap_means_no_candidates() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::default();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 10 * 60)];
        let children = vec![Child::new("c1").with_window(Weekday::Tue, 8 * 60, 10 * 60)];

        let space = encode_space(&teachers, &children, &[], &weights, &grid);
        assert!(space.candidates[0].is_empty());
        assert_eq!(space.best_gain[0], 0.0);
    }

    #[test]
    fn test_candidate_order_prefers_higher_gain() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::default();
        let teachers = vec![
            Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 9 * 60),
            Teacher::new("t2").with_window(Weekday::Mon, 8 * 60, 9 * 60),
        ];
        let children = vec![Child::new("c1")
            .with_window(Weekday::Mon, 8 * 60, 9 * 60)
            .with_preferred_teacher("t2")];

        let space = encode_space(&teachers, &children, &[], &weights, &grid);
        // Preferred teacher t2 carries the extra gain and is explored first
        assert_eq!(space.candidates[0][0].teacher, 1);
        assert_eq!(space.best_gain[0], 5.0);
    }

    #[test]
    fn test_equal_gain_orders_by_teacher_then_slot() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::zeroed();
        let teachers = vec![
            Teacher::new("t2").with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45),
            Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45),
        ];
        let children = vec![Child::new("c1").with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45)];

        let space = encode_space(&teachers, &children, &[], &weights, &grid);
        let ids: Vec<&str> = space.candidates[0]
            .iter()
            .map(|c| space.teachers[c.teacher].id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_tandem_wiring() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::default();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 10 * 60)];
        let children = vec![
            Child::new("c1").with_window(Weekday::Mon, 8 * 60, 10 * 60),
            Child::new("c2").with_window(Weekday::Mon, 8 * 60, 10 * 60),
            Child::new("c3").with_window(Weekday::Mon, 8 * 60, 10 * 60),
        ];
        let tandems = vec![Tandem::new("pair1", "c1", "c2")];

        let space = encode_space(&teachers, &children, &tandems, &weights, &grid);
        assert_eq!(space.partner[0], Some(1));
        assert_eq!(space.partner[1], Some(0));
        assert_eq!(space.partner[2], None);
        assert_eq!(space.tandem_of[0], Some(0));
        assert_eq!(space.tandem_members[0], Some((0, 1)));
    }

    #[test]
    fn test_session_overlap() {
        let mon8 = TimeSlot::new(Weekday::Mon, 480);
        let mon830 = TimeSlot::new(Weekday::Mon, 510);
        let mon9 = TimeSlot::new(Weekday::Mon, 540);
        let tue8 = TimeSlot::new(Weekday::Tue, 480);
        let s = |slot| Session {
            teacher: 0,
            slot,
            occupants: Occupants::Single(0),
        };

        assert!(s(mon8).overlaps(&s(mon830)));
        assert!(!s(mon8).overlaps(&s(mon9)));
        assert!(!s(mon8).overlaps(&s(tue8)));
        // Different teacher never overlaps
        let other = Session {
            teacher: 1,
            slot: mon8,
            occupants: Occupants::Single(1),
        };
        assert!(!s(mon8).overlaps(&other));
    }

    #[test]
    fn test_occupants_exhaustive() {
        assert_eq!(Occupants::Single(3).children(), vec![3]);
        assert_eq!(Occupants::Tandem(1, 2).children(), vec![1, 2]);
        assert_eq!(Occupants::Single(0).count(), 1);
        assert_eq!(Occupants::Tandem(0, 1).count(), 2);
    }
}
