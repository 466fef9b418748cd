//! Branching order rules for the search.
//!
//! Decides which child the search branches on next. Composable rules in
//! the style of priority dispatching: each rule scores a child, lower
//! scores branch earlier, later rules break ties of earlier ones, and
//! the child ID is the final deterministic tie-break.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::fmt::Debug;
use std::sync::Arc;

use super::candidates::CandidateSpace;

/// Score returned by a branching rule.
///
/// Lower scores = branched earlier.
pub type RuleScore = f64;

/// A rule that scores children for branching priority.
pub trait BranchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "MRV").
    fn name(&self) -> &'static str;

    /// Scores a child; lower = branch earlier.
    fn evaluate(&self, child: usize, space: &CandidateSpace<'_>) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

/// Minimum remaining values: children with fewer legal candidates branch
/// earlier, so dead ends surface near the root.
#[derive(Debug, Clone, Copy)]
pub struct FewestCandidates;

impl BranchingRule for FewestCandidates {
    fn name(&self) -> &'static str {
        "MRV"
    }

    fn evaluate(&self, child: usize, space: &CandidateSpace<'_>) -> RuleScore {
        space.candidates[child].len() as f64
    }

    fn description(&self) -> &'static str {
        "Fewest legal candidates first"
    }
}

/// Tandem members branch before unpaired children, so joint sessions are
/// decided while both slots are still open.
#[derive(Debug, Clone, Copy)]
pub struct TandemMembersFirst;

impl BranchingRule for TandemMembersFirst {
    fn name(&self) -> &'static str {
        "TANDEM"
    }

    fn evaluate(&self, child: usize, space: &CandidateSpace<'_>) -> RuleScore {
        if space.tandem_of[child].is_some() {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Tandem members first"
    }
}

/// Children with the largest attainable static gain branch earlier,
/// improving early incumbents and bound tightness.
#[derive(Debug, Clone, Copy)]
pub struct HighestPotentialFirst;

impl BranchingRule for HighestPotentialFirst {
    fn name(&self) -> &'static str {
        "POTENTIAL"
    }

    fn evaluate(&self, child: usize, space: &CandidateSpace<'_>) -> RuleScore {
        -space.best_gain[child]
    }

    fn description(&self) -> &'static str {
        "Highest static score potential first"
    }
}

/// A composable branching-order engine.
///
/// Rules are applied in sequence: each later rule only breaks ties of
/// the earlier ones (within a small epsilon); the child ID breaks any
/// remaining tie, keeping the order fully deterministic.
#[derive(Clone)]
pub struct BranchOrdering {
    rules: Vec<Arc<dyn BranchingRule>>,
    epsilon: f64,
}

impl BranchOrdering {
    /// Creates an empty ordering (ID order only).
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            epsilon: 1e-9,
        }
    }

    /// Appends a rule; earlier rules dominate.
    pub fn with_rule<R: BranchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Child indices in branching order.
    pub fn sort_indices(&self, space: &CandidateSpace<'_>) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..space.child_count()).collect();
        indices.sort_by(|&a, &b| {
            for rule in &self.rules {
                let sa = rule.evaluate(a, space);
                let sb = rule.evaluate(b, space);
                if (sa - sb).abs() > self.epsilon {
                    return sa.total_cmp(&sb);
                }
            }
            space.children[a].id.cmp(&space.children[b].id)
        });
        indices
    }
}

impl Default for BranchOrdering {
    /// MRV, then tandem members, then score potential.
    fn default() -> Self {
        Self::new()
            .with_rule(FewestCandidates)
            .with_rule(TandemMembersFirst)
            .with_rule(HighestPotentialFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Child, Tandem, Teacher, WeightConfig};
    use crate::objective::Objective;
    use crate::slots::{SlotGrid, Weekday};

    #[test]
    fn test_fewest_candidates_first() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::zeroed();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 10 * 60)];
        let children = vec![
            Child::new("c1").with_window(Weekday::Mon, 8 * 60, 10 * 60),
            Child::new("c2").with_window(Weekday::Mon, 8 * 60, 8 * 60 + 45),
        ];
        let objective = Objective::new(&weights, &grid, None);
        let space = CandidateSpace::encode(&teachers, &children, &[], &grid, &objective);

        let order = BranchOrdering::new()
            .with_rule(FewestCandidates)
            .sort_indices(&space);
        // c2 has one candidate, c1 has several
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_id_breaks_remaining_ties() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::zeroed();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 10 * 60)];
        let children = vec![
            Child::new("c2").with_window(Weekday::Mon, 8 * 60, 10 * 60),
            Child::new("c1").with_window(Weekday::Mon, 8 * 60, 10 * 60),
        ];
        let objective = Objective::new(&weights, &grid, None);
        let space = CandidateSpace::encode(&teachers, &children, &[], &grid, &objective);

        let order = BranchOrdering::default().sort_indices(&space);
        assert_eq!(order, vec![1, 0]); // c1 before c2
    }

    #[test]
    fn test_tandem_members_branch_early() {
        let grid = SlotGrid::default();
        let weights = WeightConfig::zeroed();
        let teachers = vec![Teacher::new("t1").with_window(Weekday::Mon, 8 * 60, 12 * 60)];
        let children = vec![
            Child::new("c1").with_window(Weekday::Mon, 8 * 60, 12 * 60),
            Child::new("c2").with_window(Weekday::Mon, 8 * 60, 12 * 60),
            Child::new("c3").with_window(Weekday::Mon, 8 * 60, 12 * 60),
        ];
        let tandems = vec![Tandem::new("pair1", "c2", "c3")];
        let objective = Objective::new(&weights, &grid, None);
        let space = CandidateSpace::encode(&teachers, &children, &tandems, &grid, &objective);

        let order = BranchOrdering::new()
            .with_rule(TandemMembersFirst)
            .sort_indices(&space);
        assert_eq!(order, vec![1, 2, 0]);
    }
}
