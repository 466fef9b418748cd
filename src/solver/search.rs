//! Branch-and-bound search over partial assignments.
//!
//! Depth-first exploration in a fixed child order. Each child branches
//! over its legal candidates (opening a session or joining the tandem
//! partner's) and finally over staying unassigned. An admissible upper
//! bound prunes subtrees that cannot beat the incumbent on the
//! `(assigned children, score)` objective tiers.
//!
//! A greedy opening pass (plus a few seeded shuffled restarts) seeds the
//! incumbent before the exact search, so pruning bites early and a
//! time-limited run still returns a useful assignment.
//!
//! Exhausting the tree proves optimality. The deadline and the cancel
//! flag are checked every 1024 nodes; stopping returns the best
//! incumbent found so far.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::candidates::{Candidate, CandidateSpace, Occupants, Session};
use super::{CancelToken, SearchObserver};
use crate::objective::Objective;
use crate::slots::{TimeSlot, Weekday, SESSION_MIN};

/// Tolerance for score comparisons.
const SCORE_EPS: f64 = 1e-9;

/// Deadline/cancellation is checked when `nodes & MASK == 0`.
const STOP_CHECK_MASK: u64 = 0x3FF;

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Search space exhausted; the incumbent is optimal.
    Exhausted,
    /// Deadline reached before exhausting the tree.
    TimeLimit,
    /// Cooperative cancellation was requested.
    Cancelled,
}

/// Observational snapshot emitted on incumbent improvements.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// Time since the search started.
    pub elapsed: Duration,
    /// Score of the new incumbent.
    pub best_score: f64,
    /// Assigned children in the new incumbent.
    pub assigned: usize,
    /// Nodes explored so far.
    pub nodes: u64,
}

/// Best assignment found by one search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Sessions of the incumbent, in teacher-then-slot order.
    pub sessions: Vec<Session>,
    /// Number of assigned children.
    pub assigned: usize,
    /// Incumbent score.
    pub score: f64,
    /// Why the search stopped.
    pub termination: Termination,
    /// Nodes explored.
    pub nodes: u64,
}

/// Runtime controls of one search run.
pub struct SearchParams<'a> {
    /// Absolute deadline; `None` runs until exhaustion.
    pub deadline: Option<Instant>,
    /// Cooperative cancellation flag.
    pub cancel: CancelToken,
    /// Seed of the shuffled greedy restarts.
    pub seed: u64,
    /// Number of shuffled greedy restarts.
    pub restarts: u32,
    /// Improvement observer, if any.
    pub observer: Option<&'a dyn SearchObserver>,
}

/// A reversible branching decision.
enum Decision {
    /// A new session was opened for a child.
    Open {
        child: usize,
        delta: f64,
    },
    /// A child joined its tandem partner's session.
    Join {
        child: usize,
        session_idx: usize,
        delta: f64,
    },
}

impl Decision {
    fn delta(&self) -> f64 {
        match self {
            Decision::Open { delta, .. } | Decision::Join { delta, .. } => *delta,
        }
    }
}

/// The incumbent: best complete assignment seen so far.
struct Incumbent {
    sessions: Vec<Session>,
    assigned: usize,
    score: f64,
    key: Vec<(u32, u32, TimeSlot)>,
}

/// Depth-first branch-and-bound engine.
pub struct SearchEngine<'a> {
    space: &'a CandidateSpace<'a>,
    objective: &'a Objective<'a>,
    order: Vec<usize>,
    deadline: Option<Instant>,
    cancel: CancelToken,
    seed: u64,
    restarts: u32,
    observer: Option<&'a dyn SearchObserver>,

    started: Instant,
    nodes: u64,
    stopped: Option<Termination>,

    // Search state
    sessions: Vec<Session>,
    session_at: HashMap<(usize, TimeSlot), usize>,
    day_starts: HashMap<(usize, Weekday), Vec<u16>>,
    placed: Vec<Option<usize>>,
    tandem_done: Vec<bool>,
    assigned: usize,
    score: f64,

    // Precomputed
    pos_in_order: Vec<usize>,
    suffix_assignable: Vec<usize>,
    suffix_best_gain: Vec<f64>,
    id_rank: Vec<u32>,
    teacher_rank: Vec<u32>,

    best: Incumbent,
}

impl<'a> SearchEngine<'a> {
    /// Creates an engine for one run.
    pub fn new(
        space: &'a CandidateSpace<'a>,
        objective: &'a Objective<'a>,
        order: Vec<usize>,
        params: SearchParams<'a>,
    ) -> Self {
        let n = space.child_count();

        let mut pos_in_order = vec![0; n];
        for (depth, &child) in order.iter().enumerate() {
            pos_in_order[child] = depth;
        }

        let mut suffix_assignable = vec![0; n + 1];
        let mut suffix_best_gain = vec![0.0; n + 1];
        for depth in (0..n).rev() {
            let child = order[depth];
            let assignable = usize::from(!space.candidates[child].is_empty());
            suffix_assignable[depth] = suffix_assignable[depth + 1] + assignable;
            suffix_best_gain[depth] = suffix_best_gain[depth + 1] + space.best_gain[child];
        }

        let id_rank = rank_by(n, |a, b| space.children[a].id.cmp(&space.children[b].id));
        let teacher_rank = rank_by(space.teachers.len(), |a, b| {
            space.teachers[a].id.cmp(&space.teachers[b].id)
        });

        Self {
            space,
            objective,
            order,
            deadline: params.deadline,
            cancel: params.cancel,
            seed: params.seed,
            restarts: params.restarts,
            observer: params.observer,
            started: Instant::now(),
            nodes: 0,
            stopped: None,
            sessions: Vec::new(),
            session_at: HashMap::new(),
            day_starts: HashMap::new(),
            placed: vec![None; n],
            tandem_done: vec![false; space.tandems.len()],
            assigned: 0,
            score: 0.0,
            pos_in_order,
            suffix_assignable,
            suffix_best_gain,
            id_rank,
            teacher_rank,
            // The all-unassigned assignment is always feasible.
            best: Incumbent {
                sessions: Vec::new(),
                assigned: 0,
                score: 0.0,
                key: Vec::new(),
            },
        }
    }

    /// Runs the search and returns the best assignment found.
    pub fn run(&mut self) -> SearchOutcome {
        self.started = Instant::now();

        // Greedy opening: deterministic order, then seeded shuffles.
        let base = self.order.clone();
        self.greedy(&base);
        let mut rng = SmallRng::seed_from_u64(self.seed);
        for _ in 0..self.restarts {
            let mut shuffled = base.clone();
            shuffled.shuffle(&mut rng);
            self.greedy(&shuffled);
        }

        self.dfs(0);

        let termination = self.stopped.unwrap_or(Termination::Exhausted);
        let mut sessions = self.best.sessions.clone();
        sessions.sort_by(|a, b| {
            self.teacher_rank[a.teacher]
                .cmp(&self.teacher_rank[b.teacher])
                .then_with(|| a.slot.cmp(&b.slot))
        });
        debug!(
            assigned = self.best.assigned,
            score = self.best.score,
            nodes = self.nodes,
            ?termination,
            "search finished"
        );
        SearchOutcome {
            sessions,
            assigned: self.best.assigned,
            score: self.best.score,
            termination,
            nodes: self.nodes,
        }
    }

    fn dfs(&mut self, depth: usize) {
        if self.check_stop() {
            return;
        }
        if depth == self.order.len() {
            self.offer_incumbent();
            return;
        }
        if self.pruned(depth) {
            return;
        }

        let child = self.order[depth];
        for ci in 0..self.space.candidates[child].len() {
            let cand = self.space.candidates[child][ci];
            if let Some(decision) = self.try_place(child, &cand) {
                self.dfs(depth + 1);
                self.undo(decision);
            }
            if self.stopped.is_some() {
                return;
            }
        }

        // Unassigned branch, explored last: dominated by the coverage
        // tier but required for completeness.
        self.dfs(depth + 1);
    }

    /// Greedy opening: assign each child the feasible candidate with the
    /// largest immediate score delta, then record the result as an
    /// incumbent and clear the state.
    fn greedy(&mut self, order: &[usize]) {
        for &child in order {
            let mut best: Option<(usize, f64)> = None;
            for ci in 0..self.space.candidates[child].len() {
                let cand = self.space.candidates[child][ci];
                if let Some(decision) = self.try_place(child, &cand) {
                    let delta = decision.delta();
                    self.undo(decision);
                    if best.map_or(true, |(_, d)| delta > d + SCORE_EPS) {
                        best = Some((ci, delta));
                    }
                }
            }
            if let Some((ci, _)) = best {
                let cand = self.space.candidates[child][ci];
                let _ = self.try_place(child, &cand);
            }
        }
        self.offer_incumbent();
        self.clear_state();
    }

    /// Attempts to place a child at a candidate. Returns the reversible
    /// decision on success, `None` if a hard constraint forbids it.
    fn try_place(&mut self, child: usize, cand: &Candidate) -> Option<Decision> {
        // Joining an existing session is legal only for the declared
        // tandem partner at the identical (teacher, slot).
        if let Some(&idx) = self.session_at.get(&(cand.teacher, cand.slot)) {
            let Occupants::Single(partner) = self.sessions[idx].occupants else {
                return None;
            };
            if self.space.partner[child] != Some(partner) {
                return None;
            }
            let tandem_idx = self.space.tandem_of[child]?;
            let delta = cand.gain + self.objective.tandem_gain();
            self.sessions[idx].occupants = Occupants::Tandem(partner, child);
            self.tandem_done[tandem_idx] = true;
            self.placed[child] = Some(idx);
            self.assigned += 1;
            self.score += delta;
            return Some(Decision::Join {
                child,
                session_idx: idx,
                delta,
            });
        }

        let objective = self.objective;
        let starts = self
            .day_starts
            .entry((cand.teacher, cand.slot.weekday))
            .or_default();
        if starts
            .iter()
            .any(|&s| s.abs_diff(cand.slot.start_min) < SESSION_MIN)
        {
            return None;
        }
        let pause_before = objective.pause_gain_for_day(starts);
        let pos = match starts.binary_search(&cand.slot.start_min) {
            Ok(pos) | Err(pos) => pos,
        };
        starts.insert(pos, cand.slot.start_min);
        let pause_after = objective.pause_gain_for_day(starts);

        let session_idx = self.sessions.len();
        self.sessions.push(Session {
            teacher: cand.teacher,
            slot: cand.slot,
            occupants: Occupants::Single(child),
        });
        self.session_at.insert((cand.teacher, cand.slot), session_idx);
        self.placed[child] = Some(session_idx);
        self.assigned += 1;
        let delta = cand.gain + (pause_after - pause_before);
        self.score += delta;
        Some(Decision::Open { child, delta })
    }

    /// Reverts a decision. Sessions open and close LIFO, so an opened
    /// session is always the last one.
    fn undo(&mut self, decision: Decision) {
        match decision {
            Decision::Open { child, delta } => {
                if let Some(session) = self.sessions.pop() {
                    self.session_at.remove(&(session.teacher, session.slot));
                    if let Some(starts) = self
                        .day_starts
                        .get_mut(&(session.teacher, session.slot.weekday))
                    {
                        if let Ok(pos) = starts.binary_search(&session.slot.start_min) {
                            starts.remove(pos);
                        }
                    }
                }
                self.placed[child] = None;
                self.assigned -= 1;
                self.score -= delta;
            }
            Decision::Join {
                child,
                session_idx,
                delta,
            } => {
                if let Occupants::Tandem(a, b) = self.sessions[session_idx].occupants {
                    let partner = if a == child { b } else { a };
                    self.sessions[session_idx].occupants = Occupants::Single(partner);
                }
                if let Some(tandem_idx) = self.space.tandem_of[child] {
                    self.tandem_done[tandem_idx] = false;
                }
                self.placed[child] = None;
                self.assigned -= 1;
                self.score -= delta;
            }
        }
    }

    fn clear_state(&mut self) {
        self.sessions.clear();
        self.session_at.clear();
        self.day_starts.clear();
        self.placed.fill(None);
        self.tandem_done.fill(false);
        self.assigned = 0;
        self.score = 0.0;
    }

    /// Admissible upper bound check for the subtree below `depth`.
    ///
    /// Optimistic completion: every remaining assignable child gets its
    /// best static gain plus one pause bonus, and every still-open
    /// tandem is fulfilled. Prunes only strictly worse subtrees, so
    /// equal-score solutions stay reachable for the lexicographic
    /// tie-break.
    fn pruned(&self, depth: usize) -> bool {
        let ub_count = self.assigned + self.suffix_assignable[depth];
        if ub_count < self.best.assigned {
            return true;
        }
        let weights = self.objective.weights();
        let ub_score = self.score
            + self.suffix_best_gain[depth]
            + self.objective.tandem_gain() * self.open_tandems(depth) as f64
            + weights.teacher_pause_respected * self.suffix_assignable[depth] as f64;
        ub_count == self.best.assigned && ub_score < self.best.score - SCORE_EPS
    }

    /// Tandems that could still end up fulfilled below `depth`.
    fn open_tandems(&self, depth: usize) -> usize {
        self.space
            .tandem_members
            .iter()
            .enumerate()
            .filter(|&(tandem_idx, members)| {
                if self.tandem_done[tandem_idx] {
                    return false;
                }
                match members {
                    Some((a, b)) => {
                        self.pos_in_order[*a] >= depth || self.pos_in_order[*b] >= depth
                    }
                    None => false,
                }
            })
            .count()
    }

    /// Offers the current complete assignment as incumbent.
    ///
    /// Replacement order: more children assigned, then higher score,
    /// then the lexicographically smaller sorted assignment list. This
    /// makes the reported optimum deterministic across runs.
    fn offer_incumbent(&mut self) {
        let more_assigned = self.assigned > self.best.assigned;
        let equal_assigned = self.assigned == self.best.assigned;
        let better_score = equal_assigned && self.score > self.best.score + SCORE_EPS;
        let tied_score = equal_assigned && (self.score - self.best.score).abs() <= SCORE_EPS;
        if !(more_assigned || better_score || tied_score) {
            return;
        }
        let key = self.build_key();
        if !more_assigned && !better_score && key >= self.best.key {
            return;
        }
        self.best = Incumbent {
            sessions: self.sessions.clone(),
            assigned: self.assigned,
            score: self.score,
            key,
        };
        let progress = SearchProgress {
            elapsed: self.started.elapsed(),
            best_score: self.best.score,
            assigned: self.best.assigned,
            nodes: self.nodes,
        };
        debug!(
            score = progress.best_score,
            assigned = progress.assigned,
            nodes = progress.nodes,
            "incumbent improved"
        );
        if let Some(observer) = self.observer {
            observer.on_improvement(&progress);
        }
    }

    /// Sorted assignment list of the current state, as comparison key:
    /// `(child rank, teacher rank, slot)` per assigned child.
    fn build_key(&self) -> Vec<(u32, u32, TimeSlot)> {
        let mut key = Vec::with_capacity(self.assigned);
        for child in 0..self.space.child_count() {
            if let Some(idx) = self.placed[child] {
                let session = self.sessions[idx];
                key.push((
                    self.id_rank[child],
                    self.teacher_rank[session.teacher],
                    session.slot,
                ));
            }
        }
        key.sort_unstable();
        key
    }

    /// Counts a node and periodically checks deadline and cancellation.
    fn check_stop(&mut self) -> bool {
        if self.stopped.is_some() {
            return true;
        }
        self.nodes += 1;
        if self.nodes & STOP_CHECK_MASK == 0 {
            if self.cancel.is_cancelled() {
                self.stopped = Some(Termination::Cancelled);
            } else if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.stopped = Some(Termination::TimeLimit);
                }
            }
        }
        self.stopped.is_some()
    }
}

/// Ranks `0..n` by a comparator: result[i] is the rank of index i.
fn rank_by(n: usize, cmp: impl Fn(usize, usize) -> std::cmp::Ordering) -> Vec<u32> {
    let mut sorted: Vec<usize> = (0..n).collect();
    sorted.sort_by(|&a, &b| cmp(a, b));
    let mut rank = vec![0u32; n];
    for (r, &i) in sorted.iter().enumerate() {
        rank[i] = r as u32;
    }
    rank
}
