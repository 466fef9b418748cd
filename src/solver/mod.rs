//! The solver facade.
//!
//! Orchestrates one solve invocation: validate → encode → search →
//! verify → diagnose → assemble. The search backend sits behind the
//! narrow `SearchEngine` interface, so the branching strategy can change
//! without touching the encoder, the objective, or any caller.
//!
//! # Concurrency
//!
//! `Solver::solve` is synchronous and CPU-bound; run it on a worker
//! thread to keep interactive threads responsive. `CancelToken` is a
//! cloneable flag the search checks cooperatively, not only at the
//! deadline. Each invocation works on its own state; nothing is shared
//! between solves.

pub mod candidates;
pub mod order;
pub mod search;

pub use candidates::{Candidate, CandidateSpace, Occupants, Session};
pub use order::{
    BranchOrdering, BranchingRule, FewestCandidates, HighestPotentialFirst, TandemMembersFirst,
};
pub use search::{SearchOutcome, SearchProgress, Termination};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::models::{
    Assignment, Child, Plan, PreviousPlan, SolveStatus, Tandem, Teacher, WeightConfig,
};
use crate::objective::Objective;
use crate::slots::{SlotGrid, TimeSlot, Weekday, SESSION_MIN};
use crate::validation::{validate_input, ValidationError};
use search::{SearchEngine, SearchParams};

/// Errors of one solve invocation.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Inputs are structurally invalid; no search was attempted.
    #[error("input validation failed ({} problem(s))", .0.len())]
    Invalid(Vec<ValidationError>),
    /// The engine produced an assignment violating a hard constraint.
    /// A defect, never silently swallowed.
    #[error("internal solver fault: {0}")]
    Internal(String),
}

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Observer of incumbent improvements.
///
/// Observational only: notifications never alter the search outcome.
pub trait SearchObserver: Send + Sync {
    /// Called whenever the incumbent improves.
    fn on_improvement(&self, progress: &SearchProgress);
}

/// Input container of one solve invocation.
#[derive(Debug, Clone)]
pub struct SolveRequest {
    /// Teachers offering capacity.
    pub teachers: Vec<Teacher>,
    /// Children to assign.
    pub children: Vec<Child>,
    /// Declared tandem pairs.
    pub tandems: Vec<Tandem>,
    /// Soft-goal weights.
    pub weights: WeightConfig,
    /// Prior plan for the stability goal and the change report.
    pub previous: Option<PreviousPlan>,
    /// The weekly slot grid.
    pub grid: SlotGrid,
}

impl SolveRequest {
    /// Creates a request with default weights and grid.
    pub fn new(teachers: Vec<Teacher>, children: Vec<Child>) -> Self {
        Self {
            teachers,
            children,
            tandems: Vec::new(),
            weights: WeightConfig::default(),
            previous: None,
            grid: SlotGrid::default(),
        }
    }

    /// Sets the tandems.
    pub fn with_tandems(mut self, tandems: Vec<Tandem>) -> Self {
        self.tandems = tandems;
        self
    }

    /// Sets the weights.
    pub fn with_weights(mut self, weights: WeightConfig) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the previous plan.
    pub fn with_previous(mut self, previous: PreviousPlan) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Sets the slot grid.
    pub fn with_grid(mut self, grid: SlotGrid) -> Self {
        self.grid = grid;
        self
    }
}

/// Runtime options of the solver.
#[derive(Clone)]
pub struct SolveOptions {
    /// Wall-clock budget; the best incumbent is returned afterwards.
    pub time_limit: Duration,
    /// Seed of the shuffled greedy restarts.
    pub seed: u64,
    /// Number of shuffled greedy restarts.
    pub restarts: u32,
    /// Cooperative cancellation flag.
    pub cancel: CancelToken,
    observer: Option<Arc<dyn SearchObserver>>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            seed: 42,
            restarts: 4,
            cancel: CancelToken::new(),
            observer: None,
        }
    }
}

impl SolveOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the restart seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of shuffled greedy restarts.
    pub fn with_restarts(mut self, restarts: u32) -> Self {
        self.restarts = restarts;
        self
    }

    /// Sets the cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets the improvement observer.
    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl fmt::Debug for SolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveOptions")
            .field("time_limit", &self.time_limit)
            .field("seed", &self.seed)
            .field("restarts", &self.restarts)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// The session planning solver.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolveOptions,
}

impl Solver {
    /// Creates a solver with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    /// The solver's options.
    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Solves one invocation.
    ///
    /// Fails with `SolveError::Invalid` before searching when inputs are
    /// structurally broken; otherwise always returns a `Plan`, even when
    /// no child can be assigned (`status = NO_SOLUTION`). Timeout and
    /// cancellation are normal returns, never errors.
    pub fn solve(&self, request: &SolveRequest) -> Result<Plan, SolveError> {
        let started = Instant::now();

        validate_input(
            &request.teachers,
            &request.children,
            &request.tandems,
            &request.weights,
            &request.grid,
        )
        .map_err(SolveError::Invalid)?;

        let objective = Objective::new(&request.weights, &request.grid, request.previous.as_ref());
        let space = CandidateSpace::encode(
            &request.teachers,
            &request.children,
            &request.tandems,
            &request.grid,
            &objective,
        );
        info!(
            teachers = request.teachers.len(),
            children = request.children.len(),
            tandems = request.tandems.len(),
            candidates = space.candidate_count(),
            "solve started"
        );

        let order = BranchOrdering::default().sort_indices(&space);
        let params = SearchParams {
            deadline: started.checked_add(self.options.time_limit),
            cancel: self.options.cancel.clone(),
            seed: self.options.seed,
            restarts: self.options.restarts,
            observer: self.options.observer.as_deref(),
        };
        let mut engine = SearchEngine::new(&space, &objective, order, params);
        let outcome = engine.run();

        let assignments = assignments_from_sessions(&outcome.sessions, &space);
        verify_hard_constraints(&assignments, request).map_err(SolveError::Internal)?;

        let status = if outcome.assigned == 0 {
            SolveStatus::NoSolution
        } else {
            match outcome.termination {
                Termination::Exhausted => SolveStatus::Optimal,
                Termination::TimeLimit | Termination::Cancelled => SolveStatus::Feasible,
            }
        };

        let breakdown = objective.breakdown(&assignments, &request.children, &request.tandems);
        let mut plan = Plan {
            assignments,
            status,
            runtime: started.elapsed(),
            score: breakdown.total(),
            violations: Vec::new(),
            diff: Vec::new(),
        };
        let violations = crate::analysis::explain(
            &plan,
            &request.teachers,
            &request.children,
            &request.tandems,
        );
        plan.violations = violations;
        if let Some(previous) = &request.previous {
            let entries = crate::diff::diff(&plan, previous);
            plan.diff = entries;
        }

        info!(
            status = ?plan.status,
            score = plan.score,
            assigned = plan.assignment_count(),
            violations = plan.violations.len(),
            nodes = outcome.nodes,
            runtime_ms = plan.runtime.as_millis() as u64,
            "solve finished"
        );
        Ok(plan)
    }
}

/// Flattens the incumbent's sessions into per-child assignments, sorted
/// by child ID.
fn assignments_from_sessions(sessions: &[Session], space: &CandidateSpace<'_>) -> Vec<Assignment> {
    let mut assignments = Vec::new();
    for session in sessions {
        for child in session.occupants.children() {
            assignments.push(Assignment::new(
                space.children[child].id.clone(),
                space.teachers[session.teacher].id.clone(),
                session.slot,
            ));
        }
    }
    assignments.sort_by(|a, b| a.child_id.cmp(&b.child_id));
    assignments
}

/// Re-verifies the hard constraints on the produced assignment. A breach
/// here is an engine defect, reported as `SolveError::Internal`.
fn verify_hard_constraints(
    assignments: &[Assignment],
    request: &SolveRequest,
) -> Result<(), String> {
    let child_by_id: HashMap<&str, &Child> = request
        .children
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let teacher_by_id: HashMap<&str, &Teacher> = request
        .teachers
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect();

    let mut seen_children = HashSet::new();
    let mut occupants: BTreeMap<(&str, TimeSlot), Vec<&str>> = BTreeMap::new();
    for a in assignments {
        let child = child_by_id
            .get(a.child_id.as_str())
            .ok_or_else(|| format!("assignment references unknown child '{}'", a.child_id))?;
        let teacher = teacher_by_id
            .get(a.teacher_id.as_str())
            .ok_or_else(|| format!("assignment references unknown teacher '{}'", a.teacher_id))?;
        if !seen_children.insert(a.child_id.as_str()) {
            return Err(format!("child '{}' is assigned more than once", a.child_id));
        }
        if !teacher.availability.allows_start(&request.grid, &a.slot) {
            return Err(format!(
                "teacher '{}' is not available for the session at {}",
                a.teacher_id, a.slot
            ));
        }
        if !child.availability.allows_start(&request.grid, &a.slot) {
            return Err(format!(
                "child '{}' is not available for the session at {}",
                a.child_id, a.slot
            ));
        }
        occupants
            .entry((a.teacher_id.as_str(), a.slot))
            .or_default()
            .push(a.child_id.as_str());
    }

    let mut tandem_pairs: HashSet<(&str, &str)> = HashSet::new();
    for t in &request.tandems {
        tandem_pairs.insert((t.child_a.as_str(), t.child_b.as_str()));
        tandem_pairs.insert((t.child_b.as_str(), t.child_a.as_str()));
    }

    let mut day_starts: BTreeMap<(&str, Weekday), Vec<u16>> = BTreeMap::new();
    for ((teacher_id, slot), children_here) in &occupants {
        match children_here.len() {
            1 => {}
            2 => {
                let (a, b) = (children_here[0], children_here[1]);
                if !tandem_pairs.contains(&(a, b)) {
                    return Err(format!(
                        "children '{a}' and '{b}' share a session without a declared tandem"
                    ));
                }
            }
            n => {
                return Err(format!(
                    "session of teacher '{teacher_id}' at {slot} has {n} occupants"
                ))
            }
        }
        day_starts
            .entry((*teacher_id, slot.weekday))
            .or_default()
            .push(slot.start_min);
    }

    for ((teacher_id, weekday), starts) in &mut day_starts {
        starts.sort_unstable();
        if let Some(pair) = starts.windows(2).find(|w| w[1] - w[0] < SESSION_MIN) {
            return Err(format!(
                "teacher '{teacher_id}' has overlapping sessions on {weekday} at {} and {}",
                crate::slots::format_hhmm(pair[0]),
                crate::slots::format_hhmm(pair[1]),
            ));
        }
    }

    Ok(())
}
