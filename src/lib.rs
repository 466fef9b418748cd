//! Weekly session planning engine.
//!
//! Assigns a fixed weekly set of sessions (child ↔ teacher, 45 minutes,
//! 15-minute raster) subject to hard availability and capacity rules,
//! maximizing a weighted combination of soft goals: preferred teacher,
//! early scheduling, tandem (paired) sessions, teacher breaks, and
//! stability relative to a previous plan.
//!
//! # Modules
//!
//! - **`slots`**: the weekly time grid — `Weekday`, `TimeSlot`, `SlotGrid`
//! - **`models`**: domain records — `Teacher`, `Child`, `Tandem`,
//!   `Availability`, `WeightConfig`, `Plan`, `PreviousPlan`
//! - **`validation`**: input integrity checks (duplicate IDs, tandem
//!   wiring, weight ranges, off-grid availability)
//! - **`objective`**: the weighted score over candidate assignments
//! - **`solver`**: constraint encoding, branch-and-bound search, and the
//!   `Solver` facade producing a `Plan`
//! - **`analysis`**: violation diagnosis for a finished plan
//! - **`diff`**: change classification against a previous plan
//!
//! # Guarantees
//!
//! Every returned `Plan` satisfies the hard constraints (availability,
//! one session per child, no teacher overlap, tandem-only sharing), and
//! identical inputs with identical options produce identical plans. An
//! exhausted search proves optimality; a time-bounded or cancelled search
//! returns the best incumbent found.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod analysis;
pub mod diff;
pub mod models;
pub mod objective;
pub mod slots;
pub mod solver;
pub mod validation;
