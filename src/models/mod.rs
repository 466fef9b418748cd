//! Session planning domain models.
//!
//! Immutable-per-run records describing one solve invocation: the people
//! (`Teacher`, `Child`), their pairing (`Tandem`), their free raster
//! ticks (`Availability`), the soft-goal weights (`WeightConfig`), the
//! prior result (`PreviousPlan`), and the produced solution (`Plan` with
//! its `Violation` and `DiffEntry` records).
//!
//! All entities are read-only inputs for a single solve; the engine holds
//! no state across invocations beyond what is passed in explicitly.

mod availability;
mod child;
mod plan;
mod tandem;
mod teacher;
mod weights;

pub use availability::Availability;
pub use child::Child;
pub use plan::{
    Assignment, DiffEntry, DiffKind, Placement, Plan, PreviousPlan, SolveStatus, Violation,
    ViolationKind,
};
pub use tandem::Tandem;
pub use teacher::Teacher;
pub use weights::WeightConfig;
