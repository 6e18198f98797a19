//! Query - lifecycle tracking and the outcome returned to the user.

mod lifecycle;
mod outcome;

pub use lifecycle::{QueryLifecycle, QueryStage, StageTransition};
pub use outcome::QueryOutcome;
