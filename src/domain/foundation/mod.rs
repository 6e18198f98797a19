//! Identifiers, timestamps, the stage transition trait and validation
//! errors shared by every domain module.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{ExampleId, InvocationId, QueryId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
