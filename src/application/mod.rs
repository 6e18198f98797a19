//! Application layer - orchestration of routing, dispatch and synthesis.
//!
//! Services (`QueryRouter`, `InvocationDispatcher`, `Synthesizer`) hold the
//! reusable steps; handlers compose them into the operations exposed to
//! callers.

pub mod dispatcher;
pub mod handlers;
mod registry;
mod router;
mod synthesizer;

pub use dispatcher::{DispatchSettings, InvocationDispatcher};
pub use handlers::{
    AskQueryCommand, AskQueryError, AskQueryResult, EvaluateRouterCommand, EvaluateRouterError,
    Feedback, QueryPipeline, RecordFeedbackCommand, RecordFeedbackError, RecordFeedbackHandler,
    RecordFeedbackResult, RouterEvaluator, ToolRunSummary,
};
pub use registry::{RegistryError, ToolRegistry};
pub use router::{QueryRouter, RouteError, RouterSettings};
pub use synthesizer::{SynthesisError, SynthesisSettings, Synthesizer, NO_RESULTS_ANSWER};
