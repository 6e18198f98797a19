//! Application handlers.
//!
//! Command handlers that run the public operations end to end.

mod evaluate_router;
mod query_pipeline;
mod record_feedback;

pub use evaluate_router::{EvaluateRouterCommand, EvaluateRouterError, RouterEvaluator};
pub use query_pipeline::{
    AskQueryCommand, AskQueryError, AskQueryResult, QueryPipeline, ToolRunSummary,
};
pub use record_feedback::{
    Feedback, RecordFeedbackCommand, RecordFeedbackError, RecordFeedbackHandler,
    RecordFeedbackResult,
};
