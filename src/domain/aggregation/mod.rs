//! Aggregation - combining tool outputs into attributed context.

mod aggregator;
mod context;

pub use aggregator::{AggregationError, Aggregator};
pub use context::{
    AggregatedContext, AggregationPartialFailure, Citation, Confidence, ContextEntry, FailedTool,
    InvocationOutcome, ToolFailure,
};
