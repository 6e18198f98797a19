//! Evaluation - measuring routing accuracy against held-out cases.

mod case;
mod report;

pub use case::{CaseResult, EvaluationCase};
pub use report::{EvaluationReport, ToolMetrics, ToolScore};
