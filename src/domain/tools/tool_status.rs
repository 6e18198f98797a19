//! Tool run status value object.
//!
//! Classifies how a single invocation ended so aggregation and logging can
//! react without inspecting error payloads.

use serde::{Deserialize, Serialize};

/// How one tool invocation ended.
///
/// # Examples
///
/// ```
/// use rag_router::domain::tools::ToolRunStatus;
///
/// assert!(ToolRunStatus::Success.is_success());
/// assert!(ToolRunStatus::TimedOut.is_retryable());
/// assert!(!ToolRunStatus::ValidationError.is_retryable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRunStatus {
    /// Tool returned records (possibly none)
    Success,

    /// Parameters were rejected before the backend was touched
    ValidationError,

    /// Backend unavailable or failed
    RetrievalError,

    /// Exceeded the per-tool timeout
    TimedOut,

    /// The request was abandoned while the tool was in flight
    Cancelled,
}

impl ToolRunStatus {
    /// Returns true if the tool executed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if running the same invocation again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetrievalError | Self::TimedOut)
    }

    /// Returns a human-readable description of the status.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Success => "Tool executed successfully",
            Self::ValidationError => "Tool parameters failed validation",
            Self::RetrievalError => "Retrieval backend failed",
            Self::TimedOut => "Tool did not respond in time",
            Self::Cancelled => "Tool execution was cancelled",
        }
    }
}

impl std::fmt::Display for ToolRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
