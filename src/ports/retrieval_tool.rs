//! Retrieval Tool Port - Interface for one retrieval capability.
//!
//! A tool publishes its contract through [`RetrievalTool::describe`] and
//! answers validated parameter sets through [`RetrievalTool::execute`].
//! Several tools may share one backend; each exposes a different access
//! pattern over it.
//!
//! # Example
//!
//! ```ignore
//! struct KeywordSearch { index: Arc<Index>, definition: ToolDefinition }
//!
//! #[async_trait]
//! impl RetrievalTool for KeywordSearch {
//!     fn describe(&self) -> &ToolDefinition { &self.definition }
//!
//!     async fn execute(&self, params: &ToolParameters) -> Result<Vec<RetrievalRecord>, RetrievalError> {
//!         let terms = params.str("query").unwrap_or_default();
//!         self.index.search(terms).await.map_err(|e| RetrievalError::unavailable("index", e.to_string()))
//!     }
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::tools::{RetrievalRecord, ToolDefinition, ToolParameters, ToolRunStatus};

/// Port for executing one retrieval capability.
///
/// `execute` only ever receives parameters that already passed the
/// definition's schema, and must be a side-effect-free read so that it can
/// be retried, timed out, or dropped mid-flight.
#[async_trait]
pub trait RetrievalTool: Send + Sync {
    /// Name, parameter schema and usage description.
    fn describe(&self) -> &ToolDefinition;

    /// Runs the retrieval. Results must be in a stable order for identical
    /// parameters over an unchanged backing store.
    async fn execute(&self, parameters: &ToolParameters)
        -> Result<Vec<RetrievalRecord>, RetrievalError>;
}

/// Backend-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// Backend could not be reached.
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// Backend did not answer within the allotted time.
    #[error("timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Backend answered with an error.
    #[error("retrieval failed: {0}")]
    Failed(String),
}

impl RetrievalError {
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn timeout(after_ms: u64) -> Self {
        Self::Timeout { after_ms }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns true if retrying with backoff could help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

/// Any reason a single invocation produced no records.
///
/// Validation and retrieval failures stay distinguishable so callers can
/// choose between re-prompting, retrying, or omitting the tool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("tool '{0}' is not registered")]
    UnknownTool(String),

    #[error("cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval(e) if e.is_retryable())
    }

    /// Status classification for aggregation and logs.
    pub fn status(&self) -> ToolRunStatus {
        match self {
            Self::Validation(_) | Self::UnknownTool(_) => ToolRunStatus::ValidationError,
            Self::Retrieval(RetrievalError::Timeout { .. }) => ToolRunStatus::TimedOut,
            Self::Retrieval(_) => ToolRunStatus::RetrievalError,
            Self::Cancelled => ToolRunStatus::Cancelled,
        }
    }
}
