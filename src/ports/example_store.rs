//! Example Store Port - append-only corpus of verified routes.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::few_shot::{ExampleRecord, ExampleSource, ScoredExample};
use crate::domain::routing::RouteProposal;

use super::EmbeddingError;

/// Port for the few-shot example corpus.
///
/// Reads run concurrently with appends; an append never invalidates a read
/// already in progress and becomes visible to reads started after it.
#[async_trait]
pub trait ExampleStore: Send + Sync {
    /// Appends a new example. No deduplication is performed.
    async fn add(
        &self,
        query: &str,
        route: RouteProposal,
        source: ExampleSource,
    ) -> Result<Arc<ExampleRecord>, ExampleStoreError>;

    /// Returns up to `k` examples most similar to `query`, excluding any
    /// held-out query. Ties go to the most recently added.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredExample>, ExampleStoreError>;

    /// Marks queries as held out from retrieval (evaluation set).
    async fn exclude(&self, queries: &[String]) -> Result<(), ExampleStoreError>;

    /// Number of stored examples, including held-out ones.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExampleStoreError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("example query cannot be empty")]
    EmptyQuery,

    #[error("example store unavailable: {0}")]
    Unavailable(String),
}
