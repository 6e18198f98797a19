//! In-memory example store.
//!
//! Records live in an `Arc<Vec<_>>` snapshot. Readers clone the `Arc` and
//! score against it without holding the lock; appends copy-on-write a new
//! vector, so a read already in progress keeps its snapshot and reads that
//! start later see the new record.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::domain::few_shot::{
    select_top_k, ExampleRecord, ExampleSource, LeakageGuard, ScoredExample,
};
use crate::domain::routing::RouteProposal;
use crate::ports::{Embedder, ExampleStore, ExampleStoreError};

pub struct InMemoryExampleStore {
    embedder: Arc<dyn Embedder>,
    records: RwLock<Arc<Vec<Arc<ExampleRecord>>>>,
    guard: RwLock<LeakageGuard>,
    next_sequence: AtomicU64,
}

impl InMemoryExampleStore {
    /// Creates an empty store that embeds with `embedder`.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            records: RwLock::new(Arc::new(Vec::new())),
            guard: RwLock::new(LeakageGuard::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Also excludes examples within `radius` cosine similarity of any
    /// held-out query. Must be set before `exclude` is called.
    pub fn with_exclusion_radius(self, radius: f32) -> Self {
        Self {
            guard: RwLock::new(LeakageGuard::new().with_radius(radius)),
            ..self
        }
    }

    /// Current records, in append order. Later appends do not show up in
    /// a snapshot already taken.
    pub fn snapshot(&self) -> Arc<Vec<Arc<ExampleRecord>>> {
        match self.records.read() {
            Ok(records) => Arc::clone(&records),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Number of held-out queries registered.
    pub fn held_out_count(&self) -> usize {
        match self.guard.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn poisoned(what: &str) -> ExampleStoreError {
        ExampleStoreError::Unavailable(format!("{} lock poisoned", what))
    }
}

#[async_trait]
impl ExampleStore for InMemoryExampleStore {
    async fn add(
        &self,
        query: &str,
        route: RouteProposal,
        source: ExampleSource,
    ) -> Result<Arc<ExampleRecord>, ExampleStoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ExampleStoreError::EmptyQuery);
        }

        // Embed before taking the lock; this is the slow part.
        let embedding = self.embedder.embed(query).await?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let record = Arc::new(ExampleRecord::new(query, route, embedding, source, sequence));

        {
            let mut records = self.records.write().map_err(|_| Self::poisoned("records"))?;
            Arc::make_mut(&mut *records).push(Arc::clone(&record));
        }

        debug!(
            example_id = %record.id(),
            source = ?source,
            sequence,
            "Example appended"
        );
        Ok(record)
    }

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredExample>, ExampleStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let guard = self.guard.read().map_err(|_| Self::poisoned("guard"))?;
        Ok(select_top_k(&snapshot, &embedding, k, &guard))
    }

    async fn exclude(&self, queries: &[String]) -> Result<(), ExampleStoreError> {
        let needs_embeddings = self
            .guard
            .read()
            .map_err(|_| Self::poisoned("guard"))?
            .radius()
            .is_some();

        let embeddings = if needs_embeddings {
            self.embedder
                .embed_batch(queries)
                .await?
                .into_iter()
                .map(Some)
                .collect()
        } else {
            vec![None; queries.len()]
        };

        let mut guard = self.guard.write().map_err(|_| Self::poisoned("guard"))?;
        for (query, embedding) in queries.iter().zip(embeddings) {
            guard.exclude(query, embedding);
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.snapshot().len()
    }
}
