//! Example records - verified (query, route) pairs for few-shot prompting.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ExampleId, Timestamp};
use crate::domain::routing::RouteProposal;

use super::QueryFingerprint;

/// Where an example came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleSource {
    /// Curated seed data loaded at startup.
    Seed,
    /// A positively rated production route.
    ConfirmedRoute,
    /// An explicit correction supplied with feedback.
    Correction,
}

/// A stored example. Never mutated once appended.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleRecord {
    id: ExampleId,
    query: String,
    route: RouteProposal,
    #[serde(skip)]
    embedding: Vec<f32>,
    fingerprint: QueryFingerprint,
    source: ExampleSource,
    /// Insertion order within the store; higher is newer.
    sequence: u64,
    created_at: Timestamp,
}

impl ExampleRecord {
    pub fn new(
        query: impl Into<String>,
        route: RouteProposal,
        embedding: Vec<f32>,
        source: ExampleSource,
        sequence: u64,
    ) -> Self {
        let query = query.into();
        Self {
            id: ExampleId::new(),
            fingerprint: QueryFingerprint::of(&query),
            query,
            route,
            embedding,
            source,
            sequence,
            created_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> ExampleId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn route(&self) -> &RouteProposal {
        &self.route
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn fingerprint(&self) -> &QueryFingerprint {
        &self.fingerprint
    }

    pub fn source(&self) -> ExampleSource {
        self.source
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
