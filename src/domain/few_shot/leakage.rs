//! Train/test leakage guard.
//!
//! Evaluation queries must never be shown to the router as few-shot
//! examples. Two checks are applied to every candidate:
//!
//! 1. exact match on a SHA-256 fingerprint of the normalised query text,
//! 2. optionally, cosine similarity to any held-out query embedding at or
//!    above an exclusion radius (catches near-duplicates and paraphrases).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{cosine_similarity, ExampleRecord};

/// Lowercases, collapses whitespace and strips trailing punctuation.
pub fn normalize_query(query: &str) -> String {
    let collapsed = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}

/// Hex SHA-256 of a normalised query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryFingerprint(String);

impl QueryFingerprint {
    pub fn of(query: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalize_query(query).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Set of held-out queries that retrieval must skip.
#[derive(Debug, Clone, Default)]
pub struct LeakageGuard {
    fingerprints: HashSet<QueryFingerprint>,
    embeddings: Vec<Vec<f32>>,
    radius: Option<f32>,
}

impl LeakageGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables near-duplicate exclusion at the given cosine similarity.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn radius(&self) -> Option<f32> {
        self.radius
    }

    /// Registers a held-out query. The embedding is only kept when a
    /// radius is configured.
    pub fn exclude(&mut self, query: &str, embedding: Option<Vec<f32>>) {
        self.fingerprints.insert(QueryFingerprint::of(query));
        if self.radius.is_some() {
            if let Some(embedding) = embedding {
                self.embeddings.push(embedding);
            }
        }
    }

    pub fn is_excluded(&self, record: &ExampleRecord) -> bool {
        if self.fingerprints.contains(record.fingerprint()) {
            return true;
        }
        match self.radius {
            Some(radius) => self
                .embeddings
                .iter()
                .any(|held_out| cosine_similarity(held_out, record.embedding()) >= radius),
            None => false,
        }
    }

    /// Number of distinct held-out queries.
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::few_shot::ExampleSource;
    use crate::domain::routing::RouteProposal;

    fn record(query: &str, embedding: Vec<f32>) -> ExampleRecord {
        ExampleRecord::new(
            query,
            RouteProposal::direct_answer("x"),
            embedding,
            ExampleSource::Seed,
            0,
        )
    }

    #[test]
    fn normalization_ignores_case_spacing_and_trailing_punctuation() {
        assert_eq!(
            normalize_query("  Find   Blueprints for City Hall?! "),
            "find blueprints for city hall"
        );
        assert_eq!(
            QueryFingerprint::of("Find blueprints"),
            QueryFingerprint::of("find  blueprints.")
        );
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = QueryFingerprint::of("hello");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_match_excludes() {
        let mut guard = LeakageGuard::new();
        guard.exclude("Find blueprints for city hall", None);

        assert!(guard.is_excluded(&record("find blueprints for city hall.", vec![1.0])));
        assert!(!guard.is_excluded(&record("find contracts", vec![1.0])));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn radius_excludes_near_duplicates() {
        let mut guard = LeakageGuard::new().with_radius(0.95);
        guard.exclude("held out", Some(vec![1.0, 0.0]));

        assert!(guard.is_excluded(&record("paraphrase", vec![0.99, 0.05])));
        assert!(!guard.is_excluded(&record("unrelated", vec![0.0, 1.0])));
    }

    #[test]
    fn embeddings_ignored_without_radius() {
        let mut guard = LeakageGuard::new();
        guard.exclude("held out", Some(vec![1.0, 0.0]));
        assert!(!guard.is_excluded(&record("paraphrase", vec![1.0, 0.0])));
    }
}
