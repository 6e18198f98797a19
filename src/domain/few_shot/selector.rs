//! Nearest-neighbour example selection.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{cosine_similarity, ExampleRecord, LeakageGuard};

/// An example paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredExample {
    pub record: Arc<ExampleRecord>,
    pub similarity: f32,
}

/// Picks the `k` candidates most similar to `query_embedding`.
///
/// Guarded records are skipped. Ties on similarity go to the most
/// recently added record, so fresh corrections outrank older examples.
pub fn select_top_k(
    candidates: &[Arc<ExampleRecord>],
    query_embedding: &[f32],
    k: usize,
    guard: &LeakageGuard,
) -> Vec<ScoredExample> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredExample> = candidates
        .iter()
        .filter(|record| !guard.is_excluded(record))
        .map(|record| ScoredExample {
            similarity: cosine_similarity(query_embedding, record.embedding()),
            record: Arc::clone(record),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.record.sequence().cmp(&a.record.sequence()))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::few_shot::ExampleSource;
    use crate::domain::routing::RouteProposal;

    fn record(query: &str, embedding: Vec<f32>, sequence: u64) -> Arc<ExampleRecord> {
        Arc::new(ExampleRecord::new(
            query,
            RouteProposal::direct_answer("x"),
            embedding,
            ExampleSource::Seed,
            sequence,
        ))
    }

    #[test]
    fn ranks_by_similarity() {
        let records = vec![
            record("far", vec![0.0, 1.0], 0),
            record("near", vec![1.0, 0.1], 1),
            record("exact", vec![1.0, 0.0], 2),
        ];

        let top = select_top_k(&records, &[1.0, 0.0], 2, &LeakageGuard::new());
        let queries: Vec<&str> = top.iter().map(|s| s.record.query()).collect();
        assert_eq!(queries, vec!["exact", "near"]);
    }

    #[test]
    fn ties_prefer_newest() {
        let records = vec![
            record("old", vec![1.0, 0.0], 0),
            record("new", vec![1.0, 0.0], 5),
            record("middle", vec![1.0, 0.0], 3),
        ];

        let top = select_top_k(&records, &[1.0, 0.0], 3, &LeakageGuard::new());
        let queries: Vec<&str> = top.iter().map(|s| s.record.query()).collect();
        assert_eq!(queries, vec!["new", "middle", "old"]);
    }

    #[test]
    fn guarded_records_are_skipped() {
        let records = vec![record("held out", vec![1.0, 0.0], 0), record("ok", vec![0.5, 0.5], 1)];
        let mut guard = LeakageGuard::new();
        guard.exclude("held out", None);

        let top = select_top_k(&records, &[1.0, 0.0], 5, &guard);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].record.query(), "ok");
    }

    #[test]
    fn zero_k_returns_nothing() {
        let records = vec![record("a", vec![1.0], 0)];
        assert!(select_top_k(&records, &[1.0], 0, &LeakageGuard::new()).is_empty());
    }
}
