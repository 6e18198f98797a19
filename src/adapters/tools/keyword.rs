//! Keyword scoring shared by the in-memory tools.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::tools::RetrievalRecord;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "the", "to", "with", "all", "any", "find", "show", "me", "get",
];

/// Lowercased content words with a naive plural fold.
pub(crate) fn terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(&t.as_str()))
        .map(|t| {
            if t.len() > 3 && t.ends_with('s') && !t.ends_with("ss") {
                t[..t.len() - 1].to_string()
            } else {
                t
            }
        })
        .collect()
}

/// Fraction of query terms present in `text`, in `[0, 1]`.
pub(crate) fn overlap_score(query_terms: &BTreeSet<String>, text: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let text_terms = terms(text);
    let matched = query_terms.intersection(&text_terms).count();
    matched as f32 / query_terms.len() as f32
}

/// Sorts by relevance descending then source id ascending, and truncates.
/// Identical inputs always come back in the same order.
pub(crate) fn rank(mut records: Vec<RetrievalRecord>, limit: usize) -> Vec<RetrievalRecord> {
    records.sort_by(|a, b| {
        let (ra, rb) = (a.relevance.unwrap_or(0.0), b.relevance.unwrap_or(0.0));
        rb.partial_cmp(&ra)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.source_id.cmp(&b.source_id))
    });
    records.truncate(limit);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::ContentKind;

    #[test]
    fn terms_drop_stopwords_and_fold_plurals() {
        let t = terms("Find the Blueprints for City Hall");
        let expected: BTreeSet<String> =
            ["blueprint", "city", "hall"].iter().map(|s| s.to_string()).collect();
        assert_eq!(t, expected);
        assert!(terms("glass").contains("glass"));
    }

    #[test]
    fn overlap_is_fraction_of_query_terms() {
        let q = terms("city hall blueprints");
        assert!((overlap_score(&q, "City Hall, east elevation") - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(overlap_score(&q, "library"), 0.0);
        assert_eq!(overlap_score(&BTreeSet::new(), "anything"), 0.0);
    }

    #[test]
    fn rank_breaks_ties_by_id() {
        let rec = |id: &str, score: f32| {
            RetrievalRecord::new(id, "", ContentKind::Document).with_relevance(score)
        };
        let ranked = rank(vec![rec("b", 0.5), rec("c", 0.9), rec("a", 0.5)], 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }
}
