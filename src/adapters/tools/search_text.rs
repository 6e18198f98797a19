//! Keyword search over text documents.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::tools::{
    ContentKind, ParamSpec, ParamType, ParameterSchema, RetrievalRecord, Specificity,
    ToolDefinition, ToolParameters,
};
use crate::ports::{RetrievalError, RetrievalTool};

use super::keyword::{overlap_score, rank, terms};
use super::Corpus;

pub const SEARCH_TEXT: &str = "search_text";

/// Exclusive group shared by the document search tools.
pub const DOCUMENTS_GROUP: &str = "documents";

pub(crate) const DEFAULT_LIMIT: usize = 5;

pub struct SearchText {
    corpus: Arc<Corpus>,
    definition: ToolDefinition,
}

impl SearchText {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        let schema = ParameterSchema::new()
            .field(
                ParamSpec::required("query", ParamType::String, "Keywords to look for")
                    .with_min(1.0),
            )
            .field(
                ParamSpec::optional("limit", ParamType::Integer, "Maximum number of documents")
                    .with_min(1.0)
                    .with_max(20.0),
            );

        let definition = ToolDefinition::new(
            SEARCH_TEXT,
            "Keyword search over reports, memos, contracts and other text documents.",
            schema,
        )
        .with_usage_note("Use when the question is about what documents say.")
        .with_usage_note("Do not use for blueprints or floor plans.")
        .with_specificity(Specificity::Generic)
        .with_exclusive_group(DOCUMENTS_GROUP);

        Self { corpus, definition }
    }
}

#[async_trait]
impl RetrievalTool for SearchText {
    fn describe(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        parameters: &ToolParameters,
    ) -> Result<Vec<RetrievalRecord>, RetrievalError> {
        let query_terms = terms(parameters.str("query").unwrap_or_default());
        let limit = parameters
            .i64("limit")
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LIMIT);

        let hits = self
            .corpus
            .documents
            .iter()
            .filter_map(|doc| {
                let score = overlap_score(&query_terms, &format!("{} {}", doc.title, doc.body));
                (score > 0.0).then(|| {
                    let mut record = RetrievalRecord::new(
                        &doc.id,
                        format!("{}\n{}", doc.title, doc.body),
                        ContentKind::Document,
                    )
                    .with_relevance(score)
                    .with_metadata("title", doc.title.clone());
                    if let Some(date) = doc.date {
                        record = record.with_metadata("date", date.to_string());
                    }
                    record
                })
            })
            .collect();

        Ok(rank(hits, limit))
    }
}
