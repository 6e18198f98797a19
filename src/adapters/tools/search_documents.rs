//! Metadata-filtered search over the same documents as `search_text`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::tools::{
    ContentKind, ParamSpec, ParamType, ParameterSchema, RetrievalRecord, Specificity,
    ToolDefinition, ToolParameters,
};
use crate::ports::{RetrievalError, RetrievalTool};

use super::keyword::{overlap_score, rank, terms};
use super::search_text::{DEFAULT_LIMIT, DOCUMENTS_GROUP};
use super::Corpus;

pub const SEARCH_DOCUMENTS: &str = "search_documents";

pub struct SearchDocuments {
    corpus: Arc<Corpus>,
    definition: ToolDefinition,
}

impl SearchDocuments {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        let schema = ParameterSchema::new()
            .field(ParamSpec::optional("query", ParamType::String, "Keywords to look for"))
            .field(ParamSpec::optional(
                "tags",
                ParamType::StringList,
                "Only documents carrying every one of these tags",
            ))
            .field(ParamSpec::optional(
                "start_date",
                ParamType::Date,
                "Earliest document date, inclusive",
            ))
            .field(ParamSpec::optional(
                "end_date",
                ParamType::Date,
                "Latest document date, inclusive",
            ))
            .field(
                ParamSpec::optional("limit", ParamType::Integer, "Maximum number of documents")
                    .with_min(1.0)
                    .with_max(20.0),
            )
            .ordered_dates("start_date", "end_date");

        let definition = ToolDefinition::new(
            SEARCH_DOCUMENTS,
            "Document search narrowed by tags and/or a date range.",
            schema,
        )
        .with_usage_note("Use instead of search_text when the query names a time period or a document category.")
        .with_specificity(Specificity::Filtered)
        .with_exclusive_group(DOCUMENTS_GROUP);

        Self { corpus, definition }
    }
}

#[async_trait]
impl RetrievalTool for SearchDocuments {
    fn describe(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        parameters: &ToolParameters,
    ) -> Result<Vec<RetrievalRecord>, RetrievalError> {
        let query_terms = parameters.str("query").map(terms).unwrap_or_default();
        let tags: Vec<String> = parameters
            .string_list("tags")
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        let start = parameters.date("start_date");
        let end = parameters.date("end_date");
        let limit = parameters
            .i64("limit")
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LIMIT);

        let hits = self
            .corpus
            .documents
            .iter()
            .filter(|doc| {
                tags.iter()
                    .all(|tag| doc.tags.iter().any(|t| t.to_lowercase() == *tag))
            })
            .filter(|doc| match (start, end) {
                (None, None) => true,
                _ => doc.date.map_or(false, |date| {
                    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
                }),
            })
            .filter_map(|doc| {
                // Without keywords every filtered document matches equally.
                let score = if query_terms.is_empty() {
                    1.0
                } else {
                    overlap_score(&query_terms, &format!("{} {}", doc.title, doc.body))
                };
                (score > 0.0).then(|| {
                    let mut record = RetrievalRecord::new(
                        &doc.id,
                        format!("{}\n{}", doc.title, doc.body),
                        ContentKind::Document,
                    )
                    .with_relevance(score)
                    .with_metadata("title", doc.title.clone())
                    .with_metadata("tags", doc.tags.clone());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tools::corpus::Document;
    use crate::domain::foundation::QueryId;
    use chrono::NaiveDate;
    use serde_json::json;

    fn corpus() -> Arc<Corpus> {
        let doc = |id: &str, body: &str, year: i32, tags: &[&str]| Document {
            id: id.into(),
            title: format!("Doc {}", id),
            body: body.into(),
            date: NaiveDate::from_ymd_opt(year, 6, 1),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        Arc::new(Corpus {
            documents: vec![
                doc("c-1", "City hall renovation contract", 2010, &["contract"]),
                doc("c-2", "Library construction contract", 2012, &["contract"]),
                doc("m-1", "City hall meeting memo", 2010, &["memo"]),
            ],
            ..Corpus::default()
        })
    }

    async fn ids(params: serde_json::Value) -> Vec<String> {
        let tool = SearchDocuments::new(corpus());
        let invocation = tool.describe().instantiate(QueryId::new(), &params).unwrap();
        tool.execute(invocation.parameters())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.source_id)
            .collect()
    }

    #[tokio::test]
    async fn filters_by_tag_and_date() {
        let found = ids(json!({
            "tags": ["Contract"],
            "start_date": "2010-01-01",
            "end_date": "2010-12-31"
        }))
        .await;
        assert_eq!(found, vec!["c-1"]);
    }

    #[tokio::test]
    async fn keywords_rank_within_filter() {
        let found = ids(json!({ "query": "city hall", "start_date": "2010-01-01" })).await;
        assert_eq!(found, vec!["c-1", "m-1"]);
    }

    #[test]
    fn belongs_to_documents_group_as_more_specific() {
        let tool = SearchDocuments::new(corpus());
        assert_eq!(tool.describe().exclusive_group(), Some(DOCUMENTS_GROUP));
        assert_eq!(tool.describe().specificity(), Specificity::Filtered);
    }
}
