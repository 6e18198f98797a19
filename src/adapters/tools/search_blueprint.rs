//! Blueprint search over image descriptions, optionally bounded by date.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::tools::{
    ContentKind, ParamSpec, ParamType, ParameterSchema, RetrievalRecord, Specificity,
    ToolDefinition, ToolParameters,
};
use crate::ports::{RetrievalError, RetrievalTool};

use super::keyword::{overlap_score, rank, terms};
use super::search_text::DEFAULT_LIMIT;
use super::Corpus;

pub const SEARCH_BLUEPRINT: &str = "search_blueprint";

/// Words every blueprint query carries; they say nothing about which one.
const GENERIC_TERMS: &[&str] = &["blueprint", "drawing", "architectural"];

pub struct SearchBlueprint {
    corpus: Arc<Corpus>,
    definition: ToolDefinition,
}

impl SearchBlueprint {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        let schema = ParameterSchema::new()
            .field(
                ParamSpec::required(
                    "description",
                    ParamType::String,
                    "What the blueprint shows, e.g. 'city hall blueprints'",
                )
                .with_min(1.0),
            )
            .field(ParamSpec::optional(
                "start_date",
                ParamType::Date,
                "Earliest blueprint date, inclusive",
            ))
            .field(ParamSpec::optional(
                "end_date",
                ParamType::Date,
                "Latest blueprint date, inclusive",
            ))
            .field(
                ParamSpec::optional("limit", ParamType::Integer, "Maximum number of blueprints")
                    .with_min(1.0)
                    .with_max(20.0),
            )
            .ordered_dates("start_date", "end_date");

        let definition = ToolDefinition::new(
            SEARCH_BLUEPRINT,
            "Search blueprints, floor plans and architectural drawings by description and date.",
            schema,
        )
        .with_usage_note("A year such as 2010 means start_date 2010-01-01 and end_date 2010-12-31.")
        .with_usage_note("Not needed for general questions about what a blueprint is.")
        .with_specificity(Specificity::Filtered);

        Self { corpus, definition }
    }
}

#[async_trait]
impl RetrievalTool for SearchBlueprint {
    fn describe(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        parameters: &ToolParameters,
    ) -> Result<Vec<RetrievalRecord>, RetrievalError> {
        let mut query_terms = terms(parameters.str("description").unwrap_or_default());
        query_terms.retain(|t| !GENERIC_TERMS.contains(&t.as_str()));
        let start = parameters.date("start_date");
        let end = parameters.date("end_date");
        let limit = parameters
            .i64("limit")
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_LIMIT);

        let hits = self
            .corpus
            .blueprints
            .iter()
            .filter(|bp| match (start, end) {
                (None, None) => true,
                // Undated blueprints never match a date-bounded search.
                _ => bp.date.map_or(false, |date| {
                    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
                }),
            })
            .filter_map(|bp| {
                let score = if query_terms.is_empty() {
                    1.0
                } else {
                    let searchable = format!(
                        "{} {}",
                        bp.building.as_deref().unwrap_or_default(),
                        bp.description
                    );
                    overlap_score(&query_terms, &searchable)
                };
                (score > 0.0).then(|| {
                    let mut record =
                        RetrievalRecord::new(&bp.id, &bp.description, ContentKind::ImageDescription)
                            .with_relevance(score);
                    if let Some(building) = &bp.building {
                        record = record.with_metadata("building", building.clone());
                    }
                    if let Some(date) = bp.date {
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
    use crate::adapters::tools::corpus::Blueprint;
    use crate::domain::foundation::QueryId;
    use chrono::NaiveDate;
    use serde_json::json;

    fn corpus() -> Arc<Corpus> {
        let bp = |id: &str, building: &str, desc: &str, date: Option<(i32, u32, u32)>| Blueprint {
            id: id.into(),
            description: desc.into(),
            building: Some(building.into()),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        };
        Arc::new(Corpus {
            blueprints: vec![
                bp("bp-2010-a", "City Hall", "Ground floor plan", Some((2010, 4, 2))),
                bp("bp-2010-b", "City Hall", "Roof framing plan", Some((2010, 11, 30))),
                bp("bp-2014", "City Hall", "Annex elevation", Some((2014, 1, 1))),
                bp("bp-undated", "City Hall", "Basement plan", None),
                bp("bp-lib", "Library", "Reading room plan", Some((2010, 5, 5))),
            ],
            ..Corpus::default()
        })
    }

    async fn ids(params: serde_json::Value) -> Vec<String> {
        let tool = SearchBlueprint::new(corpus());
        let invocation = tool.describe().instantiate(QueryId::new(), &params).unwrap();
        tool.execute(invocation.parameters())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.source_id)
            .collect()
    }

    #[tokio::test]
    async fn date_range_bounds_results() {
        let found = ids(json!({
            "description": "city hall blueprints",
            "start_date": "2010-01-01",
            "end_date": "2010-12-31"
        }))
        .await;
        assert_eq!(found, vec!["bp-2010-a", "bp-2010-b"]);
    }

    #[tokio::test]
    async fn no_range_includes_undated() {
        let found = ids(json!({ "description": "city hall", "limit": 10 })).await;
        assert_eq!(found.len(), 4);
        assert!(found.contains(&"bp-undated".to_string()));
    }

    #[tokio::test]
    async fn generic_description_matches_everything_in_range() {
        let found = ids(json!({
            "description": "blueprints",
            "start_date": "2014-01-01",
            "end_date": "2014-12-31"
        }))
        .await;
        assert_eq!(found, vec!["bp-2014"]);
    }

    #[test]
    fn reversed_range_fails_validation() {
        let tool = SearchBlueprint::new(corpus());
        let err = tool
            .describe()
            .instantiate(
                QueryId::new(),
                &json!({ "description": "x", "start_date": "2011-01-01", "end_date": "2010-01-01" }),
            )
            .unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }
}
