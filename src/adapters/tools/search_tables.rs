//! Structured row lookup over corpus tables.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::tools::{
    ContentKind, ParamSpec, ParamType, ParameterSchema, RetrievalRecord, Specificity,
    ToolDefinition, ToolParameters,
};
use crate::ports::{RetrievalError, RetrievalTool};

use super::corpus::cell_text;
use super::keyword::rank;
use super::Corpus;

pub const SEARCH_TABLES: &str = "search_tables";

const DEFAULT_ROW_LIMIT: usize = 20;

pub struct SearchTables {
    corpus: Arc<Corpus>,
    definition: ToolDefinition,
}

impl SearchTables {
    /// The `table` parameter is an enum of the corpus's table names.
    pub fn new(corpus: Arc<Corpus>) -> Self {
        let columns = corpus
            .tables
            .iter()
            .map(|t| format!("{} ({})", t.name, t.columns.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        let schema = ParameterSchema::new()
            .field(ParamSpec::required(
                "table",
                ParamType::Enum(corpus.table_names()),
                "Table to search",
            ))
            .field(ParamSpec::optional(
                "column",
                ParamType::String,
                "Column to match; any column when omitted",
            ))
            .field(
                ParamSpec::required("value", ParamType::String, "Text the cell must contain")
                    .with_min(1.0),
            )
            .field(
                ParamSpec::optional("limit", ParamType::Integer, "Maximum number of rows")
                    .with_min(1.0)
                    .with_max(100.0),
            );

        let mut definition = ToolDefinition::new(
            SEARCH_TABLES,
            "Exact lookup of rows in structured tables such as contracts, permits and invoices.",
            schema,
        )
        .with_specificity(Specificity::Structured);
        if !columns.is_empty() {
            definition = definition.with_usage_note(format!("Tables: {}", columns));
        }

        Self { corpus, definition }
    }
}

#[async_trait]
impl RetrievalTool for SearchTables {
    fn describe(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        parameters: &ToolParameters,
    ) -> Result<Vec<RetrievalRecord>, RetrievalError> {
        let table_name = parameters.str("table").unwrap_or_default();
        let table = self
            .corpus
            .table(table_name)
            .ok_or_else(|| RetrievalError::failed(format!("no table named '{}'", table_name)))?;

        let column = parameters.str("column");
        if let Some(column) = column {
            if !table.columns.iter().any(|c| c == column) {
                return Err(RetrievalError::failed(format!(
                    "table '{}' has no column '{}'",
                    table.name, column
                )));
            }
        }

        let needle = parameters.str("value").unwrap_or_default().to_lowercase();
        let limit = parameters
            .i64("limit")
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_ROW_LIMIT);

        let cell_matches = |value: &serde_json::Value| cell_text(value).to_lowercase().contains(&needle);

        let hits = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| match column {
                Some(column) => row.get(column).map_or(false, cell_matches),
                None => row.values().any(cell_matches),
            })
            .map(|(index, row)| {
                let mut record = RetrievalRecord::new(
                    table.row_key(index, row),
                    table.render_row(row),
                    ContentKind::TableRow,
                )
                .with_relevance(1.0)
                .with_metadata("table", table.name.clone());
                for (key, value) in row {
                    record = record.with_metadata(key.clone(), value.clone());
                }
                record
            })
            .collect();

        Ok(rank(hits, limit))
    }
}
