//! In-memory corpus backing the bundled tools.
//!
//! Three kinds of content: text documents, blueprint image descriptions and
//! small tables. Loaded once from a JSON/YAML file and shared read-only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::adapters::data_file::{load_data_file, DataFileError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub blueprints: Vec<Blueprint>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Text description of one blueprint or floor plan image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    /// Column whose value identifies a row; row index when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    /// Stable identifier of a row within this table.
    pub fn row_key(&self, index: usize, row: &Map<String, Value>) -> String {
        let key = self
            .key_column
            .as_ref()
            .and_then(|column| row.get(column))
            .map(cell_text);
        match key {
            Some(key) => format!("{}#{}", self.name, key),
            None => format!("{}#{:06}", self.name, index),
        }
    }

    /// "column: value" pairs in column order.
    pub fn render_row(&self, row: &Map<String, Value>) -> String {
        self.columns
            .iter()
            .filter_map(|column| row.get(column).map(|v| format!("{}: {}", column, cell_text(v))))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Cell value as plain text (strings unquoted).
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Corpus {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DataFileError> {
        load_data_file(path).await
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }
}
