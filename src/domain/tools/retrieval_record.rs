//! Retrieval records - the content a tool returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What kind of content a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Document,
    ImageDescription,
    TableRow,
}

/// One content record produced by a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRecord {
    /// Backend identifier of the item (document id, image id, row key).
    pub source_id: String,
    pub content: String,
    pub kind: ContentKind,
    /// Backend-specific relevance score, higher is better.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RetrievalRecord {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            source_id: source_id.into(),
            content: content.into(),
            kind,
            relevance: None,
            metadata: Map::new(),
        }
    }

    pub fn with_relevance(mut self, relevance: f32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
