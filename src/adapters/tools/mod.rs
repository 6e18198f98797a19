//! Retrieval tools over an in-memory corpus.
//!
//! | Tool               | Content              | Specificity |
//! |--------------------|----------------------|-------------|
//! | `search_text`      | documents, keywords  | generic     |
//! | `search_documents` | documents, filters   | filtered    |
//! | `search_blueprint` | blueprint images     | filtered    |
//! | `search_tables`    | table rows           | structured  |
//!
//! `search_text` and `search_documents` are alternative access paths to the
//! same documents and share the `documents` exclusive group.

mod corpus;
mod keyword;
mod search_blueprint;
mod search_documents;
mod search_tables;
mod search_text;

use std::sync::Arc;

use crate::ports::RetrievalTool;

pub use corpus::{cell_text, Blueprint, Corpus, Document, Table};
pub use search_blueprint::{SearchBlueprint, SEARCH_BLUEPRINT};
pub use search_documents::{SearchDocuments, SEARCH_DOCUMENTS};
pub use search_tables::{SearchTables, SEARCH_TABLES};
pub use search_text::{SearchText, DOCUMENTS_GROUP, SEARCH_TEXT};

/// Every bundled tool over one corpus, in a fixed order.
pub fn corpus_tools(corpus: Arc<Corpus>) -> Vec<Arc<dyn RetrievalTool>> {
    vec![
        Arc::new(SearchText::new(Arc::clone(&corpus))),
        Arc::new(SearchDocuments::new(Arc::clone(&corpus))),
        Arc::new(SearchBlueprint::new(Arc::clone(&corpus))),
        Arc::new(SearchTables::new(corpus)),
    ]
}
