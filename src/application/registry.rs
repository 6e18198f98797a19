//! Tool registry - the executable tools available to the router.
//!
//! Tools are looked up by name; schema matching happens in the resolver,
//! so adding a tool never touches routing logic.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::tools::ToolDefinition;
use crate::ports::RetrievalTool;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
}

/// Registered tools in insertion order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn RetrievalTool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, failing on the first duplicate name.
    pub fn with_tools(
        tools: impl IntoIterator<Item = Arc<dyn RetrievalTool>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn RetrievalTool>) -> Result<(), RegistryError> {
        let name = tool.describe().name();
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RetrievalTool>> {
        self.tools.iter().find(|t| t.describe().name() == name)
    }

    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| t.describe()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.describe().name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tools::{corpus_tools, Corpus, SearchText};

    #[test]
    fn preserves_insertion_order() {
        let registry = ToolRegistry::with_tools(corpus_tools(Arc::new(Corpus::default()))).unwrap();
        assert_eq!(
            registry.names(),
            vec!["search_text", "search_documents", "search_blueprint", "search_tables"]
        );
        assert_eq!(registry.definitions().len(), 4);
    }

    #[test]
    fn rejects_duplicate_names() {
        let corpus = Arc::new(Corpus::default());
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchText::new(corpus.clone()))).unwrap();

        let err = registry.register(Arc::new(SearchText::new(corpus))).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("search_text".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let registry = ToolRegistry::with_tools(corpus_tools(Arc::new(Corpus::default()))).unwrap();
        assert!(registry.get("search_blueprint").is_some());
        assert!(registry.get("search_web").is_none());
        assert!(!registry.is_empty());
    }
}
