//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the routing core and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - LLM completions for routing and synthesis
//! - `RetrievalTool` - one retrieval capability (document, image, table search)
//! - `Embedder` - text embeddings for example similarity
//! - `ExampleStore` - append-only few-shot example corpus

mod ai_provider;
mod embedder;
mod example_store;
mod retrieval_tool;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, RequestPurpose, ResponseFormat, TokenUsage,
};
pub use embedder::{Embedder, EmbeddingError};
pub use example_store::{ExampleStore, ExampleStoreError};
pub use retrieval_tool::{RetrievalError, RetrievalTool, ToolError};
