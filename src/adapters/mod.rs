//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the router to external systems:
//! - `ai` - LLM providers (OpenAI, Anthropic, failover, mock)
//! - `embeddings` - text embedders for example retrieval
//! - `example_store` - few-shot example corpus and seed loading
//! - `tools` - retrieval tools over an in-memory corpus

pub mod ai;
pub mod data_file;
pub mod embeddings;
pub mod example_store;
pub mod tools;

pub use ai::{FailoverAIProvider, MockAIProvider};
pub use data_file::{load_data_file, DataFileError};
pub use embeddings::{HashingEmbedder, OpenAIEmbedder};
pub use example_store::InMemoryExampleStore;
pub use tools::{corpus_tools, Corpus};
