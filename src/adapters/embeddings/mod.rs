//! Embedder adapters.
//!
//! - `HashingEmbedder` - deterministic feature hashing, no network (tests, offline runs)
//! - `OpenAIEmbedder` - OpenAI-compatible `/embeddings` endpoint

mod hashing_embedder;
mod openai_embedder;

pub use hashing_embedder::HashingEmbedder;
pub use openai_embedder::{OpenAIEmbedder, OpenAIEmbedderConfig};
