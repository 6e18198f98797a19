//! Language model backends.
//!
//! The OpenAI and Anthropic clients speak HTTP. The failover wrapper chains
//! them. The mock replays queued or scripted replies for tests.

mod anthropic_provider;
mod failover_provider;
mod mock_provider;
mod openai_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use failover_provider::{
    events as ai_events, AIEventCallback, FailoverAIProvider, NoOpEventCallback,
    TracingEventCallback,
};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
