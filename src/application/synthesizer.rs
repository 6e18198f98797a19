//! Answer synthesis from aggregated context.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::aggregation::AggregatedContext;
use crate::domain::foundation::QueryId;
use crate::ports::{AIError, AIProvider, CompletionRequest, MessageRole, RequestMetadata, RequestPurpose};

const SYNTHESIS_INSTRUCTIONS: &str = "\
You answer questions using only the numbered context provided.
- Cite every statement with the number of the context entry it comes from, like [1] or [2][3].
- If the context does not contain the answer, say so plainly instead of guessing.
- If the context notes that some sources could not be searched, mention that the answer may be incomplete.";

/// Answer used when every tool succeeded but none returned anything.
pub const NO_RESULTS_ANSWER: &str =
    "I searched the available sources but couldn't find anything matching your question.";

#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis provider failed: {0}")]
    Provider(#[from] AIError),

    #[error("synthesis produced an empty answer")]
    EmptyAnswer,
}

pub struct Synthesizer {
    ai: Arc<dyn AIProvider>,
    settings: SynthesisSettings,
}

impl Synthesizer {
    pub fn new(ai: Arc<dyn AIProvider>, settings: SynthesisSettings) -> Self {
        Self { ai, settings }
    }

    /// Writes an answer to `query` grounded in `context`.
    pub async fn synthesize(
        &self,
        query_id: QueryId,
        query: &str,
        context: &AggregatedContext,
    ) -> Result<String, SynthesisError> {
        if context.is_empty() {
            return Ok(match context.omission_notice() {
                Some(notice) => format!("{} {}", NO_RESULTS_ANSWER, notice),
                None => NO_RESULTS_ANSWER.to_string(),
            });
        }

        let request = CompletionRequest::new(RequestMetadata::new(query_id, RequestPurpose::Synthesis))
            .with_system_prompt(SYNTHESIS_INSTRUCTIONS)
            .with_message(
                MessageRole::User,
                format!("Context:\n\n{}\nQuestion: {}", context.render_for_prompt(), query),
            )
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let response = match timeout(self.settings.timeout, self.ai.complete(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(AIError::timed_out_after(self.settings.timeout).into()),
        };

        let answer = response.content.trim();
        if answer.is_empty() {
            return Err(SynthesisError::EmptyAnswer);
        }
        debug!(
            query_id = %query_id,
            tokens = response.usage.total_tokens,
            citations = context.entries().len(),
            "Answer synthesised"
        );
        Ok(answer.to_string())
    }
}
