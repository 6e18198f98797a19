//! Failover AI Provider - Wrapper that provides automatic failover between providers.
//!
//! When the primary provider fails with a transient error (rate limit, unavailable),
//! automatically falls back to the secondary provider if configured.
//!
//! # Example
//!
//! ```ignore
//! let provider = FailoverAIProvider::new(Arc::new(OpenAIProvider::new(openai_config)?))
//!     .with_fallback(Arc::new(AnthropicProvider::new(anthropic_config)?))
//!     .with_event_callback(Arc::new(TracingEventCallback));
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};

/// AI usage events for token accounting and failover monitoring.
pub mod events {
    use serde::Serialize;

    use crate::domain::foundation::{QueryId, Timestamp};
    use crate::ports::RequestPurpose;

    /// Emitted when a completion succeeds.
    #[derive(Debug, Clone, Serialize)]
    pub struct AITokensUsed {
        pub query_id: QueryId,
        pub purpose: RequestPurpose,
        pub provider: String,
        pub model: String,
        pub prompt_tokens: u32,
        pub completion_tokens: u32,
        pub occurred_at: Timestamp,
    }

    impl AITokensUsed {
        /// Total tokens used in this request.
        pub fn total_tokens(&self) -> u32 {
            self.prompt_tokens + self.completion_tokens
        }
    }

    /// Emitted when a provider failover occurs.
    #[derive(Debug, Clone, Serialize)]
    pub struct ProviderFallback {
        pub query_id: QueryId,
        pub primary_provider: String,
        pub fallback_provider: String,
        pub reason: String,
        pub occurred_at: Timestamp,
    }
}

/// Callback for receiving AI events (tokens used, failover).
pub trait AIEventCallback: Send + Sync {
    /// Called when tokens are used.
    fn on_tokens_used(&self, event: events::AITokensUsed);

    /// Called when a provider failover occurs.
    fn on_fallback(&self, event: events::ProviderFallback);
}

/// No-op event callback for when event tracking isn't needed.
#[derive(Debug, Clone, Copy)]
pub struct NoOpEventCallback;

impl AIEventCallback for NoOpEventCallback {
    fn on_tokens_used(&self, _event: events::AITokensUsed) {}
    fn on_fallback(&self, _event: events::ProviderFallback) {}
}

/// Event callback that writes structured log lines.
#[derive(Debug, Clone, Copy)]
pub struct TracingEventCallback;

impl AIEventCallback for TracingEventCallback {
    fn on_tokens_used(&self, event: events::AITokensUsed) {
        info!(
            query_id = %event.query_id,
            purpose = ?event.purpose,
            provider = %event.provider,
            model = %event.model,
            total_tokens = event.total_tokens(),
            "AI tokens used"
        );
    }

    fn on_fallback(&self, event: events::ProviderFallback) {
        warn!(
            query_id = %event.query_id,
            primary = %event.primary_provider,
            fallback = %event.fallback_provider,
            reason = %event.reason,
            "AI provider failover"
        );
    }
}

/// AI provider wrapper with automatic failover support.
///
/// On transient failures of the primary, tries the fallback once. Errors
/// that a second provider cannot fix (authentication, context length) are
/// returned as-is.
pub struct FailoverAIProvider {
    primary: Arc<dyn AIProvider>,
    fallback: Option<Arc<dyn AIProvider>>,
    event_callback: Arc<dyn AIEventCallback>,
}

impl FailoverAIProvider {
    /// Creates a new failover provider with only a primary provider.
    pub fn new(primary: Arc<dyn AIProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            event_callback: Arc::new(NoOpEventCallback),
        }
    }

    /// Adds a fallback provider.
    pub fn with_fallback(mut self, fallback: Arc<dyn AIProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Sets the event callback for receiving AI events.
    pub fn with_event_callback(mut self, callback: Arc<dyn AIEventCallback>) -> Self {
        self.event_callback = callback;
        self
    }

    fn emit_tokens_used(
        &self,
        provider: &dyn AIProvider,
        request: &CompletionRequest,
        response: &CompletionResponse,
    ) {
        self.event_callback.on_tokens_used(events::AITokensUsed {
            query_id: request.metadata.query_id,
            purpose: request.metadata.purpose,
            provider: provider.provider_info().name,
            model: response.model.clone(),
            prompt_tokens: response.usage.prompt_tokens,
            completion_tokens: response.usage.completion_tokens,
            occurred_at: crate::domain::foundation::Timestamp::now(),
        });
    }

    fn emit_fallback(&self, fallback: &dyn AIProvider, request: &CompletionRequest, reason: &str) {
        self.event_callback.on_fallback(events::ProviderFallback {
            query_id: request.metadata.query_id,
            primary_provider: self.primary.provider_info().name,
            fallback_provider: fallback.provider_info().name,
            reason: reason.to_string(),
            occurred_at: crate::domain::foundation::Timestamp::now(),
        });
    }
}

#[async_trait]
impl AIProvider for FailoverAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.primary.complete(request.clone()).await {
            Ok(response) => {
                self.emit_tokens_used(self.primary.as_ref(), &request, &response);
                Ok(response)
            }
            Err(err) if err.is_retryable() => match &self.fallback {
                Some(fallback) => {
                    self.emit_fallback(fallback.as_ref(), &request, &err.to_string());
                    let response = fallback.complete(request.clone()).await?;
                    self.emit_tokens_used(fallback.as_ref(), &request, &response);
                    Ok(response)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Use primary provider's estimation
        self.primary.estimate_tokens(text)
    }

    fn provider_info(&self) -> ProviderInfo {
        // Report primary provider's info
        self.primary.provider_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::foundation::QueryId;
    use crate::ports::{MessageRole, RequestMetadata, RequestPurpose};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct TestEventCallback {
        tokens_used_count: AtomicU32,
        fallback_count: AtomicU32,
    }

    impl AIEventCallback for TestEventCallback {
        fn on_tokens_used(&self, _event: events::AITokensUsed) {
            self.tokens_used_count.fetch_add(1, Ordering::SeqCst);
        }

        fn on_fallback(&self, _event: events::ProviderFallback) {
            self.fallback_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(QueryId::new(), RequestPurpose::Routing))
            .with_message(MessageRole::User, "Hello")
    }

    fn wrap(
        primary: MockAIProvider,
        fallback: MockAIProvider,
    ) -> (FailoverAIProvider, Arc<TestEventCallback>) {
        let callback = Arc::new(TestEventCallback::default());
        let provider = FailoverAIProvider::new(Arc::new(primary))
            .with_fallback(Arc::new(fallback))
            .with_event_callback(callback.clone());
        (provider, callback)
    }

    #[tokio::test]
    async fn primary_success_no_fallback_used() {
        let (provider, callback) = wrap(
            MockAIProvider::new().with_response("Hi there!"),
            MockAIProvider::new().with_response("Fallback response"),
        );

        let response = provider.complete(make_request()).await.unwrap();

        assert_eq!(response.content, "Hi there!");
        assert_eq!(callback.tokens_used_count.load(Ordering::SeqCst), 1);
        assert_eq!(callback.fallback_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_rate_limited_uses_fallback() {
        let (provider, callback) = wrap(
            MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 }),
            MockAIProvider::new().with_response("Fallback response"),
        );

        let response = provider.complete(make_request()).await.unwrap();

        assert_eq!(response.content, "Fallback response");
        assert_eq!(callback.tokens_used_count.load(Ordering::SeqCst), 1);
        assert_eq!(callback.fallback_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retryable_error_not_fallback() {
        let (provider, callback) = wrap(
            MockAIProvider::new().with_error(MockError::AuthenticationFailed),
            MockAIProvider::new().with_response("Fallback response"),
        );

        let err = provider.complete(make_request()).await.unwrap_err();

        assert!(matches!(err, AIError::AuthenticationFailed));
        assert_eq!(callback.fallback_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_fallback_configured_returns_error() {
        let primary =
            MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });
        let provider = FailoverAIProvider::new(Arc::new(primary));

        assert!(provider.complete(make_request()).await.is_err());
    }

    #[tokio::test]
    async fn fallback_also_fails_returns_fallback_error() {
        let (provider, callback) = wrap(
            MockAIProvider::new().with_error(MockError::Network {
                message: "reset".into(),
            }),
            MockAIProvider::new().with_error(MockError::AuthenticationFailed),
        );

        let err = provider.complete(make_request()).await.unwrap_err();

        assert!(matches!(err, AIError::AuthenticationFailed));
        assert_eq!(callback.fallback_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tokens_used_event_totals() {
        let event = events::AITokensUsed {
            query_id: QueryId::new(),
            purpose: RequestPurpose::Synthesis,
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            prompt_tokens: 100,
            completion_tokens: 50,
            occurred_at: crate::domain::foundation::Timestamp::now(),
        };
        assert_eq!(event.total_tokens(), 150);
    }
}
