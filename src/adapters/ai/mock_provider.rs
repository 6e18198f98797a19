//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing routing and synthesis to be tested without real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, optionally per request purpose
//! - Scripted responses computed from the request
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response_for(RequestPurpose::Routing, r#"{"type":"direct_answer","answer":"..."}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    RequestPurpose, TokenUsage,
};

type Script = Arc<dyn Fn(&CompletionRequest) -> Option<MockResponse> + Send + Sync>;

/// Mock AI provider for testing.
///
/// Response lookup order: the queue for the request's purpose, the shared
/// queue, the script, then a fixed default.
#[derive(Clone)]
pub struct MockAIProvider {
    /// Responses consumed in order regardless of purpose.
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Responses consumed in order for one purpose only.
    by_purpose: Arc<Mutex<HashMap<RequestPurpose, VecDeque<MockResponse>>>>,
    script: Option<Script>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl fmt::Debug for MockAIProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAIProvider")
            .field("info", &self.info)
            .field("delay", &self.delay)
            .field("scripted", &self.script.is_some())
            .finish()
    }
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    /// Return an error.
    Error(MockError),
}

impl MockResponse {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Success {
            content: content.into(),
            usage: TokenUsage::new(10, 20),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate context too long.
    ContextTooLong { tokens: u32, max: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContextTooLong { tokens, max } => AIError::context_too_long(tokens, max),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::timeout(timeout_secs),
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            by_purpose: Arc::new(Mutex::new(HashMap::new())),
            script: None,
            info: ProviderInfo::new("mock", "mock-model-1", 128000).with_json_mode(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the shared queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::content(content));
        self
    }

    /// Adds a successful response for one purpose.
    pub fn with_response_for(self, purpose: RequestPurpose, content: impl Into<String>) -> Self {
        self.push_for(purpose, MockResponse::content(content));
        self
    }

    /// Adds an error response to the shared queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Error(error));
        self
    }

    /// Adds an error response for one purpose.
    pub fn with_error_for(self, purpose: RequestPurpose, error: MockError) -> Self {
        self.push_for(purpose, MockResponse::Error(error));
        self
    }

    /// Computes responses from the request once the queues are empty.
    pub fn with_script<F>(mut self, script: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Option<MockResponse> + Send + Sync + 'static,
    {
        self.script = Some(Arc::new(script));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns recorded calls for one purpose.
    pub fn calls_for(&self, purpose: RequestPurpose) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.metadata.purpose == purpose)
            .cloned()
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn push_for(&self, purpose: RequestPurpose, response: MockResponse) {
        self.by_purpose
            .lock()
            .unwrap()
            .entry(purpose)
            .or_default()
            .push_back(response);
    }

    fn next_response(&self, request: &CompletionRequest) -> MockResponse {
        if let Some(response) = self
            .by_purpose
            .lock()
            .unwrap()
            .get_mut(&request.metadata.purpose)
            .and_then(|queue| queue.pop_front())
        {
            return response;
        }
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response;
        }
        self.script
            .as_ref()
            .and_then(|script| script(request))
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
                usage: TokenUsage::new(5, 10),
                finish_reason: FinishReason::Stop,
            })
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.next_response(&request);
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match response {
            MockResponse::Success {
                content,
                usage,
                finish_reason,
            } => Ok(CompletionResponse {
                content,
                usage,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Rough approximation: ~4 characters per token
        (text.len() / 4).max(1) as u32
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::QueryId;
    use crate::ports::{MessageRole, RequestMetadata};

    fn request(purpose: RequestPurpose) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(QueryId::new(), purpose))
            .with_message(MessageRole::User, "Hello")
    }

    #[tokio::test]
    async fn returns_responses_in_order_then_default() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");

        let r1 = provider.complete(request(RequestPurpose::Routing)).await.unwrap();
        let r2 = provider.complete(request(RequestPurpose::Routing)).await.unwrap();
        let r3 = provider.complete(request(RequestPurpose::Routing)).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
        assert_eq!(r3.content, "Mock response");
        assert_eq!(r1.model, "mock-model-1");
    }

    #[tokio::test]
    async fn purpose_queues_take_precedence() {
        let provider = MockAIProvider::new()
            .with_response("shared")
            .with_response_for(RequestPurpose::Synthesis, "answer");

        let synth = provider.complete(request(RequestPurpose::Synthesis)).await.unwrap();
        let route = provider.complete(request(RequestPurpose::Routing)).await.unwrap();

        assert_eq!(synth.content, "answer");
        assert_eq!(route.content, "shared");
    }

    #[tokio::test]
    async fn script_sees_the_request() {
        let provider = MockAIProvider::new().with_script(|req| {
            req.last_user_message()
                .map(|m| MockResponse::content(m.to_uppercase()))
        });

        let response = provider.complete(request(RequestPurpose::Routing)).await.unwrap();
        assert_eq!(response.content, "HELLO");
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let provider =
            MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });

        let err = provider
            .complete(request(RequestPurpose::Routing))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn tracks_calls_by_purpose() {
        let provider = MockAIProvider::new();

        provider.complete(request(RequestPurpose::Routing)).await.unwrap();
        provider.complete(request(RequestPurpose::Synthesis)).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls_for(RequestPurpose::Routing).len(), 1);

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn respects_delay() {
        let provider = MockAIProvider::new().with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.complete(request(RequestPurpose::Routing)).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn estimates_tokens() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.estimate_tokens("Hi"), 1);
        assert_eq!(provider.estimate_tokens("Hello world"), 2);
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::ContextTooLong { tokens: 100, max: 50 }.into();
        assert!(matches!(err, AIError::ContextTooLong { tokens: 100, max: 50 }));

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, AIError::Timeout { timeout_secs: 30 }));
    }
}
