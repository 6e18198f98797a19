//! Query router - maps a free-text query to a routing decision.
//!
//! The model's output is treated as untrusted input: it is parsed, checked
//! against the tool schemas and, when invalid, sent back with the problems
//! listed. After the retry budget is spent the router asks the user for
//! clarification instead of executing anything it could not validate.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::few_shot::ScoredExample;
use crate::domain::foundation::QueryId;
use crate::domain::routing::{
    build_system_prompt, build_user_prompt, detect_hints, resolve_calls, InvocationSet,
    Resolution, RouteProposal, RoutingAmbiguity, RoutingDecision,
};
use crate::domain::tools::ToolDefinition;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, ExampleStore, MessageRole, RequestMetadata,
    RequestPurpose,
};

/// Tunables for [`QueryRouter`].
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Few-shot examples retrieved per query.
    pub few_shot_k: usize,
    /// Re-prompts after the first attempt when output is invalid.
    pub max_extraction_retries: u32,
    /// Bound on each completion call.
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            few_shot_k: 5,
            max_extraction_retries: 2,
            timeout: Duration::from_secs(30),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }
}

/// Routing could not run at all. Invalid or ambiguous model output is not
/// an error; it becomes a clarification decision.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing provider failed: {0}")]
    Provider(#[from] AIError),
}

pub struct QueryRouter {
    ai: Arc<dyn AIProvider>,
    examples: Arc<dyn ExampleStore>,
    settings: RouterSettings,
}

impl QueryRouter {
    pub fn new(
        ai: Arc<dyn AIProvider>,
        examples: Arc<dyn ExampleStore>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            ai,
            examples,
            settings,
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Retrieves few-shot examples for `query`, then routes it.
    ///
    /// Example retrieval failures only cost guidance, so they are logged
    /// and routing continues without examples.
    pub async fn route(
        &self,
        query_id: QueryId,
        query: &str,
        tools: &[&ToolDefinition],
    ) -> Result<RoutingDecision, RouteError> {
        let examples = match self.examples.retrieve(query, self.settings.few_shot_k).await {
            Ok(examples) => examples,
            Err(err) => {
                warn!(query_id = %query_id, error = %err, "Few-shot retrieval failed; routing without examples");
                Vec::new()
            }
        };
        self.route_with_examples(query_id, query, tools, &examples).await
    }

    /// Routes `query` against `tools`, guided by `examples`.
    pub async fn route_with_examples(
        &self,
        query_id: QueryId,
        query: &str,
        tools: &[&ToolDefinition],
        examples: &[ScoredExample],
    ) -> Result<RoutingDecision, RouteError> {
        if query.trim().is_empty() {
            return Ok(RoutingDecision::clarify(RoutingAmbiguity::AmbiguousQuery));
        }

        let hints = detect_hints(query);
        let system_prompt = build_system_prompt(tools, examples);
        let known_tools: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        let mut conversation = vec![(MessageRole::User, build_user_prompt(query, &hints))];

        let max_attempts = self.settings.max_extraction_retries + 1;
        let mut last_issue = RoutingAmbiguity::UnreadableResponse {
            attempts: 0,
            details: String::new(),
        };
        let mut best_partial: Option<Resolution> = None;

        for attempt in 1..=max_attempts {
            let content = self.complete(query_id, &system_prompt, &conversation).await?;

            let usable = match RouteProposal::parse(&content) {
                Ok(RouteProposal::DirectAnswer { answer }) if answer.trim().is_empty() => {
                    Err("the direct answer was empty".to_string())
                }
                Ok(proposal) => Ok(proposal),
                Err(err) => Err(err.to_string()),
            };
            let proposal = match usable {
                Ok(proposal) => proposal,
                Err(details) => {
                    debug!(query_id = %query_id, attempt, error = %details, "Unreadable routing output");
                    conversation.push((MessageRole::Assistant, content));
                    conversation.push((
                        MessageRole::User,
                        format!(
                            "Your previous reply could not be used: {}. Reply with exactly one JSON object in one of the required forms.",
                            details
                        ),
                    ));
                    last_issue = RoutingAmbiguity::UnreadableResponse {
                        attempts: attempt,
                        details,
                    };
                    continue;
                }
            };

            let calls = match proposal {
                RouteProposal::DirectAnswer { answer } => {
                    info!(query_id = %query_id, attempt, "Routed to direct answer");
                    return Ok(RoutingDecision::direct_answer(answer));
                }
                RouteProposal::Clarification { question } => {
                    info!(query_id = %query_id, attempt, "Router asked for clarification");
                    let reason = RoutingAmbiguity::AmbiguousQuery;
                    let question = if question.trim().is_empty() {
                        reason.default_question().to_string()
                    } else {
                        question
                    };
                    return Ok(RoutingDecision::Clarification { question, reason });
                }
                RouteProposal::ToolCalls { calls } => calls,
            };

            if tools.is_empty() {
                return Ok(RoutingDecision::clarify(RoutingAmbiguity::NoToolsAvailable));
            }
            if calls.is_empty() {
                return Ok(RoutingDecision::clarify(RoutingAmbiguity::NoApplicableTool));
            }

            let resolution = resolve_calls(query_id, &calls, tools);
            let feedback = match resolution.feedback(&known_tools) {
                None => return Ok(self.commit(query_id, attempt, resolution)),
                Some(feedback) => feedback,
            };

            debug!(
                query_id = %query_id,
                attempt,
                rejected = resolution.rejections.len(),
                "Routing output failed validation"
            );
            last_issue = RoutingAmbiguity::InvalidParameters {
                attempts: attempt,
                details: resolution
                    .rejections
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            };
            // Keep the attempt that validated the most calls; ties go to the later one.
            let better = best_partial
                .as_ref()
                .map_or(true, |best| resolution.invocations.len() >= best.invocations.len());
            if better {
                best_partial = Some(resolution);
            }
            conversation.push((MessageRole::Assistant, content));
            conversation.push((MessageRole::User, feedback));
        }

        // Calls that never validated are dropped whole; the ones that did
        // validate are still safe to run.
        if let Some(partial) = best_partial.filter(|r| !r.invocations.is_empty()) {
            warn!(
                query_id = %query_id,
                dropped = ?partial.dropped(),
                "Proceeding with the calls that validated"
            );
            return Ok(self.commit(query_id, max_attempts, partial));
        }

        warn!(query_id = %query_id, reason = %last_issue, "Falling back to clarification");
        Ok(RoutingDecision::clarify(last_issue))
    }

    fn commit(&self, query_id: QueryId, attempt: u32, resolution: Resolution) -> RoutingDecision {
        let dropped = resolution.dropped();
        match InvocationSet::new(resolution.invocations) {
            Some(invocations) => {
                info!(
                    query_id = %query_id,
                    attempt,
                    tools = ?invocations.as_slice().iter().map(|i| i.tool_name()).collect::<Vec<_>>(),
                    "Routed to tools"
                );
                RoutingDecision::Invocations {
                    invocations,
                    dropped,
                }
            }
            None => RoutingDecision::clarify(RoutingAmbiguity::NoApplicableTool),
        }
    }

    async fn complete(
        &self,
        query_id: QueryId,
        system_prompt: &str,
        conversation: &[(MessageRole, String)],
    ) -> Result<String, RouteError> {
        let mut request =
            CompletionRequest::new(RequestMetadata::new(query_id, RequestPurpose::Routing))
                .with_system_prompt(system_prompt)
                .with_temperature(self.settings.temperature)
                .with_max_tokens(self.settings.max_tokens)
                .with_json_output();
        for (role, content) in conversation {
            request = request.with_message(*role, content.clone());
        }

        match timeout(self.settings.timeout, self.ai.complete(request)).await {
            Ok(result) => Ok(result?.content),
            Err(_) => Err(AIError::timed_out_after(self.settings.timeout).into()),
        }
    }
}
