//! Query pipeline - runs one query through its whole lifecycle.
//!
//! route -> dispatch (parallel) -> aggregate -> synthesise, with direct
//! answers and clarifications short-circuiting after routing. Every path
//! ends in a [`QueryOutcome`]; provider and tool failures become failed
//! outcomes with next steps rather than errors.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::{InvocationDispatcher, QueryRouter, Synthesizer};
use crate::domain::aggregation::{Aggregator, Confidence, InvocationOutcome};
use crate::domain::foundation::{ErrorCode, QueryId, ValidationError};
use crate::domain::query::{QueryLifecycle, QueryOutcome, QueryStage, StageTransition};
use crate::domain::routing::RoutingDecision;
use crate::domain::tools::ToolRunStatus;

/// Command to answer one user query.
#[derive(Debug, Clone)]
pub struct AskQueryCommand {
    pub query_id: QueryId,
    pub query: String,
}

impl AskQueryCommand {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query_id: QueryId::new(),
            query: query.into(),
        }
    }
}

/// Per-tool execution summary.
#[derive(Debug, Clone, Serialize)]
pub struct ToolRunSummary {
    pub tool: String,
    pub status: ToolRunStatus,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub records: usize,
}

impl From<&InvocationOutcome> for ToolRunSummary {
    fn from(outcome: &InvocationOutcome) -> Self {
        Self {
            tool: outcome.invocation.tool_name().to_string(),
            status: outcome.status(),
            attempts: outcome.attempts,
            elapsed_ms: outcome.elapsed_ms,
            records: outcome.result.as_ref().map(Vec::len).unwrap_or(0),
        }
    }
}

/// Result of handling a query.
#[derive(Debug, Clone, Serialize)]
pub struct AskQueryResult {
    pub query_id: QueryId,
    pub outcome: QueryOutcome,
    /// Absent only when routing itself failed or was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<RoutingDecision>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_runs: Vec<ToolRunSummary>,
    pub stages: Vec<StageTransition>,
}

impl AskQueryResult {
    pub fn final_stage(&self) -> Option<QueryStage> {
        self.stages.last().map(|t| t.stage)
    }
}

#[derive(Debug, Clone, Error)]
pub enum AskQueryError {
    /// The pipeline tried an illegal stage transition.
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] ValidationError),
}

pub struct QueryPipeline {
    router: Arc<QueryRouter>,
    dispatcher: Arc<InvocationDispatcher>,
    aggregator: Aggregator,
    synthesizer: Arc<Synthesizer>,
}

impl QueryPipeline {
    pub fn new(
        router: Arc<QueryRouter>,
        dispatcher: Arc<InvocationDispatcher>,
        aggregator: Aggregator,
        synthesizer: Arc<Synthesizer>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            aggregator,
            synthesizer,
        }
    }

    pub async fn handle(&self, cmd: AskQueryCommand) -> Result<AskQueryResult, AskQueryError> {
        self.handle_cancellable(cmd, &CancellationToken::new()).await
    }

    /// Handles `cmd`, abandoning in-flight work once `cancel` fires.
    pub async fn handle_cancellable(
        &self,
        cmd: AskQueryCommand,
        cancel: &CancellationToken,
    ) -> Result<AskQueryResult, AskQueryError> {
        let mut run = Run::new(cmd.query_id);
        info!(query_id = %cmd.query_id, "Query received");

        let tools = self.dispatcher.registry().definitions();
        let routed = tokio::select! {
            _ = cancel.cancelled() => None,
            routed = self.router.route(cmd.query_id, &cmd.query, &tools) => Some(routed),
        };
        let decision = match routed {
            None => return run.fail(ErrorCode::Cancelled),
            Some(Err(err)) => {
                warn!(query_id = %cmd.query_id, error = %err, "Routing failed");
                return run.fail(ErrorCode::RoutingUnavailable);
            }
            Some(Ok(decision)) => decision,
        };
        run.lifecycle.advance(QueryStage::Routed)?;
        run.decision = Some(decision.clone());

        let invocations = match decision {
            RoutingDecision::DirectAnswer { answer } => {
                run.lifecycle.advance(QueryStage::Synthesized)?;
                return Ok(run.finish(QueryOutcome::Answered {
                    answer,
                    citations: Vec::new(),
                    confidence: Confidence::Full,
                    notice: None,
                }));
            }
            RoutingDecision::Clarification { question, .. } => {
                run.lifecycle.advance(QueryStage::ClarificationRequested)?;
                return Ok(run.finish(QueryOutcome::Clarification { question }));
            }
            RoutingDecision::Invocations { invocations, .. } => invocations,
        };

        run.lifecycle.advance(QueryStage::Executing)?;
        let outcomes = self.dispatcher.dispatch(invocations.as_slice(), cancel).await;
        run.tool_runs = outcomes.iter().map(ToolRunSummary::from).collect();
        if cancel.is_cancelled() {
            return run.fail(ErrorCode::Cancelled);
        }

        run.lifecycle.advance(QueryStage::Aggregating)?;
        let context = match self.aggregator.aggregate(outcomes) {
            Ok(context) => context,
            Err(err) => {
                warn!(query_id = %cmd.query_id, error = %err, "No tool produced results");
                return run.fail(ErrorCode::AllToolsFailed);
            }
        };

        let synthesized = tokio::select! {
            _ = cancel.cancelled() => None,
            answer = self.synthesizer.synthesize(cmd.query_id, &cmd.query, &context) => Some(answer),
        };
        let answer = match synthesized {
            None => return run.fail(ErrorCode::Cancelled),
            Some(Err(err)) => {
                warn!(query_id = %cmd.query_id, error = %err, "Synthesis failed");
                return run.fail(ErrorCode::SynthesisFailed);
            }
            Some(Ok(answer)) => answer,
        };

        run.lifecycle.advance(QueryStage::Synthesized)?;
        info!(
            query_id = %cmd.query_id,
            citations = context.entries().len(),
            confidence = ?context.confidence(),
            elapsed_ms = run.lifecycle.elapsed_ms(),
            "Query answered"
        );
        Ok(run.finish(QueryOutcome::Answered {
            answer,
            citations: context.citations(),
            confidence: context.confidence(),
            notice: context.omission_notice(),
        }))
    }
}

/// State accumulated while one query is handled.
struct Run {
    lifecycle: QueryLifecycle,
    decision: Option<RoutingDecision>,
    tool_runs: Vec<ToolRunSummary>,
}

impl Run {
    fn new(query_id: QueryId) -> Self {
        Self {
            lifecycle: QueryLifecycle::start(query_id),
            decision: None,
            tool_runs: Vec::new(),
        }
    }

    /// Moves to `Failed`, passing through `Executing` when a cancellation
    /// lands between routing and dispatch.
    fn fail(mut self, code: ErrorCode) -> Result<AskQueryResult, AskQueryError> {
        if self.lifecycle.stage() == QueryStage::Routed {
            self.lifecycle.advance(QueryStage::Executing)?;
        }
        self.lifecycle.advance(QueryStage::Failed)?;
        info!(query_id = %self.lifecycle.query_id(), code = %code, "Query failed");
        Ok(self.finish(QueryOutcome::failed(code)))
    }

    fn finish(self, outcome: QueryOutcome) -> AskQueryResult {
        AskQueryResult {
            query_id: self.lifecycle.query_id(),
            outcome,
            decision: self.decision,
            tool_runs: self.tool_runs,
            stages: self.lifecycle.history().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::embeddings::HashingEmbedder;
    use crate::adapters::example_store::InMemoryExampleStore;
    use crate::application::dispatcher::test_support::ScriptedTool;
    use crate::application::{
        DispatchSettings, RouterSettings, SynthesisSettings, ToolRegistry,
    };
    use crate::ports::{RequestPurpose, RetrievalError, RetrievalTool};
    use std::time::Duration;

    fn handler(ai: &MockAIProvider, tools: Vec<Arc<ScriptedTool>>) -> QueryPipeline {
        let ai: Arc<MockAIProvider> = Arc::new(ai.clone());
        let store = Arc::new(InMemoryExampleStore::new(Arc::new(HashingEmbedder::default())));
        let registry =
            ToolRegistry::with_tools(tools.into_iter().map(|t| t as Arc<dyn RetrievalTool>)).unwrap();
        QueryPipeline::new(
            Arc::new(QueryRouter::new(ai.clone(), store, RouterSettings::default())),
            Arc::new(InvocationDispatcher::new(
                registry,
                DispatchSettings {
                    tool_timeout: Duration::from_millis(200),
                    max_retries: 0,
                    retry_backoff: Duration::from_millis(1),
                },
            )),
            Aggregator::default(),
            Arc::new(Synthesizer::new(ai, SynthesisSettings::default())),
        )
    }

    fn stages(result: &AskQueryResult) -> Vec<QueryStage> {
        result.stages.iter().map(|t| t.stage).collect()
    }

    const BOTH_TOOLS: &str = r#"{"type":"tool_calls","calls":[
        {"tool":"alpha","parameters":{"query":"x"}},
        {"tool":"beta","parameters":{"query":"x"}}
    ]}"#;

    #[tokio::test]
    async fn full_path_answers_with_citations() {
        let ai = MockAIProvider::new()
            .with_response_for(RequestPurpose::Routing, BOTH_TOOLS)
            .with_response_for(RequestPurpose::Synthesis, "Answer [1][2].");
        let handler = handler(
            &ai,
            vec![
                ScriptedTool::new("alpha").returning(&["a1"]).into_arc(),
                ScriptedTool::new("beta").returning(&["b1"]).into_arc(),
            ],
        );

        let result = handler.handle(AskQueryCommand::new("q")).await.unwrap();

        match &result.outcome {
            QueryOutcome::Answered { answer, citations, confidence, notice } => {
                assert_eq!(answer, "Answer [1][2].");
                assert_eq!(citations.len(), 2);
                assert_eq!(*confidence, Confidence::Full);
                assert!(notice.is_none());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            stages(&result),
            vec![
                QueryStage::Received,
                QueryStage::Routed,
                QueryStage::Executing,
                QueryStage::Aggregating,
                QueryStage::Synthesized
            ]
        );
        assert_eq!(result.tool_runs.len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_is_flagged() {
        let ai = MockAIProvider::new()
            .with_response_for(RequestPurpose::Routing, BOTH_TOOLS)
            .with_response_for(RequestPurpose::Synthesis, "Partial answer [1].");
        let handler = handler(
            &ai,
            vec![
                ScriptedTool::new("alpha").returning(&["a1"]).into_arc(),
                ScriptedTool::new("beta")
                    .failing(RetrievalError::unavailable("tables", "down"))
                    .into_arc(),
            ],
        );

        let result = handler.handle(AskQueryCommand::new("q")).await.unwrap();

        match &result.outcome {
            QueryOutcome::Answered { confidence, notice, .. } => {
                assert_eq!(*confidence, Confidence::Reduced);
                assert!(notice.as_ref().unwrap().contains("beta"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn all_tools_failing_ends_failed() {
        let ai = MockAIProvider::new().with_response_for(RequestPurpose::Routing, BOTH_TOOLS);
        let handler = handler(
            &ai,
            vec![
                ScriptedTool::new("alpha").failing(RetrievalError::failed("x")).into_arc(),
                ScriptedTool::new("beta").failing(RetrievalError::failed("y")).into_arc(),
            ],
        );

        let result = handler.handle(AskQueryCommand::new("q")).await.unwrap();

        assert!(matches!(
            result.outcome,
            QueryOutcome::Failed { code: ErrorCode::AllToolsFailed, .. }
        ));
        assert_eq!(result.final_stage(), Some(QueryStage::Failed));
        assert!(ai.calls_for(RequestPurpose::Synthesis).is_empty());
    }

    #[tokio::test]
    async fn direct_answer_skips_tools_and_synthesis() {
        let ai = MockAIProvider::new().with_response_for(
            RequestPurpose::Routing,
            r#"{"type":"direct_answer","answer":"A floor plan is a drawing."}"#,
        );
        let alpha = ScriptedTool::new("alpha").returning(&["a1"]).into_arc();
        let handler = handler(&ai, vec![alpha.clone()]);

        let result = handler.handle(AskQueryCommand::new("define floor plan")).await.unwrap();

        assert_eq!(result.outcome.kind(), "answered");
        assert_eq!(
            stages(&result),
            vec![QueryStage::Received, QueryStage::Routed, QueryStage::Synthesized]
        );
        assert_eq!(alpha.calls(), 0);
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn clarification_is_terminal() {
        let ai = MockAIProvider::new().with_response_for(
            RequestPurpose::Routing,
            r#"{"type":"clarification","question":"Which building?"}"#,
        );
        let handler = handler(&ai, vec![ScriptedTool::new("alpha").into_arc()]);

        let result = handler.handle(AskQueryCommand::new("the plans")).await.unwrap();

        assert!(matches!(&result.outcome, QueryOutcome::Clarification { question } if question == "Which building?"));
        assert_eq!(result.final_stage(), Some(QueryStage::ClarificationRequested));
    }

    #[tokio::test]
    async fn routing_failure_is_reported() {
        let ai = MockAIProvider::new().with_error_for(
            RequestPurpose::Routing,
            MockError::Unavailable {
                message: "maintenance".into(),
            },
        );
        let handler = handler(&ai, vec![ScriptedTool::new("alpha").into_arc()]);

        let result = handler.handle(AskQueryCommand::new("q")).await.unwrap();

        assert!(matches!(
            result.outcome,
            QueryOutcome::Failed { code: ErrorCode::RoutingUnavailable, .. }
        ));
        assert_eq!(stages(&result), vec![QueryStage::Received, QueryStage::Failed]);
        assert!(result.decision.is_none());
    }

    #[tokio::test]
    async fn synthesis_failure_is_reported() {
        let ai = MockAIProvider::new()
            .with_response_for(RequestPurpose::Routing, BOTH_TOOLS)
            .with_error_for(RequestPurpose::Synthesis, MockError::AuthenticationFailed);
        let handler = handler(
            &ai,
            vec![
                ScriptedTool::new("alpha").returning(&["a1"]).into_arc(),
                ScriptedTool::new("beta").returning(&["b1"]).into_arc(),
            ],
        );

        let result = handler.handle(AskQueryCommand::new("q")).await.unwrap();

        assert!(matches!(
            result.outcome,
            QueryOutcome::Failed { code: ErrorCode::SynthesisFailed, .. }
        ));
        assert_eq!(result.final_stage(), Some(QueryStage::Failed));
    }

    #[tokio::test]
    async fn cancellation_during_tools() {
        let ai = MockAIProvider::new().with_response_for(RequestPurpose::Routing, BOTH_TOOLS);
        let handler = handler(
            &ai,
            vec![
                ScriptedTool::new("alpha")
                    .returning(&["a1"])
                    .with_delay(Duration::from_secs(5))
                    .into_arc(),
                ScriptedTool::new("beta")
                    .returning(&["b1"])
                    .with_delay(Duration::from_secs(5))
                    .into_arc(),
            ],
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = handler
            .handle_cancellable(AskQueryCommand::new("q"), &cancel)
            .await
            .unwrap();

        assert!(matches!(
            result.outcome,
            QueryOutcome::Failed { code: ErrorCode::Cancelled, .. }
        ));
        assert!(result
            .tool_runs
            .iter()
            .all(|r| r.status == ToolRunStatus::Cancelled));
    }

    #[tokio::test]
    async fn cancelled_before_routing() {
        let ai = MockAIProvider::new()
            .with_response_for(RequestPurpose::Routing, BOTH_TOOLS)
            .with_delay(Duration::from_secs(5));
        let handler = handler(&ai, vec![ScriptedTool::new("alpha").into_arc()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = handler
            .handle_cancellable(AskQueryCommand::new("q"), &cancel)
            .await
            .unwrap();

        assert!(matches!(
            result.outcome,
            QueryOutcome::Failed { code: ErrorCode::Cancelled, .. }
        ));
        assert_eq!(stages(&result), vec![QueryStage::Received, QueryStage::Failed]);
    }
}
