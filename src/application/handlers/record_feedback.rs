//! RecordFeedback handler - closes the improvement loop.
//!
//! Verified routes flow back into the example store so later queries get
//! better few-shot guidance. A correction must itself validate against the
//! current tools; an invalid example would teach the router invalid calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::ToolRegistry;
use crate::domain::few_shot::ExampleSource;
use crate::domain::foundation::{ExampleId, QueryId};
use crate::domain::routing::{resolve_calls, RouteProposal};
use crate::ports::{ExampleStore, ExampleStoreError};

/// What the user said about a routed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rating", rename_all = "snake_case")]
pub enum Feedback {
    Positive,
    Negative,
    /// The route that should have been taken.
    Correction { route: RouteProposal },
}

#[derive(Debug, Clone)]
pub struct RecordFeedbackCommand {
    pub query_id: QueryId,
    pub query: String,
    /// The route that was actually taken.
    pub routed: RouteProposal,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFeedbackResult {
    Appended(ExampleId),
    /// Negative rating without a correction: nothing to learn from.
    LoggedOnly,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordFeedbackError {
    #[error("correction is not a valid route: {0}")]
    InvalidCorrection(String),

    #[error(transparent)]
    Store(#[from] ExampleStoreError),
}

pub struct RecordFeedbackHandler {
    store: Arc<dyn ExampleStore>,
    registry: ToolRegistry,
}

impl RecordFeedbackHandler {
    pub fn new(store: Arc<dyn ExampleStore>, registry: ToolRegistry) -> Self {
        Self { store, registry }
    }

    pub async fn handle(
        &self,
        cmd: RecordFeedbackCommand,
    ) -> Result<RecordFeedbackResult, RecordFeedbackError> {
        let (route, source) = match cmd.feedback {
            Feedback::Positive => (cmd.routed, ExampleSource::ConfirmedRoute),
            Feedback::Correction { route } => {
                self.check_correction(cmd.query_id, &route)?;
                (route, ExampleSource::Correction)
            }
            Feedback::Negative => {
                info!(
                    query_id = %cmd.query_id,
                    route = %cmd.routed.kind(),
                    tools = ?cmd.routed.tool_names(),
                    "Negative feedback without correction"
                );
                return Ok(RecordFeedbackResult::LoggedOnly);
            }
        };

        let record = self.store.add(&cmd.query, route, source).await?;
        info!(
            query_id = %cmd.query_id,
            example_id = %record.id(),
            source = ?source,
            "Feedback appended as example"
        );
        Ok(RecordFeedbackResult::Appended(record.id()))
    }

    fn check_correction(
        &self,
        query_id: QueryId,
        route: &RouteProposal,
    ) -> Result<(), RecordFeedbackError> {
        let RouteProposal::ToolCalls { calls } = route else {
            return Ok(());
        };
        if calls.is_empty() {
            return Err(RecordFeedbackError::InvalidCorrection(
                "tool_calls must name at least one tool".to_string(),
            ));
        }

        let resolution = resolve_calls(query_id, calls, &self.registry.definitions());
        if resolution.is_clean() {
            Ok(())
        } else {
            Err(RecordFeedbackError::InvalidCorrection(
                resolution
                    .rejections
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbedder;
    use crate::adapters::example_store::InMemoryExampleStore;
    use crate::adapters::tools::{corpus_tools, Corpus};
    use crate::domain::routing::ProposedCall;
    use serde_json::json;

    fn setup() -> (RecordFeedbackHandler, Arc<InMemoryExampleStore>) {
        let store = Arc::new(InMemoryExampleStore::new(Arc::new(HashingEmbedder::default())));
        let registry = ToolRegistry::with_tools(corpus_tools(Arc::new(Corpus::default()))).unwrap();
        (RecordFeedbackHandler::new(store.clone(), registry), store)
    }

    fn blueprint_route(description: &str) -> RouteProposal {
        RouteProposal::tool_calls(vec![ProposedCall::new(
            "search_blueprint",
            json!({ "description": description }),
        )])
    }

    fn command(feedback: Feedback) -> RecordFeedbackCommand {
        RecordFeedbackCommand {
            query_id: QueryId::new(),
            query: "Find blueprints for city hall".to_string(),
            routed: RouteProposal::tool_calls(vec![ProposedCall::new(
                "search_text",
                json!({ "query": "city hall" }),
            )]),
            feedback,
        }
    }

    #[tokio::test]
    async fn positive_rating_appends_the_taken_route() {
        let (handler, store) = setup();

        let result = handler.handle(command(Feedback::Positive)).await.unwrap();

        assert!(matches!(result, RecordFeedbackResult::Appended(_)));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].source(), ExampleSource::ConfirmedRoute);
        assert_eq!(snapshot[0].route().tool_names(), vec!["search_text"]);
    }

    #[tokio::test]
    async fn correction_appends_the_corrected_route() {
        let (handler, store) = setup();

        handler
            .handle(command(Feedback::Correction {
                route: blueprint_route("city hall"),
            }))
            .await
            .unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].source(), ExampleSource::Correction);
        assert_eq!(snapshot[0].route().tool_names(), vec!["search_blueprint"]);
    }

    #[tokio::test]
    async fn negative_rating_only_logs() {
        let (handler, store) = setup();

        let result = handler.handle(command(Feedback::Negative)).await.unwrap();

        assert_eq!(result, RecordFeedbackResult::LoggedOnly);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_correction_is_rejected() {
        let (handler, store) = setup();

        let err = handler
            .handle(command(Feedback::Correction {
                route: RouteProposal::tool_calls(vec![ProposedCall::new(
                    "search_blueprint",
                    json!({ "start_date": "2010-13-01" }),
                )]),
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, RecordFeedbackError::InvalidCorrection(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn direct_answer_correction_is_accepted() {
        let (handler, store) = setup();

        handler
            .handle(command(Feedback::Correction {
                route: RouteProposal::direct_answer("A blueprint is a technical drawing."),
            }))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn feedback_deserializes_from_tagged_json() {
        let feedback: Feedback = serde_json::from_value(json!({
            "rating": "correction",
            "route": { "type": "direct_answer", "answer": "..." }
        }))
        .unwrap();
        assert!(matches!(feedback, Feedback::Correction { .. }));
    }
}
