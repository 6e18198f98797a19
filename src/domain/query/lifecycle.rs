//! Query lifecycle state machine.
//!
//! ```text
//! Received -> Routed -> Executing -> Aggregating -> Synthesized
//!               |           |             |
//!               |           +-------------+--> Failed
//!               +--> Synthesized (direct answer)
//!               +--> ClarificationRequested
//! Received -> Failed (router unavailable)
//! ```

use serde::Serialize;

use crate::domain::foundation::{QueryId, StateMachine, Timestamp, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Received,
    Routed,
    Executing,
    Aggregating,
    Synthesized,
    ClarificationRequested,
    Failed,
}

impl StateMachine for QueryStage {
    fn valid_transitions(&self) -> &'static [Self] {
        use QueryStage::*;
        match self {
            Received => &[Routed, Failed],
            // Direct answers skip execution.
            Routed => &[Executing, Synthesized, ClarificationRequested],
            Executing => &[Aggregating, Failed],
            Aggregating => &[Synthesized, Failed],
            Synthesized | ClarificationRequested | Failed => &[],
        }
    }
}

/// One recorded stage change.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageTransition {
    pub stage: QueryStage,
    pub at: Timestamp,
}

/// Tracks one query through its stages.
#[derive(Debug, Clone, Serialize)]
pub struct QueryLifecycle {
    query_id: QueryId,
    stage: QueryStage,
    history: Vec<StageTransition>,
}

impl QueryLifecycle {
    pub fn start(query_id: QueryId) -> Self {
        Self {
            query_id,
            stage: QueryStage::Received,
            history: vec![StageTransition {
                stage: QueryStage::Received,
                at: Timestamp::now(),
            }],
        }
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    pub fn stage(&self) -> QueryStage {
        self.stage
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Moves to `next`, rejecting transitions the state machine forbids.
    pub fn advance(&mut self, next: QueryStage) -> Result<(), ValidationError> {
        self.stage = self.stage.transition_to(next)?;
        self.history.push(StageTransition {
            stage: next,
            at: Timestamp::now(),
        });
        Ok(())
    }

    /// Milliseconds from the first to the latest transition.
    pub fn elapsed_ms(&self) -> u64 {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) => last.at.millis_since(&first.at),
            _ => 0,
        }
    }
}
