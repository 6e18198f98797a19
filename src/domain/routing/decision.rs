//! Routing decision - what the router chose to do with a query.

use serde::Serialize;

use crate::domain::tools::ToolInvocation;

use super::{ProposedCall, RouteProposal};

/// Why the router could not commit to tools or a direct answer.
///
/// Never returned as an `Err` to callers; it is carried on a
/// [`RoutingDecision::Clarification`] so the user gets a follow-up question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutingAmbiguity {
    /// The model itself judged the query ambiguous.
    #[error("query is ambiguous with respect to the available tools")]
    AmbiguousQuery,

    #[error("no tools are available")]
    NoToolsAvailable,

    /// The model proposed an empty tool list.
    #[error("no tool applies to the query")]
    NoApplicableTool,

    #[error("tool parameters still invalid after {attempts} attempts: {details}")]
    InvalidParameters { attempts: u32, details: String },

    #[error("router output unreadable after {attempts} attempts: {details}")]
    UnreadableResponse { attempts: u32, details: String },
}

impl RoutingAmbiguity {
    /// A follow-up question suitable for the user.
    pub fn default_question(&self) -> &'static str {
        match self {
            Self::AmbiguousQuery | Self::NoApplicableTool => {
                "Could you tell me a bit more about what you are looking for, for example the kind of document and a time period?"
            }
            Self::NoToolsAvailable => {
                "I can't search any sources right now. Could you rephrase this as a general question I can answer directly?"
            }
            Self::InvalidParameters { .. } => {
                "I couldn't work out the exact search details. Could you restate the request with specific names or dates?"
            }
            Self::UnreadableResponse { .. } => {
                "I wasn't sure how to handle that request. Could you rephrase it?"
            }
        }
    }
}

/// A non-empty list of validated invocations.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct InvocationSet(Vec<ToolInvocation>);

impl InvocationSet {
    /// Returns `None` for an empty list.
    pub fn new(invocations: Vec<ToolInvocation>) -> Option<Self> {
        (!invocations.is_empty()).then_some(Self(invocations))
    }

    pub fn as_slice(&self) -> &[ToolInvocation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_vec(self) -> Vec<ToolInvocation> {
        self.0
    }
}

/// Outcome of routing one query. There is always exactly one variant, so a
/// query can never end up with an empty, unexplained decision.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDecision {
    Invocations {
        invocations: InvocationSet,
        /// Proposed calls that were dropped (unknown tool, invalid
        /// parameters, superseded by a more specific alternative).
        #[serde(skip_serializing_if = "Vec::is_empty")]
        dropped: Vec<String>,
    },
    DirectAnswer {
        answer: String,
    },
    Clarification {
        question: String,
        reason: RoutingAmbiguity,
    },
}

impl RoutingDecision {
    pub fn invocations(invocations: InvocationSet) -> Self {
        Self::Invocations {
            invocations,
            dropped: Vec::new(),
        }
    }

    pub fn direct_answer(answer: impl Into<String>) -> Self {
        Self::DirectAnswer {
            answer: answer.into(),
        }
    }

    /// Clarification using the ambiguity's default question.
    pub fn clarify(reason: RoutingAmbiguity) -> Self {
        Self::Clarification {
            question: reason.default_question().to_string(),
            reason,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invocations { .. } => "invocations",
            Self::DirectAnswer { .. } => "direct_answer",
            Self::Clarification { .. } => "clarification",
        }
    }

    pub fn invocation_slice(&self) -> &[ToolInvocation] {
        match self {
            Self::Invocations { invocations, .. } => invocations.as_slice(),
            _ => &[],
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.invocation_slice().iter().map(|i| i.tool_name()).collect()
    }

    /// Converts back to the proposal shape, with validated parameters.
    pub fn to_proposal(&self) -> RouteProposal {
        match self {
            Self::Invocations { invocations, .. } => RouteProposal::tool_calls(
                invocations
                    .as_slice()
                    .iter()
                    .map(|i| ProposedCall::new(i.tool_name(), i.parameters().to_value()))
                    .collect(),
            ),
            Self::DirectAnswer { answer } => RouteProposal::direct_answer(answer.clone()),
            Self::Clarification { question, .. } => RouteProposal::clarification(question.clone()),
        }
    }
}
