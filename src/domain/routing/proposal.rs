//! Route proposal - the structured output the router model must emit.
//!
//! The same shape is stored on example records and evaluation cases, so a
//! proposal can be rendered into a prompt, parsed back from a completion,
//! and compared against expectations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call as proposed by the model, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedCall {
    pub tool: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ProposedCall {
    pub fn new(tool: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool: tool.into(),
            parameters,
        }
    }
}

/// Unvalidated routing output.
///
/// ```
/// use rag_router::domain::routing::RouteProposal;
///
/// let p = RouteProposal::parse(r#"{"type":"direct_answer","answer":"A plan is a view."}"#).unwrap();
/// assert!(matches!(p, RouteProposal::DirectAnswer { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteProposal {
    ToolCalls { calls: Vec<ProposedCall> },
    DirectAnswer { answer: String },
    Clarification { question: String },
}

/// Failure to read a proposal out of model text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("response JSON does not match the routing format: {0}")]
    Malformed(String),
}

impl RouteProposal {
    pub fn tool_calls(calls: Vec<ProposedCall>) -> Self {
        Self::ToolCalls { calls }
    }

    pub fn direct_answer(answer: impl Into<String>) -> Self {
        Self::DirectAnswer {
            answer: answer.into(),
        }
    }

    pub fn clarification(question: impl Into<String>) -> Self {
        Self::Clarification {
            question: question.into(),
        }
    }

    /// Parses model output, tolerating code fences and surrounding prose.
    pub fn parse(text: &str) -> Result<Self, ProposalParseError> {
        let json = extract_json_object(text).ok_or(ProposalParseError::NoJsonObject)?;
        serde_json::from_str(json).map_err(|e| ProposalParseError::Malformed(e.to_string()))
    }

    /// Compact JSON rendering used in prompts and seed files.
    pub fn to_json_string(&self) -> String {
        // Serializing a tagged enum of strings and JSON values cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Names of the proposed tools, in proposal order.
    pub fn tool_names(&self) -> Vec<&str> {
        match self {
            Self::ToolCalls { calls } => calls.iter().map(|c| c.tool.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Short label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolCalls { .. } => "tool_calls",
            Self::DirectAnswer { .. } => "direct_answer",
            Self::Clarification { .. } => "clarification",
        }
    }
}

/// Returns the outermost `{...}` span of `text`, if any.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
