//! User-facing query outcome.

use serde::Serialize;

use crate::domain::aggregation::{Citation, Confidence};
use crate::domain::foundation::ErrorCode;

/// What the user receives for a query. Failures always carry next steps.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryOutcome {
    Answered {
        answer: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        citations: Vec<Citation>,
        confidence: Confidence,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
    Clarification {
        question: String,
    },
    Failed {
        message: String,
        next_steps: Vec<String>,
        code: ErrorCode,
    },
}

impl QueryOutcome {
    /// Apologetic failure with next steps suited to the error code.
    pub fn failed(code: ErrorCode) -> Self {
        let (message, next_steps) = match code {
            ErrorCode::RoutingUnavailable => (
                "Sorry, I couldn't process your question right now.",
                vec![
                    "Try again in a few moments",
                    "Contact support if the problem continues",
                ],
            ),
            ErrorCode::AllToolsFailed => (
                "Sorry, I couldn't reach any of the sources needed to answer that.",
                vec![
                    "Try again in a few moments",
                    "Rephrase the question or narrow the date range",
                    "Contact support if the problem continues",
                ],
            ),
            ErrorCode::SynthesisFailed => (
                "Sorry, I found relevant material but couldn't put an answer together.",
                vec![
                    "Try again in a few moments",
                    "Ask a narrower question",
                ],
            ),
            ErrorCode::Cancelled => (
                "The request was cancelled before it finished.",
                vec!["Ask again when you're ready"],
            ),
        };

        Self::Failed {
            message: message.to_string(),
            next_steps: next_steps.into_iter().map(String::from).collect(),
            code,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Answered { .. } => "answered",
            Self::Clarification { .. } => "clarification",
            Self::Failed { .. } => "failed",
        }
    }
}
