//! Evaluation cases and per-case comparison.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::routing::{ProposedCall, RouteProposal};

/// A held-out query with its known-correct route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCase {
    pub query: String,
    pub expected: RouteProposal,
}

impl EvaluationCase {
    pub fn new(query: impl Into<String>, expected: RouteProposal) -> Self {
        Self {
            query: query.into(),
            expected,
        }
    }
}

/// How the router did on one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub query: String,
    pub expected: RouteProposal,
    pub actual: RouteProposal,
    /// Same outcome kind and, for tool calls, the same set of tools.
    pub tools_match: bool,
    /// `tools_match` plus identical parameters for every call.
    pub exact_match: bool,
}

impl CaseResult {
    pub fn compare(query: impl Into<String>, expected: RouteProposal, actual: RouteProposal) -> Self {
        let (tools_match, exact_match) = match (&expected, &actual) {
            (RouteProposal::ToolCalls { calls: e }, RouteProposal::ToolCalls { calls: a }) => {
                let tools_match = tool_set(e) == tool_set(a);
                (tools_match, tools_match && call_set(e) == call_set(a))
            }
            (RouteProposal::DirectAnswer { .. }, RouteProposal::DirectAnswer { .. })
            | (RouteProposal::Clarification { .. }, RouteProposal::Clarification { .. }) => {
                (true, true)
            }
            _ => (false, false),
        };

        Self {
            query: query.into(),
            expected,
            actual,
            tools_match,
            exact_match,
        }
    }

    pub fn expected_tools(&self) -> BTreeSet<&str> {
        self.expected.tool_names().into_iter().collect()
    }

    pub fn actual_tools(&self) -> BTreeSet<&str> {
        self.actual.tool_names().into_iter().collect()
    }
}

fn tool_set(calls: &[ProposedCall]) -> BTreeSet<&str> {
    calls.iter().map(|c| c.tool.as_str()).collect()
}

fn call_set(calls: &[ProposedCall]) -> BTreeSet<(String, String)> {
    calls
        .iter()
        .map(|c| (c.tool.clone(), canonical(&c.parameters)))
        .collect()
}

// serde_json maps are ordered by key, so the compact rendering is canonical.
fn canonical(value: &Value) -> String {
    value.to_string()
}
