//! Tool invocation - a validated call the router decided to make.

use serde::Serialize;

use crate::domain::foundation::{InvocationId, QueryId, Timestamp};

use super::ToolParameters;

/// A concrete, validated instantiation of a tool's parameters for one query.
///
/// Created per query by [`ToolDefinition::instantiate`](super::ToolDefinition::instantiate)
/// and discarded once execution completes.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    id: InvocationId,
    query_id: QueryId,
    tool_name: String,
    parameters: ToolParameters,
    created_at: Timestamp,
}

impl ToolInvocation {
    pub(crate) fn validated(query_id: QueryId, tool_name: String, parameters: ToolParameters) -> Self {
        Self {
            id: InvocationId::new(),
            query_id,
            tool_name,
            parameters,
            created_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn query_id(&self) -> QueryId {
        self.query_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// True when both invocations call the same tool with equal parameters.
    pub fn same_call(&self, other: &ToolInvocation) -> bool {
        self.tool_name == other.tool_name && self.parameters == other.parameters
    }
}
