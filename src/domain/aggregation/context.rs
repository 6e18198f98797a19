//! Aggregated context - attributed content ready for synthesis.

use serde::Serialize;

use crate::domain::foundation::InvocationId;
use crate::domain::tools::{ContentKind, RetrievalRecord, ToolInvocation, ToolRunStatus};

/// Why one invocation produced no content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    pub status: ToolRunStatus,
    pub message: String,
}

impl ToolFailure {
    pub fn new(status: ToolRunStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// The settled result of one dispatched invocation.
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub invocation: ToolInvocation,
    pub result: Result<Vec<RetrievalRecord>, ToolFailure>,
    pub attempts: u32,
    pub elapsed_ms: u64,
}

impl InvocationOutcome {
    pub fn status(&self) -> ToolRunStatus {
        match &self.result {
            Ok(_) => ToolRunStatus::Success,
            Err(failure) => failure.status,
        }
    }
}

/// A failed invocation as recorded on the context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTool {
    pub tool_name: String,
    pub invocation_id: InvocationId,
    pub status: ToolRunStatus,
    pub message: String,
}

/// Some tools failed while at least one succeeded. Non-fatal.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{} of {} tools failed: {}", failed_tools.len(), attempted, failed_tools.join(", "))]
pub struct AggregationPartialFailure {
    pub failed_tools: Vec<String>,
    pub attempted: usize,
}

/// How much the answer can be trusted to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Full,
    /// Some sources could not be searched.
    Reduced,
}

/// One numbered piece of content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    /// 1-based citation number.
    pub citation: usize,
    pub tool_name: String,
    pub invocation_id: InvocationId,
    pub record: RetrievalRecord,
}

/// Citation metadata surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub number: usize,
    pub tool_name: String,
    pub source_id: String,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedContext {
    pub(super) entries: Vec<ContextEntry>,
    pub(super) failures: Vec<FailedTool>,
    pub(super) partial_failure: Option<AggregationPartialFailure>,
    /// Records dropped by the size caps.
    pub(super) truncated: usize,
}

impl AggregatedContext {
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn failures(&self) -> &[FailedTool] {
        &self.failures
    }

    pub fn partial_failure(&self) -> Option<&AggregationPartialFailure> {
        self.partial_failure.as_ref()
    }

    pub fn truncated(&self) -> usize {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn confidence(&self) -> Confidence {
        if self.partial_failure.is_some() {
            Confidence::Reduced
        } else {
            Confidence::Full
        }
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.entries
            .iter()
            .map(|e| Citation {
                number: e.citation,
                tool_name: e.tool_name.clone(),
                source_id: e.record.source_id.clone(),
                kind: e.record.kind,
            })
            .collect()
    }

    /// User-facing note about sources that could not be searched.
    pub fn omission_notice(&self) -> Option<String> {
        self.partial_failure.as_ref().map(|p| {
            format!(
                "Some sources could not be searched ({}), so this answer may be incomplete.",
                p.failed_tools.join(", ")
            )
        })
    }

    /// Numbered, attributed context block for the synthesis prompt.
    pub fn render_for_prompt(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "[{}] (tool: {}, source: {})\n{}\n\n",
                entry.citation, entry.tool_name, entry.record.source_id, entry.record.content
            ));
        }
        if let Some(notice) = self.omission_notice() {
            out.push_str("Note: ");
            out.push_str(&notice);
            out.push('\n');
        }
        out
    }
}
