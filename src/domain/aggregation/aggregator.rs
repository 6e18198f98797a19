//! Result aggregation with partial-failure tolerance.

use tracing::warn;

use super::{
    AggregatedContext, AggregationPartialFailure, ContextEntry, FailedTool, InvocationOutcome,
};

/// Every dispatched invocation failed; there is nothing to synthesise from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("all {} tools failed", failures.len())]
    AllToolsFailed { failures: Vec<FailedTool> },

    #[error("no invocations were dispatched")]
    NothingDispatched,
}

/// Combines invocation outcomes into one attributed context.
///
/// Output order follows dispatch order, then each tool's own record order,
/// so identical inputs always give identical citation numbers.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    max_records_per_tool: usize,
    max_total_records: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(10, 30)
    }
}

impl Aggregator {
    pub fn new(max_records_per_tool: usize, max_total_records: usize) -> Self {
        Self {
            max_records_per_tool,
            max_total_records,
        }
    }

    pub fn aggregate(
        &self,
        outcomes: Vec<InvocationOutcome>,
    ) -> Result<AggregatedContext, AggregationError> {
        if outcomes.is_empty() {
            return Err(AggregationError::NothingDispatched);
        }

        let attempted = outcomes.len();
        let mut entries = Vec::new();
        let mut failures = Vec::new();
        let mut truncated = 0usize;
        let mut succeeded = 0usize;

        for outcome in outcomes {
            let tool_name = outcome.invocation.tool_name().to_string();
            let invocation_id = outcome.invocation.id();

            match outcome.result {
                Ok(records) => {
                    succeeded += 1;
                    let total = records.len();
                    let mut kept = 0usize;
                    for record in records.into_iter().take(self.max_records_per_tool) {
                        if entries.len() >= self.max_total_records {
                            break;
                        }
                        entries.push(ContextEntry {
                            citation: entries.len() + 1,
                            tool_name: tool_name.clone(),
                            invocation_id,
                            record,
                        });
                        kept += 1;
                    }
                    truncated += total - kept;
                }
                Err(failure) => {
                    warn!(
                        tool = %tool_name,
                        invocation_id = %invocation_id,
                        status = ?failure.status,
                        error = %failure.message,
                        "Tool failed; continuing with remaining results"
                    );
                    failures.push(FailedTool {
                        tool_name,
                        invocation_id,
                        status: failure.status,
                        message: failure.message,
                    });
                }
            }
        }

        if succeeded == 0 {
            return Err(AggregationError::AllToolsFailed { failures });
        }

        let partial_failure = (!failures.is_empty()).then(|| AggregationPartialFailure {
            failed_tools: failures.iter().map(|f| f.tool_name.clone()).collect(),
            attempted,
        });

        Ok(AggregatedContext {
            entries,
            failures,
            partial_failure,
            truncated,
        })
    }
}
