//! Invocation dispatcher - runs validated invocations concurrently.
//!
//! Every invocation is bounded by a timeout, retried with exponential
//! backoff on transient failures and abandoned when the request's
//! cancellation token fires. Failures never escape as errors: each
//! invocation settles into an [`InvocationOutcome`] for the aggregator.

use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::aggregation::{InvocationOutcome, ToolFailure};
use crate::domain::tools::{RetrievalRecord, ToolInvocation};
use crate::ports::{RetrievalError, ToolError};

use super::ToolRegistry;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Bound on a single attempt.
    pub tool_timeout: Duration,
    /// Extra attempts after the first for retryable failures.
    pub max_retries: u32,
    /// Base delay; doubles on every retry.
    pub retry_backoff: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

pub struct InvocationDispatcher {
    registry: ToolRegistry,
    settings: DispatchSettings,
}

impl InvocationDispatcher {
    pub fn new(registry: ToolRegistry, settings: DispatchSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs all invocations concurrently. Outcomes come back in the same
    /// order as `invocations`, whatever order they finish in.
    pub async fn dispatch(
        &self,
        invocations: &[ToolInvocation],
        cancel: &CancellationToken,
    ) -> Vec<InvocationOutcome> {
        join_all(invocations.iter().map(|inv| self.run(inv, cancel))).await
    }

    async fn run(&self, invocation: &ToolInvocation, cancel: &CancellationToken) -> InvocationOutcome {
        let started = Instant::now();
        let (result, attempts) = self.run_with_retries(invocation, cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = result.map_err(|err| {
            warn!(
                invocation_id = %invocation.id(),
                tool = invocation.tool_name(),
                attempts,
                error = %err,
                "Tool invocation failed"
            );
            ToolFailure::new(err.status(), err.to_string())
        });

        InvocationOutcome {
            invocation: invocation.clone(),
            result,
            attempts,
            elapsed_ms,
        }
    }

    async fn run_with_retries(
        &self,
        invocation: &ToolInvocation,
        cancel: &CancellationToken,
    ) -> (Result<Vec<RetrievalRecord>, ToolError>, u32) {
        let Some(tool) = self.registry.get(invocation.tool_name()) else {
            return (Err(ToolError::UnknownTool(invocation.tool_name().to_string())), 0);
        };

        let mut attempts = 0;
        loop {
            if cancel.is_cancelled() {
                return (Err(ToolError::Cancelled), attempts);
            }
            attempts += 1;

            let attempt = timeout(self.settings.tool_timeout, tool.execute(invocation.parameters()));
            let result = tokio::select! {
                _ = cancel.cancelled() => return (Err(ToolError::Cancelled), attempts),
                outcome = attempt => match outcome {
                    Ok(result) => result.map_err(ToolError::from),
                    Err(_) => Err(RetrievalError::timeout(self.settings.tool_timeout.as_millis() as u64).into()),
                },
            };

            match result {
                Ok(records) => {
                    debug!(
                        invocation_id = %invocation.id(),
                        tool = invocation.tool_name(),
                        attempts,
                        records = records.len(),
                        "Tool invocation succeeded"
                    );
                    return (Ok(records), attempts);
                }
                Err(err) if err.is_retryable() && attempts <= self.settings.max_retries => {
                    let delay = self.settings.retry_backoff * 2u32.saturating_pow(attempts - 1);
                    debug!(
                        tool = invocation.tool_name(),
                        attempt = attempts,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying tool invocation"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return (Err(ToolError::Cancelled), attempts),
                        _ = sleep(delay) => {}
                    }
                }
                Err(err) => return (Err(err), attempts),
            }
        }
    }
}
