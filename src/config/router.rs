//! Routing, dispatch, aggregation and synthesis tunables

use serde::Deserialize;
use std::time::Duration;

use crate::application::{DispatchSettings, RouterSettings, SynthesisSettings};
use crate::domain::aggregation::Aggregator;

use super::error::ValidationError;

/// Query router configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Few-shot examples retrieved per query
    #[serde(default = "default_few_shot_k")]
    pub few_shot_k: usize,

    /// Re-prompts allowed after invalid model output
    #[serde(default = "default_extraction_retries")]
    pub max_extraction_retries: u32,

    #[serde(default = "default_router_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_router_max_tokens")]
    pub max_tokens: u32,
}

impl RouterConfig {
    pub fn settings(&self) -> RouterSettings {
        RouterSettings {
            few_shot_k: self.few_shot_k,
            max_extraction_retries: self.max_extraction_retries,
            timeout: Duration::from_secs(self.timeout_secs),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.few_shot_k > 50 {
            return Err(ValidationError::out_of_range("router.few_shot_k", "at most 50"));
        }
        if self.max_extraction_retries > 5 {
            return Err(ValidationError::out_of_range(
                "router.max_extraction_retries",
                "at most 5",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("router"));
        }
        check_temperature("router.temperature", self.temperature)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            few_shot_k: default_few_shot_k(),
            max_extraction_retries: default_extraction_retries(),
            timeout_secs: default_router_timeout(),
            temperature: 0.0,
            max_tokens: default_router_max_tokens(),
        }
    }
}

/// Tool execution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_ms: u64,

    #[serde(default = "default_tool_retries")]
    pub max_retries: u32,

    /// Base backoff, doubled on each retry
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,
}

impl DispatchConfig {
    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings {
            tool_timeout: Duration::from_millis(self.tool_timeout_ms),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tool_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("dispatch"));
        }
        if self.max_retries > 10 {
            return Err(ValidationError::out_of_range("dispatch.max_retries", "at most 10"));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tool_timeout_ms: default_tool_timeout(),
            max_retries: default_tool_retries(),
            retry_backoff_ms: default_backoff(),
        }
    }
}

/// Context size caps
#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(default = "default_per_tool")]
    pub max_records_per_tool: usize,

    #[serde(default = "default_total")]
    pub max_total_records: usize,
}

impl AggregationConfig {
    pub fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.max_records_per_tool, self.max_total_records)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_records_per_tool == 0 {
            return Err(ValidationError::out_of_range(
                "aggregation.max_records_per_tool",
                "must be at least 1",
            ));
        }
        if self.max_total_records < self.max_records_per_tool {
            return Err(ValidationError::out_of_range(
                "aggregation.max_total_records",
                "must be at least max_records_per_tool",
            ));
        }
        Ok(())
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_records_per_tool: default_per_tool(),
            max_total_records: default_total(),
        }
    }
}

/// Final answer generation
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_synthesis_temperature")]
    pub temperature: f32,

    #[serde(default = "default_synthesis_max_tokens")]
    pub max_tokens: u32,
}

impl SynthesisConfig {
    pub fn settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("synthesis"));
        }
        check_temperature("synthesis.temperature", self.temperature)
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_synthesis_timeout(),
            temperature: default_synthesis_temperature(),
            max_tokens: default_synthesis_max_tokens(),
        }
    }
}

fn check_temperature(field: &'static str, value: f32) -> Result<(), ValidationError> {
    if (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::out_of_range(field, format!("{} not in 0.0..=2.0", value)))
    }
}

fn default_few_shot_k() -> usize {
    5
}

fn default_extraction_retries() -> u32 {
    2
}

fn default_router_timeout() -> u64 {
    30
}

fn default_router_max_tokens() -> u32 {
    1024
}

fn default_tool_timeout() -> u64 {
    10_000
}

fn default_tool_retries() -> u32 {
    2
}

fn default_backoff() -> u64 {
    200
}

fn default_per_tool() -> usize {
    10
}

fn default_total() -> usize {
    30
}

fn default_synthesis_timeout() -> u64 {
    60
}

fn default_synthesis_temperature() -> f32 {
    0.2
}

fn default_synthesis_max_tokens() -> u32 {
    1024
}
