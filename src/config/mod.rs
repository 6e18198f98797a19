//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `RAG_ROUTER` prefix and nested values use double underscores as separators.
//! An optional file (TOML, YAML or JSON) can sit underneath the environment.
//!
//! # Example
//!
//! ```no_run
//! use rag_router::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Routing with up to {} examples", config.router.few_shot_k);
//! ```

mod ai;
mod embeddings;
mod error;
mod logging;
mod router;

pub use ai::{AiConfig, AiProvider};
pub use embeddings::{EmbeddingBackend, EmbeddingsConfig, ExampleStoreConfig};
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use router::{AggregationConfig, DispatchConfig, RouterConfig, SynthesisConfig};

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "RAG_ROUTER";

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads; only the AI
/// keys are required, and only by [`AppConfig::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// AI provider configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub example_store: ExampleStoreConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `RAG_ROUTER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `RAG_ROUTER__ROUTER__FEW_SHOT_K=8` -> `router.few_shot_k = 8`
    /// - `RAG_ROUTER__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`], with `file` as the lowest-precedence layer.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_offline()?;
        self.ai.validate()?;
        Ok(())
    }

    /// Validates everything except the AI provider keys.
    pub fn validate_offline(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.router.validate()?;
        self.dispatch.validate()?;
        self.aggregation.validate()?;
        self.synthesis.validate()?;
        self.embeddings.validate()?;
        self.example_store.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "RAG_ROUTER__AI__ANTHROPIC_API_KEY",
        "RAG_ROUTER__ROUTER__FEW_SHOT_K",
        "RAG_ROUTER__DISPATCH__TOOL_TIMEOUT_MS",
        "RAG_ROUTER__LOGGING__FORMAT",
        "RAG_ROUTER__EMBEDDINGS__BACKEND",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.router.few_shot_k, 5);
        assert_eq!(config.dispatch.tool_timeout_ms, 10_000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate_offline().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("RAG_ROUTER__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("RAG_ROUTER__ROUTER__FEW_SHOT_K", "8");
        env::set_var("RAG_ROUTER__DISPATCH__TOOL_TIMEOUT_MS", "2500");
        env::set_var("RAG_ROUTER__LOGGING__FORMAT", "json");
        env::set_var("RAG_ROUTER__EMBEDDINGS__BACKEND", "openai");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.router.few_shot_k, 8);
        assert_eq!(config.dispatch.tool_timeout_ms, 2500);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.embeddings.backend, EmbeddingBackend::OpenAI);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_layer_under_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "router:\n  few_shot_k: 3\n  max_extraction_retries: 1\naggregation:\n  max_records_per_tool: 4\n  max_total_records: 12"
        )
        .unwrap();

        env::set_var("RAG_ROUTER__ROUTER__FEW_SHOT_K", "7");
        let result = AppConfig::load_from(Some(file.path()));
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.router.few_shot_k, 7);
        assert_eq!(config.router.max_extraction_retries, 1);
        assert_eq!(config.aggregation.max_total_records, 12);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/rag-router.yaml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
