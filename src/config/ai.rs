//! AI provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Anthropic API key
    pub anthropic_api_key: Option<Secret<String>>,

    /// Primary AI provider
    #[serde(default = "default_provider")]
    pub primary_provider: AiProvider,

    /// Fallback AI provider
    pub fallback_provider: Option<AiProvider>,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    /// Override for OpenAI-compatible endpoints
    pub openai_base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    #[default]
    Anthropic,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Key for `provider`, if configured and non-empty
    pub fn api_key(&self, provider: AiProvider) -> Option<&Secret<String>> {
        use secrecy::ExposeSecret;
        let key = match provider {
            AiProvider::OpenAI => self.openai_api_key.as_ref(),
            AiProvider::Anthropic => self.anthropic_api_key.as_ref(),
        };
        key.filter(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key(self.primary_provider).is_none() {
            return Err(ValidationError::MissingRequired(key_name(self.primary_provider)));
        }
        if let Some(fallback) = self.fallback_provider {
            if self.api_key(fallback).is_none() {
                return Err(ValidationError::MissingRequired(key_name(fallback)));
            }
        }
        if self.timeout_secs == 0 || self.timeout_secs > 600 {
            return Err(ValidationError::InvalidTimeout("ai"));
        }
        Ok(())
    }
}

fn key_name(provider: AiProvider) -> &'static str {
    match provider {
        AiProvider::OpenAI => "OPENAI_API_KEY",
        AiProvider::Anthropic => "ANTHROPIC_API_KEY",
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            primary_provider: default_provider(),
            fallback_provider: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            openai_base_url: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::Anthropic
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Option<Secret<String>> {
        Some(Secret::new(s.to_string()))
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.primary_provider, AiProvider::Anthropic);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_validation_no_provider() {
        let config = AiConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        );
    }

    #[test]
    fn test_empty_key_counts_as_missing() {
        let config = AiConfig {
            anthropic_api_key: key(""),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_primary_missing_key() {
        let config = AiConfig {
            primary_provider: AiProvider::Anthropic,
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_fallback_needs_key() {
        let config = AiConfig {
            anthropic_api_key: key("sk-ant-xxx"),
            fallback_provider: Some(AiProvider::OpenAI),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        );
    }

    #[test]
    fn test_validation_with_fallback() {
        let config = AiConfig {
            anthropic_api_key: key("sk-ant-xxx"),
            fallback_provider: Some(AiProvider::OpenAI),
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
