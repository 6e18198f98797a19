//! Embedding backend and example store configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Vector width for the hashing embedder
    #[serde(default = "default_hashing_dimensions")]
    pub hashing_dimensions: usize,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_dimensions")]
    pub openai_dimensions: usize,
}

/// Which embedder backs example similarity
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local feature hashing, no network
    #[default]
    Hashing,
    /// OpenAI embeddings API, using `ai.openai_api_key`
    OpenAI,
}

impl EmbeddingsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let dimensions = match self.backend {
            EmbeddingBackend::Hashing => self.hashing_dimensions,
            EmbeddingBackend::OpenAI => self.openai_dimensions,
        };
        if dimensions == 0 || dimensions > 8192 {
            return Err(ValidationError::out_of_range(
                "embeddings.dimensions",
                format!("{} not in 1..=8192", dimensions),
            ));
        }
        Ok(())
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            hashing_dimensions: default_hashing_dimensions(),
            openai_model: default_openai_model(),
            openai_dimensions: default_openai_dimensions(),
        }
    }
}

fn default_hashing_dimensions() -> usize {
    256
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_dimensions() -> usize {
    1536
}

/// Few-shot example store configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExampleStoreConfig {
    /// Seed examples (JSON or YAML) loaded at startup
    pub seed_file: Option<PathBuf>,

    /// Evaluation cases whose queries are held out of retrieval
    pub held_out_file: Option<PathBuf>,

    /// Cosine similarity at or above which an example counts as a
    /// near-duplicate of a held-out query
    pub exclusion_radius: Option<f32>,
}

impl ExampleStoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.exclusion_radius {
            Some(r) if !(r > 0.0 && r <= 1.0) => Err(ValidationError::out_of_range(
                "example_store.exclusion_radius",
                format!("{} not in (0, 1]", r),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmbeddingsConfig::default();
        assert_eq!(config.backend, EmbeddingBackend::Hashing);
        assert!(config.validate().is_ok());
        assert!(ExampleStoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = EmbeddingsConfig {
            hashing_dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_radius_bounds() {
        for bad in [0.0, -0.5, 1.5] {
            let config = ExampleStoreConfig {
                exclusion_radius: Some(bad),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "radius {} accepted", bad);
        }
        let ok = ExampleStoreConfig {
            exclusion_radius: Some(0.95),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }
}
