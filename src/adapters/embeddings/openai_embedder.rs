//! OpenAI-compatible embedding client.
//!
//! Works with OpenAI's API and any endpoint that speaks the same
//! `POST {base_url}/embeddings` shape.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{Embedder, EmbeddingError};

#[derive(Debug, Clone)]
pub struct OpenAIEmbedderConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
    pub timeout: Duration,
}

impl OpenAIEmbedderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimensions: 1536,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct OpenAIEmbedder {
    config: OpenAIEmbedderConfig,
    client: Client,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIEmbedderConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::network(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::invalid_response("empty data array"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::api(status.as_u16(), body));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::invalid_response(e.to_string()))?;

        into_vectors(body, texts.len(), self.config.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Orders vectors by `index` and checks count and width.
fn into_vectors(
    body: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut data = body.data;
    if data.len() != expected {
        return Err(EmbeddingError::invalid_response(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);

    data.into_iter()
        .map(|d| {
            if d.embedding.len() == dimensions {
                Ok(d.embedding)
            } else {
                Err(EmbeddingError::invalid_response(format!(
                    "expected {} dimensions, got {}",
                    dimensions,
                    d.embedding.len()
                )))
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EmbeddingResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn vectors_follow_index_order() {
        let body = parse(
            r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
        );
        let vectors = into_vectors(body, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_count_is_invalid() {
        let body = parse(r#"{"data":[]}"#);
        assert!(matches!(
            into_vectors(body, 1, 2),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn wrong_width_is_invalid() {
        let body = parse(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#);
        assert!(into_vectors(body, 1, 3).is_err());
    }

    #[test]
    fn config_defaults_and_builders() {
        let config = OpenAIEmbedderConfig::new("key")
            .with_model("text-embedding-3-large", 3072)
            .with_base_url("http://localhost:8080/v1");
        assert_eq!(config.dimensions, 3072);
        assert_eq!(config.base_url, "http://localhost:8080/v1");

        let embedder = OpenAIEmbedder::new(config).unwrap();
        assert_eq!(embedder.embeddings_url(), "http://localhost:8080/v1/embeddings");
        assert_eq!(embedder.model_name(), "text-embedding-3-large");
    }
}
