//! Feature-hashing embedder.
//!
//! Lowercased word tokens and adjacent-token bigrams are hashed into a
//! fixed number of buckets with a sign bit, then L2-normalised. Text with
//! no word tokens ("???", emoji) falls back to its individual characters
//! so no input embeds to the zero vector.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::few_shot::l2_normalize;
use crate::ports::{Embedder, EmbeddingError};

/// Bigrams weigh less than single tokens.
const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model: format!("feature-hashing-{}", dimensions),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let hash = u64::from_le_bytes(bytes);

        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let tokens = Self::tokens(text);
        let mut vector = vec![0.0; self.dimensions];

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }
        if tokens.is_empty() {
            let symbols: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            for c in symbols.chars() {
                self.add_feature(&mut vector, &format!("char:{}", c), 1.0);
            }
            self.add_feature(&mut vector, &format!("text:{}", symbols), 1.0);
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
