//! Embedding computation and similarity search over the FAQ corpus.
//!
//! Embedding vectors are produced by an external model behind
//! [`EmbeddingClient`] and cached by text hash; [`EmbeddingIndex`] layers
//! the corpus-level operations on top: ensuring every record carries a
//! vector and ranking records against a query.

pub mod client;
pub mod index;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use index::EmbeddingIndex;

use crate::config::EmbeddingsConfig;

/// Default embedding dimension for OpenAI text-embedding-ada-002
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Maximum number of texts per embedding API call
pub const MAX_BATCH_SIZE: usize = 100;

/// Resolved embedding configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &EmbeddingsConfig) -> Self {
        let provider = match config.provider.trim().to_lowercase().as_str() {
            "ollama" => EmbeddingProvider::Ollama,
            "openai" => EmbeddingProvider::OpenAI,
            other => {
                tracing::warn!("Unknown embedding provider '{other}', assuming openai");
                EmbeddingProvider::OpenAI
            }
        };

        Self {
            provider,
            model: config.model.clone(),
            dimension: config.dimension,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            cache_ttl_secs: config.cache_ttl_secs,
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Defined as 0.0 when either vector has zero norm or the dimensions
/// disagree, so callers never see NaN and a zero vector can never match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
