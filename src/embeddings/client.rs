//! Embedding API clients for the supported providers

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::errors::FaqBotError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings from the configured provider.
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// False when the provider cannot be called at all (OpenAI without an
    /// API key). Callers degrade to zero vectors instead of erroring.
    pub fn is_available(&self) -> bool {
        match self.provider {
            EmbeddingProvider::OpenAI => self.api_key.is_some(),
            EmbeddingProvider::Ollama => true,
        }
    }

    /// Generate embedding for a single text
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::OpenAI => {
                let mut batch = self.generate_batch_openai(&[text]).await?;
                batch
                    .pop()
                    .ok_or_else(|| FaqBotError::Embedding("No embedding in response".to_string()))
            }
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embeddings for multiple texts, batching into as few API
    /// calls as the provider allows.
    ///
    /// On the per-item Ollama path a failed item comes back as an empty
    /// vector instead of failing the batch; callers substitute their zero
    /// vector for it.
    pub async fn generate_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match self.provider {
            EmbeddingProvider::OpenAI => self.generate_batch_openai(texts).await,
            EmbeddingProvider::Ollama => {
                // Ollama has no batch endpoint; fan out with bounded concurrency
                use futures::stream::{self, StreamExt};

                let concurrency = std::cmp::min(texts.len(), 16);
                let results: Vec<Result<Vec<f32>>> = stream::iter(texts.iter())
                    .map(|&text| async move { self.generate_ollama(text).await })
                    .buffered(concurrency)
                    .collect()
                    .await;

                let mut embeddings = Vec::with_capacity(results.len());
                for (result, text) in results.into_iter().zip(texts) {
                    match result {
                        Ok(vector) => embeddings.push(vector),
                        Err(e) => {
                            warn!("Ollama embedding failed for one item ({e}), degrading: {text}");
                            embeddings.push(Vec::new());
                        }
                    }
                }
                Ok(embeddings)
            }
        }
    }

    /// Generate embeddings in batch using the `OpenAI` API
    async fn generate_batch_openai(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FaqBotError::Config("OpenAI API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: &'a [&'a str],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FaqBotError::Embedding(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| FaqBotError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using the Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FaqBotError::Embedding(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| FaqBotError::Embedding(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_without_key_is_unavailable() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-ada-002".to_string(),
            "https://api.openai.com/v1".to_string(),
            None,
            10,
        )
        .unwrap();
        assert!(!client.is_available());
    }

    #[test]
    fn test_ollama_is_always_available() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::Ollama,
            "nomic-embed-text".to_string(),
            "http://localhost:11434".to_string(),
            None,
            10,
        )
        .unwrap();
        assert!(client.is_available());
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_openai_embedding() {
        let client = EmbeddingClient::new(
            EmbeddingProvider::OpenAI,
            "text-embedding-ada-002".to_string(),
            "https://api.openai.com/v1".to_string(),
            std::env::var("OPENAI_API_KEY").ok(),
            30,
        )
        .unwrap();

        let embedding = client.generate("Hello, world!").await.unwrap();
        assert_eq!(embedding.len(), 1536);
    }
}
