//! LLM delegation: chat-completion client plus the vagueness filter applied
//! to its output.

pub mod vagueness;

pub use vagueness::is_vague_response;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::errors::FaqBotError;
use crate::errors::Result;

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Provide clear, concise, and accurate answers. Keep responses brief and to the point.";

/// Client for the generative backend. Configured without an API key it is
/// simply unavailable and the pipeline skips straight to the fallback.
pub struct LlmService {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    client: Client,
}

impl LlmService {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FaqBotError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one prompt through the chat-completions API and return the
    /// trimmed answer text. Errors cover the unavailable case too, so the
    /// caller has a single fall-through path.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FaqBotError::Llm("LLM API key not configured".to_string()))?;

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            max_tokens: usize,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct CompletionResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling LLM API: {url} (model {})", self.model);

        let request = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
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
            return Err(FaqBotError::Llm(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| FaqBotError::Llm(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| FaqBotError::Llm("No choices in response".to_string()))
    }
}
