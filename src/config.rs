use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selector: "file" or "api". Anything else falls back to "file"
    /// with a warning.
    pub backend: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_file_path() -> String {
    "data/custom_faq.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_call_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_cache_ttl() -> u64 {
    3600
}

fn default_call_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_call_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> usize {
    100
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_top_k")]
    pub semantic_top_k: usize,
    #[serde(default = "default_threshold")]
    pub semantic_threshold: f32,
    #[serde(default = "default_snapshot_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    #[serde(default = "default_fallback_log_path")]
    pub fallback_log_path: String,
}

fn default_top_k() -> usize {
    3
}

fn default_threshold() -> f32 {
    0.82
}

fn default_snapshot_ttl() -> u64 {
    300
}

fn default_fallback_message() -> String {
    "فعلاً پاسخ مناسبی برای این سوال ندارم.".to_string()
}

fn default_fallback_log_path() -> String {
    "data/fallback_logs.txt".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            semantic_top_k: default_top_k(),
            semantic_threshold: default_threshold(),
            cache_ttl_secs: default_snapshot_ttl(),
            fallback_message: default_fallback_message(),
            fallback_log_path: default_fallback_log_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default config file path
    pub fn load() -> crate::Result<Self> {
        // Try config.toml first, then fall back to the shipped example
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::FaqBotError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get semantic search candidate count
    pub fn semantic_top_k(&self) -> usize {
        self.chat.semantic_top_k
    }

    /// Get semantic match threshold
    pub fn semantic_threshold(&self) -> f32 {
        self.chat.semantic_threshold
    }

    /// Get FAQ snapshot TTL in seconds
    pub fn snapshot_ttl_secs(&self) -> u64 {
        self.chat.cache_ttl_secs
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            store: StoreConfig {
                backend: "file".to_string(),
                file_path: default_file_path(),
                api_base: None,
                api_key: None,
            },
            embeddings: EmbeddingsConfig {
                provider: "openai".to_string(),
                model: "text-embedding-ada-002".to_string(),
                dimension: 1536,
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: None,
                cache_ttl_secs: default_embedding_cache_ttl(),
                timeout_secs: default_call_timeout(),
            },
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: default_llm_model(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                timeout_secs: default_call_timeout(),
            },
            chat: ChatConfig::default(),
        }
    }
}
