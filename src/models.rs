//! Core data types shared across the store, the embedding index and the chat
//! pipeline.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::FaqBotError;
use crate::errors::Result;

/// Category assigned to records that carry none.
pub const DEFAULT_CATEGORY: &str = "general";

/// A single curated question/answer entry.
///
/// `embedding` is lazily computed: `None` until the first semantic search or
/// an explicit rebuild, and reset whenever the question text changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqRecord {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl FaqRecord {
    /// Generate a fresh record id (`faq-` plus the first 8 hex chars of a v4 UUID).
    pub fn generate_id() -> String {
        let uuid = Uuid::new_v4().to_string();
        format!("faq-{}", &uuid[..8])
    }

    /// Case-insensitive question equality, the store's uniqueness key.
    pub fn question_matches(&self, question: &str) -> bool {
        self.question.to_lowercase() == question.trim().to_lowercase()
    }
}

/// Upsert payload accepted by the store. `id` forces an update of that
/// record; otherwise a case-insensitive question match decides between
/// update and insert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl FaqInput {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            ..Self::default()
        }
    }

    /// Reject empty question/answer before anything reaches a backend.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() || self.answer.trim().is_empty() {
            return Err(FaqBotError::Validation(
                "Question and answer cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a normalized record from this input, generating an id when none
    /// was supplied. Assumes `validate` has passed.
    pub fn into_record(self) -> FaqRecord {
        let now = Utc::now();
        FaqRecord {
            id: self.id.unwrap_or_else(FaqRecord::generate_id),
            question: self.question.trim().to_string(),
            answer: self.answer.trim().to_string(),
            category: self
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_category),
            embedding: self.embedding,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_record(record: &FaqRecord) -> Self {
        Self {
            question: record.question.clone(),
            answer: record.answer.clone(),
            id: Some(record.id.clone()),
            category: Some(record.category.clone()),
            embedding: record.embedding.clone(),
        }
    }
}

/// Ephemeral result of a semantic search. Not persisted.
#[derive(Debug, Clone)]
pub struct CandidateMatch {
    pub record: FaqRecord,
    pub score: f32,
}

/// Which pipeline stage produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Greeting,
    Faq,
    FaqSemantic,
    Gpt,
    Fallback,
}

/// Logical chat request, consumed by whatever transport sits on top.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Terminal pipeline output with provenance and timing metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub response_time_ms: u64,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>, source: ResponseSource) -> Self {
        Self {
            response: response.into(),
            source,
            metadata: None,
            response_time_ms: 0,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Corpus statistics exposed through the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct ChatStats {
    pub total_faqs: usize,
    pub faqs_with_embeddings: usize,
    pub backend_type: String,
    pub categories: Vec<String>,
    pub category_counts: std::collections::BTreeMap<String, usize>,
    pub semantic_top_k: usize,
    pub semantic_threshold: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_format() {
        let id = FaqRecord::generate_id();
        assert!(id.starts_with("faq-"));
        assert_eq!(id.len(), "faq-".len() + 8);
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(FaqInput::new("  ", "answer").validate().is_err());
        assert!(FaqInput::new("question", "\t\n").validate().is_err());
        assert!(FaqInput::new("question", "answer").validate().is_ok());
    }

    #[test]
    fn test_into_record_defaults_category() {
        let record = FaqInput::new("What are your hours?", "9 to 5").into_record();
        assert_eq!(record.category, DEFAULT_CATEGORY);
        assert!(record.embedding.is_none());
    }

    #[test]
    fn test_into_record_trims_fields() {
        let record = FaqInput::new("  Hello?  ", " hi ").into_record();
        assert_eq!(record.question, "Hello?");
        assert_eq!(record.answer, "hi");
    }

    #[test]
    fn test_question_matches_is_case_insensitive() {
        let record = FaqInput::new("Hello?", "a").into_record();
        assert!(record.question_matches("hello?"));
        assert!(record.question_matches("  HELLO?  "));
        assert!(!record.question_matches("hello"));
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_string(&ResponseSource::FaqSemantic).unwrap();
        assert_eq!(json, "\"faq_semantic\"");
    }
}
