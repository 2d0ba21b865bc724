//! FAQ store with pluggable backends.
//!
//! A single [`FaqStore`] facade dispatches over a closed set of backends so
//! the chat pipeline stays backend-blind. Backend selection comes from
//! configuration; an unknown mode falls back to the file backend with a
//! warning instead of failing startup.

pub mod api;
pub mod file;

use tracing::warn;

pub use api::ApiStore;
pub use file::FileStore;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::FaqInput;
use crate::models::FaqRecord;

/// The closed set of supported store backends.
enum Backend {
    File(FileStore),
    Api(ApiStore),
}

/// Uniform interface over the configured FAQ backend.
pub struct FaqStore {
    backend: Backend,
}

impl FaqStore {
    /// Build the store from configuration. Unknown or incomplete backend
    /// configuration degrades to the file backend rather than erroring.
    pub fn from_config(config: &AppConfig) -> Self {
        let mode = config.store.backend.trim().to_lowercase();
        let backend = match mode.as_str() {
            "file" => Backend::File(FileStore::new(&config.store.file_path)),
            "api" => match &config.store.api_base {
                Some(base) => match ApiStore::new(base, config.store.api_key.clone()) {
                    Ok(api) => Backend::Api(api),
                    Err(e) => {
                        warn!("Failed to initialize api backend ({e}), falling back to file");
                        Backend::File(FileStore::new(&config.store.file_path))
                    }
                },
                None => {
                    warn!("api backend selected but store.api_base is not set, falling back to file");
                    Backend::File(FileStore::new(&config.store.file_path))
                }
            },
            other => {
                warn!("Unknown store backend '{other}', falling back to file");
                Backend::File(FileStore::new(&config.store.file_path))
            }
        };
        Self { backend }
    }

    /// Build a file-backed store directly; used by tests and the demo binary.
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            backend: Backend::File(FileStore::new(path)),
        }
    }

    pub fn backend_type(&self) -> &'static str {
        match &self.backend {
            Backend::File(_) => "file",
            Backend::Api(_) => "api",
        }
    }

    /// Get every record, normalized, propagating backend errors. The
    /// snapshot cache uses this to tell a failed reload apart from an empty
    /// corpus.
    pub async fn try_get_all(&self) -> Result<Vec<FaqRecord>> {
        let raw = match &self.backend {
            Backend::File(store) => store.get_all().await?,
            Backend::Api(store) => store.get_all().await?,
        };
        Ok(normalize_records(raw))
    }

    /// Get every record, normalized. Fails soft: a backend error is logged
    /// and an empty list returned, so a broken store degrades the pipeline
    /// to greeting/LLM/fallback instead of erroring the request.
    pub async fn get_all(&self) -> Vec<FaqRecord> {
        match self.try_get_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load FAQs from {} backend: {e}", self.backend_type());
                Vec::new()
            }
        }
    }

    /// Get records filtered by category (case-insensitive).
    pub async fn get_by_category(&self, category: &str) -> Vec<FaqRecord> {
        let wanted = category.to_lowercase();
        self.get_all()
            .await
            .into_iter()
            .filter(|r| r.category.to_lowercase() == wanted)
            .collect()
    }

    /// Insert or update one record.
    ///
    /// An explicit id updates that record; otherwise a case-insensitive
    /// question match updates the existing record in place, and only
    /// a miss on both inserts. Validation failures surface as
    /// [`crate::FaqBotError::Validation`] before any backend call.
    pub async fn upsert(&self, input: FaqInput) -> Result<FaqRecord> {
        input.validate()?;
        match &self.backend {
            Backend::File(store) => store.upsert(input).await,
            Backend::Api(store) => store.upsert(input).await,
        }
    }

    /// Apply `upsert` to each item; individual failures are logged and do
    /// not abort the batch. Returns the number of successes.
    pub async fn bulk_upsert(&self, items: Vec<FaqInput>) -> usize {
        let valid: Vec<FaqInput> = items
            .into_iter()
            .filter(|item| match item.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Skipping invalid item in bulk upsert: {e}");
                    false
                }
            })
            .collect();

        match &self.backend {
            Backend::Api(store) => match store.bulk_upsert(&valid).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Bulk upsert via API failed: {e}");
                    0
                }
            },
            Backend::File(store) => {
                let mut count = 0;
                for item in valid {
                    match store.upsert(item).await {
                        Ok(_) => count += 1,
                        Err(e) => warn!("Skipping item in bulk upsert: {e}"),
                    }
                }
                count
            }
        }
    }

    /// Delete by id. Returns false when no record carried the id.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        match &self.backend {
            Backend::File(store) => store.delete(id).await,
            Backend::Api(store) => store.delete(id).await,
        }
    }

    /// Sorted, deduplicated category list across the whole corpus.
    pub async fn list_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .get_all()
            .await
            .into_iter()
            .map(|r| r.category)
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

/// Normalize raw backend records: trim, default ids, drop records whose
/// question or answer is empty (data error, skipped with a warning).
fn normalize_records(records: Vec<FaqRecord>) -> Vec<FaqRecord> {
    records
        .into_iter()
        .filter_map(|mut record| {
            record.question = record.question.trim().to_string();
            record.answer = record.answer.trim().to_string();
            record.category = record.category.trim().to_string();
            if record.question.is_empty() || record.answer.is_empty() {
                warn!("Skipping malformed FAQ record (id: '{}')", record.id);
                return None;
            }
            if record.id.is_empty() {
                record.id = FaqRecord::generate_id();
            }
            if record.category.is_empty() {
                record.category = crate::models::DEFAULT_CATEGORY.to_string();
            }
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_falls_back_to_file() {
        let mut config = AppConfig::default();
        config.store.backend = "sqlite".to_string();
        let store = FaqStore::from_config(&config);
        assert_eq!(store.backend_type(), "file");
    }

    #[test]
    fn test_api_backend_without_base_falls_back_to_file() {
        let mut config = AppConfig::default();
        config.store.backend = "api".to_string();
        config.store.api_base = None;
        let store = FaqStore::from_config(&config);
        assert_eq!(store.backend_type(), "file");
    }

    #[test]
    fn test_api_backend_selected_when_configured() {
        let mut config = AppConfig::default();
        config.store.backend = "api".to_string();
        config.store.api_base = Some("https://faq.example.com".to_string());
        let store = FaqStore::from_config(&config);
        assert_eq!(store.backend_type(), "api");
    }

    #[test]
    fn test_normalize_skips_empty_and_fills_defaults() {
        let records = vec![
            FaqRecord {
                id: String::new(),
                question: "  Where are you?  ".to_string(),
                answer: "Here".to_string(),
                category: String::new(),
                embedding: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
            FaqRecord {
                id: "faq-bad".to_string(),
                question: "   ".to_string(),
                answer: "orphan".to_string(),
                category: "general".to_string(),
                embedding: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        ];

        let normalized = normalize_records(records);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].question, "Where are you?");
        assert!(normalized[0].id.starts_with("faq-"));
        assert_eq!(normalized[0].category, "general");
    }
}
