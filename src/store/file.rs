//! JSON-file FAQ backend.
//!
//! Persists the corpus as `{"faqs": [...]}` in a single UTF-8 JSON document.
//! Suitable for a single chatbot instance with a corpus in the hundreds to
//! low thousands of entries.

use std::path::PathBuf;

use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::errors::FaqBotError;
use crate::errors::Result;
use crate::models::FaqInput;
use crate::models::FaqRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FaqDocument {
    #[serde(default)]
    faqs: Vec<FaqRecord>,
}

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles; concurrent upserts must not
    // clobber each other's records.
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub async fn get_all(&self) -> Result<Vec<FaqRecord>> {
        Ok(self.load().await?.faqs)
    }

    pub async fn upsert(&self, input: FaqInput) -> Result<FaqRecord> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;

        let position = match &input.id {
            Some(id) => doc.faqs.iter().position(|r| &r.id == id),
            None => doc
                .faqs
                .iter()
                .position(|r| r.question_matches(&input.question)),
        };

        let result = match position {
            Some(idx) => {
                let record = &mut doc.faqs[idx];
                let question = input.question.trim();
                if !record.question_matches(question) {
                    // Question text changed: the cached embedding no longer
                    // describes it.
                    record.question = question.to_string();
                    record.embedding = None;
                }
                record.answer = input.answer.trim().to_string();
                if let Some(category) = input.category {
                    record.category = category.trim().to_string();
                }
                if let Some(embedding) = input.embedding {
                    record.embedding = Some(embedding);
                }
                record.updated_at = Utc::now();
                record.clone()
            }
            None => {
                let record = input.into_record();
                doc.faqs.push(record.clone());
                record
            }
        };

        self.save(&doc).await?;
        debug!("Upserted FAQ '{}' to {}", result.id, self.path.display());
        Ok(result)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let before = doc.faqs.len();
        doc.faqs.retain(|r| r.id != id);

        if doc.faqs.len() == before {
            return Ok(false);
        }
        self.save(&doc).await?;
        Ok(true)
    }

    async fn load(&self) -> Result<FaqDocument> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FaqDocument::default());
            }
            Err(e) => return Err(FaqBotError::Io(e)),
        };

        match serde_json::from_str(&content) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(
                    "Malformed FAQ file {}, treating as empty: {e}",
                    self.path.display()
                );
                Ok(FaqDocument::default())
            }
        }
    }

    async fn save(&self, doc: &FaqDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
