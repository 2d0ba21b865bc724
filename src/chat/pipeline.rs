//! The ordered answer-resolution pipeline.
//!
//! Stages, first match wins: greeting, semantic match, exact lexical match,
//! partial lexical match, LLM delegation, fallback. Backend failures inside
//! a stage mean "no answer from this stage" and fall through; the user never
//! sees a raw backend error.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde_json::json;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cache::FaqCache;
use super::greeting;
use super::greeting::Greeter;
use super::matcher;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingIndex;
use crate::errors::FaqBotError;
use crate::errors::Result;
use crate::fallback::FallbackService;
use crate::llm::is_vague_response;
use crate::llm::LlmService;
use crate::models::ChatResponse;
use crate::models::ChatStats;
use crate::models::FaqInput;
use crate::models::FaqRecord;
use crate::models::ResponseSource;
use crate::store::FaqStore;

/// The chat responder: resolution pipeline plus the administrative surface
/// that keeps the snapshot cache consistent with the store.
pub struct ChatService {
    store: Arc<FaqStore>,
    cache: FaqCache,
    index: Arc<EmbeddingIndex>,
    llm: LlmService,
    fallback: FallbackService,
    greeter: Greeter,
    top_k: usize,
    threshold: f32,
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store = Arc::new(FaqStore::from_config(config));
        let index = Arc::new(EmbeddingIndex::new(EmbeddingConfig::from_app_config(
            &config.embeddings,
        ))?);
        let llm = LlmService::from_config(&config.llm)?;
        let fallback = FallbackService::new(
            config.chat.fallback_log_path.as_str(),
            config.chat.fallback_message.as_str(),
        );

        Ok(Self {
            cache: FaqCache::new(
                Arc::clone(&store),
                Duration::from_secs(config.snapshot_ttl_secs()),
            ),
            store,
            index,
            llm,
            fallback,
            greeter: Greeter::default(),
            top_k: config.semantic_top_k(),
            threshold: config.semantic_threshold(),
        })
    }

    /// Assemble from existing parts; lets tests substitute a fake store or
    /// a pre-seeded index without process-wide state.
    pub fn from_parts(
        store: Arc<FaqStore>,
        index: Arc<EmbeddingIndex>,
        llm: LlmService,
        fallback: FallbackService,
        config: &AppConfig,
    ) -> Self {
        Self {
            cache: FaqCache::new(
                Arc::clone(&store),
                Duration::from_secs(config.snapshot_ttl_secs()),
            ),
            store,
            index,
            llm,
            fallback,
            greeter: Greeter::default(),
            top_k: config.semantic_top_k(),
            threshold: config.semantic_threshold(),
        }
    }

    /// Resolve one message to a terminal response.
    ///
    /// An empty or whitespace-only message is a validation error, not a
    /// fallback.
    pub async fn respond(&self, message: &str) -> Result<ChatResponse> {
        let start = Instant::now();
        let message = message.trim();
        if message.is_empty() {
            return Err(FaqBotError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        debug!("Resolving message: {message}");

        // Stage 1: greeting. A pure local check; no store read, embedding
        // call or cache churn may happen before it.
        if greeting::is_greeting(message) {
            let response = ChatResponse::new(self.greeter.respond(), ResponseSource::Greeting);
            return Ok(finish(response, start));
        }

        let records = self.records_with_embeddings().await;

        // Stage 2: semantic match against the corpus
        if !records.is_empty() {
            let candidates = self.index.search(message, &records, self.top_k).await;
            if let Some(best) = candidates.first() {
                if best.score >= self.threshold {
                    info!(
                        "Semantic match '{}' (score {:.3})",
                        best.record.question, best.score
                    );
                    let response =
                        ChatResponse::new(best.record.answer.clone(), ResponseSource::FaqSemantic)
                            .with_metadata(json!({
                                "score": best.score,
                                "matched_question": best.record.question,
                            }));
                    return Ok(finish(response, start));
                }
            }
        }

        // Stage 3: exact lexical match
        if let Some(record) = matcher::exact_match(message, &records) {
            let response = ChatResponse::new(record.answer.clone(), ResponseSource::Faq);
            return Ok(finish(response, start));
        }

        // Stage 4: partial lexical match
        if let Some(record) = matcher::partial_match(message, &records) {
            let response = ChatResponse::new(record.answer.clone(), ResponseSource::Faq);
            return Ok(finish(response, start));
        }

        // Stage 5: LLM delegation, with threshold-free candidates as context
        if self.llm.is_available() {
            let candidates = if records.is_empty() {
                Vec::new()
            } else {
                self.index.search(message, &records, self.top_k).await
            };
            let prompt = build_prompt(message, &candidates);

            match self.llm.complete(&prompt).await {
                Ok(text) if !text.is_empty() && !is_vague_response(&text) => {
                    let response = ChatResponse::new(text, ResponseSource::Gpt);
                    return Ok(finish(response, start));
                }
                Ok(_) => debug!("LLM answer was vague, falling back"),
                Err(e) => warn!("LLM delegation failed: {e}"),
            }
        }

        // Stage 6: fallback
        let response = self.fallback.fallback_response(message).await;
        Ok(finish(
            ChatResponse::new(response, ResponseSource::Fallback),
            start,
        ))
    }

    /// Current snapshot with missing embeddings computed and persisted.
    /// The snapshot is invalidated after a backfill so the next reload sees
    /// the persisted vectors.
    async fn records_with_embeddings(&self) -> Vec<FaqRecord> {
        let snapshot = self.cache.get().await;
        if snapshot.is_empty() || snapshot.iter().all(|r| r.embedding.is_some()) {
            return snapshot.as_ref().clone();
        }

        let updated = self
            .index
            .ensure_embeddings(&self.store, snapshot.as_ref().clone(), false)
            .await;
        self.cache.invalidate().await;
        updated
    }

    // Administrative surface. Each mutation invalidates the snapshot only
    // after the store has acknowledged the write.

    pub async fn add_faq(&self, input: FaqInput) -> Result<FaqRecord> {
        let record = self.store.upsert(input).await?;
        self.cache.invalidate().await;
        Ok(record)
    }

    pub async fn update_faq(&self, id: &str, mut input: FaqInput) -> Result<FaqRecord> {
        input.id = Some(id.to_string());
        let record = self.store.upsert(input).await?;
        self.cache.invalidate().await;
        Ok(record)
    }

    pub async fn delete_faq(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            self.cache.invalidate().await;
        }
        Ok(deleted)
    }

    /// Force recompute and persist embeddings for the whole corpus.
    /// Returns the number of entries processed.
    pub async fn rebuild_embeddings(&self) -> usize {
        let records = self.store.get_all().await;
        if records.is_empty() {
            return 0;
        }
        let updated = self.index.ensure_embeddings(&self.store, records, true).await;
        self.cache.invalidate().await;
        updated.len()
    }

    pub async fn list_faqs(&self, category: Option<&str>) -> Vec<FaqRecord> {
        match category {
            Some(category) => self.store.get_by_category(category).await,
            None => self.store.get_all().await,
        }
    }

    pub async fn list_categories(&self) -> Vec<String> {
        self.store.list_categories().await
    }

    pub async fn recent_fallbacks(&self, limit: Option<usize>) -> Vec<String> {
        self.fallback.get_logs(limit).await
    }

    pub async fn stats(&self) -> ChatStats {
        let records = self.store.get_all().await;
        let faqs_with_embeddings = records.iter().filter(|r| r.embedding.is_some()).count();
        let mut category_counts = std::collections::BTreeMap::new();
        for record in &records {
            *category_counts.entry(record.category.clone()).or_insert(0) += 1;
        }

        ChatStats {
            total_faqs: records.len(),
            faqs_with_embeddings,
            backend_type: self.store.backend_type().to_string(),
            categories: category_counts.keys().cloned().collect(),
            category_counts,
            semantic_top_k: self.top_k,
            semantic_threshold: self.threshold,
        }
    }
}

fn finish(mut response: ChatResponse, start: Instant) -> ChatResponse {
    response.response_time_ms = start.elapsed().as_millis() as u64;
    response
}

/// Prompt for the generative backend, with the top semantic candidates
/// injected so curated answers are preferred over free generation.
fn build_prompt(message: &str, candidates: &[crate::models::CandidateMatch]) -> String {
    if candidates.is_empty() {
        return message.to_string();
    }

    let mut prompt = String::from(
        "If any of the provided FAQs answer the user, use them verbatim; otherwise answer normally.\n\nRelevant FAQs:\n",
    );
    for candidate in candidates.iter().take(3) {
        prompt.push_str(&format!(
            "Q: {}\nA: {}\n\n",
            candidate.record.question, candidate.record.answer
        ));
    }
    prompt.push_str(&format!("User question: {message}"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateMatch;

    #[test]
    fn test_prompt_without_candidates_is_the_message() {
        assert_eq!(build_prompt("hello there", &[]), "hello there");
    }

    #[test]
    fn test_prompt_injects_top_three_candidates() {
        let candidates: Vec<CandidateMatch> = (0..5)
            .map(|i| CandidateMatch {
                record: FaqInput::new(format!("Q{i}?"), format!("A{i}")).into_record(),
                score: 0.5,
            })
            .collect();

        let prompt = build_prompt("my question", &candidates);
        assert!(prompt.contains("Q: Q0?"));
        assert!(prompt.contains("Q: Q2?"));
        assert!(!prompt.contains("Q: Q3?"));
        assert!(prompt.ends_with("User question: my question"));
        assert!(prompt.starts_with("If any of the provided FAQs"));
    }
}
