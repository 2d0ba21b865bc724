//! Corpus-level embedding index: caching, backfill and similarity search.

use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cosine_similarity;
use super::EmbeddingClient;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::Result;
use crate::models::CandidateMatch;
use crate::models::FaqInput;
use crate::models::FaqRecord;
use crate::store::FaqStore;

#[derive(Debug, Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    computed_at: Instant,
}

/// Computes and caches embedding vectors for FAQ questions and ranks the
/// corpus against a query.
///
/// All embed operations degrade to zero vectors on backend failure; a zero
/// vector scores 0 against everything, so a failed computation can never
/// produce a match, only a miss.
pub struct EmbeddingIndex {
    client: EmbeddingClient,
    dimension: usize,
    // Keyed by text hash, not record id, so identical questions across
    // records share one computation. Racing writes are last-write-wins.
    cache: DashMap<String, CacheEntry>,
    cache_ttl: Duration,
}

impl EmbeddingIndex {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model,
            config.endpoint,
            config.api_key,
            config.timeout_secs,
        )?;

        Ok(Self {
            client,
            dimension: config.dimension,
            cache: DashMap::new(),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimension]
    }

    fn cache_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.trim().as_bytes());
        hex::encode(hasher.finalize())
    }

    fn cache_get(&self, key: &str) -> Option<Vec<f32>> {
        let entry = self.cache.get(key)?;
        if entry.computed_at.elapsed() < self.cache_ttl {
            Some(entry.vector.clone())
        } else {
            drop(entry);
            self.cache.remove(key);
            None
        }
    }

    fn cache_put(&self, key: String, vector: Vec<f32>) {
        self.cache.insert(
            key,
            CacheEntry {
                vector,
                computed_at: Instant::now(),
            },
        );
    }

    /// Seed the cache with a precomputed vector for a text, bypassing the
    /// backend. Used by offline tooling and tests.
    pub fn prime_cache(&self, text: &str, vector: Vec<f32>) {
        self.cache_put(Self::cache_key(text), vector);
    }

    /// Embed a single text. Whitespace-only input and any backend failure
    /// map to the zero vector.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            return self.zero_vector();
        }

        let key = Self::cache_key(text);
        if let Some(vector) = self.cache_get(&key) {
            return vector;
        }

        if !self.client.is_available() {
            return self.zero_vector();
        }

        match self.client.generate(text).await {
            Ok(vector) => {
                self.cache_put(key, vector.clone());
                vector
            }
            Err(e) => {
                warn!("Embedding failed, using zero vector: {e}");
                self.zero_vector()
            }
        }
    }

    /// Embed many texts with as few API calls as possible. Cache hits and
    /// empty texts are resolved locally; the rest go out in chunks of
    /// [`MAX_BATCH_SIZE`]. A failed chunk degrades to zero vectors per item.
    pub async fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut pending: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                results[i] = Some(self.zero_vector());
            } else if let Some(vector) = self.cache_get(&Self::cache_key(text)) {
                results[i] = Some(vector);
            } else {
                pending.push(i);
            }
        }

        if !pending.is_empty() && !self.client.is_available() {
            for &i in &pending {
                results[i] = Some(self.zero_vector());
            }
            pending.clear();
        }

        for chunk in pending.chunks(MAX_BATCH_SIZE) {
            let chunk_texts: Vec<&str> = chunk.iter().map(|&i| texts[i]).collect();
            match self.client.generate_batch(&chunk_texts).await {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    for (&i, vector) in chunk.iter().zip(vectors) {
                        if vector.is_empty() {
                            // Per-item failure marker from the client. Not
                            // cached, so a later call retries the backend.
                            results[i] = Some(self.zero_vector());
                        } else {
                            self.cache_put(Self::cache_key(texts[i]), vector.clone());
                            results[i] = Some(vector);
                        }
                    }
                }
                Ok(vectors) => {
                    warn!(
                        "Embedding batch returned {} vectors for {} texts, using zero vectors",
                        vectors.len(),
                        chunk.len()
                    );
                    for &i in chunk {
                        results[i] = Some(self.zero_vector());
                    }
                }
                Err(e) => {
                    warn!("Embedding batch failed, using zero vectors: {e}");
                    for &i in chunk {
                        results[i] = Some(self.zero_vector());
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|v| v.unwrap_or_else(|| self.zero_vector()))
            .collect()
    }

    /// Make sure every record carries an embedding (all of them when
    /// `force`), persisting the updated records back through the store.
    /// Returns the full record set with embeddings filled in, corpus order
    /// preserved.
    pub async fn ensure_embeddings(
        &self,
        store: &FaqStore,
        mut records: Vec<FaqRecord>,
        force: bool,
    ) -> Vec<FaqRecord> {
        let needs: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| force || r.embedding.is_none())
            .map(|(i, _)| i)
            .collect();

        if needs.is_empty() {
            return records;
        }

        info!("Computing embeddings for {} FAQ entries", needs.len());
        let questions: Vec<&str> = needs.iter().map(|&i| records[i].question.as_str()).collect();
        let vectors = self.embed_batch(&questions).await;

        for (&i, vector) in needs.iter().zip(vectors) {
            records[i].embedding = Some(vector);
        }

        let updated: Vec<FaqInput> = needs
            .iter()
            .map(|&i| FaqInput::from_record(&records[i]))
            .collect();
        let persisted = store.bulk_upsert(updated).await;
        debug!("Persisted {persisted} FAQ entries with fresh embeddings");

        records
    }

    /// Rank `records` against `query` by cosine similarity and return the
    /// top `top_k` candidates. Records without an embedding, or with one of
    /// the wrong dimension, are skipped. The sort is stable so ties keep
    /// corpus order and repeated searches stay deterministic.
    pub async fn search(
        &self,
        query: &str,
        records: &[FaqRecord],
        top_k: usize,
    ) -> Vec<CandidateMatch> {
        if records.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_embedding = self.embed(query).await;

        let mut candidates: Vec<CandidateMatch> = records
            .iter()
            .filter_map(|record| {
                let embedding = record.embedding.as_ref()?;
                if embedding.len() != self.dimension {
                    warn!(
                        "FAQ '{}' has embedding of dimension {} (expected {}), skipping",
                        record.id,
                        embedding.len(),
                        self.dimension
                    );
                    return None;
                }
                Some(CandidateMatch {
                    record: record.clone(),
                    score: cosine_similarity(&query_embedding, embedding),
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(top_k);
        candidates
    }
}
