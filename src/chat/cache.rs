//! TTL-bounded snapshot of the FAQ corpus.
//!
//! The pipeline reads all records on every request; this cache keeps one
//! immutable snapshot alive for the configured TTL so only the occasional
//! request pays for a store round-trip. Mutations invalidate the snapshot
//! after the store has acknowledged the write.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::warn;

use crate::models::FaqRecord;
use crate::store::FaqStore;

#[derive(Clone)]
struct Snapshot {
    records: Arc<Vec<FaqRecord>>,
    loaded_at: Instant,
}

/// Snapshot manager over the FAQ store.
///
/// Snapshots are immutable once published; readers clone an `Arc` and never
/// block each other. A reload runs outside the reader lock behind a reload
/// mutex (no dogpile) and is swapped in under a short write section, so
/// concurrent readers keep seeing the previous snapshot until the swap.
pub struct FaqCache {
    store: Arc<FaqStore>,
    ttl: Duration,
    snapshot: RwLock<Option<Snapshot>>,
    reload_lock: Mutex<()>,
}

impl FaqCache {
    pub fn new(store: Arc<FaqStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            snapshot: RwLock::new(None),
            reload_lock: Mutex::new(()),
        }
    }

    /// Current records: the live snapshot while younger than the TTL,
    /// otherwise a fresh load. A failed reload serves the last good
    /// snapshot (stale beats erroring the request); with no snapshot ever
    /// loaded it serves an empty list.
    pub async fn get(&self) -> Arc<Vec<FaqRecord>> {
        if let Some(records) = self.fresh_snapshot().await {
            return records;
        }

        let _reload = self.reload_lock.lock().await;

        // Another task may have finished the reload while we waited.
        if let Some(records) = self.fresh_snapshot().await {
            return records;
        }

        match self.store.try_get_all().await {
            Ok(records) => {
                let records = Arc::new(records);
                let mut guard = self.snapshot.write().await;
                *guard = Some(Snapshot {
                    records: Arc::clone(&records),
                    loaded_at: Instant::now(),
                });
                debug!("FAQ snapshot reloaded ({} records)", records.len());
                records
            }
            Err(e) => {
                warn!("FAQ snapshot reload failed, serving last good snapshot: {e}");
                let guard = self.snapshot.read().await;
                guard
                    .as_ref()
                    .map_or_else(|| Arc::new(Vec::new()), |s| Arc::clone(&s.records))
            }
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<Vec<FaqRecord>>> {
        let guard = self.snapshot.read().await;
        guard
            .as_ref()
            .filter(|s| s.loaded_at.elapsed() < self.ttl)
            .map(|s| Arc::clone(&s.records))
    }

    /// Tear down the snapshot so the next `get` reloads. Call only after
    /// the underlying write has been acknowledged by the store.
    pub async fn invalidate(&self) {
        let mut guard = self.snapshot.write().await;
        *guard = None;
        debug!("FAQ snapshot invalidated");
    }
}
