//! A bounded cache of validated block receipts.

use crate::CacheMetrics;
use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionReceipt;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// Label under which the receipts cache reports its metrics.
pub const RECEIPTS_CACHE_LABEL: &str = "receipts";

/// LRU cache of validated receipt lists, keyed by block hash.
///
/// Lookups refresh recency. Every lookup and insert is reported to the [`CacheMetrics`] sink.
#[derive(Debug)]
pub struct ReceiptsCache<M> {
    entries: Mutex<LruCache<B256, Vec<TransactionReceipt>>>,
    metrics: M,
}

impl<M: CacheMetrics> ReceiptsCache<M> {
    /// Creates a new [`ReceiptsCache`] holding at most `capacity` blocks.
    pub fn new(capacity: NonZeroUsize, metrics: M) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)), metrics }
    }

    /// Returns the receipts of the block with the given hash, if cached.
    pub async fn get(&self, hash: &B256) -> Option<Vec<TransactionReceipt>> {
        let receipts = self.entries.lock().await.get(hash).cloned();
        self.metrics.record_get(RECEIPTS_CACHE_LABEL, receipts.is_some());
        receipts
    }

    /// Inserts the receipts of the block with the given hash, evicting the least recently used
    /// block if full.
    pub async fn insert(&self, hash: B256, receipts: Vec<TransactionReceipt>) {
        let (size, evicted) = {
            let mut entries = self.entries.lock().await;
            let evicted = entries.push(hash, receipts).is_some_and(|(old, _)| old != hash);
            (entries.len(), evicted)
        };
        self.metrics.record_add(RECEIPTS_CACHE_LABEL, size, evicted);
    }

    /// Returns the number of cached blocks.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no block is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
