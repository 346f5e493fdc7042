//! A [`ReceiptsProvider`] that validates and caches the receipts of an inner fetcher.

use crate::{
    CacheMetrics, ReceiptsCache, ReceiptsFetcher, ReceiptsProvider, ReceiptsProviderError,
    RpcReceiptsConfig, RpcReceiptsFetcher, validate_receipts,
};
use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::TransactionReceipt;
use async_trait::async_trait;
use std::num::NonZeroUsize;

/// Wraps a [`ReceiptsFetcher`], validating every fetched receipt list against the block it was
/// requested for and caching valid lists by block hash.
///
/// Only validated receipts are ever cached or returned. Concurrent misses for the same block are
/// not de-duplicated.
#[derive(Debug)]
pub struct CachingReceiptsProvider<F, M = ()> {
    /// The inner fetcher.
    inner: F,
    /// Validated receipts by block hash.
    cache: ReceiptsCache<M>,
}

impl<F, M> CachingReceiptsProvider<F, M>
where
    F: ReceiptsFetcher,
    M: CacheMetrics,
{
    /// Creates a new [`CachingReceiptsProvider`] caching the receipts of at most `cache_size`
    /// blocks.
    pub fn new(inner: F, cache_size: NonZeroUsize, metrics: M) -> Self {
        Self { inner, cache: ReceiptsCache::new(cache_size, metrics) }
    }

    /// Returns a reference to the inner fetcher.
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    /// Returns the cached receipts of the block with the given hash, without fetching.
    pub async fn cached_receipts(&self, hash: B256) -> Option<Vec<TransactionReceipt>> {
        self.cache.get(&hash).await
    }
}

impl<M: CacheMetrics> CachingReceiptsProvider<RpcReceiptsFetcher, M> {
    /// Builds an adaptive, validating, caching receipts provider over `client`.
    pub fn from_config(client: RpcClient, config: &RpcReceiptsConfig, metrics: M) -> Self {
        Self::new(RpcReceiptsFetcher::new(client, config), config.cache_size, metrics)
    }
}

#[async_trait]
impl<F, M> ReceiptsProvider for CachingReceiptsProvider<F, M>
where
    F: ReceiptsFetcher + Send + Sync,
    M: CacheMetrics + Send + Sync,
{
    async fn fetch_receipts(
        &self,
        block: BlockNumHash,
        receipts_root: B256,
        tx_hashes: &[B256],
    ) -> Result<Vec<TransactionReceipt>, ReceiptsProviderError> {
        if let Some(receipts) = self.cache.get(&block.hash).await {
            return Ok(receipts);
        }

        let fetched = self.inner.fetch_receipts(block, tx_hashes).await?;
        if let Err(err) = validate_receipts(block, receipts_root, tx_hashes, &fetched) {
            warn!(
                target: "receipts",
                block = %block.hash,
                number = block.number,
                %err,
                "Fetched invalid receipts"
            );
            return Err(err.into());
        }

        let receipts: Vec<_> = fetched.into_iter().flatten().collect();
        self.cache.insert(block.hash, receipts.clone()).await;
        Ok(receipts)
    }
}
