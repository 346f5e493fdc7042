//! Per-transaction receipt fetching over batched `eth_getTransactionReceipt` calls.

use crate::{ReceiptsFetchError, ReceiptsFetcher, ReceiptsFetchingMethod};
use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use alloy_rpc_client::{RpcClient, Waiter};
use alloy_rpc_types_eth::TransactionReceipt;
use async_trait::async_trait;

/// Fetches receipts one per transaction, sending at most `max_batch_size` requests per JSON-RPC
/// batch.
///
/// This is the universal fallback that works against any compliant execution client.
#[derive(Debug, Clone)]
pub struct BasicRpcReceiptsFetcher {
    /// The JSON-RPC client.
    client: RpcClient,
    /// Maximum number of requests per batch.
    max_batch_size: usize,
}

impl BasicRpcReceiptsFetcher {
    /// Creates a new [`BasicRpcReceiptsFetcher`]. A `max_batch_size` of zero is treated as one.
    pub fn new(client: RpcClient, max_batch_size: usize) -> Self {
        Self { client, max_batch_size: max_batch_size.max(1) }
    }

    /// Returns the maximum number of requests sent per batch.
    pub const fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Fetches the receipts of a single chunk of transactions.
    async fn fetch_chunk(
        &self,
        tx_hashes: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
        let method = ReceiptsFetchingMethod::ETH_GET_TRANSACTION_RECEIPT_BATCH
            .rpc_method()
            .unwrap_or("eth_getTransactionReceipt");

        if let [tx_hash] = tx_hashes {
            let receipt: Option<TransactionReceipt> =
                self.client.request(method, (*tx_hash,)).await?;
            return Ok(vec![receipt]);
        }

        let mut batch = self.client.new_batch();
        let mut waiters = Vec::with_capacity(tx_hashes.len());
        for tx_hash in tx_hashes {
            let waiter: Waiter<Option<TransactionReceipt>> =
                batch.add_call(method, &(*tx_hash,))?;
            waiters.push(waiter);
        }
        batch.send().await?;

        let mut receipts = Vec::with_capacity(waiters.len());
        for waiter in waiters {
            receipts.push(waiter.await?);
        }
        Ok(receipts)
    }
}

#[async_trait]
impl ReceiptsFetcher for BasicRpcReceiptsFetcher {
    async fn fetch_receipts(
        &self,
        block: BlockNumHash,
        tx_hashes: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
        trace!(
            target: "receipts",
            block = %block.hash,
            tx_count = tx_hashes.len(),
            max_batch_size = self.max_batch_size,
            "Fetching receipts per transaction"
        );

        let mut receipts = Vec::with_capacity(tx_hashes.len());
        for chunk in tx_hashes.chunks(self.max_batch_size) {
            receipts.extend(self.fetch_chunk(chunk).await?);
        }
        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ReceiptsBuilder, test_block};
    use alloy_json_rpc::ErrorPayload;
    use alloy_transport::mock::{Asserter, MockTransport};

    fn fetcher(max_batch_size: usize) -> (BasicRpcReceiptsFetcher, Asserter) {
        let asserter = Asserter::new();
        let client = RpcClient::new(MockTransport::new(asserter.clone()), false);
        (BasicRpcReceiptsFetcher::new(client, max_batch_size), asserter)
    }

    #[tokio::test]
    async fn test_fetch_in_order_across_batches() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 5);
        let (fetcher, asserter) = fetcher(2);
        for receipt in set.build() {
            asserter.push_success(&receipt);
        }

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert_eq!(receipts, set.build().into_iter().map(Some).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fetch_null_receipt() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 3);
        let receipts = set.build();
        let (fetcher, asserter) = fetcher(10);
        asserter.push_success(&receipts[0]);
        asserter.push_success(&Option::<TransactionReceipt>::None);
        asserter.push_success(&receipts[2]);

        let fetched = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert_eq!(fetched.len(), 3);
        assert!(fetched[1].is_none());
        assert_eq!(fetched[2].as_ref(), Some(&receipts[2]));
    }

    #[tokio::test]
    async fn test_fetch_error_aborts() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 2);
        let (fetcher, asserter) = fetcher(1);
        asserter.push_success(&set.build()[0]);
        asserter.push_failure(ErrorPayload {
            code: -32000,
            message: "header not found".into(),
            data: None,
        });

        let err = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap_err();
        assert!(matches!(err, ReceiptsFetchError::Rpc(_)));
        assert!(!err.is_unusable_method());
    }

    #[tokio::test]
    async fn test_fetch_empty_block() {
        let (fetcher, _asserter) = fetcher(10);
        let receipts = fetcher.fetch_receipts(test_block(), &[]).await.unwrap();
        assert!(receipts.is_empty());
    }

    #[test]
    fn test_zero_batch_size() {
        let (fetcher, _) = fetcher(0);
        assert_eq!(fetcher.max_batch_size(), 1);
    }
}
