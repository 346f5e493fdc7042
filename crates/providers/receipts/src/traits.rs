//! Traits for fetching receipts.

use crate::{ReceiptsFetchError, ReceiptsProviderError};
use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionReceipt;
use async_trait::async_trait;

/// Fetches the receipts of a block from a remote source, without validating them.
///
/// The returned list is in the order of the requested transaction hashes on success. Entries
/// are `None` where the source reported no receipt for a transaction. Nothing returned by a
/// [`ReceiptsFetcher`] may be trusted before it has passed
/// [`validate_receipts`](crate::validate_receipts).
#[async_trait]
pub trait ReceiptsFetcher {
    /// Fetches the receipts of all `tx_hashes` in `block`.
    async fn fetch_receipts(
        &self,
        block: BlockNumHash,
        tx_hashes: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError>;
}

/// Provides the complete, validated receipt set of a block.
#[async_trait]
pub trait ReceiptsProvider {
    /// Returns all receipts of `block`, ordered like `tx_hashes`.
    ///
    /// The receipts are verified against `receipts_root` from the block header, to ensure that
    /// the execution client did not fail to return any receipts.
    async fn fetch_receipts(
        &self,
        block: BlockNumHash,
        receipts_root: B256,
        tx_hashes: &[B256],
    ) -> Result<Vec<TransactionReceipt>, ReceiptsProviderError>;
}
