//! Error types for fetching and validating receipts.

use crate::ReceiptsFetchingMethod;
use alloy_eips::eip2718::Eip2718Error;
use alloy_primitives::B256;
use alloy_transport::{RpcError, TransportErrorKind};

/// JSON-RPC error code returned when the requested method does not exist.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// JSON-RPC error code returned when the method exists but rejects the parameters.
pub const INVALID_PARAMS_CODE: i64 = -32602;

/// An error that occurred while fetching receipts over RPC.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptsFetchError {
    /// Transport or JSON-RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// `debug_getRawReceipts` returned a different number of receipts than there are
    /// transactions in the block.
    #[error("got {got} raw receipts, but expected {expected}")]
    RawReceiptsCount {
        /// The number of raw receipts returned.
        got: usize,
        /// The number of transactions in the block.
        expected: usize,
    },
    /// A raw receipt could not be decoded.
    #[error("failed to decode receipt {index}: {source}")]
    RawReceiptDecode {
        /// The position of the receipt in the block.
        index: usize,
        /// The decoding error.
        #[source]
        source: Eip2718Error,
    },
    /// The selected method has no RPC dispatch.
    #[error("unknown receipt fetching method: {0:?}")]
    UnknownMethod(ReceiptsFetchingMethod),
}

impl ReceiptsFetchError {
    /// Returns `true` if the error indicates that the RPC provider does not serve the method it
    /// was called with, as opposed to a transient failure.
    pub fn is_unusable_method(&self) -> bool {
        let Self::Rpc(err) = self else { return false };
        match err {
            RpcError::ErrorResp(payload) => {
                payload.code == METHOD_NOT_FOUND_CODE || payload.code == INVALID_PARAMS_CODE
            }
            err => {
                let text = err.to_string().to_lowercase();
                text.contains("unknown method") ||
                    text.contains("invalid param") ||
                    text.contains("is not available")
            }
        }
    }
}

/// A fetched receipt set is inconsistent with the block it was requested for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiptsValidationError {
    /// The number of receipts does not match the number of transactions.
    #[error("got {got} receipts but expected {expected}")]
    ReceiptCount {
        /// The number of receipts.
        got: usize,
        /// The number of transactions.
        expected: usize,
    },
    /// The block has no transactions, but the header commits to a non-empty receipts trie.
    #[error("no transactions, but got non-empty receipt trie root: {0}")]
    NonEmptyRoot(B256),
    /// A receipt is missing, e.g. because the node pruned it or a reorg happened mid-fetch.
    #[error("receipt of tx {0} returns nil on retrieval")]
    MissingReceipt(usize),
    /// A receipt has an unexpected transaction index.
    #[error("receipt {index} has unexpected tx index {got:?}")]
    TxIndex {
        /// The position of the receipt.
        index: usize,
        /// The transaction index reported by the receipt.
        got: Option<u64>,
    },
    /// A receipt has an unexpected block number.
    #[error("receipt {index} has unexpected block number {got:?}, expected {expected}")]
    BlockNumber {
        /// The position of the receipt.
        index: usize,
        /// The block number reported by the receipt.
        got: Option<u64>,
        /// The requested block number.
        expected: u64,
    },
    /// A receipt has an unexpected block hash.
    #[error("receipt {index} has unexpected block hash {got:?}, expected {expected}")]
    BlockHash {
        /// The position of the receipt.
        index: usize,
        /// The block hash reported by the receipt.
        got: Option<B256>,
        /// The requested block hash.
        expected: B256,
    },
    /// A receipt's cumulative gas used is lower than the previous receipt's.
    #[error(
        "receipt {index} has cumulative gas used {cumulative} below the previous receipt's {previous}"
    )]
    CumulativeGasUsed {
        /// The position of the receipt.
        index: usize,
        /// The cumulative gas used reported by the receipt.
        cumulative: u64,
        /// The cumulative gas used of the previous receipt.
        previous: u64,
    },
    /// A receipt's gas used does not match the cumulative gas used difference.
    #[error("receipt {index} has invalid gas used metadata: {got}, expected {expected}")]
    GasUsed {
        /// The position of the receipt.
        index: usize,
        /// The gas used reported by the receipt.
        got: u64,
        /// The difference between this and the previous cumulative gas used.
        expected: u64,
    },
    /// A log does not carry the next block-wide log index.
    #[error("log {expected} ({position} of tx {tx}) has unexpected log index {got:?}")]
    LogIndex {
        /// The position of the owning receipt.
        tx: usize,
        /// The position of the log within its receipt.
        position: usize,
        /// The log index reported by the log.
        got: Option<u64>,
        /// The expected block-wide log index.
        expected: u64,
    },
    /// A log has an unexpected transaction index.
    #[error("log {log_index} has unexpected tx index {got:?}, expected {expected}")]
    LogTxIndex {
        /// The block-wide log index.
        log_index: u64,
        /// The transaction index reported by the log.
        got: Option<u64>,
        /// The position of the owning receipt.
        expected: u64,
    },
    /// A log has an unexpected transaction hash.
    #[error("log {log_index} of tx {expected} has unexpected tx hash {got:?}")]
    LogTxHash {
        /// The block-wide log index.
        log_index: u64,
        /// The transaction hash reported by the log.
        got: Option<B256>,
        /// The hash of the owning transaction.
        expected: B256,
    },
    /// A log has an unexpected block hash.
    #[error("log {log_index} of block {expected} has unexpected block hash {got:?}")]
    LogBlockHash {
        /// The block-wide log index.
        log_index: u64,
        /// The block hash reported by the log.
        got: Option<B256>,
        /// The requested block hash.
        expected: B256,
    },
    /// A log has an unexpected block number.
    #[error("log {log_index} of block {expected} has unexpected block number {got:?}")]
    LogBlockNumber {
        /// The block-wide log index.
        log_index: u64,
        /// The block number reported by the log.
        got: Option<u64>,
        /// The requested block number.
        expected: u64,
    },
    /// A log is marked as removed, which only happens on reorg views.
    #[error("canonical log ({0}) must never be removed due to reorg")]
    LogRemoved(u64),
    /// The receipts trie root computed from the receipts does not match the header.
    #[error(
        "failed to fetch list of receipts: expected receipt root {expected} but computed {computed} from retrieved receipts"
    )]
    ReceiptsRootMismatch {
        /// The receipts root committed to by the block header.
        expected: B256,
        /// The receipts root computed from the fetched receipts.
        computed: B256,
    },
}

/// An error returned by a [`ReceiptsProvider`](crate::ReceiptsProvider).
#[derive(Debug, thiserror::Error)]
pub enum ReceiptsProviderError {
    /// Fetching the receipts failed.
    #[error(transparent)]
    Fetch(#[from] ReceiptsFetchError),
    /// The fetched receipts did not pass validation.
    #[error("invalid receipts: {0}")]
    Validation(#[from] ReceiptsValidationError),
}

impl ReceiptsProviderError {
    /// Returns `true` if the RPC returned receipts that cannot be trusted.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
