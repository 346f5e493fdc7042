//! Validation of fetched receipt sets against the block they were requested for.

use crate::ReceiptsValidationError;
use alloy_consensus::{EMPTY_ROOT_HASH, proofs::ordered_trie_root_with_encoder};
use alloy_eips::{BlockNumHash, eip2718::Encodable2718};
use alloy_primitives::B256;
use alloy_rpc_types_eth::TransactionReceipt;

/// Validates that `receipts` is the complete, ordered and consistent receipt set of `block`.
///
/// External RPC sources are notorious for not returning all receipts, or returning them out of
/// order, so every field derivation relies on is checked and the receipts trie root is
/// recomputed and compared against `receipts_root` from the block header.
///
/// Non-consensus fields are not checked: the post-state root (dropped from L1 with EIP-658), the
/// contract address and the L1 fee metadata of OP stack receipts.
pub fn validate_receipts(
    block: BlockNumHash,
    receipts_root: B256,
    tx_hashes: &[B256],
    receipts: &[Option<TransactionReceipt>],
) -> Result<(), ReceiptsValidationError> {
    if receipts.len() != tx_hashes.len() {
        return Err(ReceiptsValidationError::ReceiptCount {
            got: receipts.len(),
            expected: tx_hashes.len(),
        });
    }
    if tx_hashes.is_empty() && receipts_root != EMPTY_ROOT_HASH {
        return Err(ReceiptsValidationError::NonEmptyRoot(receipts_root));
    }

    let mut log_index = 0u64;
    let mut cumulative_gas = 0u64;
    let mut envelopes = Vec::with_capacity(receipts.len());
    for (i, (receipt, tx_hash)) in receipts.iter().zip(tx_hashes).enumerate() {
        let Some(receipt) = receipt else {
            return Err(ReceiptsValidationError::MissingReceipt(i));
        };
        let tx_index = i as u64;

        if receipt.transaction_index != Some(tx_index) {
            return Err(ReceiptsValidationError::TxIndex {
                index: i,
                got: receipt.transaction_index,
            });
        }
        if receipt.block_number != Some(block.number) {
            return Err(ReceiptsValidationError::BlockNumber {
                index: i,
                got: receipt.block_number,
                expected: block.number,
            });
        }
        if receipt.block_hash != Some(block.hash) {
            return Err(ReceiptsValidationError::BlockHash {
                index: i,
                got: receipt.block_hash,
                expected: block.hash,
            });
        }

        let cumulative = receipt.inner.cumulative_gas_used();
        let Some(expected_gas) = cumulative.checked_sub(cumulative_gas) else {
            return Err(ReceiptsValidationError::CumulativeGasUsed {
                index: i,
                cumulative,
                previous: cumulative_gas,
            });
        };
        if receipt.gas_used != expected_gas {
            return Err(ReceiptsValidationError::GasUsed {
                index: i,
                got: receipt.gas_used,
                expected: expected_gas,
            });
        }

        for (j, log) in receipt.inner.logs().iter().enumerate() {
            if log.log_index != Some(log_index) {
                return Err(ReceiptsValidationError::LogIndex {
                    tx: i,
                    position: j,
                    got: log.log_index,
                    expected: log_index,
                });
            }
            if log.transaction_index != Some(tx_index) {
                return Err(ReceiptsValidationError::LogTxIndex {
                    log_index,
                    got: log.transaction_index,
                    expected: tx_index,
                });
            }
            if log.transaction_hash != Some(*tx_hash) {
                return Err(ReceiptsValidationError::LogTxHash {
                    log_index,
                    got: log.transaction_hash,
                    expected: *tx_hash,
                });
            }
            if log.block_hash != Some(block.hash) {
                return Err(ReceiptsValidationError::LogBlockHash {
                    log_index,
                    got: log.block_hash,
                    expected: block.hash,
                });
            }
            if log.block_number != Some(block.number) {
                return Err(ReceiptsValidationError::LogBlockNumber {
                    log_index,
                    got: log.block_number,
                    expected: block.number,
                });
            }
            if log.removed {
                return Err(ReceiptsValidationError::LogRemoved(log_index));
            }
            log_index += 1;
        }

        cumulative_gas = cumulative;
        envelopes.push(receipt.inner.clone().into_primitives_receipt());
    }

    let computed = ordered_trie_root_with_encoder(&envelopes, |receipt, buf| {
        receipt.encode_2718(buf);
    });
    if computed != receipts_root {
        return Err(ReceiptsValidationError::ReceiptsRootMismatch {
            expected: receipts_root,
            computed,
        });
    }
    Ok(())
}
