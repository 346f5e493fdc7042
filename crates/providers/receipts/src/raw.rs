//! Decoding of `debug_getRawReceipts` responses.

use crate::ReceiptsFetchError;
use alloy_consensus::ReceiptEnvelope;
use alloy_eips::{BlockNumHash, eip2718::Decodable2718};
use alloy_primitives::{Address, B256, Bytes};
use alloy_rpc_types_eth::{Log, TransactionReceipt};

/// Decodes the EIP-2718 encoded receipts of `block` and fills in the metadata the consensus
/// encoding omits: block and transaction identifiers, per-transaction gas used, and block-wide log
/// indices.
///
/// Sender, recipient, effective gas price and contract address are not part of the consensus
/// encoding and are left empty.
pub fn decode_raw_receipts(
    block: BlockNumHash,
    raw: &[Bytes],
    tx_hashes: &[B256],
) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
    if raw.len() != tx_hashes.len() {
        return Err(ReceiptsFetchError::RawReceiptsCount {
            got: raw.len(),
            expected: tx_hashes.len(),
        });
    }

    let mut receipts = Vec::with_capacity(raw.len());
    let mut previous_cumulative_gas_used = 0u64;
    let mut log_index = 0u64;
    for (index, (encoded, tx_hash)) in raw.iter().zip(tx_hashes).enumerate() {
        let envelope: ReceiptEnvelope = ReceiptEnvelope::decode_2718_exact(encoded.as_ref())
            .map_err(|source| ReceiptsFetchError::RawReceiptDecode { index, source })?;

        let cumulative_gas_used = envelope.cumulative_gas_used();
        let gas_used = cumulative_gas_used.saturating_sub(previous_cumulative_gas_used);
        previous_cumulative_gas_used = cumulative_gas_used;

        let inner = envelope.map_logs(|inner| {
            let log = Log {
                inner,
                block_hash: Some(block.hash),
                block_number: Some(block.number),
                block_timestamp: None,
                transaction_hash: Some(*tx_hash),
                transaction_index: Some(index as u64),
                log_index: Some(log_index),
                removed: false,
            };
            log_index += 1;
            log
        });

        receipts.push(Some(TransactionReceipt {
            inner,
            transaction_hash: *tx_hash,
            transaction_index: Some(index as u64),
            block_hash: Some(block.hash),
            block_number: Some(block.number),
            gas_used,
            effective_gas_price: 0,
            blob_gas_used: None,
            blob_gas_price: None,
            from: Address::ZERO,
            to: None,
            contract_address: None,
        }));
    }
    Ok(receipts)
}
