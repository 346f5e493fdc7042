//! Test utilities for building consistent receipt sets and stubbing receipt fetchers.

use crate::{ReceiptsFetchError, ReceiptsFetcher};
use alloy_consensus::{
    Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom, proofs::ordered_trie_root_with_encoder,
};
use alloy_eips::{BlockNumHash, eip2718::Encodable2718};
use alloy_primitives::{Address, B256, Bloom, Bytes, b256};
use alloy_rpc_types_eth::{Log, TransactionReceipt};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// The block all test receipt sets belong to, unless specified otherwise.
pub const fn test_block() -> BlockNumHash {
    BlockNumHash {
        number: 19_000_000,
        hash: b256!("0x9b9e3c2f8a1b54a2d6f1c4e7a3b8d0e5f2c6a9b1d4e7f0a3c6b9d2e5f8a1b4c7"),
    }
}

/// Returns the deterministic transaction hash used for the transaction at `index`.
pub fn test_tx_hash(block: BlockNumHash, index: usize) -> B256 {
    let mut hash = block.hash;
    hash.0[..8].copy_from_slice(&(index as u64 + 1).to_be_bytes());
    hash
}

/// Returns a mutable reference to the logs of a receipt.
pub fn logs_mut(receipt: &mut TransactionReceipt) -> &mut Vec<Log> {
    match &mut receipt.inner {
        ReceiptEnvelope::Legacy(r) |
        ReceiptEnvelope::Eip2930(r) |
        ReceiptEnvelope::Eip1559(r) |
        ReceiptEnvelope::Eip4844(r) |
        ReceiptEnvelope::Eip7702(r) => &mut r.receipt.logs,
        #[allow(unreachable_patterns)]
        _ => unreachable!("unsupported receipt envelope"),
    }
}

/// Builds the receipts of a block with consistent gas and log metadata.
#[derive(Debug, Clone)]
pub struct ReceiptsBuilder {
    block: BlockNumHash,
    txs: Vec<(u64, usize)>,
}

impl ReceiptsBuilder {
    /// Creates a builder for receipts of `block`.
    pub const fn new(block: BlockNumHash) -> Self {
        Self { block, txs: Vec::new() }
    }

    /// Creates a builder for `count` transactions with two logs each.
    pub fn with_txs(block: BlockNumHash, count: usize) -> Self {
        (0..count).fold(Self::new(block), |builder, i| builder.tx(21_000 + i as u64, 2))
    }

    /// Appends a transaction using `gas_used` gas and emitting `logs` logs.
    pub fn tx(mut self, gas_used: u64, logs: usize) -> Self {
        self.txs.push((gas_used, logs));
        self
    }

    /// Returns the transaction hashes, in order.
    pub fn tx_hashes(&self) -> Vec<B256> {
        (0..self.txs.len()).map(|i| test_tx_hash(self.block, i)).collect()
    }

    /// Builds the RPC receipts.
    pub fn build(&self) -> Vec<TransactionReceipt> {
        let mut cumulative_gas_used = 0;
        let mut log_index = 0;
        self.txs
            .iter()
            .enumerate()
            .map(|(i, (gas_used, logs))| {
                let tx_hash = test_tx_hash(self.block, i);
                cumulative_gas_used += gas_used;
                let logs = (0..*logs)
                    .map(|j| {
                        let log = Log {
                            inner: alloy_primitives::Log::new_unchecked(
                                Address::with_last_byte(j as u8 + 1),
                                vec![B256::with_last_byte(i as u8), B256::with_last_byte(j as u8)],
                                Bytes::from(vec![i as u8; j + 1]),
                            ),
                            block_hash: Some(self.block.hash),
                            block_number: Some(self.block.number),
                            transaction_hash: Some(tx_hash),
                            transaction_index: Some(i as u64),
                            log_index: Some(log_index),
                            removed: false,
                            ..Default::default()
                        };
                        log_index += 1;
                        log
                    })
                    .collect();

                TransactionReceipt {
                    inner: ReceiptEnvelope::Eip1559(ReceiptWithBloom {
                        receipt: Receipt {
                            status: Eip658Value::Eip658(true),
                            cumulative_gas_used,
                            logs,
                        },
                        logs_bloom: Bloom::ZERO,
                    }),
                    transaction_hash: tx_hash,
                    transaction_index: Some(i as u64),
                    block_hash: Some(self.block.hash),
                    block_number: Some(self.block.number),
                    gas_used: *gas_used,
                    effective_gas_price: 1_000_000_000,
                    blob_gas_used: None,
                    blob_gas_price: None,
                    from: Address::ZERO,
                    to: Some(Address::ZERO),
                    contract_address: None,
                }
            })
            .collect()
    }

    /// Returns the EIP-2718 encoded receipts, as served by `debug_getRawReceipts`.
    pub fn raw(&self) -> Vec<Bytes> {
        self.build()
            .into_iter()
            .map(|r| Bytes::from(r.inner.into_primitives_receipt().encoded_2718()))
            .collect()
    }

    /// Returns the receipts trie root of the receipts.
    pub fn receipts_root(&self) -> B256 {
        let envelopes: Vec<_> =
            self.build().into_iter().map(|r| r.inner.into_primitives_receipt()).collect();
        ordered_trie_root_with_encoder(&envelopes, |receipt, buf| receipt.encode_2718(buf))
    }
}

/// A [`ReceiptsFetcher`] that serves queued responses and counts its calls.
#[derive(Debug, Default)]
pub struct TestReceiptsFetcher {
    /// Number of calls to [`ReceiptsFetcher::fetch_receipts`].
    pub calls: AtomicUsize,
    /// Responses, served front to back.
    pub responses: Mutex<VecDeque<Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError>>>,
}

impl TestReceiptsFetcher {
    /// Queues a response.
    pub fn push(&self, response: Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queues a successful response with every receipt present.
    pub fn push_receipts(&self, receipts: Vec<TransactionReceipt>) {
        self.push(Ok(receipts.into_iter().map(Some).collect()));
    }

    /// Returns the number of fetches performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptsFetcher for TestReceiptsFetcher {
    async fn fetch_receipts(
        &self,
        _: BlockNumHash,
        _: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses.lock().unwrap().pop_front().expect("no queued test response")
    }
}
