//! Receipt fetching methods, the per-provider method registry and cost-based method selection.
//!
//! Cost break-down sources:
//! - Alchemy: <https://docs.alchemy.com/reference/compute-units>
//! - QuickNode: <https://www.quicknode.com/docs/ethereum/api_credits>
//! - Infura: no pricing table available.

use crate::RpcProviderKind;
use bitflags::bitflags;
use core::fmt;

/// Alchemy compute units charged per `eth_getTransactionReceipt` call.
pub const ALCHEMY_TX_RECEIPT_COST: u64 = 15;
/// Alchemy compute units charged per `alchemy_getTransactionReceipts` call.
pub const ALCHEMY_GET_TRANSACTION_RECEIPTS_COST: u64 = 250;
/// Alchemy compute units charged per `eth_getBlockReceipts` call.
pub const ALCHEMY_BLOCK_RECEIPTS_COST: u64 = 500;
/// QuickNode credits charged per `eth_getTransactionReceipt` call.
pub const QUICKNODE_TX_RECEIPT_COST: u64 = 2;
/// QuickNode credits charged per `eth_getBlockReceipts` call.
pub const QUICKNODE_BLOCK_RECEIPTS_COST: u64 = 59;

/// Transaction count above which `alchemy_getTransactionReceipts` is cheaper than per-tx fetching.
pub const ALCHEMY_GET_TRANSACTION_RECEIPTS_BREAK_EVEN: u64 =
    break_even(ALCHEMY_GET_TRANSACTION_RECEIPTS_COST, ALCHEMY_TX_RECEIPT_COST);
/// Transaction count above which Alchemy's `eth_getBlockReceipts` is cheaper than per-tx fetching.
pub const ALCHEMY_BLOCK_RECEIPTS_BREAK_EVEN: u64 =
    break_even(ALCHEMY_BLOCK_RECEIPTS_COST, ALCHEMY_TX_RECEIPT_COST);
/// Transaction count above which QuickNode's `eth_getBlockReceipts` is cheaper than per-tx
/// fetching.
pub const QUICKNODE_BLOCK_RECEIPTS_BREAK_EVEN: u64 =
    break_even(QUICKNODE_BLOCK_RECEIPTS_COST, QUICKNODE_TX_RECEIPT_COST);

/// Returns the number of transactions above which a flat-cost bulk call is cheaper than paying
/// `per_tx_cost` for every transaction.
pub const fn break_even(bulk_cost: u64, per_tx_cost: u64) -> u64 {
    bulk_cost / per_tx_cost
}

bitflags! {
    /// A set of receipt fetching methods, one bit per method.
    ///
    /// Depending on errors, transaction counts and the provider kind, different methods are
    /// selected. A single fetch attempt always uses exactly one method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReceiptsFetchingMethod: u64 {
        /// Standard per-tx receipt fetching with JSON-RPC batches. Available everywhere.
        ///
        /// - Alchemy: 15 CU / tx
        /// - QuickNode: 2 credits / tx
        ///
        /// Method: `eth_getTransactionReceipt`
        const ETH_GET_TRANSACTION_RECEIPT_BATCH = 1 << 0;
        /// Alchemy's bulk receipts method, 250 CU total.
        ///
        /// Method: `alchemy_getTransactionReceipts`
        /// Params: object with a `blockHash` field.
        /// Returns: the receipts array wrapped in an object with a single `receipts` field,
        /// despite the docs saying otherwise.
        const ALCHEMY_GET_TRANSACTION_RECEIPTS = 1 << 1;
        /// Geth debug method returning the consensus encoding of all receipts in a block.
        /// Fast, avoids serialization and metadata overhead. Ideal for syncing from a local geth.
        ///
        /// - Geth: free
        /// - QuickNode: undocumented price
        ///
        /// Method: `debug_getRawReceipts`
        /// Params: block number or hash.
        /// Returns: list of hex encoded EIP-2718 receipts.
        const DEBUG_GET_RAW_RECEIPTS = 1 << 2;
        /// Old parity method, adopted by Nethermind and some RPC providers.
        ///
        /// - Alchemy: 500 CU total
        /// - Parity, Nethermind: free
        ///
        /// Method: `parity_getBlockReceipts`
        /// Params: block hash, number or tag.
        /// Returns: array of receipts.
        const PARITY_GET_BLOCK_RECEIPTS = 1 << 3;
        /// Formerly non-standard bulk receipts method in the `eth` namespace, standardized in
        /// execution-apis#438 and served by Geth, Besu and Reth.
        ///
        /// - Alchemy: 500 CU total
        /// - QuickNode: 59 credits total
        ///
        /// Erigon serves it too, but without support for a block hash argument.
        ///
        /// Method: `eth_getBlockReceipts`
        /// Params: block hash, number or tag.
        /// Returns: array of receipts.
        const ETH_GET_BLOCK_RECEIPTS = 1 << 4;
        /// Erigon specific method, equivalent to `eth_getBlockReceipts` with block hash support.
        ///
        /// Method: `erigon_getBlockReceiptsByBlockHash`
        /// Params: block hash.
        /// Returns: array of receipts.
        const ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH = 1 << 5;
    }
}

impl ReceiptsFetchingMethod {
    /// Every known method, paired with its JSON-RPC method name, in bit order.
    const NAMED: [(Self, &'static str); 6] = [
        (Self::ETH_GET_TRANSACTION_RECEIPT_BATCH, "eth_getTransactionReceipt"),
        (Self::ALCHEMY_GET_TRANSACTION_RECEIPTS, "alchemy_getTransactionReceipts"),
        (Self::DEBUG_GET_RAW_RECEIPTS, "debug_getRawReceipts"),
        (Self::PARITY_GET_BLOCK_RECEIPTS, "parity_getBlockReceipts"),
        (Self::ETH_GET_BLOCK_RECEIPTS, "eth_getBlockReceipts"),
        (Self::ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH, "erigon_getBlockReceiptsByBlockHash"),
    ];

    /// Returns the JSON-RPC method name if `self` is exactly one known method.
    pub fn rpc_method(&self) -> Option<&'static str> {
        Self::NAMED.iter().find(|(method, _)| method == self).map(|(_, name)| *name)
    }

    /// Returns the receipt fetching methods known to work for the given provider kind.
    pub const fn available_for(kind: RpcProviderKind) -> Self {
        match kind {
            RpcProviderKind::Alchemy => Self::ALCHEMY_GET_TRANSACTION_RECEIPTS
                .union(Self::ETH_GET_BLOCK_RECEIPTS)
                .union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH),
            RpcProviderKind::QuickNode => Self::DEBUG_GET_RAW_RECEIPTS
                .union(Self::ETH_GET_BLOCK_RECEIPTS)
                .union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH),
            // Infura does not serve any of the optimized receipt fetching methods.
            RpcProviderKind::Infura => Self::ETH_GET_TRANSACTION_RECEIPT_BATCH,
            RpcProviderKind::Parity | RpcProviderKind::Nethermind => {
                Self::PARITY_GET_BLOCK_RECEIPTS.union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH)
            }
            RpcProviderKind::DebugGeth => {
                Self::DEBUG_GET_RAW_RECEIPTS.union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH)
            }
            RpcProviderKind::Erigon => Self::ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH
                .union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH),
            RpcProviderKind::Basic => Self::ETH_GET_TRANSACTION_RECEIPT_BATCH,
            RpcProviderKind::Any => Self::all(),
            RpcProviderKind::Standard => {
                Self::ETH_GET_BLOCK_RECEIPTS.union(Self::ETH_GET_TRANSACTION_RECEIPT_BATCH)
            }
        }
    }
}

impl fmt::Display for ReceiptsFetchingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut separate = |f: &mut fmt::Formatter<'_>| {
            let res = if first { Ok(()) } else { f.write_str(", ") };
            first = false;
            res
        };
        for (method, name) in Self::NAMED {
            if self.contains(method) {
                separate(f)?;
                f.write_str(name)?;
                if method == Self::ETH_GET_TRANSACTION_RECEIPT_BATCH {
                    f.write_str(" (batched)")?;
                }
            }
        }
        if self.bits() & !Self::all().bits() != 0 {
            separate(f)?;
            f.write_str("unknown")?;
        }
        Ok(())
    }
}

/// Selects the receipt fetching method that is still available and cheapest for fetching
/// `tx_count` receipts from the given provider kind.
///
/// The per-tx batched method is always considered available and is the final fallback.
pub const fn pick_best_receipts_method(
    kind: RpcProviderKind,
    available: ReceiptsFetchingMethod,
    tx_count: u64,
) -> ReceiptsFetchingMethod {
    type M = ReceiptsFetchingMethod;

    // Optimized methods only pay off if they are cheaper than fetching the receipts one by one
    // with the standard receipts method.
    match kind {
        RpcProviderKind::Alchemy => {
            if available.contains(M::ALCHEMY_GET_TRANSACTION_RECEIPTS) &&
                tx_count > ALCHEMY_GET_TRANSACTION_RECEIPTS_BREAK_EVEN
            {
                return M::ALCHEMY_GET_TRANSACTION_RECEIPTS;
            }
            if available.contains(M::ETH_GET_BLOCK_RECEIPTS) &&
                tx_count > ALCHEMY_BLOCK_RECEIPTS_BREAK_EVEN
            {
                return M::ETH_GET_BLOCK_RECEIPTS;
            }
            M::ETH_GET_TRANSACTION_RECEIPT_BATCH
        }
        RpcProviderKind::QuickNode => {
            if available.contains(M::DEBUG_GET_RAW_RECEIPTS) {
                return M::DEBUG_GET_RAW_RECEIPTS;
            }
            if available.contains(M::ETH_GET_BLOCK_RECEIPTS) &&
                tx_count > QUICKNODE_BLOCK_RECEIPTS_BREAK_EVEN
            {
                return M::ETH_GET_BLOCK_RECEIPTS;
            }
            M::ETH_GET_TRANSACTION_RECEIPT_BATCH
        }
        // In order of preference, based on cost.
        _ => {
            if available.contains(M::ALCHEMY_GET_TRANSACTION_RECEIPTS) {
                M::ALCHEMY_GET_TRANSACTION_RECEIPTS
            } else if available.contains(M::DEBUG_GET_RAW_RECEIPTS) {
                M::DEBUG_GET_RAW_RECEIPTS
            } else if available.contains(M::ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH) {
                M::ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH
            } else if available.contains(M::ETH_GET_BLOCK_RECEIPTS) {
                M::ETH_GET_BLOCK_RECEIPTS
            } else if available.contains(M::PARITY_GET_BLOCK_RECEIPTS) {
                M::PARITY_GET_BLOCK_RECEIPTS
            } else {
                M::ETH_GET_TRANSACTION_RECEIPT_BATCH
            }
        }
    }
}
