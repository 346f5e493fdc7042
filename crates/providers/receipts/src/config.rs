//! Configuration of the receipts provider stack.

use crate::RpcProviderKind;
use serde::{Deserialize, Serialize};
use std::{num::NonZeroUsize, time::Duration};

/// Default number of `eth_getTransactionReceipt` calls sent per JSON-RPC batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Default interval after which all methods of the provider kind are retried.
pub const DEFAULT_METHOD_RESET_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default number of blocks whose receipts are cached.
pub const DEFAULT_RECEIPTS_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// Configuration of a [`CachingReceiptsProvider`](crate::CachingReceiptsProvider) over an
/// [`RpcReceiptsFetcher`](crate::RpcReceiptsFetcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcReceiptsConfig {
    /// The kind of the L1 RPC provider, used to pick receipt fetching methods.
    pub provider_kind: RpcProviderKind,
    /// Maximum number of requests per JSON-RPC batch.
    pub max_batch_size: usize,
    /// Interval after which methods that were found unusable are tried again.
    pub method_reset_interval: Duration,
    /// Number of blocks whose receipts are cached.
    pub cache_size: NonZeroUsize,
}

impl Default for RpcReceiptsConfig {
    fn default() -> Self {
        Self {
            provider_kind: RpcProviderKind::default(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            method_reset_interval: DEFAULT_METHOD_RESET_INTERVAL,
            cache_size: DEFAULT_RECEIPTS_CACHE_SIZE,
        }
    }
}

/// L1 receipts fetching arguments.
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ReceiptsArgs {
    /// The kind of RPC provider, used to inform optimal transaction receipts fetching.
    /// Valid options: alchemy, quicknode, infura, parity, nethermind, debug_geth, erigon, basic,
    /// any, standard.
    #[arg(long = "l1.rpckind", default_value = "standard", env = "KONA_NODE_L1_RPC_KIND")]
    pub rpc_kind: RpcProviderKind,
    /// Maximum number of requests to make per JSON-RPC batch.
    #[arg(long = "l1.max-batch-size", default_value = "20", env = "KONA_NODE_L1_MAX_BATCH_SIZE")]
    pub max_batch_size: usize,
    /// Interval in seconds after which receipt fetching methods that failed are tried again.
    #[arg(
        long = "l1.method-reset-interval",
        default_value = "600",
        env = "KONA_NODE_L1_METHOD_RESET_INTERVAL"
    )]
    pub method_reset_interval: u64,
    /// Number of blocks whose receipts are cached.
    #[arg(
        long = "l1.receipts-cache-size",
        default_value = "1000",
        env = "KONA_NODE_L1_RECEIPTS_CACHE_SIZE"
    )]
    pub receipts_cache_size: NonZeroUsize,
}

#[cfg(feature = "cli")]
impl Default for ReceiptsArgs {
    fn default() -> Self {
        RpcReceiptsConfig::default().into()
    }
}

#[cfg(feature = "cli")]
impl From<ReceiptsArgs> for RpcReceiptsConfig {
    fn from(args: ReceiptsArgs) -> Self {
        Self {
            provider_kind: args.rpc_kind,
            max_batch_size: args.max_batch_size,
            method_reset_interval: Duration::from_secs(args.method_reset_interval),
            cache_size: args.receipts_cache_size,
        }
    }
}

#[cfg(feature = "cli")]
impl From<RpcReceiptsConfig> for ReceiptsArgs {
    fn from(config: RpcReceiptsConfig) -> Self {
        Self {
            rpc_kind: config.provider_kind,
            max_batch_size: config.max_batch_size,
            method_reset_interval: config.method_reset_interval.as_secs(),
            receipts_cache_size: config.cache_size,
        }
    }
}
