#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/op-rs/kona/main/assets/square.png",
    html_favicon_url = "https://raw.githubusercontent.com/op-rs/kona/main/assets/favicon.ico",
    issue_tracker_base_url = "https://github.com/op-rs/kona/issues/"
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod kind;
pub use kind::{RpcProviderKind, UnknownRpcProviderKind};

mod method;
pub use method::{
    ALCHEMY_BLOCK_RECEIPTS_BREAK_EVEN, ALCHEMY_BLOCK_RECEIPTS_COST,
    ALCHEMY_GET_TRANSACTION_RECEIPTS_BREAK_EVEN, ALCHEMY_GET_TRANSACTION_RECEIPTS_COST,
    ALCHEMY_TX_RECEIPT_COST, QUICKNODE_BLOCK_RECEIPTS_BREAK_EVEN, QUICKNODE_BLOCK_RECEIPTS_COST,
    QUICKNODE_TX_RECEIPT_COST, ReceiptsFetchingMethod, break_even, pick_best_receipts_method,
};

mod errors;
pub use errors::{
    INVALID_PARAMS_CODE, METHOD_NOT_FOUND_CODE, ReceiptsFetchError, ReceiptsProviderError,
    ReceiptsValidationError,
};

mod traits;
pub use traits::{ReceiptsFetcher, ReceiptsProvider};

mod validate;
pub use validate::validate_receipts;

mod raw;
pub use raw::decode_raw_receipts;

mod basic;
pub use basic::BasicRpcReceiptsFetcher;

mod fetcher;
pub use fetcher::RpcReceiptsFetcher;

mod cache;
pub use cache::{RECEIPTS_CACHE_LABEL, ReceiptsCache};

mod caching;
pub use caching::CachingReceiptsProvider;

mod config;
pub use config::{
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_METHOD_RESET_INTERVAL, DEFAULT_RECEIPTS_CACHE_SIZE,
    RpcReceiptsConfig,
};
#[cfg(feature = "cli")]
pub use config::ReceiptsArgs;

mod metrics;
pub use metrics::{CacheMetrics, Metrics};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
