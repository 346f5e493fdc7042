//! Adaptive receipt fetching that picks the cheapest method the RPC provider serves.

use crate::{
    BasicRpcReceiptsFetcher, Metrics, ReceiptsFetchError, ReceiptsFetcher, ReceiptsFetchingMethod,
    RpcProviderKind, RpcReceiptsConfig, decode_raw_receipts, pick_best_receipts_method,
};
use alloy_eips::BlockNumHash;
use alloy_primitives::{B256, Bytes};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::TransactionReceipt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Parameter object of `alchemy_getTransactionReceipts`.
#[derive(Debug, Clone, Serialize)]
struct BlockHashParameter {
    #[serde(rename = "blockHash")]
    block_hash: B256,
}

/// Result object of `alchemy_getTransactionReceipts`.
#[derive(Debug, Deserialize)]
struct ReceiptsWrapper {
    receipts: Option<Vec<Option<TransactionReceipt>>>,
}

/// Converts `duration` to nanoseconds, saturating at [`u64::MAX`].
fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// A [`ReceiptsFetcher`] that selects the cheapest receipt fetching method for the configured
/// [`RpcProviderKind`] and the number of transactions in the block.
///
/// Methods the provider turns out not to serve are disabled until the next reset, which restores
/// all methods of the provider kind once `method_reset_interval` has passed. Transient failures
/// never disable a method.
#[derive(Debug)]
pub struct RpcReceiptsFetcher {
    /// The JSON-RPC client.
    client: RpcClient,
    /// Fallback fetcher for per-transaction receipts.
    basic: BasicRpcReceiptsFetcher,
    /// The RPC provider kind.
    provider_kind: RpcProviderKind,
    /// Bits of the methods that are currently considered available.
    available_methods: AtomicU64,
    /// Reference point for [`Self::last_reset`].
    created: Instant,
    /// Nanoseconds since [`Self::created`] at which the available methods were last reset.
    last_reset: AtomicU64,
    /// Interval after which the available methods are reset.
    method_reset_interval: Duration,
}

impl RpcReceiptsFetcher {
    /// Creates a new [`RpcReceiptsFetcher`] with all methods of the configured provider kind
    /// available.
    pub fn new(client: RpcClient, config: &RpcReceiptsConfig) -> Self {
        let basic = BasicRpcReceiptsFetcher::new(client.clone(), config.max_batch_size);
        Self {
            client,
            basic,
            provider_kind: config.provider_kind,
            available_methods: AtomicU64::new(
                ReceiptsFetchingMethod::available_for(config.provider_kind).bits(),
            ),
            created: Instant::now(),
            last_reset: AtomicU64::new(0),
            method_reset_interval: config.method_reset_interval,
        }
    }

    /// Returns the RPC provider kind.
    pub const fn provider_kind(&self) -> RpcProviderKind {
        self.provider_kind
    }

    /// Returns the receipt fetching methods currently considered available.
    pub fn available_methods(&self) -> ReceiptsFetchingMethod {
        ReceiptsFetchingMethod::from_bits_retain(self.available_methods.load(Ordering::Relaxed))
    }

    /// Returns the method to fetch the receipts of a block with `tx_count` transactions with.
    ///
    /// Restores all methods of the provider kind first if the reset interval has elapsed.
    pub fn pick_receipts_method(&self, tx_count: usize) -> ReceiptsFetchingMethod {
        let now = saturating_nanos(self.created.elapsed());
        let last_reset = self.last_reset.load(Ordering::Relaxed);
        if now.saturating_sub(last_reset) > saturating_nanos(self.method_reset_interval) {
            let defaults = ReceiptsFetchingMethod::available_for(self.provider_kind);
            let previous = ReceiptsFetchingMethod::from_bits_retain(
                self.available_methods.swap(defaults.bits(), Ordering::Relaxed),
            );
            self.last_reset.store(now, Ordering::Relaxed);
            if previous != defaults {
                warn!(
                    target: "receipts",
                    provider_kind = %self.provider_kind,
                    available = %defaults,
                    "Resetting back RPC preferences, please review RPC provider kind setting"
                );
            }
        }
        pick_best_receipts_method(self.provider_kind, self.available_methods(), tx_count as u64)
    }

    /// Disables `method` if `err` shows that the RPC provider does not serve it.
    pub fn on_receipts_method_err(&self, method: ReceiptsFetchingMethod, err: &ReceiptsFetchError) {
        if err.is_unusable_method() {
            let previous = ReceiptsFetchingMethod::from_bits_retain(
                self.available_methods.fetch_and(!method.bits(), Ordering::Relaxed),
            );
            let fallback = previous.difference(method);
            warn!(
                target: "receipts",
                provider_kind = %self.provider_kind,
                failed_method = %method,
                %fallback,
                %err,
                "Failed to use selected RPC method for receipt fetching, temporarily falling back"
            );
        } else {
            debug!(
                target: "receipts",
                method = %method,
                %err,
                "Failed to use selected RPC method for receipt fetching, but method does appear to be available, so we continue to use it"
            );
        }
    }

    /// Fetches the receipts of `block` with the given method.
    async fn fetch_with(
        &self,
        method: ReceiptsFetchingMethod,
        block: BlockNumHash,
        tx_hashes: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
        type M = ReceiptsFetchingMethod;

        if method == M::ETH_GET_TRANSACTION_RECEIPT_BATCH {
            return self.basic.fetch_receipts(block, tx_hashes).await;
        }
        let Some(name) = method.rpc_method() else {
            return Err(ReceiptsFetchError::UnknownMethod(method));
        };

        if method == M::ALCHEMY_GET_TRANSACTION_RECEIPTS {
            let wrapper: ReceiptsWrapper = self
                .client
                .request(name, [BlockHashParameter { block_hash: block.hash }])
                .await?;
            Ok(wrapper.receipts.unwrap_or_default())
        } else if method == M::DEBUG_GET_RAW_RECEIPTS {
            let raw: Option<Vec<Bytes>> = self.client.request(name, [block.hash]).await?;
            decode_raw_receipts(block, &raw.unwrap_or_default(), tx_hashes)
        } else {
            let receipts: Option<Vec<Option<TransactionReceipt>>> =
                self.client.request(name, [block.hash]).await?;
            Ok(receipts.unwrap_or_default())
        }
    }
}

#[async_trait]
impl ReceiptsFetcher for RpcReceiptsFetcher {
    async fn fetch_receipts(
        &self,
        block: BlockNumHash,
        tx_hashes: &[B256],
    ) -> Result<Vec<Option<TransactionReceipt>>, ReceiptsFetchError> {
        let method = self.pick_receipts_method(tx_hashes.len());
        trace!(
            target: "receipts",
            block = %block.hash,
            tx_count = tx_hashes.len(),
            %method,
            "Fetching receipts"
        );

        let result = self.fetch_with(method, block, tx_hashes).await;
        Metrics::record_method_call(method, result.is_err());
        if let Err(err) = &result {
            self.on_receipts_method_err(method, err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ReceiptsBuilder, test_block};
    use alloy_json_rpc::{ErrorPayload, RequestPacket, ResponsePacket};
    use alloy_transport::{
        TransportError, TransportErrorKind, TransportFut,
        mock::{Asserter, MockTransport},
    };
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::{
        sync::{Arc, Mutex},
        task::{Context, Poll},
    };
    use tower::Service;
    use tracing_test::traced_test;

    /// A [`MockTransport`] that records the method and params of every request it serves.
    #[derive(Debug, Clone)]
    struct RecordingTransport {
        inner: MockTransport,
        requests: Arc<Mutex<Vec<(String, Value)>>>,
    }

    impl Service<RequestPacket> for RecordingTransport {
        type Response = ResponsePacket;
        type Error = TransportError;
        type Future = TransportFut<'static>;

        fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            self.inner.poll_ready(cx)
        }

        fn call(&mut self, req: RequestPacket) -> Self::Future {
            let requests = match &req {
                RequestPacket::Single(req) => std::slice::from_ref(req),
                RequestPacket::Batch(reqs) => reqs.as_slice(),
            };
            let mut recorded = self.requests.lock().unwrap();
            for req in requests {
                let params = req
                    .params()
                    .map_or(Value::Null, |params| serde_json::from_str(params.get()).unwrap());
                recorded.push((req.method().to_string(), params));
            }
            drop(recorded);
            self.inner.call(req)
        }
    }

    fn recording_fetcher(
        kind: RpcProviderKind,
    ) -> (RpcReceiptsFetcher, Asserter, Arc<Mutex<Vec<(String, Value)>>>) {
        let asserter = Asserter::new();
        let requests = Arc::default();
        let transport = RecordingTransport {
            inner: MockTransport::new(asserter.clone()),
            requests: Arc::clone(&requests),
        };
        let config = RpcReceiptsConfig { provider_kind: kind, ..Default::default() };
        (RpcReceiptsFetcher::new(RpcClient::new(transport, false), &config), asserter, requests)
    }

    fn fetcher(kind: RpcProviderKind, reset: Duration) -> (RpcReceiptsFetcher, Asserter) {
        let asserter = Asserter::new();
        let client = RpcClient::new(MockTransport::new(asserter.clone()), false);
        let config = RpcReceiptsConfig {
            provider_kind: kind,
            method_reset_interval: reset,
            ..Default::default()
        };
        (RpcReceiptsFetcher::new(client, &config), asserter)
    }

    fn method_not_found() -> ErrorPayload {
        ErrorPayload { code: -32601, message: "the method does not exist".into(), data: None }
    }

    #[test]
    fn test_new_uses_registry() {
        let (fetcher, _) = fetcher(RpcProviderKind::QuickNode, Duration::from_secs(600));
        assert_eq!(fetcher.provider_kind(), RpcProviderKind::QuickNode);
        assert_eq!(
            fetcher.available_methods(),
            ReceiptsFetchingMethod::available_for(RpcProviderKind::QuickNode)
        );
    }

    #[rstest]
    #[case::standard_block_receipts(RpcProviderKind::Standard, 1, ReceiptsFetchingMethod::ETH_GET_BLOCK_RECEIPTS)]
    #[case::alchemy_small(RpcProviderKind::Alchemy, 10, ReceiptsFetchingMethod::ETH_GET_TRANSACTION_RECEIPT_BATCH)]
    #[case::alchemy_large(RpcProviderKind::Alchemy, 17, ReceiptsFetchingMethod::ALCHEMY_GET_TRANSACTION_RECEIPTS)]
    #[case::quicknode_raw(RpcProviderKind::QuickNode, 1, ReceiptsFetchingMethod::DEBUG_GET_RAW_RECEIPTS)]
    #[case::erigon(RpcProviderKind::Erigon, 1, ReceiptsFetchingMethod::ERIGON_GET_BLOCK_RECEIPTS_BY_BLOCK_HASH)]
    fn test_pick_receipts_method(
        #[case] kind: RpcProviderKind,
        #[case] tx_count: usize,
        #[case] expected: ReceiptsFetchingMethod,
    ) {
        let (fetcher, _) = fetcher(kind, Duration::from_secs(600));
        assert_eq!(fetcher.pick_receipts_method(tx_count), expected);
    }

    #[tokio::test]
    async fn test_fetch_block_receipts() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 3);
        let (fetcher, asserter) = fetcher(RpcProviderKind::Standard, Duration::from_secs(600));
        asserter.push_success(&set.build());

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert_eq!(receipts, set.build().into_iter().map(Some).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fetch_alchemy_receipts() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 20);
        let (fetcher, asserter) = fetcher(RpcProviderKind::Alchemy, Duration::from_secs(600));
        asserter.push_success(&serde_json::json!({ "receipts": set.build() }));

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert_eq!(receipts.len(), 20);
        assert_eq!(receipts[19].as_ref(), set.build().last());
    }

    #[tokio::test]
    async fn test_fetch_raw_receipts() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 3);
        let (fetcher, asserter) = fetcher(RpcProviderKind::DebugGeth, Duration::from_secs(600));
        asserter.push_success(&set.raw());

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        crate::validate_receipts(block, set.receipts_root(), &set.tx_hashes(), &receipts).unwrap();
    }

    #[tokio::test]
    async fn test_raw_receipts_count_mismatch() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 3);
        let (fetcher, asserter) = fetcher(RpcProviderKind::DebugGeth, Duration::from_secs(600));
        asserter.push_success(&set.raw()[..2].to_vec());

        let err = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap_err();
        assert_eq!(err.to_string(), "got 2 raw receipts, but expected 3");
        // A malformed response is not a sign that the method is unsupported.
        assert!(fetcher.available_methods().contains(ReceiptsFetchingMethod::DEBUG_GET_RAW_RECEIPTS));
    }

    #[tokio::test]
    async fn test_null_block_receipts() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 2);
        let (fetcher, asserter) = fetcher(RpcProviderKind::Standard, Duration::from_secs(600));
        asserter.push_success(&serde_json::Value::Null);

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert!(receipts.is_empty());
    }

    #[tokio::test]
    async fn test_degrade_and_recover() {
        type M = ReceiptsFetchingMethod;

        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 40);
        let (fetcher, asserter) = fetcher(RpcProviderKind::QuickNode, Duration::from_millis(500));

        asserter.push_failure(method_not_found());
        assert!(fetcher.fetch_receipts(block, &set.tx_hashes()).await.is_err());
        assert!(!fetcher.available_methods().contains(M::DEBUG_GET_RAW_RECEIPTS));
        assert_eq!(fetcher.pick_receipts_method(40), M::ETH_GET_BLOCK_RECEIPTS);

        asserter.push_failure(method_not_found());
        assert!(fetcher.fetch_receipts(block, &set.tx_hashes()).await.is_err());
        assert_eq!(fetcher.available_methods(), M::ETH_GET_TRANSACTION_RECEIPT_BATCH);

        // Falls back to per-transaction fetching, in two batches.
        for receipt in set.build() {
            asserter.push_success(&receipt);
        }
        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        assert_eq!(receipts.len(), 40);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fetcher.pick_receipts_method(40), M::DEBUG_GET_RAW_RECEIPTS);
        assert_eq!(fetcher.available_methods(), M::available_for(RpcProviderKind::QuickNode));
    }

    #[tokio::test]
    async fn test_transient_error_keeps_method() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 2);
        let (fetcher, asserter) = fetcher(RpcProviderKind::Standard, Duration::from_secs(600));
        asserter.push_failure(ErrorPayload {
            code: -32000,
            message: "header not found".into(),
            data: None,
        });

        assert!(fetcher.fetch_receipts(block, &set.tx_hashes()).await.is_err());
        assert_eq!(
            fetcher.available_methods(),
            ReceiptsFetchingMethod::available_for(RpcProviderKind::Standard)
        );
    }

    #[test]
    fn test_on_unusable_method_text() {
        let (fetcher, _) = fetcher(RpcProviderKind::Any, Duration::from_secs(600));
        let err: ReceiptsFetchError =
            TransportErrorKind::custom_str("parity_getBlockReceipts is not available").into();
        fetcher.on_receipts_method_err(ReceiptsFetchingMethod::PARITY_GET_BLOCK_RECEIPTS, &err);

        assert_eq!(
            fetcher.available_methods(),
            ReceiptsFetchingMethod::all().difference(ReceiptsFetchingMethod::PARITY_GET_BLOCK_RECEIPTS)
        );
    }

    #[test]
    fn test_block_hash_parameter_shape() {
        let block_hash = test_block().hash;
        assert_eq!(
            serde_json::to_value([BlockHashParameter { block_hash }]).unwrap(),
            json!([{ "blockHash": block_hash }])
        );
    }

    #[rstest]
    #[case::alchemy(RpcProviderKind::Alchemy, 20, "alchemy_getTransactionReceipts")]
    #[case::debug_geth(RpcProviderKind::DebugGeth, 3, "debug_getRawReceipts")]
    #[case::parity(RpcProviderKind::Parity, 3, "parity_getBlockReceipts")]
    #[case::nethermind(RpcProviderKind::Nethermind, 3, "parity_getBlockReceipts")]
    #[case::standard(RpcProviderKind::Standard, 3, "eth_getBlockReceipts")]
    #[case::erigon(RpcProviderKind::Erigon, 3, "erigon_getBlockReceiptsByBlockHash")]
    #[tokio::test]
    async fn test_bulk_method_request(
        #[case] kind: RpcProviderKind,
        #[case] tx_count: usize,
        #[case] method: &str,
    ) {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, tx_count);
        let (fetcher, asserter, requests) = recording_fetcher(kind);
        let (params, response) = match method {
            "alchemy_getTransactionReceipts" => {
                (json!([{ "blockHash": block.hash }]), json!({ "receipts": set.build() }))
            }
            "debug_getRawReceipts" => (json!([block.hash]), json!(set.raw())),
            _ => (json!([block.hash]), json!(set.build())),
        };
        asserter.push_success(&response);

        let receipts = fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        crate::validate_receipts(block, set.receipts_root(), &set.tx_hashes(), &receipts).unwrap();
        assert_eq!(*requests.lock().unwrap(), vec![(method.to_string(), params)]);
    }

    #[tokio::test]
    async fn test_per_transaction_request() {
        let block = test_block();
        let set = ReceiptsBuilder::with_txs(block, 3);
        let (fetcher, asserter, requests) = recording_fetcher(RpcProviderKind::Basic);
        for receipt in set.build() {
            asserter.push_success(&receipt);
        }

        fetcher.fetch_receipts(block, &set.tx_hashes()).await.unwrap();
        let expected: Vec<_> = set
            .tx_hashes()
            .into_iter()
            .map(|tx_hash| ("eth_getTransactionReceipt".to_string(), json!([tx_hash])))
            .collect();
        assert_eq!(*requests.lock().unwrap(), expected);
    }

    #[test]
    fn test_unbounded_reset_interval() {
        type M = ReceiptsFetchingMethod;

        let never = Duration::new(u64::MAX / 1_000_000_000, 709_551_616);
        let (fetcher, _) = fetcher(RpcProviderKind::Alchemy, never);
        let err: ReceiptsFetchError = TransportErrorKind::custom_str("unknown method").into();
        fetcher.on_receipts_method_err(M::ALCHEMY_GET_TRANSACTION_RECEIPTS, &err);

        assert_eq!(fetcher.pick_receipts_method(20), M::ETH_GET_TRANSACTION_RECEIPT_BATCH);
        assert!(!fetcher.available_methods().contains(M::ALCHEMY_GET_TRANSACTION_RECEIPTS));
    }

    #[test]
    #[traced_test]
    fn test_fallback_logs_remaining_methods() {
        type M = ReceiptsFetchingMethod;

        let (fetcher, _) = fetcher(RpcProviderKind::Alchemy, Duration::from_secs(600));
        let err: ReceiptsFetchError = TransportErrorKind::custom_str("unknown method").into();
        fetcher.on_receipts_method_err(M::ALCHEMY_GET_TRANSACTION_RECEIPTS, &err);

        assert!(logs_contain(
            "fallback=eth_getTransactionReceipt (batched), eth_getBlockReceipts"
        ));
    }

    #[test]
    #[traced_test]
    fn test_reset_warns_only_when_narrowed() {
        type M = ReceiptsFetchingMethod;
        const WARNING: &str = "Resetting back RPC preferences";

        let (fetcher, _) = fetcher(RpcProviderKind::Standard, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(fetcher.pick_receipts_method(1), M::ETH_GET_BLOCK_RECEIPTS);
        assert_eq!(fetcher.available_methods(), M::available_for(RpcProviderKind::Standard));
        assert!(!logs_contain(WARNING));

        let err: ReceiptsFetchError = TransportErrorKind::custom_str("unknown method").into();
        fetcher.on_receipts_method_err(M::ETH_GET_BLOCK_RECEIPTS, &err);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(fetcher.pick_receipts_method(1), M::ETH_GET_BLOCK_RECEIPTS);
        assert!(logs_contain(WARNING));
    }
}
