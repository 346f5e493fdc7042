//! Metrics for the receipts provider crate.

use crate::ReceiptsFetchingMethod;

/// Container for metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the counter of cache lookups, labeled by cache and hit or miss.
    pub const CACHE_GETS: &str = "kona_providers_receipts_cache_gets";
    /// Identifier for the counter of cache inserts, labeled by cache and whether an entry was
    /// evicted.
    pub const CACHE_ADDS: &str = "kona_providers_receipts_cache_adds";
    /// Identifier for the gauge of cache entries, labeled by cache.
    pub const CACHE_SIZE: &str = "kona_providers_receipts_cache_size";
    /// Identifier for the counter of receipt fetches, labeled by method.
    pub const METHOD_CALLS: &str = "kona_providers_receipts_method_calls";
    /// Identifier for the counter of failed receipt fetches, labeled by method.
    pub const METHOD_FAILURES: &str = "kona_providers_receipts_method_failures";

    /// Initializes metrics for the receipts provider crate.
    ///
    /// This does two things:
    /// * Describes various metrics.
    /// * Initializes metrics to 0 so they can be queried immediately.
    #[cfg(feature = "metrics")]
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    /// Describes metrics used in [`kona_providers_receipts`][crate].
    #[cfg(feature = "metrics")]
    pub fn describe() {
        metrics::describe_counter!(Self::CACHE_GETS, "Receipts cache lookups");
        metrics::describe_counter!(Self::CACHE_ADDS, "Receipts cache inserts");
        metrics::describe_gauge!(Self::CACHE_SIZE, "Number of blocks in the receipts cache");
        metrics::describe_counter!(Self::METHOD_CALLS, "Receipt fetches per RPC method");
        metrics::describe_counter!(Self::METHOD_FAILURES, "Failed receipt fetches per RPC method");
    }

    /// Initializes metrics to `0` so they can be queried immediately by consumers of prometheus
    /// metrics.
    #[cfg(feature = "metrics")]
    pub fn zero() {
        for hit in ["true", "false"] {
            metrics::counter!(Self::CACHE_GETS, "cache" => "receipts", "hit" => hit).absolute(0);
        }
        for evicted in ["true", "false"] {
            metrics::counter!(Self::CACHE_ADDS, "cache" => "receipts", "evicted" => evicted)
                .absolute(0);
        }
        metrics::gauge!(Self::CACHE_SIZE, "cache" => "receipts").set(0);
        for method in ReceiptsFetchingMethod::all().iter() {
            let Some(name) = method.rpc_method() else { continue };
            metrics::counter!(Self::METHOD_CALLS, "method" => name).absolute(0);
            metrics::counter!(Self::METHOD_FAILURES, "method" => name).absolute(0);
        }
    }

    /// Records a receipt fetch with `method`, and whether it failed.
    pub fn record_method_call(method: ReceiptsFetchingMethod, failed: bool) {
        let name = method.rpc_method().unwrap_or("unknown");
        #[cfg(feature = "metrics")]
        {
            metrics::counter!(Self::METHOD_CALLS, "method" => name).increment(1);
            if failed {
                metrics::counter!(Self::METHOD_FAILURES, "method" => name).increment(1);
            }
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (name, failed);
    }
}

/// Sink for cache observations.
pub trait CacheMetrics {
    /// Records a lookup in the cache named `label`.
    fn record_get(&self, label: &'static str, hit: bool);

    /// Records an insert into the cache named `label`, which now holds `size` entries.
    fn record_add(&self, label: &'static str, size: usize, evicted: bool);
}

impl CacheMetrics for Metrics {
    fn record_get(&self, label: &'static str, hit: bool) {
        #[cfg(feature = "metrics")]
        metrics::counter!(Self::CACHE_GETS, "cache" => label, "hit" => if hit { "true" } else { "false" })
            .increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = (label, hit);
    }

    fn record_add(&self, label: &'static str, size: usize, evicted: bool) {
        #[cfg(feature = "metrics")]
        {
            metrics::counter!(
                Self::CACHE_ADDS,
                "cache" => label,
                "evicted" => if evicted { "true" } else { "false" }
            )
            .increment(1);
            metrics::gauge!(Self::CACHE_SIZE, "cache" => label).set(size as f64);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (label, size, evicted);
    }
}

/// Discards all observations.
impl CacheMetrics for () {
    fn record_get(&self, _: &'static str, _: bool) {}

    fn record_add(&self, _: &'static str, _: usize, _: bool) {}
}
