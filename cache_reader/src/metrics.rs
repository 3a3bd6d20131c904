use std::sync::Once;

use error_printer::ErrorPrinter;
use lazy_static::lazy_static;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{register_int_counter, Gauge, IntCounter, Opts};

pub const CACHE_HIT_RATE: &str = "client_cache_hit_rate";

// Process wide counters, shared by every reader in the process.
lazy_static! {
    pub static ref BYTES_READ_CACHE: IntCounter =
        register_int_counter!("client_cache_bytes_read_cache", "Bytes served to readers from the local cache").unwrap();
    pub static ref BYTES_REQUESTED_EXTERNAL: IntCounter = register_int_counter!(
        "client_cache_bytes_requested_external",
        "Bytes served to readers that had to be fetched from external storage"
    )
    .unwrap();
    pub static ref BYTES_READ_EXTERNAL: IntCounter = register_int_counter!(
        "client_cache_bytes_read_external",
        "Bytes read from external storage, including the parts of pages readers did not ask for"
    )
    .unwrap();
}

/// hits / (hits + misses), 0 before anything was read
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total > 0 {
        hits as f64 / total as f64
    } else {
        0.0
    }
}

/// Current process wide cache hit rate, computed from the byte counters.
pub fn cache_hit_rate() -> f64 {
    hit_rate(BYTES_READ_CACHE.get(), BYTES_REQUESTED_EXTERNAL.get())
}

/// Exposes the hit rate as a gauge whose value is computed on every collection.
struct HitRateCollector {
    gauge: Gauge,
}

impl HitRateCollector {
    fn new() -> prometheus::Result<Self> {
        let gauge = Gauge::with_opts(Opts::new(CACHE_HIT_RATE, "Cache hit rate: cache hits / (cache hits + cache misses)"))?;
        Ok(Self { gauge })
    }
}

impl Collector for HitRateCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.gauge.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gauge.set(cache_hit_rate());
        self.gauge.collect()
    }
}

/// Registers the hit rate gauge with the default registry. Safe to call from every reader,
/// only the first call registers.
pub fn register_gauges() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        // the collector reads these counters while the registry is locked, so they must be
        // registered before the collector is
        lazy_static::initialize(&BYTES_READ_CACHE);
        lazy_static::initialize(&BYTES_REQUESTED_EXTERNAL);
        lazy_static::initialize(&BYTES_READ_EXTERNAL);
        let _ = HitRateCollector::new()
            .and_then(|collector| prometheus::register(Box::new(collector)))
            .log_error("failed to register cache hit rate gauge");
    });
}
