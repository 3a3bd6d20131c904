use std::sync::atomic::{AtomicU64, Ordering};

/// Unit of a [CacheCounter] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsUnit {
    Byte,
    Nano,
}

/// Counters a [CacheContext] accumulates across the reads of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCounter {
    /// Bytes served from the local cache.
    BytesReadCache,
    /// Bytes served to callers after a page was fetched from the external source.
    BytesRequestedExternal,
    PageReadCacheTimeNs,
    PageReadExternalTimeNs,
}

impl CacheCounter {
    pub const ALL: [CacheCounter; 4] = [
        CacheCounter::BytesReadCache,
        CacheCounter::BytesRequestedExternal,
        CacheCounter::PageReadCacheTimeNs,
        CacheCounter::PageReadExternalTimeNs,
    ];

    pub fn metric_name(&self) -> &'static str {
        match self {
            CacheCounter::BytesReadCache => "client_cache_bytes_read_cache",
            CacheCounter::BytesRequestedExternal => "client_cache_bytes_requested_external",
            CacheCounter::PageReadCacheTimeNs => "client_cache_page_read_cache_time_ns",
            CacheCounter::PageReadExternalTimeNs => "client_cache_page_read_external_time_ns",
        }
    }

    pub fn unit(&self) -> StatsUnit {
        match self {
            CacheCounter::BytesReadCache | CacheCounter::BytesRequestedExternal => StatsUnit::Byte,
            CacheCounter::PageReadCacheTimeNs | CacheCounter::PageReadExternalTimeNs => StatsUnit::Nano,
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Cache related context of a file, shared by reference across all reads of that file.
///
/// Counters only ever increase, increments are atomic so concurrent readers never lose updates.
#[derive(Debug, Default)]
pub struct CacheContext {
    cache_identifier: Option<String>,
    counters: [AtomicU64; CacheCounter::ALL.len()],
}

impl CacheContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose identifier replaces the file identity in page ids.
    pub fn with_cache_identifier(cache_identifier: impl Into<String>) -> Self {
        Self {
            cache_identifier: Some(cache_identifier.into()),
            ..Default::default()
        }
    }

    pub fn cache_identifier(&self) -> Option<&str> {
        self.cache_identifier.as_deref()
    }

    pub fn increment_counter(&self, counter: CacheCounter, value: u64) {
        self.counters[counter.slot()].fetch_add(value, Ordering::Relaxed);
    }

    pub fn counter(&self, counter: CacheCounter) -> u64 {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let context = CacheContext::new();
        assert_eq!(context.cache_identifier(), None);
        for counter in CacheCounter::ALL {
            assert_eq!(context.counter(counter), 0);
        }
    }

    #[test]
    fn test_counters_are_independent() {
        let context = CacheContext::with_cache_identifier("scoped");
        context.increment_counter(CacheCounter::BytesReadCache, 10);
        context.increment_counter(CacheCounter::PageReadCacheTimeNs, 3);
        context.increment_counter(CacheCounter::BytesReadCache, 5);
        assert_eq!(context.cache_identifier(), Some("scoped"));
        assert_eq!(context.counter(CacheCounter::BytesReadCache), 15);
        assert_eq!(context.counter(CacheCounter::PageReadCacheTimeNs), 3);
        assert_eq!(context.counter(CacheCounter::BytesRequestedExternal), 0);
    }

    #[test]
    fn test_units() {
        assert_eq!(CacheCounter::BytesRequestedExternal.unit(), StatsUnit::Byte);
        assert_eq!(CacheCounter::PageReadExternalTimeNs.unit(), StatsUnit::Nano);
    }

    #[test]
    fn test_concurrent_increments() {
        const THREADS: u64 = 8;
        const INCREMENTS: u64 = 10_000;
        let context = Arc::new(CacheContext::new());

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                let context = context.clone();
                s.spawn(move || {
                    for _ in 0..INCREMENTS {
                        context.increment_counter(CacheCounter::BytesRequestedExternal, 1);
                    }
                });
            }
        });

        assert_eq!(context.counter(CacheCounter::BytesRequestedExternal), THREADS * INCREMENTS);
    }
}
