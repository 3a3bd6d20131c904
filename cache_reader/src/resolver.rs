use std::sync::Arc;
use std::time::Instant;

use cache_types::{CacheContext, CacheCounter, PageId, PageLayout};
use error_printer::ErrorPrinter;
use page_cache::PageCache;
use tracing::debug;

use crate::error::Result;
use crate::external::ExternalReader;
use crate::fetcher::ExternalPageFetcher;
use crate::metrics::{BYTES_READ_CACHE, BYTES_REQUESTED_EXTERNAL};

/// Serves reads that fall within a single page: from the cache when it has the page, otherwise
/// by fetching the whole page from the external source and populating the cache with it.
pub(crate) struct PageResolver<R: ExternalReader> {
    layout: PageLayout,
    page_file_id: String,
    cache: Arc<dyn PageCache>,
    /// context handed to the cache on every get/put
    cache_context: Arc<CacheContext>,
    /// context of the file, where per read counters are accumulated
    status_context: Option<Arc<CacheContext>>,
    fetcher: ExternalPageFetcher<R>,
}

impl<R: ExternalReader> PageResolver<R> {
    pub(crate) fn new(
        layout: PageLayout,
        page_file_id: String,
        cache: Arc<dyn PageCache>,
        cache_context: Arc<CacheContext>,
        status_context: Option<Arc<CacheContext>>,
        fetcher: ExternalPageFetcher<R>,
    ) -> Self {
        Self {
            layout,
            page_file_id,
            cache,
            cache_context,
            status_context,
            fetcher,
        }
    }

    pub(crate) fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Fills `buffer` with the bytes starting at `position`.
    /// `buffer.len()` must not exceed the bytes remaining in the page of `position`.
    ///
    /// Returns the number of bytes written to the front of `buffer`. A cache hit is passed
    /// through as is, even when it delivers fewer bytes than asked for.
    pub(crate) fn resolve(&self, position: u64, buffer: &mut [u8]) -> Result<usize> {
        let page_id = PageId::new(self.page_file_id.as_str(), self.layout.page_index(position));
        let page_offset = self.layout.page_offset(position) as usize;

        let start = Instant::now();
        let hit = self
            .cache
            .get(&page_id, page_offset, buffer, &self.cache_context)
            .debug_error(format!("cache get failed for page {page_id}"))
            .unwrap_or(0);
        if hit > 0 {
            BYTES_READ_CACHE.inc_by(hit as u64);
            self.record(CacheCounter::BytesReadCache, hit as u64);
            self.record(CacheCounter::PageReadCacheTimeNs, elapsed_ns(start));
            return Ok(hit);
        }

        debug!("cache miss for page {page_id}");
        let start = Instant::now();
        let page = self.fetcher.fetch_page(position)?;
        let len = buffer.len().min(page.len().saturating_sub(page_offset));
        if len > 0 {
            buffer[..len].copy_from_slice(&page[page_offset..page_offset + len]);
        }
        BYTES_REQUESTED_EXTERNAL.inc_by(len as u64);
        self.record(CacheCounter::BytesRequestedExternal, len as u64);
        self.record(CacheCounter::PageReadExternalTimeNs, elapsed_ns(start));

        let _ = self
            .cache
            .put(&page_id, &page, &self.cache_context)
            .warn_error(format!("failed to populate page {page_id}"));
        Ok(len)
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.fetcher.close()
    }

    fn record(&self, counter: CacheCounter, value: u64) {
        if let Some(context) = &self.status_context {
            context.increment_counter(counter, value);
        }
    }
}

fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
