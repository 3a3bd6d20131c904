use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cache_types::{CacheContext, PageLayout};
use page_cache::PageCache;
use tracing::{debug, info};

use crate::config::ReaderConfig;
use crate::error::{PositionReaderError, Result};
use crate::external::{CloseableSupplier, ExternalReader};
use crate::fetcher::ExternalPageFetcher;
use crate::metrics::register_gauges;
use crate::resolver::PageResolver;
use crate::status::FileStatus;

/// Result of a successful positioned read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were written to the front of the buffer.
    Bytes(usize),
    /// The read started at or past the end of the file, nothing was written.
    EndOfFile,
}

impl ReadOutcome {
    pub fn bytes(&self) -> usize {
        match self {
            ReadOutcome::Bytes(n) => *n,
            ReadOutcome::EndOfFile => 0,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, ReadOutcome::EndOfFile)
    }
}

/// A reader of a file by absolute byte position, safe to share across threads.
pub trait PositionReader: Send + Sync {
    /// Reads `length` bytes starting at `position` into `buffer[..length]`, or fewer when the
    /// file ends first.
    fn position_read(&self, position: u64, buffer: &mut [u8], length: usize) -> Result<ReadOutcome>;

    /// Releases the external source. Idempotent; every read after close fails.
    fn close(&self) -> Result<()>;
}

/// A [PositionReader] that serves reads page by page from a local [PageCache], falling back to
/// the external source for pages the cache does not have.
pub struct LocalCachePositionReader<R: ExternalReader> {
    file_length: u64,
    closed: AtomicBool,
    resolver: PageResolver<R>,
}

impl<R: ExternalReader> LocalCachePositionReader<R> {
    pub fn new(
        status: FileStatus,
        source: CloseableSupplier<R>,
        cache: Arc<dyn PageCache>,
        config: &ReaderConfig,
    ) -> Result<Self> {
        let layout = PageLayout::new(config.page_size)?;
        let page_file_id = status.page_file_id(config.path_hash_file_id);
        let cache_context = match &status.cache_context {
            Some(context) if config.cache_quota_enabled => context.clone(),
            _ => Arc::new(CacheContext::new()),
        };
        register_gauges();

        info!(
            "opening cached reader for file {} ({} bytes, page size {})",
            page_file_id, status.length, config.page_size
        );
        let fetcher = ExternalPageFetcher::new(layout, status.length, source);
        let resolver = PageResolver::new(layout, page_file_id, cache, cache_context, status.cache_context, fetcher);
        Ok(Self {
            file_length: status.length,
            closed: AtomicBool::new(false),
            resolver,
        })
    }

    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<R: ExternalReader> PositionReader for LocalCachePositionReader<R> {
    fn position_read(&self, position: u64, buffer: &mut [u8], length: usize) -> Result<ReadOutcome> {
        if length > buffer.len() {
            return Err(PositionReaderError::InvalidArgument(format!(
                "length {length} exceeds buffer size {}",
                buffer.len()
            )));
        }
        if self.is_closed() {
            return Err(PositionReaderError::ClosedReader);
        }
        if length == 0 {
            return Ok(ReadOutcome::Bytes(0));
        }
        if position >= self.file_length {
            return Ok(ReadOutcome::EndOfFile);
        }

        let remaining_in_file = self.file_length - position;
        let to_read = (length as u64).min(remaining_in_file) as usize;
        let layout = self.resolver.layout();

        let mut total = 0;
        while total < to_read {
            let current = position + total as u64;
            let want = layout.bytes_remaining_in_page(current).min((to_read - total) as u64) as usize;
            let read = self.resolver.resolve(current, &mut buffer[total..total + want])?;
            if read == 0 || read > want {
                debug!("page read at {current} returned {read} of {want} bytes");
                return Err(PositionReaderError::IncompleteRead {
                    requested: length,
                    actual: total,
                    remaining: remaining_in_file,
                });
            }
            total += read;
        }
        Ok(ReadOutcome::Bytes(total))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.resolver.close()
    }
}
