mod cache_manager;
mod disk;
pub mod error;
mod memory;
mod test_utils;

use std::path::PathBuf;

pub use cache_manager::get_cache;
use cache_types::{CacheContext, PageId};
pub use disk::DiskCache;
use error::PageCacheError;
pub use memory::MemoryCache;
use mockall::automock;
pub use test_utils::*;

pub use crate::disk::DEFAULT_PAGE_CACHE_CAPACITY;

utils::configurable_constants! {
    ref PAGE_CACHE_SIZE_BYTES: u64 = DEFAULT_PAGE_CACHE_CAPACITY;
}

/// PageCache is the local store of file pages consulted before the external source.
///
/// Pages are immutable once written: a page id always names the same bytes. Implementors may
/// evict at any time, so a get after a put is not required to be a hit.
#[automock]
pub trait PageCache: Sync + Send {
    /// Copies up to `buffer.len()` bytes of the page starting at `page_offset` into `buffer`.
    ///
    /// Returns Ok(0) on a miss and Ok(n) when `buffer[..n]` was filled from the cache, where n is
    /// `min(buffer.len(), page_len - page_offset)`. Errors signal IO or state problems; callers
    /// may treat them as a miss.
    fn get(
        &self,
        page_id: &PageId,
        page_offset: usize,
        buffer: &mut [u8],
        context: &CacheContext,
    ) -> Result<usize, PageCacheError>;

    /// Stores a complete page. A page is always the full page (only the last page of a file is
    /// shorter than the page size), never a sub-range of one.
    fn put(&self, page_id: &PageId, page: &[u8], context: &CacheContext) -> Result<(), PageCacheError>;
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_directory: PathBuf,
    pub cache_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            cache_directory: std::env::temp_dir().join("localcache"),
            cache_size: *PAGE_CACHE_SIZE_BYTES,
        }
    }
}

/// copies the requested part of a stored page into buffer, shared by the implementations
pub(crate) fn copy_from_page(page: &[u8], page_offset: usize, buffer: &mut [u8]) -> Result<usize, PageCacheError> {
    if page_offset > page.len() {
        return Err(PageCacheError::BadRange);
    }
    let len = buffer.len().min(page.len() - page_offset);
    buffer[..len].copy_from_slice(&page[page_offset..page_offset + len]);
    Ok(len)
}
