use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cache_types::{CacheContext, PageId};
use tracing::debug;

use crate::error::PageCacheError;
use crate::{copy_from_page, PageCache};

#[derive(Debug, Default)]
struct MemoryState {
    pages: HashMap<PageId, Arc<[u8]>>,
    total_bytes: u64,
}

/// MemoryCache is a PageCache implementor holding pages in process memory, bounded by a byte
/// capacity. Pages are evicted at random when a put would exceed the capacity.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    capacity: u64,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCache {
    pub fn new(capacity: u64) -> Result<Self, PageCacheError> {
        if capacity == 0 {
            return Err(PageCacheError::InvalidArguments);
        }
        Ok(Self {
            capacity,
            state: Default::default(),
        })
    }

    pub fn num_items(&self) -> Result<usize, PageCacheError> {
        Ok(self.state.lock()?.pages.len())
    }

    pub fn total_bytes(&self) -> Result<u64, PageCacheError> {
        Ok(self.state.lock()?.total_bytes)
    }

    pub fn contains(&self, page_id: &PageId) -> Result<bool, PageCacheError> {
        Ok(self.state.lock()?.pages.contains_key(page_id))
    }
}

impl PageCache for MemoryCache {
    fn get(
        &self,
        page_id: &PageId,
        page_offset: usize,
        buffer: &mut [u8],
        _context: &CacheContext,
    ) -> Result<usize, PageCacheError> {
        // clone the page out so the copy happens without holding the lock
        let page = {
            let state = self.state.lock()?;
            match state.pages.get(page_id) {
                Some(page) => page.clone(),
                None => return Ok(0),
            }
        };
        copy_from_page(&page, page_offset, buffer)
    }

    fn put(&self, page_id: &PageId, page: &[u8], _context: &CacheContext) -> Result<(), PageCacheError> {
        let len = page.len() as u64;
        if page.is_empty() || len > self.capacity {
            return Err(PageCacheError::InvalidArguments);
        }

        let mut state = self.state.lock()?;
        if state.pages.contains_key(page_id) {
            return Ok(());
        }

        while state.total_bytes + len > self.capacity {
            let idx = rand::random::<usize>() % state.pages.len();
            let victim = state.pages.keys().nth(idx).cloned().ok_or(PageCacheError::Infallible)?;
            if let Some(evicted) = state.pages.remove(&victim) {
                debug!("evicting page {victim} ({} bytes)", evicted.len());
                state.total_bytes -= evicted.len() as u64;
            }
        }

        state.total_bytes += len;
        state.pages.insert(page_id.clone(), Arc::from(page));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cache_types::{CacheContext, PageId};

    use super::MemoryCache;
    use crate::{PageCache, RandomPageIterator};

    const RANDOM_SEED: u64 = 9089 << 20 | 120043;

    #[test]
    fn test_get_empty() {
        let cache = MemoryCache::new(1 << 20).unwrap();
        let mut buf = [0u8; 16];
        let read = cache.get(&PageId::new("f", 0), 0, &mut buf, &CacheContext::default()).unwrap();
        assert_eq!(read, 0);
    }

    #[test]
    fn test_put_get_offsets() {
        let cache = MemoryCache::new(1 << 20).unwrap();
        let context = CacheContext::default();
        let mut it = RandomPageIterator::std_from_seed(RANDOM_SEED).with_page_len(4096);
        let (page_id, page) = it.next().unwrap();
        cache.put(&page_id, &page, &context).unwrap();

        let mut buf = vec![0u8; 100];
        assert_eq!(cache.get(&page_id, 4000, &mut buf, &context).unwrap(), 96);
        assert_eq!(&buf[..96], &page[4000..]);

        assert_eq!(cache.get(&page_id, 10, &mut buf, &context).unwrap(), 100);
        assert_eq!(&buf[..], &page[10..110]);

        assert_eq!(cache.get(&page_id, 4096, &mut buf, &context).unwrap(), 0);
        assert!(cache.get(&page_id, 4097, &mut buf, &context).is_err());
    }

    #[test]
    fn test_same_put_noop() {
        let cache = MemoryCache::new(1 << 20).unwrap();
        let context = CacheContext::default();
        let (page_id, page) = RandomPageIterator::std_from_seed(RANDOM_SEED).next().unwrap();
        cache.put(&page_id, &page, &context).unwrap();
        cache.put(&page_id, &page, &context).unwrap();
        assert_eq!(cache.num_items().unwrap(), 1);
        assert_eq!(cache.total_bytes().unwrap(), page.len() as u64);
    }

    #[test]
    fn test_eviction_respects_capacity() {
        const PAGE_LEN: u32 = 1024;
        const CAP: u64 = PAGE_LEN as u64 * 8;
        let cache = MemoryCache::new(CAP).unwrap();
        let context = CacheContext::default();
        let it = RandomPageIterator::std_from_seed(RANDOM_SEED).with_page_len(PAGE_LEN);

        for (page_id, page) in it.take(32) {
            cache.put(&page_id, &page, &context).unwrap();
            assert!(cache.total_bytes().unwrap() <= CAP);
        }
        assert_eq!(cache.num_items().unwrap(), 8);
    }

    #[test]
    fn test_invalid_puts() {
        assert!(MemoryCache::new(0).is_err());
        let cache = MemoryCache::new(10).unwrap();
        let context = CacheContext::default();
        assert!(cache.put(&PageId::new("f", 0), &[], &context).is_err());
        assert!(cache.put(&PageId::new("f", 0), &[0u8; 11], &context).is_err());
    }
}
