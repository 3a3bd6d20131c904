use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::PageCacheError;
use crate::{CacheConfig, DiskCache, PageCache};

// process wide registry of live disk caches, keyed by cache directory, so that every reader
// in the process sharing a directory shares one in-memory view of it
static CACHE_MANAGER: Lazy<CacheManager> = Lazy::new(CacheManager::default);

/// get_cache returns the DiskCache for config.cache_directory, initializing it on first use
/// or after every previous handle to it was dropped.
pub fn get_cache(config: &CacheConfig) -> Result<Arc<dyn PageCache>, PageCacheError> {
    Ok(CACHE_MANAGER.get(config)?)
}

#[derive(Default)]
struct CacheManager {
    caches: Mutex<HashMap<PathBuf, Weak<DiskCache>>>,
}

impl CacheManager {
    /// only a weak pointer is held, a cache whose handles are all dropped is re-initialized
    /// from its directory on the next call
    fn get(&self, config: &CacheConfig) -> Result<Arc<DiskCache>, PageCacheError> {
        let mut caches = self.caches.lock()?;
        if let Some(cache) = caches.get(&config.cache_directory).and_then(Weak::upgrade) {
            return Ok(cache);
        }

        debug!("initializing disk cache at {:?}", config.cache_directory);
        let cache = Arc::new(DiskCache::initialize(config)?);
        caches.insert(config.cache_directory.clone(), Arc::downgrade(&cache));
        Ok(cache)
    }
}
