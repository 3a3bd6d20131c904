use std::collections::HashMap;
use std::fs::DirEntry;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use base64::engine::general_purpose::URL_SAFE;
use base64::engine::GeneralPurpose;
use base64::Engine;
use cache_types::{CacheContext, PageId};
use error_printer::ErrorPrinter;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::disk::page_item::{PageItem, VerificationCell};
use crate::error::PageCacheError;
use crate::{copy_from_page, CacheConfig, PageCache};

mod page_item;

// consistently use URL_SAFE (also file path safe) base64 codec
pub(crate) const BASE64_ENGINE: GeneralPurpose = URL_SAFE;
pub const DEFAULT_PAGE_CACHE_CAPACITY: u64 = 10 << 30; // 10 GB
const PREFIX_DIR_NAME_LEN: usize = 2;
const MAX_FILE_NAME_LEN: usize = 255;

type OptionResult<T, E> = Result<Option<T>, E>;

#[derive(Debug, Default)]
struct CacheState {
    inner: HashMap<PageId, VerificationCell<PageItem>>,
    total_bytes: u64,
}

/// DiskCache is a PageCache implementor that saves pages on the file system
#[derive(Debug, Clone)]
pub struct DiskCache {
    cache_root: PathBuf,
    capacity: u64,
    state: Arc<Mutex<CacheState>>,
}

impl DiskCache {
    pub fn num_items(&self) -> Result<usize, PageCacheError> {
        let state = self.state.lock()?;
        Ok(state.inner.len())
    }

    pub fn total_bytes(&self) -> Result<u64, PageCacheError> {
        let state = self.state.lock()?;
        Ok(state.total_bytes)
    }

    /// initialize creates a DiskCache rooted at config.cache_directory holding at most
    /// config.cache_size bytes of pages, loading any pages already present in the directory.
    ///
    /// a configured size of 0 causes initialization to fail
    ///
    /// Each file gets a directory named after its base64 encoded file id, holding one file per
    /// cached page. File directories are grouped under the first 2 characters of their name.
    ///
    /// cache_root/
    /// ├── [ab]/
    /// │   ├── [file 1 (ab123...)]/
    /// │   │   ├── [page 0, len, crc32]
    /// │   │   └── [page 7, len, crc32]
    /// │   └── [file 2 (ab456...)]/
    /// │       └── [page 3, len, crc32]
    /// └── [cd]/
    ///     └── [file 3 (cd123...)]/
    ///         └── [page 0, len, crc32]
    ///
    /// Names longer than 255 characters continue in a nested directory,
    /// i.e. [ef]/[first 255 chars]/[rest]/[page 0, len, crc32].
    pub fn initialize(config: &CacheConfig) -> Result<Self, PageCacheError> {
        if config.cache_size == 0 {
            return Err(PageCacheError::InvalidArguments);
        }
        let capacity = config.cache_size;
        let cache_root = config.cache_directory.clone();

        let state = Self::initialize_state(&cache_root, capacity)?;

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            cache_root,
            capacity,
        })
    }

    fn initialize_state(cache_root: &Path, capacity: u64) -> Result<CacheState, PageCacheError> {
        let mut state = CacheState::default();

        let Some(cache_root_readdir) = read_dir(cache_root)? else {
            return Ok(state);
        };

        for prefix_dir in cache_root_readdir {
            let Some(prefix_dir) = is_ok_dir(prefix_dir)? else {
                continue;
            };

            let prefix_dir_name = prefix_dir.file_name();
            if prefix_dir_name.as_encoded_bytes().len() != PREFIX_DIR_NAME_LEN {
                debug!("prefix dir name len != {PREFIX_DIR_NAME_LEN}");
                continue;
            }

            let Some(prefix_readdir) = read_dir(prefix_dir.path())? else {
                continue;
            };

            for file_dir in prefix_readdir {
                let Some(file_dir) = is_ok_dir(file_dir)? else {
                    continue;
                };
                let Ok(name) = file_dir.file_name().into_string() else {
                    debug!("file dir name is not valid unicode: {:?}", file_dir.path());
                    continue;
                };
                if Self::load_file_dir(&mut state, &file_dir.path(), name, capacity)? {
                    return Ok(state);
                }
            }
        }

        Ok(state)
    }

    /// loads the pages under a file directory whose name so far is `encoded_id`.
    /// encoded ids longer than a file name continue in a nested directory, so a directory whose
    /// name fills a whole segment may hold both page files and further segments.
    ///
    /// returns true once the capacity is reached
    fn load_file_dir(
        state: &mut CacheState,
        dir: &Path,
        encoded_id: String,
        capacity: u64,
    ) -> Result<bool, PageCacheError> {
        let file_id = try_parse_file_id(encoded_id.as_bytes());
        let may_continue = encoded_id.len() % MAX_FILE_NAME_LEN == 0;
        if file_id.is_err() && !may_continue {
            debug!("failed to decode a directory name as a file id: {encoded_id}");
            return Ok(false);
        }

        let Some(file_readdir) = read_dir(dir)? else {
            return Ok(false);
        };

        for item in file_readdir {
            let Some(item) = not_found_as_none(item)? else {
                continue;
            };
            let Some(file_type) = not_found_as_none(item.file_type())? else {
                continue;
            };

            if file_type.is_dir() {
                if !may_continue {
                    continue;
                }
                let Ok(segment) = item.file_name().into_string() else {
                    continue;
                };
                if Self::load_file_dir(state, &item.path(), encoded_id.clone() + &segment, capacity)? {
                    return Ok(true);
                }
                continue;
            }

            let Ok(file_id) = &file_id else {
                continue;
            };
            let Some(page_item) = try_parse_page_file(Ok(item), capacity)? else {
                continue;
            };

            state.total_bytes += page_item.len as u64;
            let page_id = PageId::new(file_id.clone(), page_item.page_index);
            state.inner.insert(page_id, VerificationCell::new_unverified(page_item));

            // stop loading once the capacity is reached, the remaining files are
            // untracked and get overwritten or ignored
            if state.total_bytes >= capacity {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn get_impl(&self, page_id: &PageId) -> OptionResult<Vec<u8>, PageCacheError> {
        let Some(page_item) = self.find_item(page_id)? else {
            return Ok(None);
        };

        let path = self.item_path(page_id, &page_item)?;
        let page = match std::fs::read(&path) {
            Ok(page) => page,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.remove_item(page_id, &page_item)?;
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
        };

        if page.len() != page_item.len as usize {
            warn!("page file {path:?} has length {}, expected {}", page.len(), page_item.len);
            self.remove_item(page_id, &page_item)?;
            return Ok(None);
        }

        if !page_item.is_verified() {
            if !page_item.matches(&page) {
                warn!("checksum mismatch on page {page_id} ({}), removing", *page_item);
                self.remove_item(page_id, &page_item)?;
                return Ok(None);
            }
            page_item.verify();
        }

        Ok(Some(page))
    }

    fn find_item(&self, page_id: &PageId) -> OptionResult<VerificationCell<PageItem>, PageCacheError> {
        let state = self.state.lock()?;
        Ok(state.inner.get(page_id).cloned())
    }

    fn put_impl(&self, page_id: &PageId, page: &[u8]) -> Result<(), PageCacheError> {
        // a single page may not take up more than 10% of capacity
        if page.is_empty() || page.len() as u64 > self.capacity / 10 {
            return Err(PageCacheError::InvalidArguments);
        }

        let page_item = PageItem::new(page_id.page_index, page)?;

        if let Some(existing) = self.find_item(page_id)? {
            if existing.matches(page) {
                return Ok(());
            }
            // pages are immutable, a different page under the same id is a caller error
            debug!("put for page {page_id} does not match cached {}", *existing);
            return Err(PageCacheError::InvalidArguments);
        }

        let path = self.item_path(page_id, &page_item)?;
        write_page_file(&path, page)?;

        // evict after the page file is written but before committing to cache state
        // to avoid evicting the new page.
        let mut state = self.state.lock()?;

        if state.inner.contains_key(page_id) {
            // a concurrent put of the same page got there first
            return Ok(());
        }

        let evicted_paths = self.maybe_evict(&mut state, page_item.len as u64)?;

        state.total_bytes += page_item.len as u64;
        state.inner.insert(page_id.clone(), VerificationCell::new_verified(page_item));

        drop(state);

        // remove files after done with modifying in memory state and releasing lock
        for path in evicted_paths {
            remove_file(&path)?;
            let dir_path = path.parent().ok_or(PageCacheError::Infallible)?;
            check_remove_dir(&self.cache_root, dir_path);
        }

        Ok(())
    }

    /// removes pages from the in-memory state until `expected_add` more bytes fit in the capacity
    ///
    /// returns the file paths to delete so that deletion occurs after the state lock is released
    fn maybe_evict(
        &self,
        state: &mut MutexGuard<'_, CacheState>,
        expected_add: u64,
    ) -> Result<Vec<PathBuf>, PageCacheError> {
        let mut paths = Vec::new();
        while state.total_bytes + expected_add > self.capacity && !state.inner.is_empty() {
            let idx = rand::random::<usize>() % state.inner.len();
            let page_id = state.inner.keys().nth(idx).cloned().ok_or(PageCacheError::Infallible)?;
            let page_item = state.inner.remove(&page_id).ok_or(PageCacheError::Infallible)?;
            debug!("evicting page {page_id}");
            state.total_bytes -= page_item.len as u64;
            paths.push(self.item_path(&page_id, &page_item)?);
        }

        Ok(paths)
    }

    /// removes a page from both the in-memory state of the cache and the file system
    fn remove_item(&self, page_id: &PageId, page_item: &VerificationCell<PageItem>) -> Result<(), PageCacheError> {
        {
            let mut state = self.state.lock()?;
            // only remove the item if it is still the one we looked at
            if state.inner.get(page_id).is_some_and(|current| current == page_item) {
                state.inner.remove(page_id);
                state.total_bytes -= page_item.len as u64;
            }
        }

        let path = self.item_path(page_id, page_item)?;

        if !path.exists() {
            return Ok(());
        }
        remove_file(&path)?;
        let dir_path = path.parent().ok_or(PageCacheError::Infallible)?;
        check_remove_dir(&self.cache_root, dir_path);
        Ok(())
    }

    fn item_path(&self, page_id: &PageId, page_item: &PageItem) -> Result<PathBuf, PageCacheError> {
        Ok(self.cache_root.join(file_dir(&page_id.file_id)?).join(page_item.file_name()?))
    }
}

impl PageCache for DiskCache {
    fn get(
        &self,
        page_id: &PageId,
        page_offset: usize,
        buffer: &mut [u8],
        _context: &CacheContext,
    ) -> Result<usize, PageCacheError> {
        match self.get_impl(page_id)? {
            Some(page) => copy_from_page(&page, page_offset, buffer),
            None => Ok(0),
        }
    }

    fn put(&self, page_id: &PageId, page: &[u8], _context: &CacheContext) -> Result<(), PageCacheError> {
        self.put_impl(page_id, page)
    }
}

// wrapper over std::fs::read_dir
// returns Ok(None) on a not found error
fn read_dir(path: impl AsRef<Path>) -> OptionResult<std::fs::ReadDir, PageCacheError> {
    match std::fs::read_dir(path) {
        Ok(rd) => Ok(Some(rd)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// returns Ok(Some(_)) if the dirent is a directory, Ok(None) if it was removed or is not a
// directory (left in place, it may belong to someone else), Err(_) on unrecoverable errors
fn is_ok_dir(dir_result: io::Result<DirEntry>) -> OptionResult<DirEntry, PageCacheError> {
    let Some(dirent) = not_found_as_none(dir_result)? else {
        return Ok(None);
    };
    let Some(md) = not_found_as_none(dirent.metadata())? else {
        return Ok(None);
    };
    if !md.is_dir() {
        debug!("CACHE: expected directory at {:?}, is not directory", dirent.path());
        return Ok(None);
    }
    Ok(Some(dirent))
}

// given a result from readdir attempts to parse it as a page file, validating its name
// against its length (checksums are verified lazily on first read)
fn try_parse_page_file(file_result: io::Result<DirEntry>, capacity: u64) -> OptionResult<PageItem, PageCacheError> {
    let Some(item) = not_found_as_none(file_result)? else {
        return Ok(None);
    };
    let Some(md) = not_found_as_none(item.metadata())? else {
        return Ok(None);
    };

    if !md.is_file() {
        return Ok(None);
    }

    // don't track a page that takes up the whole capacity
    if md.len() > capacity {
        return Ok(None);
    }

    let page_item = match PageItem::parse(item.file_name().as_encoded_bytes())
        .debug_error("failed to decode a file name as a page item")
    {
        Ok(i) => i,
        Err(e) => {
            warn!("not a valid page file, removing: {:?} {e:?}", item.file_name());
            remove_file(item.path())?;
            return Ok(None);
        },
    };
    if md.len() != page_item.len as u64 {
        warn!(
            "page file len {} does not match expected length {}, removing path: {:?}",
            md.len(),
            page_item.len,
            item.path()
        );
        remove_file(item.path())?;
        return Ok(None);
    }
    Ok(Some(page_item))
}

fn not_found_as_none<T>(result: io::Result<T>) -> OptionResult<T, PageCacheError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// removes a file but disregards a "NotFound" error if the file is already gone
fn remove_file(path: impl AsRef<Path>) -> Result<(), PageCacheError> {
    not_found_as_none(std::fs::remove_file(path))?;
    Ok(())
}

// removes dir_path if empty, then each parent that became empty up to (not including) the
// cache root. a concurrent put may repopulate any of them at any time, so failures are only logged
fn check_remove_dir(cache_root: &Path, dir_path: &Path) {
    let mut dir = Some(dir_path);
    while let Some(path) = dir {
        if path == cache_root || !path.starts_with(cache_root) {
            break;
        }
        match try_remove_empty_dir(path).debug_error(format!("failed to prune {path:?}")) {
            Ok(true) => dir = path.parent(),
            _ => break,
        }
    }
}

/// returns true if the directory is gone, false if it still holds entries
fn try_remove_empty_dir(path: &Path) -> Result<bool, PageCacheError> {
    let Some(mut rd) = read_dir(path)? else {
        return Ok(true);
    };
    if rd.next().is_some() {
        return Ok(false);
    }
    drop(rd);
    not_found_as_none(std::fs::remove_dir(path))?;
    Ok(true)
}

/// writes the page through a temp file in the page's directory and renames it into place.
/// retries when the directory was pruned by a concurrent eviction in between.
fn write_page_file(path: &Path, page: &[u8]) -> Result<(), PageCacheError> {
    const MAX_ATTEMPTS: usize = 3;
    let dir = path.parent().ok_or(PageCacheError::Infallible)?;
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = (|| -> Result<(), PageCacheError> {
            std::fs::create_dir_all(dir)?;
            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(page)?;
            tmp.as_file().sync_data()?;
            tmp.persist(path)?;
            Ok(())
        })();
        match result {
            Err(PageCacheError::IO(e)) if e.kind() == ErrorKind::NotFound && attempt < MAX_ATTEMPTS => {
                debug!("page directory {dir:?} vanished during write, retrying");
            },
            r => return r,
        }
    }
}

/// parses a file id from a directory name encoded by fn `file_dir`
fn try_parse_file_id(dir_name: &[u8]) -> Result<String, PageCacheError> {
    let buf = BASE64_ENGINE.decode(dir_name)?;
    Ok(String::from(std::str::from_utf8(&buf)?))
}

/// file_dir returns "<prefix>/<BASE64_encode(file_id)>", with encoded ids longer than a file
/// name split over nested directories of at most MAX_FILE_NAME_LEN characters each
fn file_dir(file_id: &str) -> Result<PathBuf, PageCacheError> {
    let encoded = BASE64_ENGINE.encode(file_id.as_bytes());
    if encoded.len() < PREFIX_DIR_NAME_LEN {
        return Err(PageCacheError::InvalidArguments);
    }
    let mut dir = PathBuf::from(&encoded[..PREFIX_DIR_NAME_LEN]);
    for segment in encoded.as_bytes().chunks(MAX_FILE_NAME_LEN) {
        dir.push(std::str::from_utf8(segment)?);
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cache_types::{CacheContext, PageId};
    use tempdir::TempDir;

    use super::{file_dir, try_parse_file_id, DiskCache, DEFAULT_PAGE_CACHE_CAPACITY, MAX_FILE_NAME_LEN};
    use crate::test_utils::*;
    use crate::{CacheConfig, PageCache};

    const RANDOM_SEED: u64 = 9089 << 20 | 120043;

    fn config(cache_root: &TempDir, cache_size: u64) -> CacheConfig {
        CacheConfig {
            cache_directory: cache_root.path().to_path_buf(),
            cache_size,
        }
    }

    fn read_page(cache: &DiskCache, page_id: &PageId, len: usize) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let read = cache.get(page_id, 0, &mut buf, &CacheContext::default()).unwrap();
        (read > 0).then(|| buf[..read].to_vec())
    }

    #[test]
    fn test_get_cache_empty() {
        let cache_root = TempDir::new("empty").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        assert!(read_page(&cache, &PageId::new("file", 0), 16).is_none());
    }

    #[test]
    fn test_put_get_simple() {
        let cache_root = TempDir::new("put_get_simple").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();

        let mut it = RandomPageIterator::std_from_seed(RANDOM_SEED);
        let (page_id, page) = it.next().unwrap();
        cache.put(&page_id, &page, &context).unwrap();
        print_directory_contents(cache_root.as_ref());

        assert_eq!(read_page(&cache, &page_id, page.len()).unwrap(), page);

        // sub range of the page
        let mut buf = vec![0u8; 100];
        let read = cache.get(&page_id, page.len() - 50, &mut buf, &context).unwrap();
        assert_eq!(read, 50);
        assert_eq!(&buf[..50], &page[page.len() - 50..]);
    }

    #[test]
    fn test_same_puts_noop() {
        let cache_root = TempDir::new("same_puts_noop").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();
        let (page_id, page) = RandomPageIterator::std_from_seed(RANDOM_SEED).next().unwrap();
        assert!(cache.put(&page_id, &page, &context).is_ok());
        assert!(cache.put(&page_id, &page, &context).is_ok());
        assert_eq!(cache.num_items().unwrap(), 1);
    }

    #[test]
    fn test_mismatched_put_fails() {
        let cache_root = TempDir::new("mismatched_put").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();
        let (page_id, mut page) = RandomPageIterator::std_from_seed(RANDOM_SEED).next().unwrap();
        cache.put(&page_id, &page, &context).unwrap();

        page[0] = page[0].wrapping_add(1);
        assert!(cache.put(&page_id, &page, &context).is_err());
        assert!(cache.put(&page_id, &page[1..], &context).is_err());
        assert!(cache.put(&page_id, &[], &context).is_err());
    }

    #[test]
    fn test_puts_eviction() {
        const MIN_NUM_PAGES: u32 = 12;
        // a page may take at most 10% of the capacity
        const CAP: u64 = (PAGE_LEN * 10) as u64;
        let cache_root = TempDir::new("puts_eviction").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, CAP)).unwrap();
        let context = CacheContext::default();
        let it = RandomPageIterator::std_from_seed(RANDOM_SEED);

        for (page_id, page) in it.take(MIN_NUM_PAGES as usize) {
            assert!(cache.put(&page_id, &page, &context).is_ok());
            assert!(cache.total_bytes().unwrap() <= CAP);
        }
        assert_eq!(cache.num_items().unwrap(), 10);
    }

    #[test]
    fn test_initialize_non_empty() {
        let cache_root = TempDir::new("initialize_non_empty").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();
        let mut it = RandomPageIterator::std_from_seed(RANDOM_SEED).with_file_id("shared");

        let mut pages = Vec::new();
        for _ in 0..20 {
            let (page_id, page) = it.next().unwrap();
            cache.put(&page_id, &page, &context).unwrap();
            pages.push((page_id, page));
        }

        let cache2 = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        assert_eq!(cache2.num_items().unwrap(), cache.num_items().unwrap());
        assert_eq!(cache2.total_bytes().unwrap(), cache.total_bytes().unwrap());
        for (page_id, page) in pages {
            assert_eq!(read_page(&cache2, &page_id, page.len()).unwrap(), page, "{page_id}");
        }
    }

    #[test]
    fn test_corrupt_page_is_removed() {
        let cache_root = TempDir::new("corrupt_page").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();
        let (page_id, page) = RandomPageIterator::std_from_seed(RANDOM_SEED).next().unwrap();
        cache.put(&page_id, &page, &context).unwrap();

        // flip a byte without changing the length
        let path = {
            let state = cache.state.lock().unwrap();
            cache.item_path(&page_id, state.inner.get(&page_id).unwrap()).unwrap()
        };
        let mut content = std::fs::read(&path).unwrap();
        content[0] = content[0].wrapping_add(1);
        std::fs::write(&path, content).unwrap();

        // reloaded items are unverified, the checksum catches the corruption
        let cache2 = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        assert_eq!(cache2.num_items().unwrap(), 1);
        assert!(read_page(&cache2, &page_id, page.len()).is_none());
        assert_eq!(cache2.num_items().unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_initialize_ignores_foreign_files() {
        let cache_root = TempDir::new("foreign_files").unwrap();
        std::fs::write(cache_root.path().join("README"), b"not a cache file").unwrap();
        std::fs::create_dir_all(cache_root.path().join("long_dir_name")).unwrap();
        std::fs::create_dir_all(cache_root.path().join("ab").join("!!not base64!!")).unwrap();

        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        assert_eq!(cache.num_items().unwrap(), 0);
        assert!(cache_root.path().join("README").exists());
    }

    #[test]
    fn test_initialize_stops_loading_at_capacity() {
        const CAP: u64 = (PAGE_LEN * 10) as u64;
        let cache_root = TempDir::new("stops_loading").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, CAP)).unwrap();
        let context = CacheContext::default();
        for (page_id, page) in RandomPageIterator::std_from_seed(RANDOM_SEED).take(10) {
            cache.put(&page_id, &page, &context).unwrap();
        }

        let cache2 = DiskCache::initialize(&config(&cache_root, CAP / 2)).unwrap();
        assert!(cache2.total_bytes().unwrap() <= CAP / 2);
    }

    #[test]
    fn test_eviction_prunes_directories() {
        const CAP: u64 = (PAGE_LEN * 10) as u64;
        let cache_root = TempDir::new("eviction_prunes").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, CAP)).unwrap();
        let context = CacheContext::default();
        for (page_id, page) in RandomPageIterator::std_from_seed(RANDOM_SEED).take(50) {
            cache.put(&page_id, &page, &context).unwrap();
        }

        // every random page lives in its own file directory, so only tracked files remain
        let mut file_dirs = BTreeSet::new();
        for prefix in std::fs::read_dir(cache_root.path()).unwrap() {
            for file_dir in std::fs::read_dir(prefix.unwrap().path()).unwrap() {
                file_dirs.insert(file_dir.unwrap().path());
            }
        }
        assert_eq!(file_dirs.len(), cache.num_items().unwrap());
    }

    #[test]
    fn test_file_dir_roundtrip() {
        let dir = file_dir("s3://bucket/key").unwrap();
        let name = dir.file_name().unwrap().to_str().unwrap().to_owned();
        assert_eq!(try_parse_file_id(name.as_bytes()).unwrap(), "s3://bucket/key");
        assert!(file_dir("").is_err());

        // long ids are split over nested directories that each fit a file name
        for len in [200, 300, 1024] {
            let file_id = "x".repeat(len);
            let dir = file_dir(&file_id).unwrap();
            let segments: Vec<String> = dir.iter().skip(1).map(|s| s.to_str().unwrap().to_owned()).collect();
            assert!(segments.iter().all(|s| s.len() <= MAX_FILE_NAME_LEN));
            assert_eq!(try_parse_file_id(segments.concat().as_bytes()).unwrap(), file_id);
        }
    }

    #[test]
    fn test_long_file_ids() {
        let cache_root = TempDir::new("long_file_ids").unwrap();
        let cache = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        let context = CacheContext::default();

        // both encoded ids start with the same 255 characters, so they share the first
        // nested directory and only differ in the second
        let mut pages = Vec::new();
        for (i, len) in [200, 300].into_iter().enumerate() {
            let mut it = RandomPageIterator::std_from_seed(RANDOM_SEED + i as u64).with_file_id(&"x".repeat(len));
            for _ in 0..3 {
                let (page_id, page) = it.next().unwrap();
                cache.put(&page_id, &page, &context).unwrap();
                pages.push((page_id, page));
            }
        }
        print_directory_contents(cache_root.as_ref());
        for (page_id, page) in &pages {
            assert_eq!(read_page(&cache, page_id, page.len()).unwrap(), *page);
        }

        let cache2 = DiskCache::initialize(&config(&cache_root, DEFAULT_PAGE_CACHE_CAPACITY)).unwrap();
        assert_eq!(cache2.num_items().unwrap(), pages.len());
        for (page_id, page) in &pages {
            assert_eq!(read_page(&cache2, page_id, page.len()).unwrap(), *page);
        }

        // removing every page of the long ids prunes their nested directories
        for (page_id, _) in &pages {
            let item = cache2.find_item(page_id).unwrap().unwrap();
            cache2.remove_item(page_id, &item).unwrap();
        }
        assert_eq!(std::fs::read_dir(cache_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_initialize_with_cache_size_0() {
        let cache_root = TempDir::new("initialize_with_cache_size_0").unwrap();
        assert!(DiskCache::initialize(&config(&cache_root, 0)).is_err());
    }
}
