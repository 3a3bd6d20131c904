utils::configurable_constants! {
    /// Size of a cache page. Must match across every reader sharing a cache.
    ref PAGE_SIZE_BYTES: u64 = 1 << 20;

    /// Pass the file's own cache context to the page cache so it can enforce per-scope quotas.
    ref CACHE_QUOTA_ENABLED: bool = false;

    /// Identify files by a hash of their path instead of their numeric file id, for deployments
    /// where file ids are generated locally and are not unique across clients.
    ref PATH_HASH_FILE_ID: bool = false;
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub page_size: u64,
    pub cache_quota_enabled: bool,
    pub path_hash_file_id: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            page_size: *PAGE_SIZE_BYTES,
            cache_quota_enabled: *CACHE_QUOTA_ENABLED,
            path_hash_file_id: *PATH_HASH_FILE_ID,
        }
    }
}
