use std::sync::Arc;

use cache_types::CacheContext;
use sha2::{Digest, Sha256};

/// Metadata of the file being read, resolved once before the reader is constructed and
/// treated as immutable for the reader's lifetime.
#[derive(Debug, Clone, Default)]
pub struct FileStatus {
    pub file_id: u64,
    /// total length of the file in bytes
    pub length: u64,
    /// path of the file in the external storage
    pub ufs_path: String,
    pub cache_context: Option<Arc<CacheContext>>,
}

impl FileStatus {
    pub fn new(file_id: u64, length: u64, ufs_path: impl Into<String>) -> Self {
        Self {
            file_id,
            length,
            ufs_path: ufs_path.into(),
            cache_context: None,
        }
    }

    pub fn with_cache_context(mut self, cache_context: Arc<CacheContext>) -> Self {
        self.cache_context = Some(cache_context);
        self
    }

    /// The identity of this file in page ids: an explicit cache identifier wins, then either a
    /// hash of the path or the numeric file id.
    pub fn page_file_id(&self, path_hash_file_id: bool) -> String {
        if let Some(identifier) = self.cache_context.as_ref().and_then(|c| c.cache_identifier()) {
            return identifier.to_owned();
        }
        if path_hash_file_id {
            path_hash(&self.ufs_path)
        } else {
            self.file_id.to_string()
        }
    }
}

fn path_hash(path: &str) -> String {
    let mut h = Sha256::new();
    h.update(path.as_bytes());
    format!("{:x}", h.finalize())
}
