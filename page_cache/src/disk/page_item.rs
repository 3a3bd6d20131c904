use std::fmt::{Debug, Formatter};
use std::io::Cursor;
use std::mem::size_of;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine;
use utils::serialization_utils::{read_u32, read_u64, write_u32, write_u64};

use super::BASE64_ENGINE;
use crate::error::PageCacheError;

/// Wraps an item loaded from disk whose checksum has not been checked yet.
/// Clones share the verification flag.
#[derive(Debug, Clone)]
pub(crate) struct VerificationCell<T> {
    inner: T,
    verification: Arc<AtomicBool>,
}

impl<T> Deref for VerificationCell<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: PartialEq> PartialEq for VerificationCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq(&other.inner)
    }
}

impl<T: PartialEq> PartialEq<T> for VerificationCell<T> {
    fn eq(&self, other: &T) -> bool {
        self.inner.eq(other)
    }
}

impl<T> VerificationCell<T> {
    pub fn new_unverified(inner: T) -> Self {
        Self::new(inner, false)
    }

    pub fn new_verified(inner: T) -> Self {
        Self::new(inner, true)
    }

    #[inline]
    fn new(inner: T, verified: bool) -> Self {
        Self {
            inner,
            verification: Arc::new(AtomicBool::new(verified)),
        }
    }

    pub fn verify(&self) {
        self.verification.store(true, Ordering::Release)
    }

    pub fn is_verified(&self) -> bool {
        self.verification.load(Ordering::Acquire)
    }
}

// page index, length and checksum
const PAGE_ITEM_FILE_NAME_BUF_SIZE: usize = size_of::<u64>() + size_of::<u32>() + size_of::<u32>();

/// Metadata of one cached page: which page of the file, the page length (also the file
/// length on disk) and the crc32 of the page bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PageItem {
    pub(crate) page_index: u64,
    pub(crate) len: u32,
    pub(crate) checksum: u32,
}

impl std::fmt::Display for PageItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PageItem {{ page: {}, len: {}, checksum: {} }}", self.page_index, self.len, self.checksum)
    }
}

/// On disk a PageItem is the name of its page file: the base64 encoding of the page index,
/// length and checksum written as little endian numbers.
impl PageItem {
    pub(crate) fn new(page_index: u64, page: &[u8]) -> Result<Self, PageCacheError> {
        let len = u32::try_from(page.len()).map_err(|_| PageCacheError::InvalidArguments)?;
        Ok(Self {
            page_index,
            len,
            checksum: crc32fast::hash(page),
        })
    }

    pub(crate) fn file_name(&self) -> Result<String, PageCacheError> {
        let mut buf = [0u8; PAGE_ITEM_FILE_NAME_BUF_SIZE];
        let mut w = Cursor::new(&mut buf[..]);
        write_u64(&mut w, self.page_index)?;
        write_u32(&mut w, self.len)?;
        write_u32(&mut w, self.checksum)?;
        Ok(BASE64_ENGINE.encode(buf))
    }

    pub(crate) fn parse(file_name: &[u8]) -> Result<PageItem, PageCacheError> {
        let buf = BASE64_ENGINE.decode(file_name)?;
        if buf.len() != PAGE_ITEM_FILE_NAME_BUF_SIZE {
            return Err(PageCacheError::parse("decoded buf is not the right size for a page item file name"));
        }
        let mut r = Cursor::new(buf);
        let page_index = read_u64(&mut r)?;
        let len = read_u32(&mut r)?;
        let checksum = read_u32(&mut r)?;
        if len == 0 {
            return Err(PageCacheError::BadRange);
        }

        Ok(Self {
            page_index,
            len,
            checksum,
        })
    }

    /// true if `page` is exactly the content this item was created from
    pub(crate) fn matches(&self, page: &[u8]) -> bool {
        page.len() == self.len as usize && crc32fast::hash(page) == self.checksum
    }
}
