use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::CacheTypesError;

/// A PageId names one page of one file in the page cache.
///
/// `file_id` is a stable identity of the file (an explicit cache identifier, a path hash or a
/// numeric file id rendered as a string), `page_index` is `position / page_size`.
#[derive(Debug, PartialEq, Default, Ord, PartialOrd, Eq, Hash, Clone)]
pub struct PageId {
    pub file_id: String,
    pub page_index: u64,
}

impl PageId {
    pub fn new(file_id: impl Into<String>, page_index: u64) -> Self {
        Self {
            file_id: file_id.into(),
            page_index,
        }
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.file_id, self.page_index)
    }
}

impl FromStr for PageId {
    type Err = CacheTypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((file_id, page_index)) = s.rsplit_once('/') else {
            return Err(CacheTypesError::InvalidPageId(s.to_owned()));
        };
        if file_id.is_empty() {
            return Err(CacheTypesError::InvalidPageId(s.to_owned()));
        }

        let page_index = page_index
            .parse::<u64>()
            .map_err(|_| CacheTypesError::InvalidPageId(s.to_owned()))?;

        Ok(PageId::new(file_id, page_index))
    }
}

/// Maps byte positions of a file onto fixed size pages.
///
/// All functions are total once the layout exists, the page size is validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    page_size: u64,
}

impl PageLayout {
    pub fn new(page_size: u64) -> Result<Self, CacheTypesError> {
        if page_size == 0 {
            return Err(CacheTypesError::InvalidPageSize(page_size));
        }
        Ok(Self { page_size })
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    #[inline]
    pub fn page_index(&self, position: u64) -> u64 {
        position / self.page_size
    }

    #[inline]
    pub fn page_offset(&self, position: u64) -> u64 {
        position % self.page_size
    }

    #[inline]
    pub fn bytes_remaining_in_page(&self, position: u64) -> u64 {
        self.page_size - self.page_offset(position)
    }

    /// Position of the first byte of the page containing `position`.
    #[inline]
    pub fn page_start(&self, position: u64) -> u64 {
        position - self.page_offset(position)
    }

    /// Length of the page containing `position` in a file of `file_length` bytes; only the
    /// last page of a file may be shorter than the page size. Zero if the page lies past the end.
    pub fn page_len(&self, position: u64, file_length: u64) -> u64 {
        self.page_size.min(file_length.saturating_sub(self.page_start(position)))
    }
}
