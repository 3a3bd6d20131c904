use std::sync::Mutex;

use cache_types::PageLayout;
use tracing::debug;

use crate::error::{PositionReaderError, Result};
use crate::external::{CloseableSupplier, ExternalReader};
use crate::metrics::BYTES_READ_EXTERNAL;

/// Reads whole pages from the external source.
///
/// The source is not assumed to be safe for concurrent positioned reads, so every fetch holds
/// the source lock for the whole page.
pub struct ExternalPageFetcher<R: ExternalReader> {
    layout: PageLayout,
    file_length: u64,
    source: Mutex<CloseableSupplier<R>>,
}

impl<R: ExternalReader> ExternalPageFetcher<R> {
    pub fn new(layout: PageLayout, file_length: u64, source: CloseableSupplier<R>) -> Self {
        Self {
            layout,
            file_length,
            source: Mutex::new(source),
        }
    }

    /// Fetches the complete page containing `position`.
    ///
    /// The returned page is `page_len` bytes long; only the last page of the file is shorter
    /// than the page size. Fails with ShortRead if the source runs out before the page is full.
    pub fn fetch_page(&self, position: u64) -> Result<Vec<u8>> {
        let page_start = self.layout.page_start(position);
        let page_len = self.layout.page_len(position, self.file_length) as usize;
        let mut page = vec![0u8; page_len];

        let mut source = self.source.lock()?;
        let reader = source.get()?;
        let mut filled = 0;
        let result = loop {
            if filled == page_len {
                break Ok(());
            }
            match reader.position_read(page_start + filled as u64, &mut page[filled..]) {
                Ok(0) => break Ok(()),
                Ok(n) => filled += n,
                Err(e) => break Err(e),
            }
        };
        drop(source);

        BYTES_READ_EXTERNAL.inc_by(filled as u64);
        result?;

        if filled != page_len {
            debug!("short read of page at {page_start}: {filled} of {page_len} bytes");
            return Err(PositionReaderError::ShortRead {
                expected: page_len,
                actual: filled,
            });
        }
        Ok(page)
    }

    /// Closes the source. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.source.lock()?.close()
    }
}
