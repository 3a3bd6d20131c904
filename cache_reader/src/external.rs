use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use error_printer::ErrorPrinter;
use tracing::debug;

use crate::error::{PositionReaderError, Result};

/// A reader over the external storage holding the source of truth for a file.
///
/// Implementors are not assumed to support concurrent positioned reads (they may keep a
/// cursor), hence `&mut self`.
pub trait ExternalReader: Send {
    /// Reads up to `buffer.len()` bytes starting at `position`. Ok(0) means no more bytes are
    /// available.
    fn position_read(&mut self, position: u64, buffer: &mut [u8]) -> io::Result<usize>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

type Supplier<R> = Box<dyn FnOnce() -> io::Result<R> + Send>;

/// Owns an [ExternalReader] that is only constructed on first use, and releases it exactly once.
pub struct CloseableSupplier<R: ExternalReader> {
    supplier: Option<Supplier<R>>,
    reader: Option<R>,
    closed: bool,
}

impl<R: ExternalReader> CloseableSupplier<R> {
    pub fn new<F>(supplier: F) -> Self
    where
        F: FnOnce() -> io::Result<R> + Send + 'static,
    {
        Self {
            supplier: Some(Box::new(supplier)),
            reader: None,
            closed: false,
        }
    }

    /// A supplier around an already constructed reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            supplier: None,
            reader: Some(reader),
            closed: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the reader, constructing it on first call.
    pub fn get(&mut self) -> Result<&mut R> {
        if self.closed {
            return Err(PositionReaderError::ClosedReader);
        }
        if self.reader.is_none() {
            let supplier = self.supplier.take().ok_or(PositionReaderError::ClosedReader)?;
            debug!("constructing external reader");
            self.reader = Some(supplier()?);
        }
        self.reader.as_mut().ok_or(PositionReaderError::ClosedReader)
    }

    /// Releases the reader if it was ever constructed. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.supplier = None;
        if let Some(mut reader) = self.reader.take() {
            reader.close()?;
        }
        Ok(())
    }
}

impl<R: ExternalReader> Drop for CloseableSupplier<R> {
    fn drop(&mut self) {
        let _ = self.close().warn_error("failed to close external reader");
    }
}

/// Adapts any seekable stream, e.g. a `std::fs::File`, into an [ExternalReader] by seeking
/// before every read.
#[derive(Debug)]
pub struct StreamReader<T> {
    inner: T,
}

impl<T: Read + Seek + Send> StreamReader<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Seek + Send> ExternalReader for StreamReader<T> {
    fn position_read(&mut self, position: u64, buffer: &mut [u8]) -> io::Result<usize> {
        self.inner.seek(SeekFrom::Start(position))?;
        loop {
            match self.inner.read(buffer) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                r => return r,
            }
        }
    }
}
