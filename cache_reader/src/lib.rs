#![cfg_attr(feature = "strict", deny(warnings))]

mod config;
pub mod error;
mod external;
mod fetcher;
pub mod metrics;
mod position_reader;
mod resolver;
mod status;

pub use config::{ReaderConfig, CACHE_QUOTA_ENABLED, PAGE_SIZE_BYTES, PATH_HASH_FILE_ID};
pub use error::{PositionReaderError, Result};
pub use external::{CloseableSupplier, ExternalReader, StreamReader};
pub use fetcher::ExternalPageFetcher;
pub use position_reader::{LocalCachePositionReader, PositionReader, ReadOutcome};
pub use status::FileStatus;
