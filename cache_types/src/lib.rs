mod context;
mod error;
mod page;

pub use context::{CacheContext, CacheCounter, StatsUnit};
pub use error::CacheTypesError;
pub use page::{PageId, PageLayout};
