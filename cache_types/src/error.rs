use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheTypesError {
    #[error("Invalid page id: {0}")]
    InvalidPageId(String),

    #[error("Invalid page size: {0}, page size must be positive")]
    InvalidPageSize(u64),
}
