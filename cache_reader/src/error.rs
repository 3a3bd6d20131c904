use cache_types::CacheTypesError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PositionReaderError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Position reader is closed")]
    ClosedReader,

    #[error("Failed to read complete page from external storage, bytes read: {actual}, page size: {expected}")]
    ShortRead { expected: usize, actual: usize },

    #[error(
        "Invalid number of bytes read - bytes to read = {requested}, actual bytes read = {actual}, bytes remaining in file = {remaining}"
    )]
    IncompleteRead { requested: usize, actual: usize, remaining: u64 },

    #[error(transparent)]
    External(#[from] std::io::Error),

    #[error("Cache types error: {0}")]
    CacheTypes(#[from] CacheTypesError),

    #[error("LockPoison")]
    LockPoison,
}

pub type Result<T> = std::result::Result<T, PositionReaderError>;

impl<T> From<std::sync::PoisonError<T>> for PositionReaderError {
    fn from(_value: std::sync::PoisonError<T>) -> Self {
        PositionReaderError::LockPoison
    }
}

impl PartialEq for PositionReaderError {
    fn eq(&self, other: &PositionReaderError) -> bool {
        match (self, other) {
            (PositionReaderError::External(a), PositionReaderError::External(b)) => a.kind() == b.kind(),
            (PositionReaderError::InvalidArgument(a), PositionReaderError::InvalidArgument(b)) => a == b,
            (
                PositionReaderError::ShortRead { expected, actual },
                PositionReaderError::ShortRead {
                    expected: e2,
                    actual: a2,
                },
            ) => expected == e2 && actual == a2,
            (
                PositionReaderError::IncompleteRead {
                    requested,
                    actual,
                    remaining,
                },
                PositionReaderError::IncompleteRead {
                    requested: r2,
                    actual: a2,
                    remaining: rem2,
                },
            ) => requested == r2 && actual == a2 && remaining == rem2,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}
