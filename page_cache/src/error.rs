use std::array::TryFromSliceError;
use std::str::Utf8Error;

use base64::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageCacheError {
    #[error("General: {0}")]
    General(String),
    #[error("IO: {0}")]
    IO(#[from] std::io::Error),
    #[error("ParseError: {0}")]
    Parse(String),
    #[error("bad range")]
    BadRange,
    #[error("Infallible")]
    Infallible,
    #[error("LockPoison")]
    LockPoison,
    #[error("invalid arguments")]
    InvalidArguments,
}

impl PageCacheError {
    pub fn parse<T: ToString>(value: T) -> PageCacheError {
        PageCacheError::Parse(value.to_string())
    }

    pub fn general<T: ToString>(value: T) -> PageCacheError {
        PageCacheError::General(value.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PageCacheError {
    fn from(_value: std::sync::PoisonError<T>) -> Self {
        PageCacheError::LockPoison
    }
}

impl From<tempfile::PersistError> for PageCacheError {
    fn from(value: tempfile::PersistError) -> Self {
        PageCacheError::IO(value.error)
    }
}

macro_rules! impl_parse_error_from_error {
    ($error_type:ty) => {
        impl From<$error_type> for PageCacheError {
            fn from(value: $error_type) -> Self {
                PageCacheError::parse(value)
            }
        }
    };
}

impl_parse_error_from_error!(TryFromSliceError);
impl_parse_error_from_error!(DecodeError);
impl_parse_error_from_error!(Utf8Error);
