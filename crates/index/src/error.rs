use bincode::error::{DecodeError, EncodeError};
use document::DocumentError;
use thiserror::Error;

/// Errors raised while admitting, encoding or storing documents.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("sink write error: {0}")]
    Write(String),
    #[error("illegal http status range {0:?}")]
    InvalidStatusRange(String),
    #[error("invalid index configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Write(e.to_string())
    }
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}
