use thiserror::Error;

/// Errors raised while decoding documents and keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("invalid document json: {0}")]
    InvalidJson(String),
    #[error("document json must be an object")]
    NotAnObject,
    #[error("invalid identity key {0:?}: expected \"<url> <digest>\"")]
    InvalidKey(String),
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::InvalidJson(err.to_string())
    }
}
