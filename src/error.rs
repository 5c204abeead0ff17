use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReadError>;

/// Everything that can stop a read.
///
/// Store implementations report failures as `anyhow::Error`; the batch loader
/// wraps them in [`ReadError::StoreFailure`] together with the operation that
/// was rejected. Callers that only want an I/O-class failure can convert with
/// `std::io::Error::from`.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("malformed value: {0}")]
    MalformedValue(String),

    #[error("{entity} document is missing required field `{field}`")]
    MissingRequiredField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("unexpected field `{field}` in {document} document")]
    UnexpectedField {
        document: &'static str,
        field: String,
    },

    #[error("store rejected {operation}")]
    StoreFailure {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON line: {0}")]
    Parse(#[from] simd_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid reader configuration: {0}")]
    InvalidConfig(String),
}

impl ReadError {
    pub(crate) fn store(operation: &'static str, source: anyhow::Error) -> Self {
        ReadError::StoreFailure { operation, source }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ReadError::MalformedValue(message.into())
    }
}

impl From<ReadError> for io::Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io(inner) => inner,
            store @ ReadError::StoreFailure { .. } => io::Error::new(io::ErrorKind::Other, store),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
