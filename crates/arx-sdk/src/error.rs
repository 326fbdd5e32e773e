use std::path::PathBuf;

use arx_types::ValueKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArxError {
    /// No save handler is registered for the value's runtime type.
    #[error("no save handler for {0}")]
    UnsupportedType(String),

    /// The artifact declares a type tag that no read handler knows.
    #[error("unknown object type: {0}")]
    UnknownTypeTag(String),

    /// A handler is already bound and the caller asked for an error.
    #[error("{direction} handler already registered for {tag}")]
    RegistryConflict { tag: String, direction: &'static str },

    /// Decoded dimensions disagree with the metadata.
    #[error("{what} mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A handler received, or a child decoded to, the wrong kind of value.
    #[error("expected {expected}, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: ValueKind,
    },

    /// Artifacts are never overwritten.
    #[error("artifact directory already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("codec error: {0}")]
    Codec(#[from] arx_codec::CodecError),

    #[error("storage error: {0}")]
    Store(#[from] arx_store::StoreError),

    #[error("metadata error: {0}")]
    Meta(#[from] arx_meta::MetaError),

    #[error("type error: {0}")]
    Type(#[from] arx_types::TypeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ArxError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

pub type ArxResult<T> = Result<T, ArxError>;
