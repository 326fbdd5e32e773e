use std::path::PathBuf;

/// Errors from metadata handling.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The record does not conform to its declared schema.
    #[error("metadata does not match schema {schema}: {}", errors.join("; "))]
    Validation { schema: String, errors: Vec<String> },

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid schema {id}: {reason}")]
    InvalidSchema { id: String, reason: String },

    /// A field the writer relies on is absent or has the wrong JSON type.
    #[error("metadata field {0} is missing or malformed")]
    MissingField(String),

    /// The stored content hash does not match the data file.
    #[error("checksum mismatch for {path}: recorded {expected}, computed {computed}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        computed: String,
    },

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl MetaError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;
