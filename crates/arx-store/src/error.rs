use std::path::PathBuf;

/// Errors from the physical storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid file magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported file version: {0}")]
    UnsupportedVersion(u32),

    /// The container trailer does not match its body.
    #[error("CRC32 mismatch: expected {expected:08x}, computed {computed:08x}")]
    CrcMismatch { expected: u32, computed: u32 },

    #[error("corrupt file: {0}")]
    Corrupt(String),

    /// A group member was requested that does not exist.
    #[error("no such member: {0}")]
    NotFound(String),

    #[error("member already exists: {0}")]
    AlreadyExists(String),

    /// A member exists but is a group where a dataset was expected, or vice versa.
    #[error("{path} is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    /// A required attribute is missing.
    #[error("missing attribute {name} on {path}")]
    MissingAttribute { path: String, name: String },

    /// A CSV file could not be parsed.
    #[error("malformed CSV at line {line}: {reason}")]
    MalformedCsv { line: usize, reason: String },

    /// Declared and actual dimensions disagree.
    #[error("{what} mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn file(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
