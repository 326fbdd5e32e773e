use arx_store::{Dtype, StoreError};
use arx_types::TypeError;
use thiserror::Error;

/// Errors from encoding or decoding logical values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No placeholder is left in the storage type's domain.
    #[error("no missing-value placeholder available for {storage} storage")]
    RangeExhausted { storage: &'static str },

    /// The placeholder attribute's type differs from the dataset's type.
    #[error("placeholder type {actual} does not match dataset type {expected}")]
    PlaceholderType { expected: Dtype, actual: Dtype },

    /// Stored data cannot represent the declared logical type.
    #[error("cannot decode {stored} storage as {declared}")]
    TypeMismatch { declared: String, stored: Dtype },

    /// Decoded dimensions disagree with what the metadata declares.
    #[error("{what} mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A cell or JSON value could not be parsed as its declared type.
    #[error("invalid {expected} value: {value}")]
    InvalidValue { expected: &'static str, value: String },

    /// A list node is structurally invalid.
    #[error("malformed list node: {0}")]
    MalformedList(String),

    /// A list node carries an unrecognised type tag.
    #[error("unknown list node type: {0}")]
    UnknownNodeType(String),

    /// An external reference points past the staged children.
    #[error("external index {index} out of range for {count} children")]
    ExternalOutOfRange { index: usize, count: usize },

    /// A factor cell names a level that is not in the dictionary.
    #[error("unknown factor level: {0}")]
    UnknownLevel(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
