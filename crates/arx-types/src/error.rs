use thiserror::Error;

/// Errors raised while constructing or validating logical values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Two sequences that must line up have different lengths.
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A factor code is neither missing nor a valid level index.
    #[error("factor code {code} at position {index} is out of range for {levels} levels")]
    InvalidFactorCode {
        index: usize,
        code: i32,
        levels: usize,
    },

    /// Factor levels must be unique.
    #[error("duplicate factor level: {0}")]
    DuplicateLevel(String),

    /// Data frame column names must be unique.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// The value cannot be used as a data frame column.
    #[error("invalid column {name}: {reason}")]
    InvalidColumn { name: String, reason: String },

    /// Resource paths must be relative and stay inside the parent artifact.
    #[error("invalid resource path: {0}")]
    InvalidResourcePath(String),

    /// An element or column type tag was not recognised.
    #[error("unknown type tag: {0}")]
    UnknownType(String),
}
