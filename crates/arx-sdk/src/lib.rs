//! High-level SDK for Arx artifacts.
//!
//! An [`Arx`] session saves values as self-describing artifact directories and
//! reads them back. Dispatch goes through a [`Registry`] of save handlers,
//! keyed by the runtime type of the value, and read handlers, keyed by the
//! type tag recorded in the artifact's `OBJECT` file. Host applications add
//! their own types by implementing [`Saveable`] and registering handlers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod registry;
pub mod session;

pub use config::{ArxConfig, FrameFormat, ListFormat};
pub use error::{ArxError, ArxResult};
pub use listing::{list_objects, validate_directory, ObjectEntry};
pub use registry::{type_tag, ConflictPolicy, ReadHandler, Registry, SaveHandler};
pub use session::Arx;

// Re-export key types
pub use arx_meta::{ObjectMetadata, OBJECT_FILE};
pub use arx_types::{
    AtomicVector, ColumnDescriptor, ColumnType, DataFrame, ElementType, Factor, List,
    ResourceRef, Saveable, Scalar, Value, ValueKind, VectorData,
};
