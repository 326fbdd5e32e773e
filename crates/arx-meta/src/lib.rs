//! Artifact metadata for Arx.
//!
//! Every artifact directory is committed by writing its `OBJECT` file through
//! a [`MetadataWriter`]. The writer strips null fields, validates the record
//! against the schema it declares, fingerprints the primary data file with
//! BLAKE3 and only then writes the file.
//!
//! # Key Types
//!
//! - [`ObjectMetadata`]: the record: shared top-level fields plus a section
//!   named after the object type
//! - [`SchemaStore`]: schema source; [`EmbeddedSchemas`] ships the built-in
//!   types, [`DirectorySchemas`] reads extra ones from disk
//! - [`CachedSchemaStore`]: parses each schema at most once

pub mod error;
pub mod hash;
pub mod metadata;
pub mod schema;
pub mod validate;
pub mod writer;

pub use error::{MetaError, MetaResult};
pub use hash::{hash_bytes, hash_file};
pub use metadata::{strip_nulls, ObjectMetadata, CHECKSUM_FIELD, FORMAT_VERSION};
pub use schema::{
    is_metadata_only, CachedSchemaStore, DirectorySchemas, EmbeddedSchemas, LayeredSchemas,
    SchemaStore,
};
pub use validate::validate;
pub use writer::{is_object_dir, read_metadata, MetadataWriter, OBJECT_FILE};
