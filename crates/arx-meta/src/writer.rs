//! Committing and re-checking artifact metadata.
//!
//! [`MetadataWriter::write`] is the commit point of every artifact: once the
//! `OBJECT` file exists, the directory is complete.

use std::path::Path;

use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::error::{MetaError, MetaResult};
use crate::hash::hash_file;
use crate::metadata::ObjectMetadata;
use crate::schema::{is_metadata_only, CachedSchemaStore, EmbeddedSchemas, SchemaStore};
use crate::validate::validate;

/// Name of the metadata file inside an artifact directory.
pub const OBJECT_FILE: &str = "OBJECT";

/// Whether `dir` holds a committed artifact.
pub fn is_object_dir(dir: &Path) -> bool {
    dir.join(OBJECT_FILE).is_file()
}

/// Read the committed metadata of the artifact at `dir`.
pub fn read_metadata(dir: &Path) -> MetaResult<ObjectMetadata> {
    let path = dir.join(OBJECT_FILE);
    let bytes = std::fs::read(&path).map_err(|e| MetaError::file(&path, e))?;
    let json: Json = serde_json::from_slice(&bytes)?;
    ObjectMetadata::from_json(json)
}

/// Validates, fingerprints and commits metadata records.
#[derive(Debug)]
pub struct MetadataWriter<S = EmbeddedSchemas> {
    schemas: CachedSchemaStore<S>,
}

impl MetadataWriter<EmbeddedSchemas> {
    pub fn new() -> Self {
        Self::with_store(EmbeddedSchemas)
    }
}

impl Default for MetadataWriter<EmbeddedSchemas> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SchemaStore> MetadataWriter<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            schemas: CachedSchemaStore::new(store),
        }
    }

    pub fn schemas(&self) -> &CachedSchemaStore<S> {
        &self.schemas
    }

    /// Check `meta` against its declared schema.
    pub fn check(&self, meta: &ObjectMetadata) -> MetaResult<()> {
        let id = meta.schema_id();
        let schema = self.schemas.get(&id)?;
        let errors = validate(&schema, &meta.to_json());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(MetaError::Validation { schema: id, errors })
        }
    }

    /// Finalise `meta` for the artifact whose data was written to `dir`.
    ///
    /// Nulls are stripped, the record is validated, the primary data file is
    /// hashed (unless the schema is metadata-only) and the `OBJECT` file is
    /// written. Returns the record as committed.
    pub fn write(&self, mut meta: ObjectMetadata, dir: &Path) -> MetaResult<ObjectMetadata> {
        meta.strip_nulls();
        self.check(&meta)?;

        let schema = self.schemas.get(&meta.schema_id())?;
        if !is_metadata_only(&schema) {
            let rel = meta.path().ok_or_else(|| MetaError::MissingField("path".into()))?;
            let checksum = hash_file(&dir.join(rel))?;
            meta.set_checksum(checksum);
        }

        let path = dir.join(OBJECT_FILE);
        let bytes = serde_json::to_vec_pretty(&meta.to_json())?;
        std::fs::write(&path, bytes).map_err(|e| MetaError::file(&path, e))?;
        debug!(dir = %dir.display(), object_type = meta.object_type(), "committed artifact");
        Ok(meta)
    }

    /// Re-validate a committed artifact and, if asked, re-hash its data file.
    pub fn validate_object(&self, dir: &Path, verify_checksum: bool) -> MetaResult<ObjectMetadata> {
        let meta = read_metadata(dir)?;
        self.check(&meta)?;
        if verify_checksum {
            self.verify_checksum(&meta, dir)?;
        }
        Ok(meta)
    }

    /// Compare the recorded content hash with the data file.
    pub fn verify_checksum(&self, meta: &ObjectMetadata, dir: &Path) -> MetaResult<()> {
        let schema = self.schemas.get(&meta.schema_id())?;
        if is_metadata_only(&schema) {
            return Ok(());
        }
        let rel = meta.path().ok_or_else(|| MetaError::MissingField("path".into()))?;
        let expected = meta
            .checksum()
            .ok_or_else(|| MetaError::MissingField("checksum".into()))?;
        let data = dir.join(rel);
        let computed = hash_file(&data)?;
        if computed != expected {
            warn!(path = %data.display(), "checksum mismatch");
            return Err(MetaError::ChecksumMismatch {
                path: data,
                expected: expected.to_string(),
                computed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DirectorySchemas, LayeredSchemas};
    use serde_json::json;

    fn vector_meta() -> ObjectMetadata {
        let mut m = ObjectMetadata::new("atomic_vector");
        m.set_path("contents.hds")
            .insert("length", 2)
            .insert("type", "integer")
            .insert("names", Json::Null);
        m
    }

    #[test]
    fn write_strips_hashes_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("contents.hds"), b"payload").unwrap();

        let writer = MetadataWriter::new();
        let committed = writer.write(vector_meta(), dir.path()).unwrap();
        assert!(committed.get("names").is_none());
        assert_eq!(committed.checksum(), Some(crate::hash::hash_bytes(b"payload").as_str()));

        assert!(is_object_dir(dir.path()));
        let back = writer.validate_object(dir.path(), true).unwrap();
        assert_eq!(back, committed);
    }

    #[test]
    fn tampered_data_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("contents.hds"), b"payload").unwrap();
        let writer = MetadataWriter::new();
        writer.write(vector_meta(), dir.path()).unwrap();

        std::fs::write(dir.path().join("contents.hds"), b"tampered").unwrap();
        assert!(writer.validate_object(dir.path(), false).is_ok());
        assert!(matches!(
            writer.validate_object(dir.path(), true),
            Err(MetaError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn invalid_record_is_not_committed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("contents.hds"), b"payload").unwrap();
        let mut meta = vector_meta();
        meta.insert("type", "matrix");

        let err = MetadataWriter::new().write(meta, dir.path()).unwrap_err();
        assert!(matches!(err, MetaError::Validation { .. }));
        assert!(!is_object_dir(dir.path()));
    }

    #[test]
    fn metadata_only_schemas_skip_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(schemas.path().join("note")).unwrap();
        std::fs::write(
            schemas.path().join("note/v1.json"),
            json!({
                "type": "object",
                "_attributes": {"metadata_only": true},
                "required": ["type"]
            })
            .to_string(),
        )
        .unwrap();

        let writer = MetadataWriter::with_store(
            LayeredSchemas::new()
                .with(EmbeddedSchemas)
                .with(DirectorySchemas::new(schemas.path())),
        );
        let committed = writer.write(ObjectMetadata::new("note"), dir.path()).unwrap();
        assert!(committed.checksum().is_none());
        assert!(writer.validate_object(dir.path(), true).is_ok());
    }
}
