use std::path::Path;

use arx_meta::{read_metadata, DirectorySchemas, EmbeddedSchemas, LayeredSchemas, MetadataWriter, ObjectMetadata};
use arx_types::{ResourceRef, Value};
use tracing::{debug, info};

use crate::config::ArxConfig;
use crate::error::{ArxError, ArxResult};
use crate::registry::Registry;

/// High-level Arx API.
///
/// A session owns the type registry, the format preferences and the metadata
/// writer. Handlers receive the session so that nested values are saved and
/// read through the same registry and settings.
#[derive(Debug)]
pub struct Arx {
    registry: Registry,
    config: ArxConfig,
    writer: MetadataWriter<LayeredSchemas>,
}

impl Default for Arx {
    fn default() -> Self {
        Self::new()
    }
}

impl Arx {
    /// Built-in handlers, default configuration.
    pub fn new() -> Self {
        Self::with_config(ArxConfig::default())
    }

    /// Built-in handlers with the given configuration.
    pub fn with_config(config: ArxConfig) -> Self {
        Self::from_parts(Registry::with_builtins(), config)
    }

    pub fn from_parts(registry: Registry, config: ArxConfig) -> Self {
        let mut schemas = LayeredSchemas::new().with(EmbeddedSchemas);
        if let Some(dir) = &config.schema_dir {
            schemas = schemas.with(DirectorySchemas::new(dir));
        }
        Self {
            registry,
            config,
            writer: MetadataWriter::with_store(schemas),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn config(&self) -> &ArxConfig {
        &self.config
    }

    /// Mutable format preferences. Schema locations are fixed at construction.
    pub fn config_mut(&mut self) -> &mut ArxConfig {
        &mut self.config
    }

    pub fn writer(&self) -> &MetadataWriter<LayeredSchemas> {
        &self.writer
    }

    // ---- Save ----

    /// Save `value` as a new artifact at `dir`, which must not exist yet.
    ///
    /// Returns the committed metadata.
    pub fn save(&self, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
        if dir.exists() {
            return Err(ArxError::AlreadyExists(dir.to_path_buf()));
        }
        let (tag, handler) = self.registry.saver_for(value)?;
        std::fs::create_dir_all(dir).map_err(|e| ArxError::file(dir, e))?;
        debug!(dir = %dir.display(), object_type = %tag, "saving artifact");

        let meta = handler.save(self, value, dir)?;
        let committed = self.writer.write(meta, dir)?;
        if self.config.validate_on_save {
            self.writer.validate_object(dir, true)?;
        }
        info!(dir = %dir.display(), object_type = %tag, "saved artifact");
        Ok(committed)
    }

    /// Save `value` as a child artifact at `parent/rel` and return the
    /// reference to record in the parent's metadata.
    pub fn save_child(&self, value: &Value, parent: &Path, rel: &str) -> ArxResult<ResourceRef> {
        let resource = ResourceRef::local(rel)?;
        self.save(value, &resource.resolve(parent))?;
        Ok(resource)
    }

    // ---- Read ----

    /// Read the artifact at `dir`. Without `meta`, the `OBJECT` file is read.
    pub fn read(&self, dir: &Path, meta: Option<ObjectMetadata>) -> ArxResult<Value> {
        let meta = match meta {
            Some(m) => m,
            None => read_metadata(dir)?,
        };
        if self.config.verify_checksums {
            self.writer.verify_checksum(&meta, dir)?;
        }
        let handler = self.registry.reader_for(meta.object_type())?;
        debug!(dir = %dir.display(), object_type = meta.object_type(), "reading artifact");
        handler.read(self, &meta, dir)
    }

    /// Read a child artifact referenced from the parent at `parent`.
    pub fn read_child(&self, parent: &Path, resource: &ResourceRef) -> ArxResult<Value> {
        self.read(&resource.resolve(parent), None)
    }

    /// Re-validate the artifact at `dir` and verify its content hash.
    pub fn validate(&self, dir: &Path) -> ArxResult<ObjectMetadata> {
        Ok(self.writer.validate_object(dir, true)?)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::registry::ConflictPolicy;
    use arx_meta::MetaError;
    use arx_types::{AtomicVector, Saveable};

    #[derive(Debug, PartialEq)]
    struct Note(String);

    impl Saveable for Note {
        fn object_type(&self) -> &str {
            "note"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn save_note(_: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
        let note = value.downcast_object::<Note>().ok_or(ArxError::WrongKind {
            expected: "note",
            actual: value.kind(),
        })?;
        std::fs::write(dir.join("note.txt"), &note.0).map_err(|e| ArxError::file(dir, e))?;
        let mut meta = ObjectMetadata::new("note");
        meta.set_path("note.txt");
        Ok(meta)
    }

    fn read_note(_: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
        let path = dir.join(meta.path().unwrap_or("note.txt"));
        let text = std::fs::read_to_string(&path).map_err(|e| ArxError::file(path, e))?;
        Ok(Value::object(Note(text)))
    }

    fn note_session(schema_dir: &Path) -> Arx {
        std::fs::create_dir_all(schema_dir.join("note")).unwrap();
        std::fs::write(
            schema_dir.join("note/v1.json"),
            r#"{"type": "object", "required": ["type", "path"]}"#,
        )
        .unwrap();
        let config = ArxConfig {
            schema_dir: Some(schema_dir.to_path_buf()),
            verify_checksums: true,
            ..ArxConfig::default()
        };
        let mut arx = Arx::with_config(config);
        arx.registry_mut()
            .register_saver("note", save_note, ConflictPolicy::Error)
            .unwrap();
        arx.registry_mut()
            .register_reader("note", read_note, ConflictPolicy::Error)
            .unwrap();
        arx
    }

    #[test]
    fn host_types_plug_into_the_registry() {
        let tmp = tempfile::tempdir().unwrap();
        let arx = note_session(&tmp.path().join("schemas"));
        let dir = tmp.path().join("obj");

        let meta = arx.save(&Value::object(Note("hello".into())), &dir).unwrap();
        assert!(meta.checksum().is_some());
        let back = arx.read(&dir, None).unwrap();
        assert_eq!(back.downcast_object::<Note>(), Some(&Note("hello".into())));
        assert!(arx.validate(&dir).is_ok());
    }

    #[test]
    fn existing_directories_are_never_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let arx = Arx::new();
        let v = Value::Vector(AtomicVector::integers([1, 2]));
        assert!(matches!(arx.save(&v, tmp.path()), Err(ArxError::AlreadyExists(_))));
    }

    #[test]
    fn unregistered_types_fail_on_both_sides() {
        let tmp = tempfile::tempdir().unwrap();
        let arx = Arx::new();
        let dir = tmp.path().join("obj");
        assert!(matches!(
            arx.save(&Value::object(Note("x".into())), &dir),
            Err(ArxError::UnsupportedType(t)) if t == "note"
        ));
        assert!(!dir.exists());

        let meta = ObjectMetadata::new("matrix");
        assert!(matches!(arx.read(&dir, Some(meta)), Err(ArxError::UnknownTypeTag(_))));
    }

    #[test]
    fn checksum_verification_on_read() {
        let tmp = tempfile::tempdir().unwrap();
        let arx = note_session(&tmp.path().join("schemas"));
        let dir = tmp.path().join("obj");
        arx.save(&Value::object(Note("hello".into())), &dir).unwrap();
        std::fs::write(dir.join("note.txt"), "HELLO").unwrap();
        assert!(matches!(
            arx.read(&dir, None),
            Err(ArxError::Meta(MetaError::ChecksumMismatch { .. }))
        ));
    }

    #[test]
    fn validate_on_save_covers_nested_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let arx = Arx::with_config(ArxConfig {
            validate_on_save: true,
            ..ArxConfig::default()
        });
        let dir = tmp.path().join("list");
        let inner = arx_types::DataFrame::from_columns([(
            "x",
            Value::Vector(AtomicVector::booleans([true, false])),
        )])
        .unwrap();
        let value = Value::List(arx_types::List::new(vec![Value::Frame(inner), Value::from(2.5)]));
        arx.save(&value, &dir).unwrap();
        assert!(dir.join("other_contents/0/OBJECT").is_file());
        assert_eq!(arx.read(&dir, None).unwrap(), value);
    }
}
