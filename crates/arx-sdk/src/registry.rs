//! Type registry.
//!
//! Saving dispatches on the runtime shape of a [`Value`] (see [`type_tag`]);
//! reading dispatches on the `type` field of the artifact's metadata. Both
//! sides are plain maps owned by a [`Registry`] value, so tests and embedders
//! can build isolated registries.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arx_meta::ObjectMetadata;
use arx_types::Value;
use tracing::debug;

use crate::error::{ArxError, ArxResult};
use crate::handlers;
use crate::session::Arx;

/// Writes the physical files of one object type into a fresh directory and
/// returns the (uncommitted) metadata describing them.
pub trait SaveHandler: Send + Sync {
    fn save(&self, arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata>;
}

/// Reconstructs a value from an artifact directory and its metadata.
pub trait ReadHandler: Send + Sync {
    fn read(&self, arx: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value>;
}

impl<F> SaveHandler for F
where
    F: Fn(&Arx, &Value, &Path) -> ArxResult<ObjectMetadata> + Send + Sync,
{
    fn save(&self, arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
        self(arx, value, dir)
    }
}

impl<F> ReadHandler for F
where
    F: Fn(&Arx, &ObjectMetadata, &Path) -> ArxResult<Value> + Send + Sync,
{
    fn read(&self, arx: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
        self(arx, meta, dir)
    }
}

/// What to do when a tag is already bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Leave the existing handler in place.
    #[default]
    KeepOld,
    /// Replace the existing handler.
    UseNew,
    /// Fail with [`ArxError::RegistryConflict`].
    Error,
}

/// Save tag of a value: the built-in tag for primitive shapes, or the
/// object's own tag for host objects.
pub fn type_tag(value: &Value) -> ArxResult<&str> {
    Ok(match value {
        Value::Scalar(_) | Value::Vector(_) => handlers::ATOMIC_VECTOR,
        Value::Factor(_) => handlers::STRING_FACTOR,
        Value::List(_) => handlers::SIMPLE_LIST,
        Value::Frame(_) => handlers::DATA_FRAME,
        Value::Object(o) => o.object_type(),
        Value::Nothing => return Err(ArxError::UnsupportedType(value.kind().to_string())),
    })
}

fn bind<H: ?Sized>(
    map: &mut HashMap<String, Arc<H>>,
    tag: &str,
    handler: Arc<H>,
    policy: ConflictPolicy,
    direction: &'static str,
) -> ArxResult<bool> {
    if map.contains_key(tag) {
        match policy {
            ConflictPolicy::KeepOld => {
                debug!(tag, direction, "keeping existing handler");
                return Ok(false);
            }
            ConflictPolicy::Error => {
                return Err(ArxError::RegistryConflict {
                    tag: tag.to_string(),
                    direction,
                })
            }
            ConflictPolicy::UseNew => debug!(tag, direction, "replacing handler"),
        }
    }
    map.insert(tag.to_string(), handler);
    Ok(true)
}

/// Tag to handler tables for both directions.
#[derive(Clone, Default)]
pub struct Registry {
    savers: HashMap<String, Arc<dyn SaveHandler>>,
    readers: HashMap<String, Arc<dyn ReadHandler>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut savers: Vec<&str> = self.savers.keys().map(String::as_str).collect();
        let mut readers: Vec<&str> = self.readers.keys().map(String::as_str).collect();
        savers.sort_unstable();
        readers.sort_unstable();
        f.debug_struct("Registry")
            .field("savers", &savers)
            .field("readers", &readers)
            .finish()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in object types bound.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        handlers::register_builtins(&mut registry);
        registry
    }

    /// Bind a save handler. Returns whether `handler` is now the bound one.
    pub fn register_saver(
        &mut self,
        tag: &str,
        handler: impl SaveHandler + 'static,
        policy: ConflictPolicy,
    ) -> ArxResult<bool> {
        let handler: Arc<dyn SaveHandler> = Arc::new(handler);
        bind(&mut self.savers, tag, handler, policy, "save")
    }

    /// Bind a read handler. Returns whether `handler` is now the bound one.
    pub fn register_reader(
        &mut self,
        tag: &str,
        handler: impl ReadHandler + 'static,
        policy: ConflictPolicy,
    ) -> ArxResult<bool> {
        let handler: Arc<dyn ReadHandler> = Arc::new(handler);
        bind(&mut self.readers, tag, handler, policy, "read")
    }

    /// Bind a save handler unless `tag` already has one. Returns whether
    /// `handler` was bound.
    pub fn provide_saver(&mut self, tag: &str, handler: impl SaveHandler + 'static) -> bool {
        if self.savers.contains_key(tag) {
            debug!(tag, direction = "save", "keeping existing handler");
            return false;
        }
        self.savers.insert(tag.to_string(), Arc::new(handler));
        true
    }

    /// Bind a read handler unless `tag` already has one. Returns whether
    /// `handler` was bound.
    pub fn provide_reader(&mut self, tag: &str, handler: impl ReadHandler + 'static) -> bool {
        if self.readers.contains_key(tag) {
            debug!(tag, direction = "read", "keeping existing handler");
            return false;
        }
        self.readers.insert(tag.to_string(), Arc::new(handler));
        true
    }

    pub fn saver(&self, tag: &str) -> Option<Arc<dyn SaveHandler>> {
        self.savers.get(tag).cloned()
    }

    pub fn reader(&self, tag: &str) -> Option<Arc<dyn ReadHandler>> {
        self.readers.get(tag).cloned()
    }

    /// Save handler for `value`, or [`ArxError::UnsupportedType`].
    pub fn saver_for(&self, value: &Value) -> ArxResult<(String, Arc<dyn SaveHandler>)> {
        let tag = type_tag(value)?;
        let handler = self
            .saver(tag)
            .ok_or_else(|| ArxError::UnsupportedType(tag.to_string()))?;
        Ok((tag.to_string(), handler))
    }

    /// Read handler for `tag`, or [`ArxError::UnknownTypeTag`].
    pub fn reader_for(&self, tag: &str) -> ArxResult<Arc<dyn ReadHandler>> {
        self.reader(tag)
            .ok_or_else(|| ArxError::UnknownTypeTag(tag.to_string()))
    }

    /// Tags with a read handler, sorted.
    pub fn readable_types(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.readers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arx_types::{AtomicVector, DataFrame, List};

    fn marker(tag: &'static str) -> impl ReadHandler {
        move |_: &Arx, _: &ObjectMetadata, _: &Path| -> ArxResult<Value> { Ok(Value::from(tag)) }
    }

    fn read_with(registry: &Registry, tag: &str) -> Value {
        let arx = Arx::new();
        let meta = ObjectMetadata::new(tag);
        registry
            .reader_for(tag)
            .unwrap()
            .read(&arx, &meta, Path::new("."))
            .unwrap()
    }

    #[test]
    fn conflict_policy_keep_old_is_a_no_op() {
        let mut r = Registry::new();
        assert!(r.register_reader("thing", marker("first"), ConflictPolicy::default()).unwrap());
        assert!(!r.register_reader("thing", marker("second"), ConflictPolicy::KeepOld).unwrap());
        assert_eq!(read_with(&r, "thing"), Value::from("first"));
    }

    #[test]
    fn conflict_policy_use_new_replaces() {
        let mut r = Registry::new();
        r.register_reader("thing", marker("first"), ConflictPolicy::KeepOld).unwrap();
        assert!(r.register_reader("thing", marker("second"), ConflictPolicy::UseNew).unwrap());
        assert_eq!(read_with(&r, "thing"), Value::from("second"));
    }

    #[test]
    fn conflict_policy_error_raises() {
        let mut r = Registry::new();
        r.register_reader("thing", marker("first"), ConflictPolicy::KeepOld).unwrap();
        let err = r
            .register_reader("thing", marker("second"), ConflictPolicy::Error)
            .unwrap_err();
        assert!(matches!(err, ArxError::RegistryConflict { direction: "read", .. }));
        assert_eq!(read_with(&r, "thing"), Value::from("first"));
    }

    #[test]
    fn builtins_leave_existing_bindings_alone() {
        let mut r = Registry::new();
        r.register_reader("simple_list", marker("host"), ConflictPolicy::KeepOld).unwrap();
        handlers::register_builtins(&mut r);
        assert_eq!(read_with(&r, "simple_list"), Value::from("host"));
        assert_eq!(r.readable_types().len(), 4);

        assert!(!r.provide_reader("atomic_vector", marker("late")));
        assert!(r.provide_reader("matrix", marker("late")));
        assert_eq!(read_with(&r, "matrix"), Value::from("late"));
    }

    #[test]
    fn unknown_tags_fail() {
        let r = Registry::with_builtins();
        assert!(matches!(r.reader_for("matrix"), Err(ArxError::UnknownTypeTag(_))));
        assert_eq!(
            r.readable_types(),
            vec!["atomic_vector", "data_frame", "simple_list", "string_factor"]
        );
    }

    #[test]
    fn tags_follow_runtime_shape() {
        assert_eq!(type_tag(&Value::from(1i64)).unwrap(), "atomic_vector");
        assert_eq!(type_tag(&Value::Vector(AtomicVector::integers([1]))).unwrap(), "atomic_vector");
        assert_eq!(type_tag(&Value::List(List::default())).unwrap(), "simple_list");
        assert_eq!(type_tag(&Value::Frame(DataFrame::new(0))).unwrap(), "data_frame");
        assert!(matches!(type_tag(&Value::Nothing), Err(ArxError::UnsupportedType(_))));
    }
}
