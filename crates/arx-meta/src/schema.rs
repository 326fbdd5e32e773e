//! Schema lookup.
//!
//! A [`SchemaStore`] resolves identifiers such as `data_frame/v1.json` to
//! parsed schema documents. [`CachedSchemaStore`] wraps any store and parses
//! each identifier at most once.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value as Json;
use tracing::debug;

use crate::error::{MetaError, MetaResult};

/// Source of schema documents.
pub trait SchemaStore: Debug + Send + Sync {
    /// Load and parse the schema named `id`.
    fn load(&self, id: &str) -> MetaResult<Json>;
}

const EMBEDDED: &[(&str, &str)] = &[
    ("atomic_vector/v1.json", include_str!("../schemas/atomic_vector/v1.json")),
    ("string_factor/v1.json", include_str!("../schemas/string_factor/v1.json")),
    ("simple_list/v1.json", include_str!("../schemas/simple_list/v1.json")),
    ("data_frame/v1.json", include_str!("../schemas/data_frame/v1.json")),
];

/// Schemas of the built-in object types, compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedSchemas;

impl EmbeddedSchemas {
    /// Identifiers of every embedded schema.
    pub fn ids() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(id, _)| *id)
    }
}

impl SchemaStore for EmbeddedSchemas {
    fn load(&self, id: &str) -> MetaResult<Json> {
        let (_, text) = EMBEDDED
            .iter()
            .find(|(name, _)| *name == id)
            .ok_or_else(|| MetaError::SchemaNotFound(id.to_string()))?;
        serde_json::from_str(text).map_err(|e| MetaError::InvalidSchema {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Schemas stored as files under a root directory, `<root>/<id>`.
#[derive(Clone, Debug)]
pub struct DirectorySchemas {
    root: PathBuf,
}

impl DirectorySchemas {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaStore for DirectorySchemas {
    fn load(&self, id: &str) -> MetaResult<Json> {
        if id.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(MetaError::SchemaNotFound(id.to_string()));
        }
        let path = self.root.join(id);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetaError::SchemaNotFound(id.to_string()))
            }
            Err(e) => return Err(MetaError::file(path, e)),
        };
        serde_json::from_str(&text).map_err(|e| MetaError::InvalidSchema {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Looks in each store in turn; the first that knows the identifier wins.
#[derive(Debug, Default)]
pub struct LayeredSchemas {
    layers: Vec<Box<dyn SchemaStore>>,
}

impl LayeredSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, store: impl SchemaStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl SchemaStore for LayeredSchemas {
    fn load(&self, id: &str) -> MetaResult<Json> {
        for layer in &self.layers {
            match layer.load(id) {
                Err(MetaError::SchemaNotFound(_)) => continue,
                other => return other,
            }
        }
        Err(MetaError::SchemaNotFound(id.to_string()))
    }
}

/// Memoising wrapper around a schema store.
#[derive(Debug)]
pub struct CachedSchemaStore<S> {
    inner: S,
    cache: RwLock<HashMap<String, Arc<Json>>>,
}

impl<S: SchemaStore> CachedSchemaStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The parsed schema `id`, loading it on first use.
    pub fn get(&self, id: &str) -> MetaResult<Arc<Json>> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| MetaError::LockPoisoned(e.to_string()))?;
            if let Some(schema) = cache.get(id) {
                return Ok(Arc::clone(schema));
            }
        }
        debug!(schema = id, "schema cache miss");
        let schema = Arc::new(self.inner.load(id)?);
        let mut cache = self
            .cache
            .write()
            .map_err(|e| MetaError::LockPoisoned(e.to_string()))?;
        Ok(Arc::clone(cache.entry(id.to_string()).or_insert(schema)))
    }

    /// Number of cached schemas.
    pub fn cached(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

/// Whether the schema flags its objects as carrying no data file to hash.
pub fn is_metadata_only(schema: &Json) -> bool {
    schema
        .pointer("/_attributes/metadata_only")
        .and_then(Json::as_bool)
        .unwrap_or(false)
}
