//! The metadata record of one artifact.
//!
//! A record is a JSON object of the shape
//!
//! ```json
//! {
//!   "$schema": "data_frame/v1.json",
//!   "type": "data_frame",
//!   "path": "basic_columns.hds",
//!   "data_frame": { "version": "1.0", ... }
//! }
//! ```
//!
//! Top-level fields are shared by every object type; the section named after
//! the type holds the type-specific fields.

use serde_json::{Map, Value as Json};

use crate::error::{MetaError, MetaResult};

/// Version written into the type section of new records.
pub const FORMAT_VERSION: &str = "1.0";

/// Name of the field holding the content hash.
pub const CHECKSUM_FIELD: &str = "checksum";

/// An artifact's metadata record.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMetadata {
    fields: Map<String, Json>,
}

impl ObjectMetadata {
    /// A fresh record for `object_type`, validated against `<type>/v1.json`.
    pub fn new(object_type: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("$schema".into(), Json::from(format!("{object_type}/v1.json")));
        fields.insert("type".into(), Json::from(object_type));
        let mut section = Map::new();
        section.insert("version".into(), Json::from(FORMAT_VERSION));
        fields.insert(object_type.to_string(), Json::Object(section));
        Self { fields }
    }

    /// Wrap an existing JSON record, checking that it carries a type.
    pub fn from_json(value: Json) -> MetaResult<Self> {
        match value {
            Json::Object(fields) if fields.get("type").is_some_and(Json::is_string) => Ok(Self { fields }),
            _ => Err(MetaError::MissingField("type".into())),
        }
    }

    pub fn object_type(&self) -> &str {
        self.fields.get("type").and_then(Json::as_str).unwrap_or_default()
    }

    /// Schema identifier; defaults to `<type>/v1.json`.
    pub fn schema_id(&self) -> String {
        self.fields
            .get("$schema")
            .and_then(Json::as_str)
            .map_or_else(|| format!("{}/v1.json", self.object_type()), str::to_string)
    }

    /// Primary data file, relative to the artifact directory.
    pub fn path(&self) -> Option<&str> {
        self.fields.get("path").and_then(Json::as_str)
    }

    pub fn set_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.fields.insert("path".into(), Json::from(path.into()));
        self
    }

    pub fn checksum(&self) -> Option<&str> {
        self.fields.get(CHECKSUM_FIELD).and_then(Json::as_str)
    }

    pub(crate) fn set_checksum(&mut self, checksum: String) {
        self.fields.insert(CHECKSUM_FIELD.into(), Json::from(checksum));
    }

    /// Type-specific section.
    pub fn section(&self) -> Option<&Map<String, Json>> {
        self.fields.get(self.object_type()).and_then(Json::as_object)
    }

    /// Set a field of the type section.
    pub fn insert(&mut self, key: &str, value: impl Into<Json>) -> &mut Self {
        let section = self.object_type().to_string();
        match self.fields.get_mut(&section) {
            Some(Json::Object(map)) => {
                map.insert(key.to_string(), value.into());
            }
            _ => {
                let mut map = Map::new();
                map.insert(key.to_string(), value.into());
                self.fields.insert(section, Json::Object(map));
            }
        }
        self
    }

    /// Field of the type section.
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.section().and_then(|s| s.get(key))
    }

    /// Required field of the type section.
    pub fn require(&self, key: &str) -> MetaResult<&Json> {
        self.get(key).ok_or_else(|| MetaError::MissingField(format!("{}.{key}", self.object_type())))
    }

    /// Required unsigned integer field of the type section.
    pub fn require_u64(&self, key: &str) -> MetaResult<u64> {
        self.require(key)?
            .as_u64()
            .ok_or_else(|| MetaError::MissingField(format!("{}.{key}", self.object_type())))
    }

    /// Set a top-level field.
    pub fn set_top_level(&mut self, key: &str, value: impl Into<Json>) -> &mut Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn top_level(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }

    /// Remove null-valued fields at every depth.
    pub fn strip_nulls(&mut self) {
        strip_map(&mut self.fields);
    }

    pub fn to_json(&self) -> Json {
        Json::Object(self.fields.clone())
    }

    pub fn into_json(self) -> Json {
        Json::Object(self.fields)
    }
}

fn strip_map(map: &mut Map<String, Json>) {
    map.retain(|_, v| !v.is_null());
    for v in map.values_mut() {
        strip_nulls(v);
    }
}

/// Recursively drop `null` object members. Array elements are kept so that
/// positions stay stable; objects inside arrays are still stripped.
pub fn strip_nulls(value: &mut Json) {
    match value {
        Json::Object(map) => strip_map(map),
        Json::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_record_shape() {
        let mut m = ObjectMetadata::new("atomic_vector");
        m.set_path("contents.hds").insert("length", 3);
        assert_eq!(
            m.to_json(),
            json!({
                "$schema": "atomic_vector/v1.json",
                "type": "atomic_vector",
                "path": "contents.hds",
                "atomic_vector": {"version": "1.0", "length": 3}
            })
        );
        assert_eq!(m.require_u64("length").unwrap(), 3);
        assert!(matches!(m.require("type"), Err(MetaError::MissingField(_))));
    }

    #[test]
    fn strip_nulls_recurses() {
        let mut v = json!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [null, {"f": null, "g": 2}]
        });
        strip_nulls(&mut v);
        assert_eq!(v, json!({"b": {"d": 1}, "e": [null, {"g": 2}]}));
    }

    #[test]
    fn from_json_requires_type() {
        assert!(ObjectMetadata::from_json(json!({"path": "x"})).is_err());
        let m = ObjectMetadata::from_json(json!({"type": "simple_list"})).unwrap();
        assert_eq!(m.schema_id(), "simple_list/v1.json");
        assert!(m.section().is_none());
    }
}
