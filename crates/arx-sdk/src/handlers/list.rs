//! `simple_list`.
//!
//! The tree goes to `list_contents.json.zst` or `list_contents.hds`. Values
//! without an inline encoding are saved first, as `other_contents/<i>` in the
//! order the encoder met them, and the tree refers to them by index.

use std::path::Path;

use arx_codec::list::{self, ListNode};
use arx_codec::CodecError;
use arx_meta::ObjectMetadata;
use arx_store::{read_json, write_json, HdsFile};
use arx_types::{ResourceRef, Value};
use serde_json::Value as Json;
use tracing::debug;

use super::{meta_len, SIMPLE_LIST};
use crate::config::ListFormat;
use crate::error::{ArxError, ArxResult};
use crate::session::Arx;

pub const JSON_CONTENTS: &str = "list_contents.json.zst";
pub const HDS_CONTENTS: &str = "list_contents.hds";
pub const EXTERNALS_DIR: &str = "other_contents";

fn external_path(i: usize) -> String {
    format!("{EXTERNALS_DIR}/{i}")
}

pub fn save_simple_list(arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
    if !matches!(value, Value::List(_)) {
        return Err(ArxError::WrongKind {
            expected: "list",
            actual: value.kind(),
        });
    }
    let encoded = list::encode(value);
    for (i, external) in encoded.externals.iter().enumerate() {
        debug!(index = i, kind = %external.kind(), "staging list external");
        arx.save_child(external, dir, &external_path(i))?;
    }

    let compression = arx.config().compression();
    let format = arx.config().list_format;
    let path = match format {
        ListFormat::Json => {
            write_json(&dir.join(JSON_CONTENTS), &list::to_json_document(&encoded.root), compression)?;
            JSON_CONTENTS
        }
        ListFormat::Hds => {
            list::to_hds(&encoded.root, compression)?.write(&dir.join(HDS_CONTENTS))?;
            HDS_CONTENTS
        }
    };

    let mut meta = ObjectMetadata::new(SIMPLE_LIST);
    meta.set_path(path)
        .insert("format", format.as_str())
        .insert("externals", encoded.externals.len());
    Ok(meta)
}

pub fn read_simple_list(arx: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
    let count = meta_len(meta, "externals")?;
    let root: ListNode = match meta.require("format")?.as_str() {
        Some("hds") => list::from_hds(&HdsFile::open(&dir.join(meta.path().unwrap_or(HDS_CONTENTS)))?)?,
        Some("json") => list::from_json(&read_json(&dir.join(meta.path().unwrap_or(JSON_CONTENTS)))?)?,
        other => {
            return Err(ArxError::Config(format!(
                "unknown list format {}",
                other.map_or(Json::Null, Json::from)
            )))
        }
    };

    root.into_value(&mut |index: usize| -> ArxResult<Value> {
        if index >= count {
            return Err(CodecError::ExternalOutOfRange { index, count }.into());
        }
        arx.read_child(dir, &ResourceRef::local(external_path(index))?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArxConfig;
    use arx_types::{AtomicVector, DataFrame, Factor, List};

    fn nested() -> Value {
        let frame = DataFrame::from_columns([("a", Value::Vector(AtomicVector::integers([1, 2])))]).unwrap();
        let inner = List::named([
            ("frame", Value::Frame(frame.clone())),
            ("flag", Value::from(false)),
            ("none", Value::Nothing),
        ]);
        Value::List(List::named([
            ("first", Value::Frame(frame.clone())),
            ("inner", Value::List(inner)),
            (
                "fac",
                Value::Factor(Factor::from_values(&[Some("u"), None], false)),
            ),
            ("words", Value::Vector(AtomicVector::strings(["p", "q"]))),
            ("last", Value::Frame(frame)),
        ]))
    }

    fn roundtrip(format: ListFormat) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("list");
        let arx = Arx::with_config(ArxConfig {
            list_format: format,
            ..ArxConfig::default()
        });
        let meta = arx.save(&nested(), &dir).unwrap();
        assert_eq!(meta.get("externals"), Some(&Json::from(3)));
        for i in 0..3 {
            assert!(dir.join(external_path(i)).join("OBJECT").is_file());
        }
        assert!(!dir.join(external_path(3)).exists());
        assert_eq!(arx.read(&dir, None).unwrap(), nested());
    }

    #[test]
    fn json_list_with_externals() {
        roundtrip(ListFormat::Json);
    }

    #[test]
    fn hds_list_with_externals() {
        roundtrip(ListFormat::Hds);
    }

    #[test]
    fn externals_resolve_by_index() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("list");
        let arx = Arx::new();
        let a = DataFrame::from_columns([("x", Value::Vector(AtomicVector::integers([1])))]).unwrap();
        let b = DataFrame::from_columns([("y", Value::Vector(AtomicVector::strings(["b", "c"])))]).unwrap();
        let value = Value::List(List::new(vec![
            Value::Frame(a.clone()),
            Value::Frame(b.clone()),
            Value::Frame(a.clone()),
        ]));
        arx.save(&value, &dir).unwrap();

        let staged: Vec<Value> = (0..3)
            .map(|i| arx.read(&dir.join(external_path(i)), None).unwrap())
            .collect();
        assert_eq!(staged, vec![Value::Frame(a.clone()), Value::Frame(b), Value::Frame(a)]);
        assert_eq!(arx.read(&dir, None).unwrap(), value);
    }

    #[test]
    fn dangling_external_index_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("list");
        let arx = Arx::new();
        let value = Value::List(List::new(vec![Value::Frame(DataFrame::new(0))]));
        let mut meta = arx.save(&value, &dir).unwrap();
        meta.insert("externals", 0);
        assert!(matches!(
            arx.read(&dir, Some(meta)),
            Err(ArxError::Codec(CodecError::ExternalOutOfRange { index: 0, count: 0 }))
        ));
    }
}
