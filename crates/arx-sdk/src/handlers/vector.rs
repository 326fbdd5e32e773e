//! `atomic_vector` and `string_factor`.
//!
//! Both live in `contents.hds` under a group named after the type.

use std::path::Path;

use arx_codec::vector::{read_names, write_names};
use arx_codec::{read_factor, read_vector, write_factor, write_vector};
use arx_meta::ObjectMetadata;
use arx_store::HdsFile;
use arx_types::{AtomicVector, ElementType, Scalar, Value, VectorData};
use serde_json::Value as Json;

use super::{expect_len, meta_len, ATOMIC_VECTOR, STRING_FACTOR};
use crate::error::{ArxError, ArxResult};
use crate::session::Arx;

pub const CONTENTS: &str = "contents.hds";

fn scalar_vector(s: &Scalar) -> VectorData {
    match s {
        Scalar::Integer(x) => VectorData::Integer(vec![Some(*x)]),
        Scalar::Number(x) => VectorData::Number(vec![Some(*x)]),
        Scalar::String(x) => VectorData::String(vec![Some(x.clone())]),
        Scalar::Boolean(x) => VectorData::Boolean(vec![Some(*x)]),
    }
}

fn has_names(meta: &ObjectMetadata) -> bool {
    meta.get("names").and_then(Json::as_bool).unwrap_or(false)
}

pub fn save_atomic_vector(arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
    let scalar;
    let (data, names) = match value {
        Value::Vector(v) => (v.data(), v.names()),
        Value::Scalar(s) => {
            scalar = scalar_vector(s);
            (&scalar, None)
        }
        other => {
            return Err(ArxError::WrongKind {
                expected: "vector",
                actual: other.kind(),
            })
        }
    };

    let compression = arx.config().compression();
    let mut file = HdsFile::new();
    let group = file.root_mut().create_group(ATOMIC_VECTOR)?;
    let stored = write_vector(group, "values", data, compression)?;
    if let Some(n) = names {
        write_names(group, "names", n, compression)?;
    }
    file.write(&dir.join(CONTENTS))?;

    let mut meta = ObjectMetadata::new(ATOMIC_VECTOR);
    meta.set_path(CONTENTS)
        .insert("length", data.len())
        .insert("type", stored.as_str())
        .insert("names", names.is_some());
    Ok(meta)
}

pub fn read_atomic_vector(_: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
    let declared: ElementType = meta
        .require("type")?
        .as_str()
        .unwrap_or_default()
        .parse()?;
    let length = meta_len(meta, "length")?;

    let file = HdsFile::open(&dir.join(meta.path().unwrap_or(CONTENTS)))?;
    let group = file.root().group(ATOMIC_VECTOR)?;
    let data = read_vector(group, "values", declared)?;
    expect_len("vector length", length, data.len())?;
    let vector = if has_names(meta) {
        AtomicVector::with_names(data, read_names(group, "names")?)?
    } else {
        AtomicVector::new(data)
    };
    Ok(Value::Vector(vector))
}

pub fn save_string_factor(arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
    let factor = value.as_factor().ok_or(ArxError::WrongKind {
        expected: "factor",
        actual: value.kind(),
    })?;

    let compression = arx.config().compression();
    let mut file = HdsFile::new();
    let group = file.root_mut().create_group(STRING_FACTOR)?;
    write_factor(group, factor, compression)?;
    if let Some(n) = factor.names() {
        write_names(group, "names", n, compression)?;
    }
    file.write(&dir.join(CONTENTS))?;

    let mut meta = ObjectMetadata::new(STRING_FACTOR);
    meta.set_path(CONTENTS)
        .insert("length", factor.len())
        .insert("levels", factor.levels().len())
        .insert("ordered", factor.is_ordered())
        .insert("names", factor.names().is_some());
    Ok(meta)
}

pub fn read_string_factor(_: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
    let length = meta_len(meta, "length")?;
    let file = HdsFile::open(&dir.join(meta.path().unwrap_or(CONTENTS)))?;
    let group = file.root().group(STRING_FACTOR)?;
    let mut factor = read_factor(group)?;
    expect_len("factor length", length, factor.len())?;
    expect_len("factor levels", meta_len(meta, "levels")?, factor.levels().len())?;
    if has_names(meta) {
        factor = factor.with_names(read_names(group, "names")?)?;
    }
    Ok(Value::Factor(factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arx_types::{Factor, MISSING_CODE};
    use proptest::prelude::*;

    fn roundtrip(value: &Value) -> (ObjectMetadata, Value) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("obj");
        let arx = Arx::new();
        let meta = arx.save(value, &dir).unwrap();
        let back = arx.read(&dir, None).unwrap();
        (meta, back)
    }

    #[test]
    fn named_strings_with_missing() {
        let v = AtomicVector::with_names(
            vec![Some("NA".to_string()), None, Some("b".to_string())],
            vec!["x".into(), "y".into(), "z".into()],
        )
        .unwrap();
        let (meta, back) = roundtrip(&Value::Vector(v.clone()));
        assert_eq!(meta.get("type"), Some(&Json::from("string")));
        assert_eq!(back, Value::Vector(v));
    }

    #[test]
    fn oversized_integers_are_stored_as_numbers() {
        let v = AtomicVector::new(vec![Some(1i64 << 31), None, Some(-5)]);
        let (meta, back) = roundtrip(&Value::Vector(v));
        assert_eq!(meta.get("type"), Some(&Json::from("number")));
        assert_eq!(
            back,
            Value::Vector(AtomicVector::new(vec![Some((1i64 << 31) as f64), None, Some(-5.0)]))
        );
    }

    #[test]
    fn scalars_become_length_one_vectors() {
        let (_, back) = roundtrip(&Value::from(true));
        assert_eq!(back, Value::Vector(AtomicVector::booleans([true])));
    }

    #[test]
    fn factor_roundtrip_with_missing_code() {
        let f = Factor::new(vec![0, MISSING_CODE, 1], vec!["x".into(), "y".into()], true)
            .unwrap()
            .with_names(vec!["a".into(), "b".into(), "c".into()])
            .unwrap();
        let (meta, back) = roundtrip(&Value::Factor(f.clone()));
        assert_eq!(meta.get("levels"), Some(&Json::from(2)));
        assert_eq!(back, Value::Factor(f));
    }

    #[test]
    fn declared_length_is_checked() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("obj");
        let arx = Arx::new();
        let mut meta = arx
            .save(&Value::Vector(AtomicVector::integers([1, 2, 3])), &dir)
            .unwrap();
        meta.insert("length", 4);
        assert!(matches!(
            arx.read(&dir, Some(meta)),
            Err(ArxError::ShapeMismatch { expected: 4, actual: 3, .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn number_vectors_roundtrip(xs in proptest::collection::vec(proptest::option::of(any::<f64>()), 0..40)) {
            let v = Value::Vector(AtomicVector::new(xs.clone()));
            let (_, back) = roundtrip(&v);
            let back = back.as_vector().unwrap().data().clone();
            prop_assert!(back.same_values(&VectorData::Number(xs)));
        }

        #[test]
        fn integer_vectors_roundtrip(xs in proptest::collection::vec(proptest::option::of(any::<i32>()), 0..40)) {
            let data: Vec<Option<i64>> = xs.iter().map(|x| x.map(i64::from)).collect();
            let v = Value::Vector(AtomicVector::new(data.clone()));
            let (meta, back) = roundtrip(&v);
            prop_assert_eq!(meta.get("type"), Some(&Json::from("integer")));
            prop_assert_eq!(back, Value::Vector(AtomicVector::new(data)));
        }
    }
}
