//! Typed vector codec.
//!
//! Maps logical vectors onto the three physical backends:
//!
//! - hierarchical datasets, where missing entries become a placeholder recorded
//!   in the [`PLACEHOLDER_ATTR`] attribute
//! - JSON arrays, which hold missing entries as `null`
//! - CSV cells, which hold missing entries as a bare `NA`
//!
//! Integer vectors that do not fit 32-bit storage are promoted to `f64` as a
//! whole; the returned element type then reads `number`.

use arx_store::{ArrayData, AttrValue, Compression, CsvField, Dtype, Group};
use arx_types::{ElementType, Scalar, VectorData};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::placeholder::{
    choose_float_placeholder, choose_integer_placeholder, choose_string_placeholder,
    BOOLEAN_PLACEHOLDER,
};

/// Attribute that records the missing-value placeholder of a dataset.
pub const PLACEHOLDER_ATTR: &str = "missing-value-placeholder";

/// A vector lowered to fixed-width storage.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedArray {
    pub data: ArrayData,
    /// Present only when the input had missing entries. Same dtype as `data`.
    pub placeholder: Option<AttrValue>,
    /// Logical type after any promotion.
    pub element_type: ElementType,
}

/// The logical type a vector will be stored as: integers beyond 32 bits
/// become `number`.
pub fn stored_type(values: &VectorData) -> ElementType {
    if values.exceeds_int32() {
        ElementType::Number
    } else {
        values.element_type()
    }
}

fn encode_numbers(values: &[Option<f64>]) -> CodecResult<EncodedArray> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() == values.len() {
        return Ok(EncodedArray {
            data: ArrayData::F64(present),
            placeholder: None,
            element_type: ElementType::Number,
        });
    }
    let placeholder =
        choose_float_placeholder(&present).ok_or(CodecError::RangeExhausted { storage: "f64" })?;
    Ok(EncodedArray {
        data: ArrayData::F64(values.iter().map(|x| x.unwrap_or(placeholder)).collect()),
        placeholder: Some(AttrValue::F64(placeholder)),
        element_type: ElementType::Number,
    })
}

fn promote(values: &[Option<i64>]) -> CodecResult<EncodedArray> {
    let floats: Vec<Option<f64>> = values.iter().map(|x| x.map(|x| x as f64)).collect();
    encode_numbers(&floats)
}

/// Lower a vector to fixed-width storage, choosing a placeholder if needed.
pub fn encode_array(values: &VectorData) -> CodecResult<EncodedArray> {
    let missing = values.has_missing();
    match values {
        VectorData::Integer(v) => {
            if values.exceeds_int32() {
                debug!(len = v.len(), "integer vector exceeds 32 bits, promoting to f64");
                return promote(v);
            }
            if !missing {
                return Ok(EncodedArray {
                    data: ArrayData::I32(v.iter().flatten().map(|&x| x as i32).collect()),
                    placeholder: None,
                    element_type: ElementType::Integer,
                });
            }
            match choose_integer_placeholder(v.iter().flatten().map(|&x| x as i32)) {
                Some(p) => Ok(EncodedArray {
                    data: ArrayData::I32(v.iter().map(|x| x.map_or(p, |x| x as i32)).collect()),
                    placeholder: Some(AttrValue::I32(p)),
                    element_type: ElementType::Integer,
                }),
                None => {
                    debug!(len = v.len(), "i32 placeholder range exhausted, promoting to f64");
                    promote(v)
                }
            }
        }
        VectorData::Number(v) => encode_numbers(v),
        VectorData::String(v) => {
            let placeholder = missing.then(|| choose_string_placeholder(v.iter().flatten().map(String::as_str)));
            let data = v
                .iter()
                .map(|x| match (x, &placeholder) {
                    (Some(s), _) => s.clone(),
                    (None, Some(p)) => p.clone(),
                    (None, None) => String::new(),
                })
                .collect();
            Ok(EncodedArray {
                data: ArrayData::Str(data),
                placeholder: placeholder.map(AttrValue::Str),
                element_type: ElementType::String,
            })
        }
        VectorData::Boolean(v) => Ok(EncodedArray {
            data: ArrayData::I8(
                v.iter()
                    .map(|x| x.map_or(BOOLEAN_PLACEHOLDER, i8::from))
                    .collect(),
            ),
            placeholder: missing.then_some(AttrValue::I8(BOOLEAN_PLACEHOLDER)),
            element_type: ElementType::Boolean,
        }),
    }
}

trait FromAttr: Sized {
    fn from_attr(a: &AttrValue) -> Option<Self>;
}

macro_rules! from_attr {
    ($($t:ty => $variant:ident),*) => {
        $(impl FromAttr for $t {
            fn from_attr(a: &AttrValue) -> Option<Self> {
                match a {
                    AttrValue::$variant(x) => Some(x.clone()),
                    _ => None,
                }
            }
        })*
    };
}

from_attr!(i8 => I8, i32 => I32, u32 => U32, u64 => U64, f64 => F64, String => Str);

fn placeholder_of<T: FromAttr>(placeholder: Option<&AttrValue>, dtype: Dtype) -> CodecResult<Option<T>> {
    match placeholder {
        None => Ok(None),
        Some(a) => T::from_attr(a).map(Some).ok_or(CodecError::PlaceholderType {
            expected: dtype,
            actual: a.dtype(),
        }),
    }
}

fn widen<T: Copy + PartialEq + Into<i64>>(values: &[T], placeholder: Option<T>) -> Vec<Option<i64>> {
    values
        .iter()
        .map(|&x| (Some(x) != placeholder).then(|| x.into()))
        .collect()
}

fn decode_integers(data: &ArrayData, placeholder: Option<&AttrValue>) -> CodecResult<Option<Vec<Option<i64>>>> {
    let dtype = data.dtype();
    let out = match data {
        ArrayData::I8(v) => widen(v, placeholder_of(placeholder, dtype)?),
        ArrayData::I32(v) => widen(v, placeholder_of(placeholder, dtype)?),
        ArrayData::U32(v) => widen(v, placeholder_of(placeholder, dtype)?),
        ArrayData::U64(v) => {
            let p: Option<u64> = placeholder_of(placeholder, dtype)?;
            v.iter()
                .map(|&x| {
                    if Some(x) == p {
                        Ok(None)
                    } else {
                        i64::try_from(x).map(Some).map_err(|_| CodecError::InvalidValue {
                            expected: "integer",
                            value: x.to_string(),
                        })
                    }
                })
                .collect::<CodecResult<Vec<_>>>()?
        }
        ArrayData::F64(_) | ArrayData::Str(_) => return Ok(None),
    };
    Ok(Some(out))
}

fn mismatch(declared: ElementType, data: &ArrayData) -> CodecError {
    CodecError::TypeMismatch {
        declared: declared.to_string(),
        stored: data.dtype(),
    }
}

/// Invert [`encode_array`]: mask placeholder slots and coerce to `declared`.
///
/// A NaN placeholder masks every NaN; any other placeholder masks by equality.
pub fn decode_array(
    data: &ArrayData,
    placeholder: Option<&AttrValue>,
    declared: ElementType,
) -> CodecResult<VectorData> {
    match declared {
        ElementType::Integer => decode_integers(data, placeholder)?
            .map(VectorData::Integer)
            .ok_or_else(|| mismatch(declared, data)),
        ElementType::Number => {
            if let ArrayData::F64(v) = data {
                let p: Option<f64> = placeholder_of(placeholder, Dtype::F64)?;
                let out = match p {
                    Some(p) if p.is_nan() => v.iter().map(|&x| (!x.is_nan()).then_some(x)).collect(),
                    Some(p) => v.iter().map(|&x| (x != p).then_some(x)).collect(),
                    None => v.iter().copied().map(Some).collect(),
                };
                return Ok(VectorData::Number(out));
            }
            decode_integers(data, placeholder)?
                .map(|v| VectorData::Number(v.into_iter().map(|x| x.map(|x| x as f64)).collect()))
                .ok_or_else(|| mismatch(declared, data))
        }
        ElementType::String => match data {
            ArrayData::Str(v) => {
                let p: Option<String> = placeholder_of(placeholder, Dtype::Str)?;
                Ok(VectorData::String(
                    v.iter()
                        .map(|s| (Some(s) != p.as_ref()).then(|| s.clone()))
                        .collect(),
                ))
            }
            _ => Err(mismatch(declared, data)),
        },
        ElementType::Boolean => decode_integers(data, placeholder)?
            .map(|v| VectorData::Boolean(v.into_iter().map(|x| x.map(|x| x != 0)).collect()))
            .ok_or_else(|| mismatch(declared, data)),
    }
}

/// Write a vector as dataset `name` of `group`. Returns the stored logical type.
pub fn write_vector(
    group: &mut Group,
    name: &str,
    values: &VectorData,
    compression: Compression,
) -> CodecResult<ElementType> {
    let encoded = encode_array(values)?;
    let ds = group.create_dataset(name, encoded.data, compression)?;
    if let Some(p) = encoded.placeholder {
        ds.set_attr(PLACEHOLDER_ATTR, p);
    }
    Ok(encoded.element_type)
}

/// Read dataset `name` of `group` as a vector of the declared type.
pub fn read_vector(group: &Group, name: &str, declared: ElementType) -> CodecResult<VectorData> {
    let ds = group.dataset(name)?;
    decode_array(ds.data(), ds.attr(PLACEHOLDER_ATTR), declared)
}

/// Read a string dataset.
pub fn read_strings(group: &Group, name: &str) -> CodecResult<Vec<Option<String>>> {
    let ds = group.dataset(name)?;
    match decode_array(ds.data(), ds.attr(PLACEHOLDER_ATTR), ElementType::String)? {
        VectorData::String(v) => Ok(v),
        _ => Err(mismatch(ElementType::String, ds.data())),
    }
}

/// Read an integer dataset.
pub fn read_integers(group: &Group, name: &str) -> CodecResult<Vec<Option<i64>>> {
    let ds = group.dataset(name)?;
    match decode_array(ds.data(), ds.attr(PLACEHOLDER_ATTR), ElementType::Integer)? {
        VectorData::Integer(v) => Ok(v),
        _ => Err(mismatch(ElementType::Integer, ds.data())),
    }
}

/// Write names (or any string labels without missing entries).
pub fn write_names(group: &mut Group, name: &str, names: &[String], compression: Compression) -> CodecResult<()> {
    group.create_dataset(name, names.to_vec(), compression)?;
    Ok(())
}

/// Read names written by [`write_names`]; missing entries are an error.
pub fn read_names(group: &Group, name: &str) -> CodecResult<Vec<String>> {
    read_strings(group, name)?
        .into_iter()
        .map(|s| s.ok_or_else(|| CodecError::InvalidValue {
            expected: "name",
            value: "missing".into(),
        }))
        .collect()
}

/// Store a single value as scalar dataset `name`. Returns the stored type.
pub fn write_scalar(group: &mut Group, name: &str, scalar: &Scalar) -> CodecResult<ElementType> {
    let (data, element_type) = match scalar {
        Scalar::Integer(x) => match i32::try_from(*x) {
            Ok(x) => (ArrayData::I32(vec![x]), ElementType::Integer),
            Err(_) => (ArrayData::F64(vec![*x as f64]), ElementType::Number),
        },
        Scalar::Number(x) => (ArrayData::F64(vec![*x]), ElementType::Number),
        Scalar::String(s) => (ArrayData::Str(vec![s.clone()]), ElementType::String),
        Scalar::Boolean(b) => (ArrayData::I8(vec![i8::from(*b)]), ElementType::Boolean),
    };
    group.create_scalar(name, data)?;
    Ok(element_type)
}

/// Read a one-element vector. `None` means the single element is missing.
pub fn read_scalar(group: &Group, name: &str, declared: ElementType) -> CodecResult<Option<Scalar>> {
    let values = read_vector(group, name, declared)?;
    if values.len() != 1 {
        return Err(CodecError::ShapeMismatch {
            what: format!("scalar {name}"),
            expected: 1,
            actual: values.len(),
        });
    }
    Ok(match values {
        VectorData::Integer(v) => v[0].map(Scalar::Integer),
        VectorData::Number(v) => v[0].map(Scalar::Number),
        VectorData::String(mut v) => v.pop().flatten().map(Scalar::String),
        VectorData::Boolean(v) => v[0].map(Scalar::Boolean),
    })
}

/// JSON has no NaN or infinities; those travel as strings.
pub fn number_to_json(x: f64) -> Json {
    match serde_json::Number::from_f64(x) {
        Some(n) => Json::Number(n),
        None if x.is_nan() => Json::from("NaN"),
        None if x > 0.0 => Json::from("Inf"),
        None => Json::from("-Inf"),
    }
}

/// Scalar JSON value for `scalar`, with its stored type.
pub fn scalar_to_json(scalar: &Scalar) -> (ElementType, Json) {
    match scalar {
        Scalar::Integer(x) => {
            let t = if arx_types::exceeds_int32(*x) {
                ElementType::Number
            } else {
                ElementType::Integer
            };
            (t, Json::from(*x))
        }
        Scalar::Number(x) => (ElementType::Number, number_to_json(*x)),
        Scalar::String(s) => (ElementType::String, Json::from(s.as_str())),
        Scalar::Boolean(b) => (ElementType::Boolean, Json::from(*b)),
    }
}

/// JSON array for `values`, with the stored type.
pub fn vector_to_json(values: &VectorData) -> (ElementType, Vec<Json>) {
    let out = match values {
        VectorData::Integer(v) => v.iter().map(|x| x.map_or(Json::Null, Json::from)).collect(),
        VectorData::Number(v) => v.iter().map(|x| x.map_or(Json::Null, number_to_json)).collect(),
        VectorData::String(v) => v
            .iter()
            .map(|x| x.as_deref().map_or(Json::Null, Json::from))
            .collect(),
        VectorData::Boolean(v) => v.iter().map(|x| x.map_or(Json::Null, Json::from)).collect(),
    };
    (stored_type(values), out)
}

fn invalid(expected: &'static str, value: &Json) -> CodecError {
    CodecError::InvalidValue {
        expected,
        value: value.to_string(),
    }
}

fn json_element(declared: ElementType, value: &Json) -> CodecResult<Option<Scalar>> {
    if value.is_null() {
        return Ok(None);
    }
    let scalar = match declared {
        ElementType::Integer => Scalar::Integer(value.as_i64().ok_or_else(|| invalid("integer", value))?),
        ElementType::Number => Scalar::Number(match value {
            Json::Number(n) => n.as_f64().ok_or_else(|| invalid("number", value))?,
            Json::String(s) => parse_special_float(s).ok_or_else(|| invalid("number", value))?,
            _ => return Err(invalid("number", value)),
        }),
        ElementType::String => Scalar::String(
            value
                .as_str()
                .ok_or_else(|| invalid("string", value))?
                .to_string(),
        ),
        ElementType::Boolean => Scalar::Boolean(value.as_bool().ok_or_else(|| invalid("boolean", value))?),
    };
    Ok(Some(scalar))
}

fn parse_special_float(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Parse a scalar JSON value. `None` means null.
pub fn scalar_from_json(declared: ElementType, value: &Json) -> CodecResult<Option<Scalar>> {
    json_element(declared, value)
}

/// Parse a JSON array as a vector of the declared type.
pub fn vector_from_json(declared: ElementType, values: &[Json]) -> CodecResult<VectorData> {
    let mut out = empty_vector(declared, values.len());
    for v in values {
        push_scalar(&mut out, json_element(declared, v)?);
    }
    Ok(out)
}

fn empty_vector(t: ElementType, capacity: usize) -> VectorData {
    match t {
        ElementType::Integer => VectorData::Integer(Vec::with_capacity(capacity)),
        ElementType::Number => VectorData::Number(Vec::with_capacity(capacity)),
        ElementType::String => VectorData::String(Vec::with_capacity(capacity)),
        ElementType::Boolean => VectorData::Boolean(Vec::with_capacity(capacity)),
    }
}

fn push_scalar(out: &mut VectorData, x: Option<Scalar>) {
    match (out, x) {
        (VectorData::Integer(v), Some(Scalar::Integer(x))) => v.push(Some(x)),
        (VectorData::Number(v), Some(Scalar::Number(x))) => v.push(Some(x)),
        (VectorData::String(v), Some(Scalar::String(x))) => v.push(Some(x)),
        (VectorData::Boolean(v), Some(Scalar::Boolean(x))) => v.push(Some(x)),
        (VectorData::Integer(v), _) => v.push(None),
        (VectorData::Number(v), _) => v.push(None),
        (VectorData::String(v), _) => v.push(None),
        (VectorData::Boolean(v), _) => v.push(None),
    }
}

/// Text form of a number in CSV and listings.
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x == f64::INFINITY {
        "Inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{x:?}")
    }
}

/// CSV cells for `values`.
pub fn vector_to_csv(values: &VectorData) -> Vec<CsvField> {
    fn cells<T>(v: &[Option<T>], f: impl Fn(&T) -> CsvField) -> Vec<CsvField> {
        v.iter().map(|x| x.as_ref().map_or(CsvField::Missing, &f)).collect()
    }
    match values {
        VectorData::Integer(v) => cells(v, |x| CsvField::Bare(x.to_string())),
        VectorData::Number(v) => cells(v, |x| CsvField::Bare(format_number(*x))),
        VectorData::String(v) => cells(v, |x| CsvField::Text(x.clone())),
        VectorData::Boolean(v) => cells(v, |x| CsvField::Bare(x.to_string())),
    }
}

fn csv_cell(declared: ElementType, cell: &CsvField) -> CodecResult<Option<Scalar>> {
    let text = match cell {
        CsvField::Missing => return Ok(None),
        CsvField::Text(s) if declared == ElementType::String => return Ok(Some(Scalar::String(s.clone()))),
        CsvField::Bare(s) | CsvField::Text(s) => s,
    };
    let bad = |expected| CodecError::InvalidValue {
        expected,
        value: text.clone(),
    };
    let scalar = match declared {
        ElementType::Integer => Scalar::Integer(text.parse().map_err(|_| bad("integer"))?),
        ElementType::Number => Scalar::Number(
            parse_special_float(text)
                .map_or_else(|| text.parse::<f64>().map_err(|_| bad("number")), Ok)?,
        ),
        ElementType::String => Scalar::String(text.clone()),
        ElementType::Boolean => Scalar::Boolean(if text.eq_ignore_ascii_case("true") {
            true
        } else if text.eq_ignore_ascii_case("false") {
            false
        } else {
            return Err(bad("boolean"));
        }),
    };
    Ok(Some(scalar))
}

/// Parse CSV cells as a vector of the declared type.
pub fn vector_from_csv(declared: ElementType, cells: &[CsvField]) -> CodecResult<VectorData> {
    let mut out = empty_vector(declared, cells.len());
    for c in cells {
        push_scalar(&mut out, csv_cell(declared, c)?);
    }
    Ok(out)
}
