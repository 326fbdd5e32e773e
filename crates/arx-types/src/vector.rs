use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Returns `true` if `x` cannot be stored in a signed 32-bit integer.
pub fn exceeds_int32(x: i64) -> bool {
    x < i64::from(i32::MIN) || x > i64::from(i32::MAX)
}

/// Semantic element type of a typed vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Integer,
    Number,
    String,
    Boolean,
}

impl ElementType {
    /// The lowercase tag used in metadata and physical files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            other => Err(TypeError::UnknownType(other.to_string())),
        }
    }
}

/// The values of a typed vector. `None` marks a missing entry.
///
/// Integers are held as `i64` so that values beyond the 32-bit range can be
/// represented in memory; the codec decides whether they fit the storage width.
#[derive(Clone, Debug, PartialEq)]
pub enum VectorData {
    Integer(Vec<Option<i64>>),
    Number(Vec<Option<f64>>),
    String(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
}

impl VectorData {
    /// Number of elements, missing entries included.
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Number(v) => v.len(),
            Self::String(v) => v.len(),
            Self::Boolean(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Integer(_) => ElementType::Integer,
            Self::Number(_) => ElementType::Number,
            Self::String(_) => ElementType::String,
            Self::Boolean(_) => ElementType::Boolean,
        }
    }

    /// Whether element `i` is missing. Out-of-range indices are not missing.
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            Self::Integer(v) => matches!(v.get(i), Some(None)),
            Self::Number(v) => matches!(v.get(i), Some(None)),
            Self::String(v) => matches!(v.get(i), Some(None)),
            Self::Boolean(v) => matches!(v.get(i), Some(None)),
        }
    }

    /// Whether any element is missing.
    pub fn has_missing(&self) -> bool {
        self.missing_count() > 0
    }

    pub fn missing_count(&self) -> usize {
        match self {
            Self::Integer(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Number(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::String(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Boolean(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Whether an integer vector holds a present value outside the 32-bit range.
    ///
    /// Always `false` for non-integer vectors.
    pub fn exceeds_int32(&self) -> bool {
        match self {
            Self::Integer(v) => v.iter().flatten().any(|&x| exceeds_int32(x)),
            _ => false,
        }
    }

    /// Element-wise equality that treats NaN as equal to NaN.
    ///
    /// Derived `PartialEq` follows IEEE semantics, which makes any vector
    /// containing a NaN unequal to itself.
    pub fn same_values(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| match (x, y) {
                        (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
                        (None, None) => true,
                        _ => false,
                    })
            }
            _ => self == other,
        }
    }
}

impl From<Vec<Option<i64>>> for VectorData {
    fn from(v: Vec<Option<i64>>) -> Self {
        Self::Integer(v)
    }
}

impl From<Vec<Option<f64>>> for VectorData {
    fn from(v: Vec<Option<f64>>) -> Self {
        Self::Number(v)
    }
}

impl From<Vec<Option<String>>> for VectorData {
    fn from(v: Vec<Option<String>>) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Option<bool>>> for VectorData {
    fn from(v: Vec<Option<bool>>) -> Self {
        Self::Boolean(v)
    }
}

/// A typed vector with optional element names.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicVector {
    data: VectorData,
    names: Option<Vec<String>>,
}

impl AtomicVector {
    /// Create an unnamed vector.
    pub fn new(data: impl Into<VectorData>) -> Self {
        Self {
            data: data.into(),
            names: None,
        }
    }

    /// Create a named vector. There must be exactly one name per element.
    pub fn with_names(data: impl Into<VectorData>, names: Vec<String>) -> Result<Self, TypeError> {
        let data = data.into();
        if names.len() != data.len() {
            return Err(TypeError::LengthMismatch {
                what: "vector names",
                expected: data.len(),
                actual: names.len(),
            });
        }
        Ok(Self {
            data,
            names: Some(names),
        })
    }

    /// Convenience constructor for a vector without missing integers.
    pub fn integers(values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(values.into_iter().map(Some).collect::<Vec<_>>())
    }

    /// Convenience constructor for a vector without missing numbers.
    pub fn numbers(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(Some).collect::<Vec<_>>())
    }

    /// Convenience constructor for a vector without missing strings.
    pub fn strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(|s| Some(s.into())).collect::<Vec<_>>())
    }

    /// Convenience constructor for a vector without missing booleans.
    pub fn booleans(values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(values.into_iter().map(Some).collect::<Vec<_>>())
    }

    pub fn data(&self) -> &VectorData {
        &self.data
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }

    /// Replace or drop the names.
    pub fn set_names(&mut self, names: Option<Vec<String>>) -> Result<(), TypeError> {
        if let Some(n) = &names {
            if n.len() != self.data.len() {
                return Err(TypeError::LengthMismatch {
                    what: "vector names",
                    expected: self.data.len(),
                    actual: n.len(),
                });
            }
        }
        self.names = names;
        Ok(())
    }

    pub fn into_parts(self) -> (VectorData, Option<Vec<String>>) {
        (self.data, self.names)
    }

    /// NaN-aware equality over values and names.
    pub fn same_values(&self, other: &Self) -> bool {
        self.names == other.names && self.data.same_values(&other.data)
    }
}

impl From<VectorData> for AtomicVector {
    fn from(data: VectorData) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn int32_bounds() {
        assert!(!exceeds_int32(i64::from(i32::MAX)));
        assert!(!exceeds_int32(i64::from(i32::MIN)));
        assert!(exceeds_int32(i64::from(i32::MAX) + 1));
        assert!(exceeds_int32(i64::from(i32::MIN) - 1));
    }

    #[test]
    fn element_type_round_trips_through_tag() {
        for t in [
            ElementType::Integer,
            ElementType::Number,
            ElementType::String,
            ElementType::Boolean,
        ] {
            assert_eq!(t.as_str().parse::<ElementType>().unwrap(), t);
        }
        assert!("factor".parse::<ElementType>().is_err());
    }

    #[test]
    fn missing_detection() {
        let v = VectorData::Integer(vec![Some(1), None, Some(3)]);
        assert!(v.has_missing());
        assert!(v.is_missing(1));
        assert!(!v.is_missing(0));
        assert!(!v.is_missing(10));
        assert_eq!(v.missing_count(), 1);
    }

    #[test]
    fn exceeds_only_counts_present_values() {
        let v = VectorData::Integer(vec![None, Some(1)]);
        assert!(!v.exceeds_int32());
        let v = VectorData::Integer(vec![None, Some(1 << 40)]);
        assert!(v.exceeds_int32());
        let v = VectorData::Number(vec![Some(1e20)]);
        assert!(!v.exceeds_int32());
    }

    #[test]
    fn names_must_match_length() {
        let err = AtomicVector::with_names(
            vec![Some(true), Some(false)],
            vec!["a".into()],
        )
        .unwrap_err();
        assert!(matches!(err, TypeError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn same_values_treats_nan_as_equal() {
        let a = VectorData::Number(vec![Some(f64::NAN), None, Some(1.0)]);
        let b = VectorData::Number(vec![Some(f64::NAN), None, Some(1.0)]);
        assert_ne!(a, b);
        assert!(a.same_values(&b));
        let c = VectorData::Number(vec![Some(f64::NAN), Some(0.0), Some(1.0)]);
        assert!(!a.same_values(&c));
    }

    proptest! {
        #[test]
        fn same_values_is_reflexive(xs in proptest::collection::vec(proptest::option::of(any::<f64>()), 0..40)) {
            let v = VectorData::Number(xs);
            prop_assert!(v.same_values(&v.clone()));
        }

        #[test]
        fn missing_count_matches_none_entries(xs in proptest::collection::vec(proptest::option::of(any::<i64>()), 0..40)) {
            let nones = xs.iter().filter(|x| x.is_none()).count();
            let v = VectorData::Integer(xs);
            prop_assert_eq!(v.missing_count(), nones);
            prop_assert_eq!(v.has_missing(), nones > 0);
        }
    }
}
