//! Column negotiation for data frames.
//!
//! Each column is classified exactly once, before any backend is chosen, so
//! the resulting descriptors are the same for every backend.

use std::borrow::Cow;
use std::collections::HashSet;

use arx_types::{ColumnDescriptor, ColumnType, ElementType, Factor, List, Scalar, Value, VectorData};

use crate::vector::stored_type;

/// How one column will be stored.
#[derive(Clone, Debug, PartialEq)]
pub enum Negotiated<'a> {
    /// Inline typed vector.
    Vector {
        data: Cow<'a, VectorData>,
        column_type: ColumnType,
    },
    /// Inline factor (codes plus levels).
    Factor(&'a Factor),
    /// Staged as an independent child artifact.
    Other,
}

impl Negotiated<'_> {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Vector { column_type, .. } => *column_type,
            Self::Factor(_) => ColumnType::Factor,
            Self::Other => ColumnType::Other,
        }
    }

    /// Descriptor for a column negotiated this way.
    pub fn descriptor(&self, name: &str) -> ColumnDescriptor {
        match self {
            Self::Factor(f) => ColumnDescriptor::factor(name, f.is_ordered()),
            other => ColumnDescriptor::new(name, other.column_type()),
        }
    }
}

/// Classify a column value.
///
/// Typed vectors and factors are stored inline. A plain list is stored inline
/// only when `convert_list_to_vector` is set and its present elements are
/// scalars of one primitive type (integers mixed with numbers count as
/// numbers). Everything else is `Other`.
pub fn negotiate(value: &Value, convert_list_to_vector: bool) -> Negotiated<'_> {
    match value {
        Value::Vector(v) => Negotiated::Vector {
            column_type: stored_type(v.data()).into(),
            data: Cow::Borrowed(v.data()),
        },
        Value::Factor(f) => Negotiated::Factor(f),
        Value::List(l) if convert_list_to_vector => match list_to_vector(l) {
            Some(data) => Negotiated::Vector {
                column_type: stored_type(&data).into(),
                data: Cow::Owned(data),
            },
            None => Negotiated::Other,
        },
        _ => Negotiated::Other,
    }
}

/// Collapse a list of scalars into a typed vector, if it is homogeneous.
///
/// `Nothing` entries become missing values. A list with no present values has
/// no type and yields `None`.
pub fn list_to_vector(list: &List) -> Option<VectorData> {
    let mut types = HashSet::new();
    for v in list.iter() {
        match v {
            Value::Scalar(s) => {
                types.insert(s.element_type());
            }
            Value::Nothing => {}
            _ => return None,
        }
    }
    let target = match types.len() {
        1 => types.into_iter().next()?,
        2 if types.contains(&ElementType::Integer) && types.contains(&ElementType::Number) => {
            ElementType::Number
        }
        _ => return None,
    };

    let scalars = list.iter().map(|v| match v {
        Value::Scalar(s) => Some(s),
        _ => None,
    });
    Some(match target {
        ElementType::Integer => VectorData::Integer(
            scalars
                .map(|s| match s {
                    Some(Scalar::Integer(x)) => Some(*x),
                    _ => None,
                })
                .collect(),
        ),
        ElementType::Number => VectorData::Number(
            scalars
                .map(|s| match s {
                    Some(Scalar::Integer(x)) => Some(*x as f64),
                    Some(Scalar::Number(x)) => Some(*x),
                    _ => None,
                })
                .collect(),
        ),
        ElementType::String => VectorData::String(
            scalars
                .map(|s| match s {
                    Some(Scalar::String(x)) => Some(x.clone()),
                    _ => None,
                })
                .collect(),
        ),
        ElementType::Boolean => VectorData::Boolean(
            scalars
                .map(|s| match s {
                    Some(Scalar::Boolean(x)) => Some(*x),
                    _ => None,
                })
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arx_types::AtomicVector;

    fn list(values: Vec<Value>) -> Value {
        Value::List(List::new(values))
    }

    #[test]
    fn mixed_int_and_float_is_number() {
        let v = list(vec![Value::from(1i64), Value::Nothing, Value::from(2.5)]);
        let n = negotiate(&v, true);
        assert_eq!(n.column_type(), ColumnType::Number);
        match n {
            Negotiated::Vector { data, .. } => {
                assert_eq!(*data, VectorData::Number(vec![Some(1.0), None, Some(2.5)]))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn large_ints_negotiate_to_number() {
        let v = Value::Vector(AtomicVector::integers([1, 1 << 33]));
        assert_eq!(negotiate(&v, true).column_type(), ColumnType::Number);
        let l = list(vec![Value::from(1i64 << 33)]);
        assert_eq!(negotiate(&l, true).column_type(), ColumnType::Number);
    }

    #[test]
    fn pure_types() {
        let b = list(vec![Value::from(true), Value::Nothing]);
        assert_eq!(negotiate(&b, true).column_type(), ColumnType::Boolean);
        let s = list(vec![Value::from("a")]);
        assert_eq!(negotiate(&s, true).column_type(), ColumnType::String);
        let i = list(vec![Value::from(3i64)]);
        assert_eq!(negotiate(&i, true).column_type(), ColumnType::Integer);
    }

    #[test]
    fn heterogeneous_lists_are_other() {
        let cases = [
            list(vec![Value::from(true), Value::from(1i64)]),
            list(vec![Value::from("a"), Value::from(1.0)]),
            list(vec![Value::Nothing, Value::Nothing]),
            list(vec![Value::from(1i64), Value::Vector(AtomicVector::integers([1]))]),
        ];
        for c in &cases {
            assert_eq!(negotiate(c, true), Negotiated::Other);
        }
    }

    #[test]
    fn conversion_can_be_disabled() {
        let v = list(vec![Value::from(1i64)]);
        assert_eq!(negotiate(&v, false), Negotiated::Other);
    }

    #[test]
    fn factor_descriptor_keeps_ordering() {
        let f = Factor::from_values(&[Some("a")], true);
        let v = Value::Factor(f);
        let d = negotiate(&v, true).descriptor("f");
        assert_eq!(d, ColumnDescriptor::factor("f", true));
    }
}
