use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::factor::Factor;
use crate::frame::DataFrame;
use crate::list::List;
use crate::vector::{AtomicVector, ElementType};

/// A single typed value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Scalar {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Integer(_) => ElementType::Integer,
            Self::Number(_) => ElementType::Number,
            Self::String(_) => ElementType::String,
            Self::Boolean(_) => ElementType::Boolean,
        }
    }
}

/// Host-defined object type that plugs into the registry.
///
/// Implementors are saved by the handler registered under
/// [`Saveable::object_type`], and that handler recovers the concrete type
/// through [`Saveable::as_any`].
pub trait Saveable: Any + fmt::Debug + Send + Sync {
    /// Registry tag of this object (e.g. `"dense_array"`).
    fn object_type(&self) -> &str;

    /// Length along the first dimension, when the object can act as a column.
    fn length(&self) -> Option<usize> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Coarse classification of a [`Value`], used for logging and dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nothing,
    Scalar,
    Vector,
    Factor,
    List,
    Frame,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Nothing => "nothing",
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Factor => "factor",
            Self::List => "list",
            Self::Frame => "frame",
            Self::Object => "object",
        };
        f.write_str(s)
    }
}

/// Any value the engine can persist.
///
/// The primitive shapes form a closed set; everything else enters through
/// [`Value::Object`].
#[derive(Clone, Debug)]
pub enum Value {
    Nothing,
    Scalar(Scalar),
    Vector(AtomicVector),
    Factor(Factor),
    List(List),
    Frame(DataFrame),
    Object(Arc<dyn Saveable>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Nothing => ValueKind::Nothing,
            Self::Scalar(_) => ValueKind::Scalar,
            Self::Vector(_) => ValueKind::Vector,
            Self::Factor(_) => ValueKind::Factor,
            Self::List(_) => ValueKind::List,
            Self::Frame(_) => ValueKind::Frame,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Length along the first dimension, if the value has one.
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Nothing | Self::Scalar(_) => None,
            Self::Vector(v) => Some(v.len()),
            Self::Factor(f) => Some(f.len()),
            Self::List(l) => Some(l.len()),
            Self::Frame(df) => Some(df.nrows()),
            Self::Object(o) => o.length(),
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Wrap a host object.
    pub fn object<T: Saveable>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Borrow the concrete host object, if this is one of type `T`.
    pub fn downcast_object<T: Saveable>(&self) -> Option<&T> {
        match self {
            Self::Object(o) => o.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&AtomicVector> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_factor(&self) -> Option<&Factor> {
        match self {
            Self::Factor(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Self::Frame(df) => Some(df),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nothing, Self::Nothing) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Vector(a), Self::Vector(b)) => a == b,
            (Self::Factor(a), Self::Factor(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Frame(a), Self::Frame(b)) => a == b,
            // Host objects carry no equality contract; identity is the best we can do.
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<AtomicVector> for Value {
    fn from(v: AtomicVector) -> Self {
        Self::Vector(v)
    }
}

impl From<Factor> for Value {
    fn from(f: Factor) -> Self {
        Self::Factor(f)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Self::List(l)
    }
}

impl From<DataFrame> for Value {
    fn from(df: DataFrame) -> Self {
        Self::Frame(df)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Self::Scalar(Scalar::Integer(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Scalar(Scalar::Number(x))
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Self {
        Self::Scalar(Scalar::Boolean(x))
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Self {
        Self::Scalar(Scalar::String(x.to_string()))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Self {
        x.map_or(Self::Nothing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Blob(usize);

    impl Saveable for Blob {
        fn object_type(&self) -> &str {
            "blob"
        }

        fn length(&self) -> Option<usize> {
            Some(self.0)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn downcast_recovers_host_object() {
        let v = Value::object(Blob(3));
        assert_eq!(v.kind(), ValueKind::Object);
        assert_eq!(v.length(), Some(3));
        assert_eq!(v.downcast_object::<Blob>().unwrap().0, 3);
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(Blob(1));
        let b = a.clone();
        let c = Value::object(Blob(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn option_converts_to_nothing() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_nothing());
        let v: Value = Some(5i64).into();
        assert_eq!(v, Value::Scalar(Scalar::Integer(5)));
    }
}
