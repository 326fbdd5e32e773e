use crate::error::TypeError;
use crate::value::Value;

/// Ordered heterogeneous collection with optional names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    values: Vec<Value>,
    names: Option<Vec<String>>,
}

impl List {
    /// Create an unnamed list.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            names: None,
        }
    }

    /// Create a named list from `(name, value)` pairs, preserving order.
    pub fn named<S: Into<String>>(entries: impl IntoIterator<Item = (S, Value)>) -> Self {
        let (names, values): (Vec<String>, Vec<Value>) =
            entries.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self {
            values,
            names: Some(names),
        }
    }

    /// Create a list with explicit names; one name per child.
    pub fn with_names(values: Vec<Value>, names: Vec<String>) -> Result<Self, TypeError> {
        if names.len() != values.len() {
            return Err(TypeError::LengthMismatch {
                what: "list names",
                expected: values.len(),
                actual: names.len(),
            });
        }
        Ok(Self {
            values,
            names: Some(names),
        })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.values.get(i)
    }

    /// First child carrying `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let names = self.names.as_ref()?;
        names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_parts(self) -> (Vec<Value>, Option<Vec<String>>) {
        (self.values, self.names)
    }
}
