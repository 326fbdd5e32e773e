use crate::error::TypeError;
use crate::list::List;
use crate::value::Value;

/// One named column of a [`DataFrame`].
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub value: Value,
}

/// Named columns of equal length.
///
/// A column may hold anything with a first-dimension length: vectors,
/// factors, lists, nested frames, or host objects that report a length.
/// Frame-level annotations live in `metadata`; per-column annotations live in
/// `column_data`, a frame with one row per column.
#[derive(Clone, Debug, PartialEq)]
pub struct DataFrame {
    nrows: usize,
    columns: Vec<Column>,
    row_names: Option<Vec<String>>,
    metadata: Option<List>,
    column_data: Option<Box<DataFrame>>,
}

impl DataFrame {
    /// An empty frame with a fixed row count.
    pub fn new(nrows: usize) -> Self {
        Self {
            nrows,
            columns: Vec::new(),
            row_names: None,
            metadata: None,
            column_data: None,
        }
    }

    /// Build a frame from `(name, value)` pairs. The row count is taken from
    /// the first column (zero when there are none).
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Value)>,
    ) -> Result<Self, TypeError> {
        let columns: Vec<(String, Value)> =
            columns.into_iter().map(|(n, v)| (n.into(), v)).collect();
        let nrows = match columns.first() {
            Some((name, value)) => column_length(name, value)?,
            None => 0,
        };
        let mut df = Self::new(nrows);
        for (name, value) in columns {
            df.add_column(name, value)?;
        }
        Ok(df)
    }

    /// Append a column, checking name uniqueness and length.
    pub fn add_column(&mut self, name: impl Into<String>, value: Value) -> Result<(), TypeError> {
        let name = name.into();
        if self.columns.iter().any(|c| c.name == name) {
            return Err(TypeError::DuplicateColumn(name));
        }
        let len = column_length(&name, &value)?;
        if len != self.nrows {
            return Err(TypeError::LengthMismatch {
                what: "column",
                expected: self.nrows,
                actual: len,
            });
        }
        self.columns.push(Column { name, value });
        Ok(())
    }

    pub fn with_row_names(mut self, row_names: Vec<String>) -> Result<Self, TypeError> {
        if row_names.len() != self.nrows {
            return Err(TypeError::LengthMismatch {
                what: "row names",
                expected: self.nrows,
                actual: row_names.len(),
            });
        }
        self.row_names = Some(row_names);
        Ok(self)
    }

    pub fn with_metadata(mut self, metadata: List) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach per-column annotations; one row per column.
    pub fn with_column_data(mut self, column_data: DataFrame) -> Result<Self, TypeError> {
        if column_data.nrows() != self.columns.len() {
            return Err(TypeError::LengthMismatch {
                what: "column annotations",
                expected: self.columns.len(),
                actual: column_data.nrows(),
            });
        }
        self.column_data = Some(Box::new(column_data));
        Ok(self)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn row_names(&self) -> Option<&[String]> {
        self.row_names.as_deref()
    }

    pub fn metadata(&self) -> Option<&List> {
        self.metadata.as_ref()
    }

    pub fn column_data(&self) -> Option<&DataFrame> {
        self.column_data.as_deref()
    }
}

fn column_length(name: &str, value: &Value) -> Result<usize, TypeError> {
    value.length().ok_or_else(|| TypeError::InvalidColumn {
        name: name.to_string(),
        reason: format!("{} values have no length", value.kind()),
    })
}
