use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::resource::ResourceRef;
use crate::vector::ElementType;

/// Semantic type of a data frame column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Number,
    String,
    Boolean,
    Factor,
    Other,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Factor => "factor",
            Self::Other => "other",
        }
    }

    /// The element type of an inline atomic column.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Self::Integer => Some(ElementType::Integer),
            Self::Number => Some(ElementType::Number),
            Self::String => Some(ElementType::String),
            Self::Boolean => Some(ElementType::Boolean),
            Self::Factor | Self::Other => None,
        }
    }
}

impl From<ElementType> for ColumnType {
    fn from(t: ElementType) -> Self {
        match t {
            ElementType::Integer => Self::Integer,
            ElementType::Number => Self::Number,
            ElementType::String => Self::String,
            ElementType::Boolean => Self::Boolean,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "boolean" => Ok(Self::Boolean),
            "factor" => Ok(Self::Factor),
            "other" => Ok(Self::Other),
            other => Err(TypeError::UnknownType(other.to_string())),
        }
    }
}

/// Schema entry for one data frame column, as recorded in metadata.
///
/// `levels` is only set for factor columns written by a backend that cannot
/// hold the level dictionary inline; `resource` is only set for `other`
/// columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRef>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            ordered: None,
            levels: None,
            resource: None,
        }
    }

    pub fn factor(name: impl Into<String>, ordered: bool) -> Self {
        Self {
            ordered: Some(ordered),
            ..Self::new(name, ColumnType::Factor)
        }
    }

    /// The backend-independent part of the descriptor.
    pub fn schema_key(&self) -> (&str, ColumnType, Option<bool>) {
        (&self.name, self.column_type, self.ordered)
    }
}
