//! Logical data model for Arx artifacts.
//!
//! Every other Arx crate depends on `arx-types`. The types here describe
//! *what* is persisted, never *how*: the physical encodings live in
//! `arx-store` and `arx-codec`.
//!
//! # Key Types
//!
//! - [`AtomicVector`]: typed vector (string/integer/number/boolean) with
//!   optional names and missing entries
//! - [`Factor`]: categorical vector of integer codes plus a level dictionary
//! - [`DataFrame`]: named columns of equal length, optional row names
//! - [`List`]: ordered, optionally named, heterogeneous children
//! - [`Value`]: closed tagged variant over all of the above, plus the open
//!   [`Saveable`] extension point for host-defined object types
//! - [`ResourceRef`]: relative pointer from a parent artifact to a child
//! - [`ColumnDescriptor`]: per-column schema entry of a data frame

pub mod column;
pub mod error;
pub mod factor;
pub mod frame;
pub mod list;
pub mod resource;
pub mod value;
pub mod vector;

pub use column::{ColumnDescriptor, ColumnType};
pub use error::TypeError;
pub use factor::{Factor, MISSING_CODE};
pub use frame::{Column, DataFrame};
pub use list::List;
pub use resource::{ResourceKind, ResourceRef};
pub use value::{Saveable, Scalar, Value, ValueKind};
pub use vector::{exceeds_int32, AtomicVector, ElementType, VectorData};
