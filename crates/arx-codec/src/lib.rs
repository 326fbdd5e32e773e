//! Logical-to-physical codecs for Arx artifacts.
//!
//! # Architecture
//!
//! - **Placeholders**: pick an in-band sentinel for missing entries that never
//!   collides with a present value
//! - **Vectors**: typed vectors to hierarchical datasets, JSON arrays and CSV
//!   cells, with whole-vector promotion of oversized integers
//! - **Factors**: codes plus levels, missing codes remapped to the level count
//! - **Columns**: one-shot classification of data-frame columns, shared by all
//!   frame backends
//! - **Lists**: recursive list trees with ordered external references

pub mod columns;
pub mod error;
pub mod factor;
pub mod list;
pub mod placeholder;
pub mod vector;

pub use columns::{list_to_vector, negotiate, Negotiated};
pub use error::{CodecError, CodecResult};
pub use factor::{factor_from_csv, factor_to_csv, read_factor, write_factor};
pub use list::{encode, EncodedList, ListNode};
pub use placeholder::{
    choose_float_placeholder, choose_integer_placeholder, choose_string_placeholder,
    FloatStorage, IntStorage, BOOLEAN_PLACEHOLDER,
};
pub use vector::{
    read_vector, stored_type, vector_from_csv, vector_to_csv, write_vector, PLACEHOLDER_ATTR,
};
