//! Physical storage backends for Arx artifacts.
//!
//! The codecs in `arx-codec` never touch bytes directly; they build and read
//! the structures defined here.
//!
//! - **Hierarchical dataset file** (`.hds`): groups, typed datasets and typed
//!   attributes, zstd-compressed per dataset, CRC-checked as a whole
//! - **CSV**: quoted-string tables with bare `NA` for missing cells
//! - **Text helpers**: (optionally zstd-compressed) JSON and raw bytes

pub mod csv;
pub mod error;
pub mod hds;
pub mod text;

pub use csv::{format_csv, parse_csv, read_csv, write_csv, CsvField, CsvTable};
pub use error::{StoreError, StoreResult};
pub use hds::{ArrayData, AttrValue, Dataset, Dtype, Group, HdsFile, Node};
pub use text::{read_bytes, read_json, write_bytes, write_json, Compression};
