//! Built-in object types.

pub mod frame;
pub mod list;
pub mod vector;

use crate::error::{ArxError, ArxResult};
use crate::registry::Registry;

pub const ATOMIC_VECTOR: &str = "atomic_vector";
pub const STRING_FACTOR: &str = "string_factor";
pub const SIMPLE_LIST: &str = "simple_list";
pub const DATA_FRAME: &str = "data_frame";

/// Bind the built-in handlers, leaving any existing binding in place.
pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.provide_saver(ATOMIC_VECTOR, vector::save_atomic_vector);
    registry.provide_reader(ATOMIC_VECTOR, vector::read_atomic_vector);
    registry.provide_saver(STRING_FACTOR, vector::save_string_factor);
    registry.provide_reader(STRING_FACTOR, vector::read_string_factor);
    registry.provide_saver(SIMPLE_LIST, list::save_simple_list);
    registry.provide_reader(SIMPLE_LIST, list::read_simple_list);
    registry.provide_saver(DATA_FRAME, frame::save_data_frame);
    registry.provide_reader(DATA_FRAME, frame::read_data_frame);
}

/// Fail with [`ArxError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn expect_len(what: &str, expected: usize, actual: usize) -> ArxResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ArxError::ShapeMismatch {
            what: what.to_string(),
            expected,
            actual,
        })
    }
}

/// Unsigned metadata field as a length.
pub(crate) fn meta_len(meta: &arx_meta::ObjectMetadata, key: &str) -> ArxResult<usize> {
    Ok(meta.require_u64(key)? as usize)
}
