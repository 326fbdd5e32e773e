//! Factor codec.
//!
//! On disk, codes are unsigned, so the in-memory missing code cannot be stored
//! as is. Missing entries are remapped to `levels.len()`, which is never a
//! valid level index, and that value is recorded as the placeholder.

use std::collections::HashMap;

use arx_store::{AttrValue, Compression, CsvField, Group};
use arx_types::{Factor, MISSING_CODE};

use crate::error::{CodecError, CodecResult};
use crate::vector::{read_integers, read_names, PLACEHOLDER_ATTR};

pub const CODES: &str = "codes";
pub const LEVELS: &str = "levels";
pub const ORDERED_ATTR: &str = "ordered";

/// Write `factor` into `group` as `codes`, `levels` and an `ordered` attribute.
pub fn write_factor(group: &mut Group, factor: &Factor, compression: Compression) -> CodecResult<()> {
    let nlevels = u32::try_from(factor.levels().len()).map_err(|_| CodecError::InvalidValue {
        expected: "level count",
        value: factor.levels().len().to_string(),
    })?;
    let codes: Vec<u32> = factor
        .codes()
        .iter()
        .map(|&c| if c == MISSING_CODE { nlevels } else { c as u32 })
        .collect();
    let ds = group.create_dataset(CODES, codes, compression)?;
    if factor.has_missing() {
        ds.set_attr(PLACEHOLDER_ATTR, AttrValue::U32(nlevels));
    }
    group.create_dataset(LEVELS, factor.levels().to_vec(), compression)?;
    group.set_attr(ORDERED_ATTR, i8::from(factor.is_ordered()));
    Ok(())
}

/// Read a factor written by [`write_factor`].
pub fn read_factor(group: &Group) -> CodecResult<Factor> {
    let levels = read_names(group, LEVELS)?;
    let codes = read_integers(group, CODES)?
        .into_iter()
        .map(|c| match c {
            None => Ok(MISSING_CODE),
            Some(c) => i32::try_from(c).map_err(|_| CodecError::InvalidValue {
                expected: "factor code",
                value: c.to_string(),
            }),
        })
        .collect::<CodecResult<Vec<_>>>()?;
    let ordered = group
        .attr(ORDERED_ATTR)
        .and_then(AttrValue::as_u64)
        .is_some_and(|x| x != 0);
    Ok(Factor::new(codes, levels, ordered)?)
}

/// CSV cells holding the level string of each entry.
pub fn factor_to_csv(factor: &Factor) -> Vec<CsvField> {
    factor
        .to_values()
        .into_iter()
        .map(|v| v.map_or(CsvField::Missing, CsvField::Text))
        .collect()
}

/// Rebuild a factor from CSV level strings and a separately stored dictionary.
pub fn factor_from_csv(cells: &[CsvField], levels: Vec<String>, ordered: bool) -> CodecResult<Factor> {
    let lookup: HashMap<&str, i32> = levels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i as i32))
        .collect();
    let codes = cells
        .iter()
        .map(|cell| match cell {
            CsvField::Missing => Ok(MISSING_CODE),
            CsvField::Text(s) | CsvField::Bare(s) => lookup
                .get(s.as_str())
                .copied()
                .ok_or_else(|| CodecError::UnknownLevel(s.clone())),
        })
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Factor::new(codes, levels, ordered)?)
}
