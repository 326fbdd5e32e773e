//! `data_frame`.
//!
//! Columns are negotiated once, then written to one of two backends:
//!
//! - `basic_columns.hds`: group `data_frame` with a `row-count` attribute,
//!   `column_names`, optional `row_names`, and `data/<i>` for every inline
//!   column (a dataset, or a group for factors)
//! - `table.csv[.zst]`: a header line, an optional leading `row_names`
//!   column, then one column per frame column; factor levels are saved as
//!   child vectors under `column_levels/<i>`
//!
//! Columns with no inline encoding are saved as child artifacts under
//! `other_columns/<i>`. The column descriptors in the metadata are the same
//! for both backends apart from the `levels` references.

use std::path::Path;

use arx_codec::vector::{encode_array, read_names, write_names};
use arx_codec::{
    factor_from_csv, factor_to_csv, negotiate, read_factor, read_vector, vector_from_csv,
    vector_to_csv, write_factor, Negotiated, PLACEHOLDER_ATTR,
};
use arx_meta::{MetaError, ObjectMetadata, FORMAT_VERSION};
use arx_store::{read_csv, write_csv, Compression, CsvField, HdsFile};
use arx_types::{AtomicVector, ColumnDescriptor, ColumnType, DataFrame, ResourceRef, TypeError, Value, VectorData};
use serde_json::Value as Json;
use tracing::debug;

use super::{expect_len, meta_len, DATA_FRAME};
use crate::config::FrameFormat;
use crate::error::{ArxError, ArxResult};
use crate::session::Arx;

pub const HDS_CONTENTS: &str = "basic_columns.hds";
pub const CSV_CONTENTS: &str = "table.csv";
pub const CSV_COMPRESSED: &str = "table.csv.zst";

const GROUP: &str = "data_frame";
const ROW_COUNT_ATTR: &str = "row-count";
const TYPE_ATTR: &str = "type";
const ROW_NAMES: &str = "row_names";
const OTHER_ANNOTATIONS: &str = "other_annotations";
const COLUMN_ANNOTATIONS: &str = "column_annotations";

pub fn save_data_frame(arx: &Arx, value: &Value, dir: &Path) -> ArxResult<ObjectMetadata> {
    let frame = value.as_frame().ok_or(ArxError::WrongKind {
        expected: "data frame",
        actual: value.kind(),
    })?;
    let config = arx.config();

    let negotiated: Vec<Negotiated<'_>> = frame
        .columns()
        .iter()
        .map(|c| negotiate(&c.value, config.convert_list_to_vector))
        .collect();
    let mut descriptors: Vec<ColumnDescriptor> = frame
        .columns()
        .iter()
        .zip(&negotiated)
        .map(|(c, n)| n.descriptor(&c.name))
        .collect();

    for (i, (column, n)) in frame.columns().iter().zip(&negotiated).enumerate() {
        if matches!(n, Negotiated::Other) {
            debug!(column = %column.name, index = i, kind = %column.value.kind(), "saving column as child artifact");
            descriptors[i].resource = Some(arx.save_child(&column.value, dir, &format!("other_columns/{i}"))?);
        }
    }

    let mut meta = ObjectMetadata::new(DATA_FRAME);
    let path = match config.frame_format {
        FrameFormat::Hds => {
            write_hds(frame, &negotiated, &dir.join(HDS_CONTENTS), config.compression())?;
            HDS_CONTENTS
        }
        FrameFormat::Csv => {
            let compression = config.csv_compression();
            let path = if compression.is_compressed() {
                CSV_COMPRESSED
            } else {
                CSV_CONTENTS
            };
            write_table(arx, frame, &negotiated, &mut descriptors, dir, path, compression)?;
            meta.insert("compression", compression.is_compressed());
            path
        }
    };

    meta.set_path(path)
        .insert("format", config.frame_format.as_str())
        .insert("rows", frame.nrows())
        .insert("row_names", frame.row_names().is_some())
        .insert("columns", serde_json::to_value(&descriptors)?);

    if let Some(md) = frame.metadata() {
        let r = arx.save_child(&Value::List(md.clone()), dir, OTHER_ANNOTATIONS)?;
        meta.insert(OTHER_ANNOTATIONS, serde_json::to_value(r)?);
    }
    if let Some(cd) = frame.column_data() {
        let r = arx.save_child(&Value::Frame(cd.clone()), dir, COLUMN_ANNOTATIONS)?;
        meta.insert(COLUMN_ANNOTATIONS, serde_json::to_value(r)?);
    }
    Ok(meta)
}

fn write_hds(frame: &DataFrame, negotiated: &[Negotiated<'_>], path: &Path, compression: Compression) -> ArxResult<()> {
    let mut file = HdsFile::new();
    let group = file.root_mut().create_group(GROUP)?;
    group.set_attr(ROW_COUNT_ATTR, frame.nrows() as u64);
    group.set_attr("version", FORMAT_VERSION);

    let data = group.create_group("data")?;
    for (i, n) in negotiated.iter().enumerate() {
        let key = i.to_string();
        match n {
            Negotiated::Vector { data: values, .. } => {
                let encoded = encode_array(values)?;
                let ds = data.create_dataset(&key, encoded.data, compression)?;
                if let Some(p) = encoded.placeholder {
                    ds.set_attr(PLACEHOLDER_ATTR, p);
                }
                ds.set_attr(TYPE_ATTR, encoded.element_type.as_str());
            }
            Negotiated::Factor(f) => {
                let g = data.create_group(&key)?;
                g.set_attr(TYPE_ATTR, "factor");
                write_factor(g, f, compression)?;
            }
            Negotiated::Other => {}
        }
    }

    let names: Vec<String> = frame.column_names().map(str::to_string).collect();
    write_names(group, "column_names", &names, compression)?;
    if let Some(rn) = frame.row_names() {
        write_names(group, ROW_NAMES, rn, compression)?;
    }
    file.write(path)?;
    Ok(())
}

fn write_table(
    arx: &Arx,
    frame: &DataFrame,
    negotiated: &[Negotiated<'_>],
    descriptors: &mut [ColumnDescriptor],
    dir: &Path,
    file_name: &str,
    compression: Compression,
) -> ArxResult<()> {
    let mut header = Vec::with_capacity(negotiated.len() + 1);
    let mut cells = Vec::with_capacity(negotiated.len() + 1);
    if let Some(rn) = frame.row_names() {
        header.push(ROW_NAMES.to_string());
        cells.push(rn.iter().cloned().map(CsvField::Text).collect());
    }
    for (i, (column, n)) in frame.columns().iter().zip(negotiated).enumerate() {
        header.push(column.name.clone());
        cells.push(match n {
            Negotiated::Vector { data, .. } => vector_to_csv(data),
            Negotiated::Factor(f) => {
                let levels = Value::Vector(AtomicVector::strings(f.levels().iter().cloned()));
                descriptors[i].levels = Some(arx.save_child(&levels, dir, &format!("column_levels/{i}"))?);
                factor_to_csv(f)
            }
            Negotiated::Other => vec![CsvField::Missing; frame.nrows()],
        });
    }
    write_csv(&dir.join(file_name), &header, &cells, frame.nrows(), compression)?;
    Ok(())
}

fn descriptors_of(meta: &ObjectMetadata) -> ArxResult<Vec<ColumnDescriptor>> {
    Ok(serde_json::from_value(meta.require("columns")?.clone())?)
}

fn missing_field(d: &ColumnDescriptor, field: &str) -> ArxError {
    MetaError::MissingField(format!("columns.{}.{field}", d.name)).into()
}

fn read_other(arx: &Arx, dir: &Path, d: &ColumnDescriptor) -> ArxResult<Value> {
    let resource = d.resource.as_ref().ok_or_else(|| missing_field(d, "resource"))?;
    arx.read_child(dir, resource)
}

pub fn read_data_frame(arx: &Arx, meta: &ObjectMetadata, dir: &Path) -> ArxResult<Value> {
    let rows = meta_len(meta, "rows")?;
    let descriptors = descriptors_of(meta)?;
    let has_row_names = meta.get(ROW_NAMES).and_then(Json::as_bool).unwrap_or(false);

    let (columns, row_names) = match meta.require("format")?.as_str() {
        Some("hds") => read_hds(arx, meta, dir, &descriptors, rows)?,
        Some("csv") => read_table(arx, meta, dir, &descriptors, rows, has_row_names)?,
        other => {
            return Err(ArxError::Config(format!(
                "unknown data frame format {}",
                other.map_or(Json::Null, Json::from)
            )))
        }
    };

    let mut frame = DataFrame::new(rows);
    for (d, value) in descriptors.iter().zip(columns) {
        frame.add_column(d.name.clone(), value).map_err(|e| match e {
            TypeError::LengthMismatch { expected, actual, .. } => ArxError::ShapeMismatch {
                what: format!("column {} length", d.name),
                expected,
                actual,
            },
            other => other.into(),
        })?;
    }
    if let Some(rn) = row_names {
        frame = frame.with_row_names(rn)?;
    }

    if let Some(r) = meta.get(OTHER_ANNOTATIONS) {
        let r: ResourceRef = serde_json::from_value(r.clone())?;
        match arx.read_child(dir, &r)? {
            Value::List(l) => frame = frame.with_metadata(l),
            other => {
                return Err(ArxError::WrongKind {
                    expected: "list",
                    actual: other.kind(),
                })
            }
        }
    }
    if let Some(r) = meta.get(COLUMN_ANNOTATIONS) {
        let r: ResourceRef = serde_json::from_value(r.clone())?;
        match arx.read_child(dir, &r)? {
            Value::Frame(cd) => frame = frame.with_column_data(cd)?,
            other => {
                return Err(ArxError::WrongKind {
                    expected: "data frame",
                    actual: other.kind(),
                })
            }
        }
    }
    Ok(Value::Frame(frame))
}

type Decoded = (Vec<Value>, Option<Vec<String>>);

fn read_hds(arx: &Arx, meta: &ObjectMetadata, dir: &Path, descriptors: &[ColumnDescriptor], rows: usize) -> ArxResult<Decoded> {
    let file = HdsFile::open(&dir.join(meta.path().unwrap_or(HDS_CONTENTS)))?;
    let group = file.root().group(GROUP)?;
    let stored_rows = group.require_attr(ROW_COUNT_ATTR)?.as_u64().ok_or_else(|| {
        ArxError::from(MetaError::MissingField(ROW_COUNT_ATTR.into()))
    })?;
    expect_len("row count", rows, stored_rows as usize)?;
    let names = read_names(group, "column_names")?;
    expect_len("column count", descriptors.len(), names.len())?;

    let data = group.group("data")?;
    let mut columns = Vec::with_capacity(descriptors.len());
    for (i, d) in descriptors.iter().enumerate() {
        let key = i.to_string();
        let value = match (d.column_type, d.column_type.element_type()) {
            (_, Some(t)) => Value::Vector(AtomicVector::new(read_vector(data, &key, t)?)),
            (ColumnType::Factor, None) => Value::Factor(read_factor(data.group(&key)?)?),
            _ => read_other(arx, dir, d)?,
        };
        columns.push(value);
    }

    let row_names = if group.contains(ROW_NAMES) {
        Some(read_names(group, ROW_NAMES)?)
    } else {
        None
    };
    Ok((columns, row_names))
}

fn cell_text(cell: CsvField) -> ArxResult<String> {
    match cell {
        CsvField::Text(s) | CsvField::Bare(s) => Ok(s),
        CsvField::Missing => Err(arx_codec::CodecError::InvalidValue {
            expected: "row name",
            value: "NA".into(),
        }
        .into()),
    }
}

fn read_table(
    arx: &Arx,
    meta: &ObjectMetadata,
    dir: &Path,
    descriptors: &[ColumnDescriptor],
    rows: usize,
    has_row_names: bool,
) -> ArxResult<Decoded> {
    let path = dir.join(meta.path().unwrap_or(CSV_COMPRESSED));
    let physical = descriptors.len() + usize::from(has_row_names);
    let table = read_csv(&path, Some(rows))?;
    expect_len("CSV column count", physical, table.header.len())?;

    let mut cells = table.columns.into_iter();
    let row_names = if has_row_names {
        let cells = cells.next().unwrap_or_default();
        Some(cells.into_iter().map(cell_text).collect::<ArxResult<Vec<_>>>()?)
    } else {
        None
    };

    let mut columns = Vec::with_capacity(descriptors.len());
    for (d, column) in descriptors.iter().zip(cells) {
        let value = match (d.column_type, d.column_type.element_type()) {
            (_, Some(t)) => Value::Vector(AtomicVector::new(vector_from_csv(t, &column)?)),
            (ColumnType::Factor, None) => {
                let r = d.levels.as_ref().ok_or_else(|| missing_field(d, "levels"))?;
                let levels = match arx.read_child(dir, r)? {
                    Value::Vector(v) => match v.into_parts().0 {
                        VectorData::String(s) => s
                            .into_iter()
                            .map(|l| l.ok_or_else(|| missing_field(d, "levels")))
                            .collect::<ArxResult<Vec<_>>>()?,
                        _ => return Err(missing_field(d, "levels")),
                    },
                    other => {
                        return Err(ArxError::WrongKind {
                            expected: "string vector",
                            actual: other.kind(),
                        })
                    }
                };
                Value::Factor(factor_from_csv(&column, levels, d.ordered.unwrap_or(false))?)
            }
            _ => read_other(arx, dir, d)?,
        };
        columns.push(value);
    }
    Ok((columns, row_names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArxConfig;
    use arx_types::{Factor, List, MISSING_CODE};

    fn session(format: FrameFormat) -> Arx {
        Arx::with_config(ArxConfig {
            frame_format: format,
            ..ArxConfig::default()
        })
    }

    fn sample() -> DataFrame {
        let mixed = List::new(vec![Value::from(1i64), Value::Nothing, Value::from(2.5)]);
        let hetero = List::new(vec![Value::from("a"), Value::from(true), Value::from(3i64)]);
        DataFrame::from_columns([
            ("ints", Value::Vector(AtomicVector::new(vec![Some(1i64), None, Some(3)]))),
            ("big", Value::Vector(AtomicVector::integers([1, 1 << 33, -1]))),
            ("text", Value::Vector(AtomicVector::new(vec![Some("a,\"b\"".to_string()), None, Some("NA".to_string())]))),
            ("flags", Value::Vector(AtomicVector::new(vec![Some(true), Some(false), None]))),
            (
                "fac",
                Value::Factor(Factor::new(vec![0, MISSING_CODE, 1], vec!["x".into(), "y".into()], true).unwrap()),
            ),
            ("mixed", Value::List(mixed)),
            ("hetero", Value::List(hetero.clone())),
        ])
        .unwrap()
        .with_row_names(vec!["r1".into(), "r2".into(), "r3".into()])
        .unwrap()
    }

    fn expected() -> DataFrame {
        let hetero = List::new(vec![Value::from("a"), Value::from(true), Value::from(3i64)]);
        DataFrame::from_columns([
            ("ints", Value::Vector(AtomicVector::new(vec![Some(1i64), None, Some(3)]))),
            ("big", Value::Vector(AtomicVector::numbers([1.0, (1i64 << 33) as f64, -1.0]))),
            ("text", Value::Vector(AtomicVector::new(vec![Some("a,\"b\"".to_string()), None, Some("NA".to_string())]))),
            ("flags", Value::Vector(AtomicVector::new(vec![Some(true), Some(false), None]))),
            (
                "fac",
                Value::Factor(Factor::new(vec![0, MISSING_CODE, 1], vec!["x".into(), "y".into()], true).unwrap()),
            ),
            ("mixed", Value::Vector(AtomicVector::new(vec![Some(1.0), None, Some(2.5)]))),
            ("hetero", Value::List(hetero)),
        ])
        .unwrap()
        .with_row_names(vec!["r1".into(), "r2".into(), "r3".into()])
        .unwrap()
    }

    fn save_and_read(format: FrameFormat, frame: &DataFrame) -> (ObjectMetadata, Value, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("df");
        let arx = session(format);
        let meta = arx.save(&Value::Frame(frame.clone()), &dir).unwrap();
        let back = arx.read(&dir, None).unwrap();
        (meta, back, tmp)
    }

    #[test]
    fn hds_roundtrip() {
        let (meta, back, tmp) = save_and_read(FrameFormat::Hds, &sample());
        assert_eq!(meta.path(), Some(HDS_CONTENTS));
        assert_eq!(back, Value::Frame(expected()));
        assert!(tmp.path().join("df/other_columns/6/OBJECT").is_file());
        assert!(!tmp.path().join("df/other_columns/5").exists());
    }

    #[test]
    fn csv_roundtrip() {
        let (meta, back, tmp) = save_and_read(FrameFormat::Csv, &sample());
        assert_eq!(meta.path(), Some(CSV_COMPRESSED));
        assert_eq!(back, Value::Frame(expected()));
        assert!(tmp.path().join("df/column_levels/4/OBJECT").is_file());
    }

    #[test]
    fn schema_is_identical_across_backends() {
        let (hds, _, _t1) = save_and_read(FrameFormat::Hds, &sample());
        let (csv, _, _t2) = save_and_read(FrameFormat::Csv, &sample());
        let keys = |m: &ObjectMetadata| -> Vec<(String, ColumnType, Option<bool>)> {
            descriptors_of(m)
                .unwrap()
                .iter()
                .map(|d| {
                    let (n, t, o) = d.schema_key();
                    (n.to_string(), t, o)
                })
                .collect()
        };
        assert_eq!(keys(&hds), keys(&csv));
        assert_eq!(
            keys(&hds).iter().map(|k| k.1).collect::<Vec<_>>(),
            vec![
                ColumnType::Integer,
                ColumnType::Number,
                ColumnType::String,
                ColumnType::Boolean,
                ColumnType::Factor,
                ColumnType::Number,
                ColumnType::Other,
            ]
        );
    }

    #[test]
    fn uncompressed_csv_is_plain_text() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("df");
        let arx = Arx::with_config(ArxConfig {
            frame_format: FrameFormat::Csv,
            compress_csv: false,
            ..ArxConfig::default()
        });
        let frame = DataFrame::from_columns([
            ("n", Value::Vector(AtomicVector::new(vec![Some(1.5), None]))),
            ("s", Value::Vector(AtomicVector::strings(["q\"uote", "x"]))),
        ])
        .unwrap();
        arx.save(&Value::Frame(frame.clone()), &dir).unwrap();
        let text = std::fs::read_to_string(dir.join(CSV_CONTENTS)).unwrap();
        assert_eq!(text, "\"n\",\"s\"\n1.5,\"q\"\"uote\"\nNA,\"x\"\n");
        assert_eq!(arx.read(&dir, None).unwrap(), Value::Frame(frame));
    }

    #[test]
    fn list_conversion_can_be_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("df");
        let arx = Arx::with_config(ArxConfig {
            convert_list_to_vector: false,
            ..ArxConfig::default()
        });
        let col = List::new(vec![Value::from(1i64), Value::from(2i64)]);
        let frame = DataFrame::from_columns([("l", Value::List(col))]).unwrap();
        let meta = arx.save(&Value::Frame(frame.clone()), &dir).unwrap();
        assert_eq!(descriptors_of(&meta).unwrap()[0].column_type, ColumnType::Other);
        assert_eq!(arx.read(&dir, None).unwrap(), Value::Frame(frame));
    }

    #[test]
    fn annotations_and_empty_frames() {
        let column_data = DataFrame::from_columns([(
            "unit",
            Value::Vector(AtomicVector::strings(["cm", "kg"])),
        )])
        .unwrap();
        let frame = DataFrame::from_columns([
            ("h", Value::Vector(AtomicVector::numbers([1.0]))),
            ("w", Value::Vector(AtomicVector::numbers([2.0]))),
        ])
        .unwrap()
        .with_metadata(List::named([("source", Value::from("survey"))]))
        .with_column_data(column_data)
        .unwrap();

        for format in [FrameFormat::Hds, FrameFormat::Csv] {
            let (meta, back, tmp) = save_and_read(format, &frame);
            assert!(meta.get(OTHER_ANNOTATIONS).is_some());
            assert!(tmp.path().join("df").join(COLUMN_ANNOTATIONS).join("OBJECT").is_file());
            assert_eq!(back, Value::Frame(frame.clone()));

            let empty = DataFrame::new(4);
            let (_, back, _t) = save_and_read(format, &empty);
            assert_eq!(back, Value::Frame(empty));
        }
    }

    #[test]
    fn empty_annotations_are_kept() {
        let frame = DataFrame::new(3)
            .with_metadata(List::default())
            .with_column_data(DataFrame::new(0))
            .unwrap();
        for format in [FrameFormat::Hds, FrameFormat::Csv] {
            let (meta, back, _t) = save_and_read(format, &frame);
            assert!(meta.get(OTHER_ANNOTATIONS).is_some());
            assert!(meta.get(COLUMN_ANNOTATIONS).is_some());
            let back = back.as_frame().unwrap().clone();
            assert_eq!(back.metadata(), Some(&List::default()));
            assert_eq!(back.column_data().map(DataFrame::ncols), Some(0));
            assert_eq!(Value::Frame(back), Value::Frame(frame.clone()));
        }
    }

    #[test]
    fn zero_column_csv_keeps_its_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("df");
        let arx = Arx::with_config(ArxConfig {
            frame_format: FrameFormat::Csv,
            compress_csv: false,
            ..ArxConfig::default()
        });
        arx.save(&Value::Frame(DataFrame::new(3)), &dir).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join(CSV_CONTENTS)).unwrap(), "\n\n\n\n");
        assert_eq!(arx.read(&dir, None).unwrap(), Value::Frame(DataFrame::new(3)));
    }

    #[test]
    fn row_count_mismatch_is_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("df");
        let arx = Arx::new();
        let frame = DataFrame::from_columns([("a", Value::Vector(AtomicVector::integers([1, 2])))]).unwrap();
        let mut meta = arx.save(&Value::Frame(frame), &dir).unwrap();
        meta.insert("rows", 3);
        assert!(matches!(
            arx.read(&dir, Some(meta)),
            Err(ArxError::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
