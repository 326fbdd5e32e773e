//! Minimal CSV codec for tabular artifacts.
//!
//! Strings are always quoted (embedded quotes doubled), numbers and booleans
//! are written bare, and missing entries are the bare token `NA`. Quoting is
//! preserved on read, so a quoted `"NA"` is a string and a bare `NA` is a
//! missing value.

use std::path::Path;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::text::{read_bytes, write_bytes, Compression};

const MISSING: &str = "NA";

/// One CSV cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CsvField {
    Missing,
    /// Quoted text.
    Text(String),
    /// Unquoted token such as a number or boolean.
    Bare(String),
}

/// A parsed table, stored column-major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub columns: Vec<Vec<CsvField>>,
    nrows: usize,
}

impl CsvTable {
    pub fn nrows(&self) -> usize {
        self.nrows
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

/// Render a header and column-major cells as CSV text.
///
/// Every column must hold `nrows` cells. A table without columns is written
/// as `nrows` empty lines so that its row count survives.
pub fn format_csv(header: &[String], columns: &[Vec<CsvField>], nrows: usize) -> StoreResult<String> {
    if header.len() != columns.len() {
        return Err(StoreError::ShapeMismatch {
            what: "CSV header fields".into(),
            expected: columns.len(),
            actual: header.len(),
        });
    }
    if let Some(bad) = columns.iter().find(|c| c.len() != nrows) {
        return Err(StoreError::ShapeMismatch {
            what: "CSV column length".into(),
            expected: nrows,
            actual: bad.len(),
        });
    }

    let mut out = String::new();
    for (i, name) in header.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_quoted(&mut out, name);
    }
    out.push('\n');
    for row in 0..nrows {
        for (i, col) in columns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match &col[row] {
                CsvField::Missing => out.push_str(MISSING),
                CsvField::Text(s) => push_quoted(&mut out, s),
                CsvField::Bare(s) => out.push_str(s),
            }
        }
        out.push('\n');
    }
    Ok(out)
}

fn finish_field(field: &mut String, quoted: &mut bool) -> CsvField {
    let text = std::mem::take(field);
    if std::mem::take(quoted) {
        CsvField::Text(text)
    } else if text == MISSING {
        CsvField::Missing
    } else {
        CsvField::Bare(text)
    }
}

fn parse_records(text: &str) -> StoreResult<Vec<Vec<CsvField>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
            continue;
        }
        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            '"' => {
                return Err(StoreError::MalformedCsv {
                    line,
                    reason: "unexpected quote".into(),
                })
            }
            ',' => record.push(finish_field(&mut field, &mut quoted)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                // An empty line is a record with no fields.
                if !(record.is_empty() && field.is_empty() && !quoted) {
                    record.push(finish_field(&mut field, &mut quoted));
                }
                records.push(std::mem::take(&mut record));
                line += 1;
            }
            _ if quoted => {
                return Err(StoreError::MalformedCsv {
                    line,
                    reason: "text after closing quote".into(),
                })
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(StoreError::MalformedCsv {
            line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || quoted || !record.is_empty() {
        record.push(finish_field(&mut field, &mut quoted));
        records.push(record);
    }
    Ok(records)
}

/// Parse CSV text. Every record must have as many fields as the header.
pub fn parse_csv(text: &str) -> StoreResult<CsvTable> {
    let mut records = parse_records(text)?.into_iter();
    let header: Vec<String> = records
        .next()
        .ok_or_else(|| StoreError::MalformedCsv {
            line: 1,
            reason: "missing header".into(),
        })?
        .into_iter()
        .map(|f| match f {
            CsvField::Missing => MISSING.to_string(),
            CsvField::Text(s) | CsvField::Bare(s) => s,
        })
        .collect();

    let mut columns: Vec<Vec<CsvField>> = vec![Vec::new(); header.len()];
    let mut nrows = 0;
    for record in records {
        if record.len() != header.len() {
            return Err(StoreError::ShapeMismatch {
                what: format!("fields in CSV row {}", nrows + 1),
                expected: header.len(),
                actual: record.len(),
            });
        }
        for (col, f) in columns.iter_mut().zip(record) {
            col.push(f);
        }
        nrows += 1;
    }
    Ok(CsvTable {
        header,
        columns,
        nrows,
    })
}

/// Write a table to `path`.
pub fn write_csv(
    path: &Path,
    header: &[String],
    columns: &[Vec<CsvField>],
    nrows: usize,
    compression: Compression,
) -> StoreResult<()> {
    let text = format_csv(header, columns, nrows)?;
    write_bytes(path, text.as_bytes(), compression)
}

/// Read a table from `path`, optionally checking the number of data rows.
pub fn read_csv(path: &Path, expected_rows: Option<usize>) -> StoreResult<CsvTable> {
    let bytes = read_bytes(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
    let table = parse_csv(&text)?;
    if let Some(expected) = expected_rows {
        if table.nrows() != expected {
            return Err(StoreError::ShapeMismatch {
                what: "CSV rows".into(),
                expected,
                actual: table.nrows(),
            });
        }
    }
    debug!(path = %path.display(), rows = table.nrows(), cols = table.header.len(), "read csv");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CsvField {
        CsvField::Text(s.into())
    }

    fn bare(s: &str) -> CsvField {
        CsvField::Bare(s.into())
    }

    #[test]
    fn quotes_and_missing_survive() {
        let header = vec!["name".to_string(), "x".to_string()];
        let columns = vec![
            vec![text("a,b"), text("say \"hi\""), text("NA"), text("two\nlines")],
            vec![bare("1"), CsvField::Missing, bare("-3.5"), bare("1e300")],
        ];
        let out = format_csv(&header, &columns, 4).unwrap();
        assert!(out.starts_with("\"name\",\"x\"\n\"a,b\",1\n"));
        assert!(out.contains("\"say \"\"hi\"\"\",NA\n"));

        let table = parse_csv(&out).unwrap();
        assert_eq!(table.header, header);
        assert_eq!(table.columns, columns);
        assert_eq!(table.nrows(), 4);
    }

    #[test]
    fn ragged_rows_are_shape_errors() {
        let err = parse_csv("\"a\",\"b\"\n1,2\n3\n").unwrap_err();
        assert!(matches!(err, StoreError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn crlf_and_missing_final_newline() {
        let table = parse_csv("\"a\"\r\n1\r\n2").unwrap();
        assert_eq!(table.columns, vec![vec![bare("1"), bare("2")]]);
    }

    #[test]
    fn zero_column_table_keeps_row_count() {
        let out = format_csv(&[], &[], 2).unwrap();
        assert_eq!(out, "\n\n\n");
        let table = parse_csv(&out).unwrap();
        assert!(table.header.is_empty());
        assert_eq!(table.nrows(), 2);
        assert_eq!(parse_csv(&format_csv(&[], &[], 0).unwrap()).unwrap().nrows(), 0);
    }

    #[test]
    fn columns_must_match_row_count() {
        let columns = vec![vec![bare("1")]];
        assert!(matches!(
            format_csv(&["a".to_string()], &columns, 2),
            Err(StoreError::ShapeMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn malformed_quotes() {
        assert!(matches!(parse_csv("\"a\nb"), Err(StoreError::MalformedCsv { .. })));
        assert!(matches!(parse_csv("a\"b\n"), Err(StoreError::MalformedCsv { .. })));
        assert!(matches!(parse_csv("\"a\"b\n"), Err(StoreError::MalformedCsv { .. })));
        assert!(matches!(parse_csv(""), Err(StoreError::MalformedCsv { .. })));
    }

    #[test]
    fn compressed_file_with_row_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv.zst");
        let header = vec!["v".to_string()];
        let columns = vec![vec![bare("true"), bare("false")]];
        write_csv(&path, &header, &columns, 2, Compression::Zstd(3)).unwrap();
        assert_eq!(read_csv(&path, Some(2)).unwrap().columns, columns);
        assert!(matches!(
            read_csv(&path, Some(3)),
            Err(StoreError::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
    }
}
