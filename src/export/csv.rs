//! Comma-separated tables, plain or gzip compressed.
//!
//! Fields containing a comma, quote or line break are quoted, with quotes
//! doubled. Missing cells are written as empty fields. On reading, a column
//! is numeric when every non-empty cell parses as a float.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::error::ExportError;
use super::table::{Column, ColumnData, Table};

fn write_field<W: Write>(w: &mut W, field: &str) -> io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        write!(w, "\"{}\"", field.replace('"', "\"\""))
    } else {
        w.write_all(field.as_bytes())
    }
}

/// Write `table` with a header row.
pub fn write_csv<W: Write>(table: &Table, w: &mut W) -> io::Result<()> {
    for (i, name) in table.column_names().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        write_field(w, name)?;
    }
    w.write_all(b"\n")?;

    for row in 0..table.num_rows() {
        for (i, column) in table.columns().iter().enumerate() {
            if i > 0 {
                w.write_all(b",")?;
            }
            write_field(w, &column.data.cell_string(row))?;
        }
        w.write_all(b"\n")?;
    }
    Ok(())
}

/// Split delimited text into records of fields.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(ExportError::Malformed("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

/// Read a table written by [`write_csv`] (or any header-first CSV).
pub fn read_csv<R: Read>(r: &mut R) -> Result<Table, ExportError> {
    let mut text = String::new();
    r.read_to_string(&mut text)?;

    let mut records = parse_records(&text)?.into_iter();
    let Some(header) = records.next() else {
        return Ok(Table::new());
    };
    let body: Vec<Vec<String>> = records.collect();

    for (i, record) in body.iter().enumerate() {
        if record.len() != header.len() {
            return Err(ExportError::Malformed(format!(
                "row {} has {} fields, header has {}",
                i + 1,
                record.len(),
                header.len()
            )));
        }
    }

    let columns = header
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let cells: Vec<&str> = body.iter().map(|r| r[j].as_str()).collect();
            let numeric = cells
                .iter()
                .all(|c| c.is_empty() || c.parse::<f64>().is_ok());
            let data = if numeric {
                ColumnData::Float(cells.iter().map(|c| c.parse().ok()).collect())
            } else {
                ColumnData::Text(
                    cells
                        .iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect(),
                )
            };
            Column { name, data }
        })
        .collect();

    Table::from_columns(columns)
}

/// Write `table` to `path`, gzip compressed when `gzip` is set.
pub fn write_csv_file<P: AsRef<Path>>(path: P, table: &Table, gzip: bool) -> io::Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        write_csv(table, &mut encoder)?;
        encoder.finish()?.flush()
    } else {
        let mut writer = writer;
        write_csv(table, &mut writer)?;
        writer.flush()
    }
}

/// Read a CSV table; paths ending in `.gz` are decompressed.
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> Result<Table, ExportError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    if path.extension().is_some_and(|ext| ext == "gz") {
        read_csv(&mut GzDecoder::new(reader))
    } else {
        let mut reader = reader;
        read_csv(&mut reader)
    }
}
