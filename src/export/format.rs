//! Binary column table format (`.ptbl`).
//!
//! ```text
//! Header (28 bytes):
//!   Magic: "PTBL" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression in the lower 4 bits)
//!   Column count: u32
//!   Row count: u64
//!   Reserved: 8 bytes
//!
//! Column descriptors (column count entries):
//!   Name length: u32
//!   Name: UTF-8 bytes
//!   Kind: u8 (0 = float, 1 = text)
//!
//! Payload size: u64, followed by the payload, optionally LZ4 compressed.
//! Payload, column after column:
//!   Float: one presence byte per row, then one f64 per row (0 when absent)
//!   Text: per row a u32 byte length (u32::MAX when absent) and the bytes
//! ```
//!
//! All integers and floats are little-endian.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::table::{Column, ColumnData, Table};

/// Magic bytes identifying a table file.
pub const TABLE_MAGIC: &[u8; 4] = b"PTBL";

/// Current format version.
pub const TABLE_VERSION: u16 = 1;

const NULL_TEXT: u32 = u32::MAX;

/// Compression type for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }

    /// Compression to use when writing; LZ4 falls back to none without the `lz4` feature.
    pub fn effective(self) -> Self {
        if cfg!(feature = "lz4") { self } else { Self::None }
    }
}

/// Table file header.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub compression: CompressionType,
    pub columns: u32,
    pub rows: u64,
}

impl TableHeader {
    /// Magic(4) + Version(2) + Flags(2) + Columns(4) + Rows(8) + Reserved(8)
    pub const SIZE: usize = 28;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(TABLE_MAGIC)?;
        w.write_all(&TABLE_VERSION.to_le_bytes())?;
        w.write_all(&(self.compression as u16).to_le_bytes())?;
        w.write_all(&self.columns.to_le_bytes())?;
        w.write_all(&self.rows.to_le_bytes())?;
        w.write_all(&[0u8; 8])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != TABLE_MAGIC {
            return Err(invalid("Invalid PTBL magic bytes".to_string()));
        }

        let version = read_u16(r)?;
        if version != TABLE_VERSION {
            return Err(invalid(format!("Unsupported PTBL version: {}", version)));
        }

        let flags = read_u16(r)?;
        let compression = CompressionType::from_u8((flags & 0x0F) as u8)
            .ok_or_else(|| invalid(format!("Unknown compression flag: {}", flags & 0x0F)))?;
        let columns = read_u32(r)?;
        let rows = read_u64(r)?;

        let mut reserved = [0u8; 8];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            compression,
            columns,
            rows,
        })
    }
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read exactly `len` bytes, growing the buffer only as data arrives.
fn read_bytes<R: Read>(r: &mut R, len: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    r.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buf.len()),
        ));
    }
    Ok(buf)
}

/// Fail unless `rows` entries of at least `min_bytes` each fit in `remaining`.
fn check_rows(rows: usize, min_bytes: usize, remaining: usize) -> io::Result<()> {
    match rows.checked_mul(min_bytes) {
        Some(needed) if needed <= remaining => Ok(()),
        _ => Err(invalid(format!(
            "{} rows do not fit in {} payload bytes",
            rows, remaining
        ))),
    }
}

/// Serialize column values.
pub fn encode_columns(columns: &[Column]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for column in columns {
        match &column.data {
            ColumnData::Float(values) => {
                bytes.extend(values.iter().map(|v| v.is_some() as u8));
                for v in values {
                    bytes.extend_from_slice(&v.unwrap_or(0.0).to_le_bytes());
                }
            }
            ColumnData::Text(values) => {
                for v in values {
                    match v {
                        Some(s) => {
                            bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
                            bytes.extend_from_slice(s.as_bytes());
                        }
                        None => bytes.extend_from_slice(&NULL_TEXT.to_le_bytes()),
                    }
                }
            }
        }
    }
    bytes
}

/// Column kinds as stored in descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Float = 0,
    Text = 1,
}

/// Deserialize column values for the given descriptors.
fn decode_columns(
    mut bytes: &[u8],
    descriptors: Vec<(String, ColumnKind)>,
    rows: usize,
) -> io::Result<Vec<Column>> {
    let r = &mut bytes;
    let mut columns = Vec::with_capacity(descriptors.len());
    for (name, kind) in descriptors {
        let data = match kind {
            ColumnKind::Float => {
                check_rows(rows, 9, r.len())?;
                let mut present = vec![0u8; rows];
                r.read_exact(&mut present)?;
                let mut values = Vec::with_capacity(rows);
                for p in present {
                    let v = read_f64(r)?;
                    values.push((p != 0).then_some(v));
                }
                ColumnData::Float(values)
            }
            ColumnKind::Text => {
                check_rows(rows, 4, r.len())?;
                let mut values = Vec::with_capacity(rows);
                for _ in 0..rows {
                    let len = read_u32(r)?;
                    if len == NULL_TEXT {
                        values.push(None);
                        continue;
                    }
                    let buf = read_bytes(r, len as u64)?;
                    let s = String::from_utf8(buf).map_err(|e| invalid(e.to_string()))?;
                    values.push(Some(s));
                }
                ColumnData::Text(values)
            }
        };
        columns.push(Column { name, data });
    }
    if !r.is_empty() {
        return Err(invalid(format!("{} trailing payload bytes", r.len())));
    }
    Ok(columns)
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Upper bound on the LZ4 expansion ratio.
#[cfg(feature = "lz4")]
const LZ4_MAX_RATIO: usize = 255;

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    let prefix: [u8; 4] = data
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("LZ4 payload shorter than its size prefix".to_string()))?;
    let size = u32::from_le_bytes(prefix) as usize;
    if size > (data.len() - 4).saturating_mul(LZ4_MAX_RATIO) {
        return Err(invalid(format!(
            "LZ4 size prefix {} exceeds what {} compressed bytes can hold",
            size,
            data.len() - 4
        )));
    }
    lz4_flex::decompress_size_prepended(data).map_err(|e| invalid(e.to_string()))
}

#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(invalid(
        "Table is LZ4 compressed but LZ4 support is not enabled".to_string(),
    ))
}

/// Write a table.
pub fn write_table<W: Write>(
    table: &Table,
    w: &mut W,
    compression: CompressionType,
) -> io::Result<()> {
    let compression = compression.effective();
    let header = TableHeader {
        compression,
        columns: table.num_columns() as u32,
        rows: table.num_rows() as u64,
    };
    header.write_to(w)?;

    for column in table.columns() {
        w.write_all(&(column.name.len() as u32).to_le_bytes())?;
        w.write_all(column.name.as_bytes())?;
        let kind = match column.data {
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
        };
        w.write_all(&[kind as u8])?;
    }

    let payload = encode_columns(table.columns());
    let payload = match compression {
        CompressionType::None => payload,
        CompressionType::Lz4 => compress_lz4(&payload),
    };
    w.write_all(&(payload.len() as u64).to_le_bytes())?;
    w.write_all(&payload)?;
    Ok(())
}

/// Read a table written by [`write_table`].
pub fn read_table<R: Read>(r: &mut R) -> io::Result<Table> {
    let header = TableHeader::read_from(r)?;

    let mut descriptors = Vec::new();
    for _ in 0..header.columns {
        let len = read_u32(r)?;
        let name = read_bytes(r, len as u64)?;
        let name = String::from_utf8(name).map_err(|e| invalid(e.to_string()))?;

        let mut kind = [0u8; 1];
        r.read_exact(&mut kind)?;
        let kind = match kind[0] {
            0 => ColumnKind::Float,
            1 => ColumnKind::Text,
            other => return Err(invalid(format!("Unknown column kind {} for `{}`", other, name))),
        };
        descriptors.push((name, kind));
    }

    let size = read_u64(r)?;
    let payload = read_bytes(r, size)?;
    let payload = match header.compression {
        CompressionType::None => payload,
        CompressionType::Lz4 => decompress_lz4(&payload)?,
    };

    let rows = usize::try_from(header.rows)
        .map_err(|_| invalid(format!("Row count {} out of range", header.rows)))?;
    let columns = decode_columns(&payload, descriptors, rows)?;
    Table::from_columns(columns).map_err(|e| invalid(e.to_string()))
}

/// Write a table to `path`.
pub fn write_table_file<P: AsRef<Path>>(
    path: P,
    table: &Table,
    compression: CompressionType,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_table(table, &mut writer, compression)?;
    writer.flush()
}

/// Read a table from `path`.
pub fn read_table_file<P: AsRef<Path>>(path: P) -> io::Result<Table> {
    let mut reader = BufReader::new(File::open(path)?);
    read_table(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column {
                name: "id".into(),
                data: ColumnData::Text(vec![Some("r1".into()), None, Some("r3 ü".into())]),
            },
            Column {
                name: "energy".into(),
                data: ColumnData::Float(vec![Some(1.5), Some(-2.0), None]),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_header_size() {
        let header = TableHeader {
            compression: CompressionType::Lz4,
            columns: 7,
            rows: 1000,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), TableHeader::SIZE);
        assert_eq!(TableHeader::read_from(&mut Cursor::new(&buf)).unwrap(), header);
    }

    #[test]
    fn test_table_preserves_missing_cells() {
        let table = sample();
        let mut buf = Vec::new();
        write_table(&table, &mut buf, CompressionType::None).unwrap();
        let decoded = read_table(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn test_compressed_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.ptbl");

        let table = sample();
        write_table_file(&path, &table, CompressionType::Lz4).unwrap();
        assert_eq!(read_table_file(&path).unwrap(), table);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let err = read_table(&mut Cursor::new(b"NOPE\x01\x00")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut buf = Vec::new();
        write_table(&sample(), &mut buf, CompressionType::None).unwrap();
        buf.truncate(buf.len() - 3);
        assert!(read_table(&mut Cursor::new(&buf)).is_err());
    }

    /// Offset of the payload size field in the encoding of `sample()`.
    fn payload_size_offset() -> usize {
        TableHeader::SIZE + (4 + 2 + 1) + (4 + 6 + 1)
    }

    #[test]
    fn test_huge_payload_size_is_an_error() {
        let mut buf = Vec::new();
        write_table(&sample(), &mut buf, CompressionType::None).unwrap();
        let at = payload_size_offset();
        buf[at..at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = read_table(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_huge_row_count_is_invalid() {
        let mut buf = Vec::new();
        write_table(&sample(), &mut buf, CompressionType::None).unwrap();
        // Row count lives at bytes 12..20 of the header.
        buf[12..20].copy_from_slice(&(u32::MAX as u64).to_le_bytes());
        let err = read_table(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_huge_name_length_is_an_error() {
        let mut buf = Vec::new();
        write_table(&sample(), &mut buf, CompressionType::None).unwrap();
        let at = TableHeader::SIZE;
        buf[at..at + 4].copy_from_slice(&(u32::MAX - 1).to_le_bytes());
        assert!(read_table(&mut Cursor::new(&buf)).is_err());
    }
}
