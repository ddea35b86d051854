//! Export module - Record ingestion, tables and output files.
//!
//! # File formats
//!
//! Tables are written as CSV, gzip CSV or the binary `.ptbl` column format
//! described in [`format`]. Inputs to the hypervolume pipeline are probed
//! in the order given by [`TABLE_EXTENSIONS`].

mod csv;
mod error;
pub mod format;
mod loader;
mod pipeline;
mod source;
mod table;

pub use csv::{read_csv, read_csv_file, write_csv, write_csv_file};
pub use error::ExportError;
pub use format::{CompressionType, read_table_file, write_table_file};
pub use loader::{LoadReport, RecordLoader, SkippedRecord};
pub use pipeline::*;
pub use source::{InputSource, TABLE_EXTENSIONS, candidates, read_table_any, resolve_input};
pub use table::{Column, ColumnData, Table};
