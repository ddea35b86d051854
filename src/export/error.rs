//! Errors raised while loading records and writing tables.

use std::io;
use std::path::PathBuf;

use crate::compute::ParetoError;
use crate::schema::{ConfigError, RecordError};

/// Errors from the export and hypervolume pipelines.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Pareto(#[from] ParetoError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Column `{name}` has {found} rows, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate column `{0}`")]
    DuplicateColumn(String),
    #[error("Missing column `{0}`")]
    MissingColumn(String),
    #[error("Column `{column}` has no numeric value in row {row}")]
    MissingValue { column: String, row: usize },
    #[error("Malformed table: {0}")]
    Malformed(String),
    #[error("No evaluation records found in {}", .0.display())]
    NoRecords(PathBuf),
    #[error("No input found; tried {0}")]
    NoSource(String),
}
