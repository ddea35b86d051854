//! Resolution of an input argument to a record directory or a table file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::csv::read_csv_file;
use super::error::ExportError;
use super::format::read_table_file;
use super::table::Table;

/// Extensions probed, in order, when an input names a table without one.
pub const TABLE_EXTENSIONS: [&str; 3] = [".ptbl", ".csv", ".csv.gz"];

/// Where individuals are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Directory of JSON records.
    Records(PathBuf),
    /// Previously exported table.
    Table(PathBuf),
}

/// Candidate table paths for `stem`, in probing order.
pub fn candidates(stem: &Path) -> Vec<PathBuf> {
    TABLE_EXTENSIONS
        .iter()
        .map(|ext| {
            let mut name = OsString::from(stem.as_os_str());
            name.push(ext);
            PathBuf::from(name)
        })
        .collect()
}

/// Resolve `input`: an existing directory or file is used as is, otherwise
/// the first existing table candidate wins.
pub fn resolve_input(input: &Path) -> Result<InputSource, ExportError> {
    if input.is_dir() {
        return Ok(InputSource::Records(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(InputSource::Table(input.to_path_buf()));
    }

    let tried = candidates(input);
    match tried.iter().find(|p| p.is_file()) {
        Some(found) => {
            log::info!("Reading individuals from {}", found.display());
            Ok(InputSource::Table(found.clone()))
        }
        None => Err(ExportError::NoSource(
            tried
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

/// Read a table file, choosing the codec from its extension.
pub fn read_table_any(path: &Path) -> Result<Table, ExportError> {
    if path.extension().is_some_and(|ext| ext == "ptbl") {
        Ok(read_table_file(path)?)
    } else {
        read_csv_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_probe_order() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("all_individuals");

        assert!(matches!(
            resolve_input(&stem),
            Err(ExportError::NoSource(msg)) if msg.contains("all_individuals.csv.gz")
        ));

        fs::write(dir.path().join("all_individuals.csv.gz"), b"").unwrap();
        assert_eq!(
            resolve_input(&stem).unwrap(),
            InputSource::Table(dir.path().join("all_individuals.csv.gz"))
        );

        fs::write(dir.path().join("all_individuals.csv"), b"").unwrap();
        assert_eq!(
            resolve_input(&stem).unwrap(),
            InputSource::Table(dir.path().join("all_individuals.csv"))
        );
    }

    #[test]
    fn test_directory_and_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_input(dir.path()).unwrap(),
            InputSource::Records(dir.path().to_path_buf())
        );

        let file = dir.path().join("front.csv");
        fs::write(&file, "a\n1\n").unwrap();
        assert_eq!(resolve_input(&file).unwrap(), InputSource::Table(file.clone()));
        assert_eq!(read_table_any(&file).unwrap().num_rows(), 1);
    }
}
