//! Loading a directory of evaluation records.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use rayon::prelude::*;

use crate::schema::{ExportConfig, Individual, ObjectiveSchema};

use super::error::ExportError;

/// A record file that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Records decoded from a directory.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Decoded records in file name order.
    pub individuals: Vec<Individual>,
    /// Objective schema shared by every record.
    pub schema: ObjectiveSchema,
    pub skipped: Vec<SkippedRecord>,
}

/// Reads `*.json` and `*.json.gz` record files, one evaluation each.
#[derive(Debug, Clone)]
pub struct RecordLoader {
    search_file_suffix: String,
}

impl RecordLoader {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            search_file_suffix: config.search_file_suffix.clone(),
        }
    }

    /// Record identity and whether the file is a record at all.
    fn record_id<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let json = file_name.strip_suffix(".gz").unwrap_or(file_name);
        if json.ends_with(&self.search_file_suffix) {
            return None;
        }
        json.strip_suffix(".json")
    }

    /// Record files in `dir`, sorted by name.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.record_id(n).is_some());
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("Found {} record files in {}", paths.len(), dir.display());
        Ok(paths)
    }

    /// Decode one record file.
    pub fn load_file(&self, path: &Path) -> Result<Individual, ExportError> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let id = self
            .record_id(file_name)
            .ok_or_else(|| ExportError::Malformed(format!("{} is not a record file", path.display())))?;

        let reader = BufReader::new(File::open(path)?);
        let mut json = String::new();
        if file_name.ends_with(".gz") {
            GzDecoder::new(reader).read_to_string(&mut json)?;
        } else {
            let mut reader = reader;
            reader.read_to_string(&mut json)?;
        }
        Ok(Individual::from_json_str(id, &json)?)
    }

    /// Decode every record in `dir` in parallel.
    ///
    /// Unreadable records and records whose objectives differ from the first
    /// decoded record are skipped and reported.
    pub fn load(&self, dir: &Path) -> Result<LoadReport, ExportError> {
        let paths = self.discover(dir)?;
        let decoded: Vec<(PathBuf, Result<Individual, ExportError>)> = paths
            .into_par_iter()
            .map(|path| {
                let result = self.load_file(&path);
                (path, result)
            })
            .collect();

        let mut schema: Option<ObjectiveSchema> = None;
        let mut individuals = Vec::with_capacity(decoded.len());
        let mut skipped = Vec::new();
        for (path, result) in decoded {
            let checked = result.and_then(|individual| {
                let found = individual.schema();
                match &schema {
                    Some(expected) => expected.check(&found)?,
                    None => schema = Some(found),
                }
                Ok(individual)
            });
            match checked {
                Ok(individual) => individuals.push(individual),
                Err(err) => {
                    log::warn!("Skipping {}: {}", path.display(), err);
                    skipped.push(SkippedRecord {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let Some(schema) = schema else {
            return Err(ExportError::NoRecords(dir.to_path_buf()));
        };
        log::info!(
            "Loaded {} individuals with objectives {} ({} skipped)",
            individuals.len(),
            schema,
            skipped.len()
        );
        Ok(LoadReport {
            individuals,
            schema,
            skipped,
        })
    }
}
