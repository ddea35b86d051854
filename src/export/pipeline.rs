//! Export and hypervolume pipelines over a set of evaluation records.
//!
//! Records are decoded once, turned into column tables and written in the
//! configured format. The hypervolume pipeline orders individuals by
//! evaluation time, orients and normalizes their objectives, groups them by
//! seed and writes the combined and per-seed series as one table.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::SecondsFormat;

use crate::compute::{
    HypervolumeSeries, MultiSeedAggregator, NormalizationReport,
    ProgressReport, ProgressTracker, RecordNormalizer, SeedStreams, non_dominated_indices,
};
use crate::schema::{
    AnalysisConfig, Individual, ObjectiveSchema, Orientation, OutputFormat, SeedId, SeedMode,
    parse_timestamp, sort_by_evaluation,
};

use super::csv::write_csv_file;
use super::error::ExportError;
use super::format::{CompressionType, write_table_file};
use super::loader::{LoadReport, RecordLoader};
use super::source::{InputSource, read_table_any, resolve_input};
use super::table::{ColumnData, Table};

/// Record identity column joining metrics and variables.
pub const ID_COLUMN: &str = "id";
pub const EVALUATED_AT_COLUMN: &str = "evaluated_at";
pub const SEED_COLUMN: &str = "search_seed";
pub const SEARCH_ID_COLUMN: &str = "search_id";

/// Columns that never hold objectives.
pub const NON_OBJECTIVE_COLUMNS: [&str; 4] =
    [ID_COLUMN, EVALUATED_AT_COLUMN, SEED_COLUMN, SEARCH_ID_COLUMN];

/// Table column for an objective or variable called `name`. Names that
/// would shadow an identity column get a `<kind>_` prefix.
pub fn data_column(kind: &str, name: &str) -> String {
    if NON_OBJECTIVE_COLUMNS.contains(&name) {
        format!("{}_{}", kind, name)
    } else {
        name.to_string()
    }
}

/// Objective name behind a table column, undoing [`data_column`].
fn objective_name(column: &str) -> &str {
    column
        .strip_prefix("objective_")
        .filter(|n| NON_OBJECTIVE_COLUMNS.contains(n))
        .unwrap_or(column)
}

fn objective_columns(schema: &ObjectiveSchema) -> Vec<String> {
    schema.names.iter().map(|n| data_column("objective", n)).collect()
}

/// Hypervolume table column holding the combined series.
pub const COMBINED_COLUMN: &str = "all";

/// Seed key for individuals without a seed.
const UNSEEDED: &str = "unseeded";

// ============================================================================
// Tables
// ============================================================================

fn identity_columns(individuals: &[Individual]) -> Result<Table, ExportError> {
    let mut table = Table::new();
    table.push_column(
        ID_COLUMN,
        ColumnData::Text(individuals.iter().map(|i| Some(i.id.clone())).collect()),
    )?;
    table.push_column(
        EVALUATED_AT_COLUMN,
        ColumnData::Text(
            individuals
                .iter()
                .map(|i| Some(i.evaluated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
                .collect(),
        ),
    )?;
    table.push_column(
        SEED_COLUMN,
        ColumnData::Text(
            individuals
                .iter()
                .map(|i| i.seed.as_ref().map(|s| s.to_string()))
                .collect(),
        ),
    )?;
    table.push_column(
        SEARCH_ID_COLUMN,
        ColumnData::Text(individuals.iter().map(|i| i.search_id.clone()).collect()),
    )?;
    Ok(table)
}

/// Identity columns plus one raw-valued column per objective.
pub fn metrics_table(
    individuals: &[Individual],
    schema: &ObjectiveSchema,
) -> Result<Table, ExportError> {
    let mut table = identity_columns(individuals)?;
    let values: Vec<Vec<f64>> = individuals.iter().map(Individual::objective_values).collect();
    for (j, name) in objective_columns(schema).into_iter().enumerate() {
        table.push_column(
            name,
            ColumnData::Float(values.iter().map(|v| v.get(j).copied()).collect()),
        )?;
    }
    Ok(table)
}

/// Names of all decision variables, in first-seen order.
pub fn variable_names(individuals: &[Individual]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for individual in individuals {
        for v in &individual.variables {
            if !names.contains(&v.name) {
                names.push(v.name.clone());
            }
        }
    }
    names
}

/// Identity columns plus one column per decision variable.
pub fn variables_table(individuals: &[Individual]) -> Result<Table, ExportError> {
    let mut table = identity_columns(individuals)?;
    for name in variable_names(individuals) {
        let column = individuals
            .iter()
            .map(|i| i.variables.iter().find(|v| v.name == name).map(|v| v.value))
            .collect();
        table.push_column(data_column("variable", &name), ColumnData::Float(column))?;
    }
    Ok(table)
}

/// One row per distinct evaluation count, one column per series.
///
/// Series sample different nfe values (the combined series is expressed
/// per seed), so cells where a series has no sample are left empty.
pub fn hypervolume_table(report: &ProgressReport) -> Result<Table, ExportError> {
    let mut named: Vec<(String, &HypervolumeSeries)> =
        vec![(COMBINED_COLUMN.to_string(), &report.combined)];
    named.extend(report.per_seed.iter().map(|(seed, s)| (seed.to_string(), s)));

    let mut nfe: Vec<f64> = named
        .iter()
        .flat_map(|(_, s)| s.iter().map(|p| p.nfe))
        .collect();
    nfe.sort_by(f64::total_cmp);
    nfe.dedup();

    let mut table = Table::new();
    table.push_column("nfe", ColumnData::Float(nfe.iter().copied().map(Some).collect()))?;
    for (name, series) in named {
        let by_nfe: HashMap<u64, f64> = series
            .iter()
            .map(|p| (p.nfe.to_bits(), p.hypervolume))
            .collect();
        let column = nfe.iter().map(|x| by_nfe.get(&x.to_bits()).copied()).collect();
        table.push_column(data_column("variable", &name), ColumnData::Float(column))?;
    }
    Ok(table)
}

// ============================================================================
// Observations
// ============================================================================

/// Time-ordered, oriented objective vectors with their seeds.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    pub names: Vec<String>,
    pub orientation: Vec<Orientation>,
    pub rows: Vec<Vec<f64>>,
    pub seeds: Vec<Option<SeedId>>,
}

impl Observations {
    /// From decoded records, sorted by evaluation time.
    pub fn from_individuals(mut individuals: Vec<Individual>, schema: &ObjectiveSchema) -> Self {
        sort_by_evaluation(&mut individuals);
        Self {
            names: objective_columns(schema),
            orientation: schema.orientation.clone(),
            rows: individuals.iter().map(Individual::oriented_objectives).collect(),
            seeds: individuals.into_iter().map(|i| i.seed).collect(),
        }
    }

    /// From an exported metrics table. Every numeric column outside the
    /// identity columns is an objective, oriented by `orientation_of`.
    pub fn from_table(
        table: &Table,
        orientation_of: impl Fn(&str) -> Orientation,
    ) -> Result<Self, ExportError> {
        let names: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| !NON_OBJECTIVE_COLUMNS.contains(&c.name.as_str()))
            .filter(|c| matches!(c.data, ColumnData::Float(_)))
            .map(|c| c.name.clone())
            .collect();
        if names.is_empty() {
            return Err(ExportError::Malformed("table has no objective columns".to_string()));
        }
        let orientation: Vec<Orientation> =
            names.iter().map(|n| orientation_of(objective_name(n))).collect();

        let raw = table.float_rows(&names)?;
        let seeds: Vec<Option<SeedId>> = match table.column(SEED_COLUMN) {
            Some(_) => table
                .text_values(SEED_COLUMN)?
                .into_iter()
                .map(|s| s.map(SeedId::new))
                .collect(),
            None => vec![None; raw.len()],
        };

        let mut order: Vec<usize> = (0..raw.len()).collect();
        if table.column(EVALUATED_AT_COLUMN).is_some() {
            let times = table
                .text_values(EVALUATED_AT_COLUMN)?
                .into_iter()
                .enumerate()
                .map(|(row, t)| {
                    let t = t.ok_or_else(|| ExportError::MissingValue {
                        column: EVALUATED_AT_COLUMN.to_string(),
                        row,
                    })?;
                    Ok(parse_timestamp("evaluated_at", &t)?)
                })
                .collect::<Result<Vec<_>, ExportError>>()?;
            order.sort_by_key(|&r| times[r]);
        } else {
            log::warn!("Table has no `{}` column; keeping row order", EVALUATED_AT_COLUMN);
        }

        Ok(Self {
            rows: order
                .iter()
                .map(|&r| {
                    raw[r]
                        .iter()
                        .zip(&orientation)
                        .map(|(&v, o)| o.orient(v))
                        .collect()
                })
                .collect(),
            seeds: order.iter().map(|&r| seeds[r].clone()).collect(),
            names,
            orientation,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn objectives(&self) -> usize {
        self.names.len()
    }

    /// Split into per-seed streams, keeping time order within each seed.
    pub fn by_seed(&self) -> SeedStreams {
        let mut streams: SeedStreams = BTreeMap::new();
        for (row, seed) in self.rows.iter().zip(&self.seeds) {
            let seed = seed.clone().unwrap_or_else(|| SeedId::new(UNSEEDED));
            streams.entry(seed).or_default().push(row.clone());
        }
        streams
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Files written by an export.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub individuals: usize,
    pub skipped: usize,
    pub outputs: Vec<PathBuf>,
}

/// Result of the hypervolume pipeline.
#[derive(Debug, Clone)]
pub struct HypervolumeOutcome {
    pub report: ProgressReport,
    pub normalization: Option<NormalizationReport>,
    pub output: PathBuf,
}

/// Runs exports and hypervolume tracking with one configuration.
#[derive(Debug, Clone)]
pub struct ExportPipeline {
    config: AnalysisConfig,
}

impl ExportPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, ExportError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn pool(&self) -> Result<rayon::ThreadPool, ExportError> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .build()?)
    }

    /// Decode every record in `input_dir` on the worker pool.
    pub fn load(&self, input_dir: &Path) -> Result<LoadReport, ExportError> {
        let loader = RecordLoader::new(&self.config.export);
        self.pool()?.install(|| loader.load(input_dir))
    }

    /// Write `table` as `<output_dir>/<name>.<ext>`.
    pub fn write_table(
        &self,
        output_dir: &Path,
        name: &str,
        table: &Table,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(output_dir)?;
        let format = self.config.export.format;
        let path = output_dir.join(format!("{}.{}", name, format.extension()));
        match format {
            OutputFormat::Csv => write_csv_file(&path, table, false)?,
            OutputFormat::CsvGz => write_csv_file(&path, table, true)?,
            OutputFormat::Binary => {
                let compression = if self.config.export.compress {
                    CompressionType::Lz4
                } else {
                    CompressionType::None
                };
                write_table_file(&path, table, compression)?
            }
        }
        log::info!(
            "Wrote {} rows x {} columns to {}",
            table.num_rows(),
            table.num_columns(),
            path.display()
        );
        Ok(path)
    }

    /// Metrics, variables and their join.
    pub fn tables(&self, loaded: &LoadReport) -> Result<(Table, Table, Table), ExportError> {
        let metrics = metrics_table(&loaded.individuals, &loaded.schema)?;
        let variables = variables_table(&loaded.individuals)?;
        let combined = metrics.join(&variables, ID_COLUMN)?;
        Ok((metrics, variables, combined))
    }

    /// Non-dominated rows of the joined table, after dropping rows that
    /// repeat an earlier row's decision variables.
    pub fn nondominated(&self, loaded: &LoadReport) -> Result<Table, ExportError> {
        let (_, _, combined) = self.tables(loaded)?;
        let variables: Vec<String> = variable_names(&loaded.individuals)
            .iter()
            .map(|n| data_column("variable", n))
            .collect();
        let unique = combined.dedup_rows(&variables)?;

        let raw = unique.float_rows(&objective_columns(&loaded.schema))?;
        let oriented: Vec<Vec<f64>> = raw
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&loaded.schema.orientation)
                    .map(|(&v, o)| o.orient(v))
                    .collect()
            })
            .collect();
        let refs: Vec<&[f64]> = oriented.iter().map(Vec::as_slice).collect();

        let start = Instant::now();
        let front = non_dominated_indices(&refs)?;
        log::info!(
            "Non-dominated sort of {} unique individuals complete in {:.2}s; {} on the front",
            refs.len(),
            start.elapsed().as_secs_f64(),
            front.len()
        );
        Ok(unique.select_rows(&front))
    }

    /// Write metrics, variables and metrics-and-variables tables.
    pub fn export_all(&self, input_dir: &Path, output_dir: &Path) -> Result<ExportSummary, ExportError> {
        let loaded = self.load(input_dir)?;
        let (metrics, variables, combined) = self.tables(&loaded)?;
        let names = &self.config.export;
        let outputs = vec![
            self.write_table(output_dir, &names.metrics_file_name, &metrics)?,
            self.write_table(output_dir, &names.variables_file_name, &variables)?,
            self.write_table(output_dir, &names.combined_file_name, &combined)?,
        ];
        Ok(ExportSummary {
            individuals: loaded.individuals.len(),
            skipped: loaded.skipped.len(),
            outputs,
        })
    }

    /// Write the non-dominated table.
    pub fn export_nondominated(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<ExportSummary, ExportError> {
        let loaded = self.load(input_dir)?;
        let front = self.nondominated(&loaded)?;
        let output =
            self.write_table(output_dir, &self.config.export.nondominated_file_name, &front)?;
        Ok(ExportSummary {
            individuals: loaded.individuals.len(),
            skipped: loaded.skipped.len(),
            outputs: vec![output],
        })
    }

    /// Read observations from a record directory or an exported table.
    pub fn observations(&self, input: &Path) -> Result<Observations, ExportError> {
        match resolve_input(input)? {
            InputSource::Records(dir) => {
                let loaded = self.load(&dir)?;
                Ok(Observations::from_individuals(loaded.individuals, &loaded.schema))
            }
            InputSource::Table(path) => {
                let table = read_table_any(&path)?;
                Observations::from_table(&table, |name| self.config.export.orientation_of(name))
            }
        }
    }

    /// Combined and per-seed hypervolume series for `observations`.
    ///
    /// Objectives are normalized in place first when enabled.
    pub fn track(
        &self,
        observations: &mut Observations,
    ) -> Result<(ProgressReport, Option<NormalizationReport>), ExportError> {
        let normalization = if self.config.normalization.enabled {
            let normalizer = RecordNormalizer::new(&self.config.normalization);
            Some(normalizer.normalize(&mut observations.rows, &observations.names)?)
        } else {
            None
        };

        let objectives = observations.objectives();
        let tracker =
            ProgressTracker::new(&self.config.tracker, &self.config.hypervolume, objectives)?;
        log::info!(
            "Tracking {} individuals over {} objectives with {:?}",
            observations.len(),
            objectives,
            tracker.estimator().method()
        );

        let streams = observations.by_seed();
        let interleave = match self.config.seeds {
            SeedMode::Single => false,
            SeedMode::Multi => true,
            SeedMode::Auto => streams.len() > 1,
        };

        let report = if interleave {
            let aggregator = MultiSeedAggregator::new(tracker);
            self.pool()?.install(|| aggregator.report(&streams))?
        } else {
            ProgressReport {
                combined: tracker.track(&observations.rows)?,
                ..Default::default()
            }
        };
        Ok((report, normalization))
    }

    /// Track hypervolume for `input` and write the series table.
    pub fn run_hypervolume(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<HypervolumeOutcome, ExportError> {
        let mut observations = self.observations(input)?;
        let (report, normalization) = self.track(&mut observations)?;
        let table = hypervolume_table(&report)?;
        let output =
            self.write_table(output_dir, &self.config.export.hypervolume_file_name, &table)?;
        Ok(HypervolumeOutcome {
            report,
            normalization,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::csv::read_csv_file;
    use crate::export::format::read_table_file;
    use crate::export::loader::tests::record_json;

    /// Records for two seeds, ten evaluations each, one second apart.
    fn write_records(dir: &Path) {
        for seed in 0..2u32 {
            for k in 0..10u32 {
                let t = format!("2021-03-01T10:00:{:02}", k * 2 + seed);
                let x = (k as f64 + 0.5 * seed as f64) / 10.0;
                let cost = 10.0 * x;
                let energy = 100.0 * (1.0 - x * x) + seed as f64;
                fs::write(
                    dir.join(format!("s{}-{:03}.json", seed, k)),
                    record_json(&t, seed, cost, energy, x),
                )
                .unwrap();
            }
        }
        // Same decision variables as s0-000, dominated objectives.
        fs::write(
            dir.join("s0-999.json"),
            record_json("2021-03-01T11:00:00", 0, 50.0, 1.0, 0.0),
        )
        .unwrap();
        fs::write(dir.join("search.json"), "{}").unwrap();
    }

    fn pipeline(f: impl FnOnce(&mut AnalysisConfig)) -> ExportPipeline {
        let mut config = AnalysisConfig::default();
        config.workers = Some(2);
        f(&mut config);
        ExportPipeline::new(config).unwrap()
    }

    #[test]
    fn test_export_all() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_records(input.path());

        let summary = pipeline(|_| {})
            .export_all(input.path(), output.path())
            .unwrap();
        assert_eq!(summary.individuals, 21);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.outputs.len(), 3);

        let combined = read_csv_file(output.path().join("metrics_and_vars.csv")).unwrap();
        assert_eq!(combined.num_rows(), 21);
        assert_eq!(
            combined.column_names().collect::<Vec<_>>(),
            vec!["id", "evaluated_at", "search_seed", "search_id", "cost", "energy", "x"]
        );
    }

    #[test]
    fn test_nondominated_dedups_and_orients() {
        let input = tempfile::tempdir().unwrap();
        write_records(input.path());

        let p = pipeline(|_| {});
        let loaded = p.load(input.path()).unwrap();
        let front = p.nondominated(&loaded).unwrap();

        let ids = front.text_values(ID_COLUMN).unwrap();
        assert!(!ids.contains(&Some("s0-999".to_string())));
        assert!(ids.contains(&Some("s0-000".to_string())));

        // Front members are mutually non-dominated under (min cost, max energy).
        let rows = front.float_rows(&["cost".into(), "energy".into()]).unwrap();
        for a in &rows {
            for b in &rows {
                let dominates = a[0] <= b[0] && a[1] >= b[1] && (a[0] < b[0] || a[1] > b[1]);
                assert!(!dominates);
            }
        }
    }

    #[test]
    fn test_export_nondominated_binary() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_records(input.path());

        let p = pipeline(|c| c.export.format = OutputFormat::Binary);
        let summary = p.export_nondominated(input.path(), output.path()).unwrap();
        assert!(summary.outputs[0].ends_with("nondominated.ptbl"));

        let table = read_table_file(&summary.outputs[0]).unwrap();
        assert_eq!(table, p.nondominated(&p.load(input.path()).unwrap()).unwrap());
    }

    #[test]
    fn test_hypervolume_from_records() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_records(input.path());

        let p = pipeline(|c| c.tracker.step = 5);
        let outcome = p.run_hypervolume(input.path(), output.path()).unwrap();

        // Seed 0 has 11 records, seed 1 has 10: rounds at 5 and 10 per seed.
        let nfe: Vec<f64> = outcome.report.combined.iter().map(|s| s.nfe).collect();
        assert_eq!(nfe, vec![2.5, 5.0]);
        assert!(outcome.report.combined.is_non_decreasing());
        assert_eq!(outcome.report.per_seed.len(), 2);
        assert!(outcome.normalization.is_some());

        let table = read_csv_file(&outcome.output).unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["nfe", "all", "0", "1"]
        );
        // nfe union: 2.5, 5 (combined and per seed) and 10 (per seed).
        assert_eq!(table.num_rows(), 3);
    }

    #[test]
    fn test_hypervolume_from_exported_table() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_records(input.path());

        let p = pipeline(|c| {
            c.tracker.step = 5;
            c.export.maximize = vec!["energy".to_string()];
        });
        p.export_all(input.path(), output.path()).unwrap();

        let from_records = p.run_hypervolume(input.path(), output.path()).unwrap();
        let from_table = p
            .run_hypervolume(&output.path().join("all_individuals"), output.path())
            .unwrap();
        assert_eq!(from_table.report.combined, from_records.report.combined);
    }

    #[test]
    fn test_single_seed_mode() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_records(input.path());

        let p = pipeline(|c| {
            c.tracker.step = 7;
            c.seeds = SeedMode::Single;
        });
        let outcome = p.run_hypervolume(input.path(), output.path()).unwrap();
        let nfe: Vec<f64> = outcome.report.combined.iter().map(|s| s.nfe).collect();
        assert_eq!(nfe, vec![7.0, 14.0, 21.0]);
        assert!(outcome.report.per_seed.is_empty());
    }

    #[test]
    fn test_missing_input() {
        let output = tempfile::tempdir().unwrap();
        let err = pipeline(|_| {})
            .run_hypervolume(&output.path().join("nothing"), output.path())
            .unwrap_err();
        assert!(matches!(err, ExportError::NoSource(_)));
    }

    /// A record with two minimized objectives and no decision variables.
    fn bare_record(evaluated_at: &str, first: (&str, f64), second: (&str, f64)) -> String {
        format!(
            r#"{{
                "metrics": [
                    {{"name": "{}", "value": {}, "objective": true, "constraint": false, "minimise": true}},
                    {{"name": "{}", "value": {}, "objective": true, "constraint": false, "minimise": true}}
                ],
                "evaluated_at": "{}",
                "search_seed": 0
            }}"#,
            first.0, first.1, second.0, second.1, evaluated_at
        )
    }

    #[test]
    fn test_nondominated_without_variables_keeps_front() {
        let input = tempfile::tempdir().unwrap();
        for k in 0..4u32 {
            let a = k as f64;
            fs::write(
                input.path().join(format!("r{}.json", k)),
                bare_record(
                    &format!("2021-03-01T10:00:0{}", k),
                    ("cost", a),
                    ("mass", 3.0 - a),
                ),
            )
            .unwrap();
        }

        let p = pipeline(|_| {});
        let loaded = p.load(input.path()).unwrap();
        assert_eq!(loaded.individuals.len(), 4);
        let front = p.nondominated(&loaded).unwrap();
        assert_eq!(front.num_rows(), 4);
    }

    #[test]
    fn test_objective_named_like_identity_column() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        for k in 0..4u32 {
            let a = k as f64;
            fs::write(
                input.path().join(format!("r{}.json", k)),
                bare_record(&format!("2021-03-01T10:00:0{}", k), ("id", a), ("mass", 3.0 - a)),
            )
            .unwrap();
        }

        let p = pipeline(|c| c.tracker.step = 2);
        let summary = p.export_all(input.path(), output.path()).unwrap();
        assert_eq!(summary.individuals, 4);

        let combined = read_csv_file(output.path().join("metrics_and_vars.csv")).unwrap();
        let names: Vec<_> = combined.column_names().collect();
        assert!(names.contains(&"id"));
        assert!(names.contains(&"objective_id"));

        let from_records = p.run_hypervolume(input.path(), output.path()).unwrap();
        let from_table = p
            .run_hypervolume(&output.path().join("all_individuals"), output.path())
            .unwrap();
        assert_eq!(from_table.report.combined, from_records.report.combined);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::default();
        config.tracker.step = 0;
        assert!(matches!(
            ExportPipeline::new(config),
            Err(ExportError::Config(_))
        ));
    }
}
