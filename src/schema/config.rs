//! Configuration types for hypervolume tracking and result export.

use serde::{Deserialize, Serialize};

use super::Orientation;

/// Top-level analysis configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Chunking and reference point for progress tracking.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Hypervolume method selection.
    #[serde(default)]
    pub hypervolume: HypervolumeConfig,
    /// Objective rescaling before hypervolume computation.
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// How seeds are combined.
    #[serde(default)]
    pub seeds: SeedMode,
    /// Output files and formats.
    #[serde(default)]
    pub export: ExportConfig,
    /// Worker pool size. `None` uses one worker per core.
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Progress tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Chunk size in function evaluations.
    #[serde(default = "default_step")]
    pub step: usize,
    /// Reference point in oriented space. Defaults to all ones.
    #[serde(default)]
    pub reference_point: Option<Vec<f64>>,
    /// Record the trailing partial chunk as a final point.
    #[serde(default)]
    pub include_final: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            reference_point: None,
            include_final: false,
        }
    }
}

fn default_step() -> usize {
    50
}

impl TrackerConfig {
    /// Reference point for `objectives` objectives.
    pub fn reference_for(&self, objectives: usize) -> Vec<f64> {
        self.reference_point
            .clone()
            .unwrap_or_else(|| vec![1.0; objectives])
    }
}

/// Hypervolume computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypervolumeConfig {
    /// Highest objective count computed exactly; above this Monte-Carlo is used.
    #[serde(default = "default_exact_max_objectives")]
    pub exact_max_objectives: usize,
    /// Number of Monte-Carlo samples.
    #[serde(default = "default_monte_carlo_samples")]
    pub monte_carlo_samples: usize,
    /// RNG seed for Monte-Carlo samples.
    #[serde(default = "default_monte_carlo_seed")]
    pub monte_carlo_seed: u64,
    /// Lower corner of the Monte-Carlo sampling box. Defaults to zeros.
    #[serde(default)]
    pub lower_bound: Option<Vec<f64>>,
}

impl Default for HypervolumeConfig {
    fn default() -> Self {
        Self {
            exact_max_objectives: default_exact_max_objectives(),
            monte_carlo_samples: default_monte_carlo_samples(),
            monte_carlo_seed: default_monte_carlo_seed(),
            lower_bound: None,
        }
    }
}

fn default_exact_max_objectives() -> usize {
    3
}
fn default_monte_carlo_samples() -> usize {
    100_000
}
fn default_monte_carlo_seed() -> u64 {
    0x5EED_0F_F00D
}

/// Min-max normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Rescale objective columns to [0, 1].
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Columns whose range is below this are treated as constant.
    #[serde(default = "default_degenerate_range")]
    pub degenerate_range: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            degenerate_range: default_degenerate_range(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_degenerate_range() -> f64 {
    1e-3
}

/// How per-seed streams are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Interleave when more than one seed is present.
    #[default]
    Auto,
    /// Treat all individuals as a single stream.
    Single,
    /// Always interleave by seed.
    Multi,
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    CsvGz,
    /// Columnar binary table (`.ptbl`).
    Binary,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::CsvGz => "csv.gz",
            Self::Binary => "ptbl",
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Compress binary tables with LZ4 (requires the `lz4` feature).
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_metrics_file_name")]
    pub metrics_file_name: String,
    #[serde(default = "default_variables_file_name")]
    pub variables_file_name: String,
    #[serde(default = "default_combined_file_name")]
    pub combined_file_name: String,
    #[serde(default = "default_nondominated_file_name")]
    pub nondominated_file_name: String,
    #[serde(default = "default_hypervolume_file_name")]
    pub hypervolume_file_name: String,
    /// Files whose name ends with this hold search metadata, not evaluations.
    #[serde(default = "default_search_file_suffix")]
    pub search_file_suffix: String,
    /// Objective orientation for tables that carry no flags, by column name.
    /// Columns not listed are minimized.
    #[serde(default)]
    pub maximize: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            compress: false,
            metrics_file_name: default_metrics_file_name(),
            variables_file_name: default_variables_file_name(),
            combined_file_name: default_combined_file_name(),
            nondominated_file_name: default_nondominated_file_name(),
            hypervolume_file_name: default_hypervolume_file_name(),
            search_file_suffix: default_search_file_suffix(),
            maximize: Vec::new(),
        }
    }
}

fn default_metrics_file_name() -> String {
    "all_individuals".to_string()
}
fn default_variables_file_name() -> String {
    "all_variables".to_string()
}
fn default_combined_file_name() -> String {
    "metrics_and_vars".to_string()
}
fn default_nondominated_file_name() -> String {
    "nondominated".to_string()
}
fn default_hypervolume_file_name() -> String {
    "hypervolume".to_string()
}
fn default_search_file_suffix() -> String {
    "search.json".to_string()
}

impl ExportConfig {
    /// Orientation of a table column by name.
    pub fn orientation_of(&self, column: &str) -> Orientation {
        if self.maximize.iter().any(|m| m == column) {
            Orientation::Maximize
        } else {
            Orientation::Minimize
        }
    }
}

impl AnalysisConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.step == 0 {
            return Err(ConfigError::InvalidStep);
        }
        if let Some(reference) = &self.tracker.reference_point {
            if reference.is_empty() {
                return Err(ConfigError::EmptyReferencePoint);
            }
            if reference.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::NonFiniteReferencePoint);
            }
        }
        if self.hypervolume.exact_max_objectives < 2 {
            return Err(ConfigError::InvalidExactLimit(
                self.hypervolume.exact_max_objectives,
            ));
        }
        if self.hypervolume.monte_carlo_samples == 0 {
            return Err(ConfigError::InvalidSampleCount);
        }
        if let (Some(lower), Some(reference)) =
            (&self.hypervolume.lower_bound, &self.tracker.reference_point)
        {
            if lower.len() != reference.len() {
                return Err(ConfigError::BoundsLength {
                    lower: lower.len(),
                    reference: reference.len(),
                });
            }
            if lower.iter().zip(reference).any(|(l, r)| l >= r) {
                return Err(ConfigError::EmptySamplingBox);
            }
        }
        let degenerate = self.normalization.degenerate_range;
        if degenerate.is_nan() || degenerate < 0.0 {
            return Err(ConfigError::InvalidDegenerateRange);
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Step size must be non-zero")]
    InvalidStep,
    #[error("Reference point must have at least one objective")]
    EmptyReferencePoint,
    #[error("Reference point must be finite")]
    NonFiniteReferencePoint,
    #[error("Exact hypervolume limit must be at least 2 objectives, got {0}")]
    InvalidExactLimit(usize),
    #[error("Monte-Carlo sample count must be non-zero")]
    InvalidSampleCount,
    #[error("Lower bound has {lower} objectives but reference point has {reference}")]
    BoundsLength { lower: usize, reference: usize },
    #[error("Lower bound must be below the reference point on every objective")]
    EmptySamplingBox,
    #[error("Degenerate range threshold must be a non-negative number")]
    InvalidDegenerateRange,
    #[error("Worker count must be non-zero")]
    InvalidWorkers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker.step, 50);
        assert_eq!(config.tracker.reference_for(3), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"tracker": {"step": 10}, "seeds": "multi"}"#).unwrap();
        assert_eq!(config.tracker.step, 10);
        assert_eq!(config.seeds, SeedMode::Multi);
        assert_eq!(config.export.search_file_suffix, "search.json");
        assert_eq!(config.hypervolume.exact_max_objectives, 3);
    }

    #[test]
    fn test_zero_step_rejected() {
        let mut config = AnalysisConfig::default();
        config.tracker.step = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidStep)));
    }

    #[test]
    fn test_empty_sampling_box_rejected() {
        let mut config = AnalysisConfig::default();
        config.tracker.reference_point = Some(vec![1.0, 1.0]);
        config.hypervolume.lower_bound = Some(vec![0.0, 1.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySamplingBox)
        ));
    }

    #[test]
    fn test_orientation_by_column() {
        let config = ExportConfig {
            maximize: vec!["energy".to_string()],
            ..Default::default()
        };
        assert_eq!(config.orientation_of("energy"), Orientation::Maximize);
        assert_eq!(config.orientation_of("cost"), Orientation::Minimize);
    }

    #[test]
    fn test_serialization() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tracker.step, config.tracker.step);
        assert_eq!(parsed.export.format, OutputFormat::Csv);
    }
}
