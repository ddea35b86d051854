//! Min-max rescaling of objective columns onto [0, 1].

use serde::{Deserialize, Serialize};

use crate::schema::NormalizationConfig;

use super::error::{ParetoError, check_dims};

/// Observed bounds of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Bounds used for a normalization, and which columns were constant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub ranges: Vec<ColumnRange>,
    /// Indices of columns narrower than the degenerate threshold; mapped to 0.
    pub degenerate: Vec<usize>,
}

impl NormalizationReport {
    /// Rescale one row in place using these bounds.
    pub fn apply(&self, row: &mut [f64]) {
        for (j, (v, range)) in row.iter_mut().zip(&self.ranges).enumerate() {
            *v = if self.degenerate.contains(&j) {
                0.0
            } else {
                (*v - range.min) / range.width()
            };
        }
    }
}

/// Per-column min-max normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordNormalizer {
    degenerate_range: f64,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new(&NormalizationConfig::default())
    }
}

impl RecordNormalizer {
    pub fn new(config: &NormalizationConfig) -> Self {
        Self {
            degenerate_range: config.degenerate_range,
        }
    }

    /// Compute column bounds without modifying anything.
    pub fn fit(&self, rows: &[Vec<f64>]) -> Result<NormalizationReport, ParetoError> {
        let Some(first) = rows.first() else {
            return Ok(NormalizationReport::default());
        };
        let dims = first.len();
        let mut ranges = vec![
            ColumnRange {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            };
            dims
        ];
        for row in rows {
            check_dims(dims, row.len())?;
            for (range, &v) in ranges.iter_mut().zip(row) {
                if !v.is_finite() {
                    return Err(ParetoError::NonFinite);
                }
                range.min = range.min.min(v);
                range.max = range.max.max(v);
            }
        }

        let degenerate: Vec<usize> = ranges
            .iter()
            .enumerate()
            .filter(|(_, r)| r.width() <= 0.0 || r.width() < self.degenerate_range)
            .map(|(j, _)| j)
            .collect();

        Ok(NormalizationReport { ranges, degenerate })
    }

    /// Fit on `rows` and rescale them in place.
    ///
    /// `names` labels columns in warnings; pass an empty slice to use indices.
    pub fn normalize(
        &self,
        rows: &mut [Vec<f64>],
        names: &[String],
    ) -> Result<NormalizationReport, ParetoError> {
        let report = self.fit(rows)?;
        for &j in &report.degenerate {
            let range = report.ranges[j];
            match names.get(j) {
                Some(name) => log::warn!(
                    "Objective `{}` spans only {:.3e} ({}..{}); treating it as constant",
                    name,
                    range.width(),
                    range.min,
                    range.max
                ),
                None => log::warn!(
                    "Objective column {} spans only {:.3e}; treating it as constant",
                    j,
                    range.width()
                ),
            }
        }
        for row in rows.iter_mut() {
            report.apply(row);
        }
        Ok(report)
    }
}
