//! Hypervolume progress over a time-ordered evaluation stream.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::schema::{HypervolumeConfig, TrackerConfig};

use super::archive::ParetoArchive;
use super::error::{ParetoError, check_dims};
use super::hypervolume::HypervolumeEstimator;

/// Relative drop below which a decrease is treated as rounding noise.
const MONOTONE_TOLERANCE: f64 = 1e-9;

/// Hypervolume after a given number of evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Evaluations consumed (per seed when seeds are interleaved).
    pub nfe: f64,
    pub hypervolume: f64,
}

/// Hypervolume indexed by evaluation count, non-decreasing in both columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HypervolumeSeries {
    pub points: Vec<SeriesPoint>,
}

impl HypervolumeSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    /// Check the series invariant: both columns non-decreasing.
    pub fn is_non_decreasing(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| w[0].nfe <= w[1].nfe && w[0].hypervolume <= w[1].hypervolume)
    }

    /// Divide the evaluation axis, e.g. by the number of interleaved seeds.
    pub fn scale_nfe(&mut self, divisor: f64) {
        for p in &mut self.points {
            p.nfe /= divisor;
        }
    }
}

/// Progress update emitted after every merged chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerProgress {
    /// 1-based chunk (or round) number.
    pub chunk: usize,
    /// Cumulative evaluations before any per-seed scaling.
    pub nfe: usize,
    pub archive_size: usize,
    pub hypervolume: f64,
    pub elapsed_seconds: f64,
}

/// Progress callback type.
pub type ProgressCallback = Box<dyn Fn(&TrackerProgress) + Send + Sync>;

/// Running archive plus the series recorded from it.
pub(crate) struct SeriesBuilder<'e> {
    estimator: &'e HypervolumeEstimator,
    archive: ParetoArchive,
    series: HypervolumeSeries,
    chunks: usize,
    start: Instant,
}

impl<'e> SeriesBuilder<'e> {
    pub(crate) fn new(estimator: &'e HypervolumeEstimator) -> Self {
        Self {
            estimator,
            archive: ParetoArchive::new(),
            series: HypervolumeSeries::default(),
            chunks: 0,
            start: Instant::now(),
        }
    }

    /// Merge one chunk and record the hypervolume at `nfe`.
    pub(crate) fn advance<'a, I>(&mut self, nfe: usize, chunk: I) -> Result<TrackerProgress, ParetoError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let dims = self.estimator.reference().len();
        let chunk: Vec<&[f64]> = chunk.into_iter().collect();
        for row in &chunk {
            check_dims(dims, row.len())?;
        }

        let stats = self.archive.merge(chunk)?;
        let mut hv = self.estimator.compute_archive(&self.archive)?;

        if let Some(prev) = self.series.last().map(|p| p.hypervolume)
            && hv < prev
        {
            if prev - hv > MONOTONE_TOLERANCE * prev.abs().max(1.0) {
                log::warn!(
                    "Hypervolume dropped from {:.6} to {:.6} at {} NFE; keeping previous value",
                    prev,
                    hv,
                    nfe
                );
            }
            hv = prev;
        }

        self.chunks += 1;
        self.series.points.push(SeriesPoint {
            nfe: nfe as f64,
            hypervolume: hv,
        });

        let elapsed_seconds = self.start.elapsed().as_secs_f64();
        log::debug!(
            "Hypervolume at {:06} NFE is {:.4} (archive {}, +{} -{}); {:.2}s total",
            nfe,
            hv,
            stats.retained,
            stats.added,
            stats.evicted,
            elapsed_seconds
        );

        Ok(TrackerProgress {
            chunk: self.chunks,
            nfe,
            archive_size: self.archive.len(),
            hypervolume: hv,
            elapsed_seconds,
        })
    }

    pub(crate) fn finish(self) -> (HypervolumeSeries, ParetoArchive) {
        (self.series, self.archive)
    }
}

/// Tracks hypervolume over consecutive fixed-size chunks of one stream.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    step: usize,
    include_final: bool,
    estimator: HypervolumeEstimator,
}

impl ProgressTracker {
    /// Create a tracker for streams with `objectives` objectives.
    pub fn new(
        config: &TrackerConfig,
        hv_config: &HypervolumeConfig,
        objectives: usize,
    ) -> Result<Self, ParetoError> {
        if objectives == 0 {
            return Err(ParetoError::EmptyObjectives);
        }
        let reference = config.reference_for(objectives);
        check_dims(objectives, reference.len())?;
        let estimator = HypervolumeEstimator::new(reference, hv_config)?;
        Self::with_estimator(config.step, config.include_final, estimator)
    }

    /// Create a tracker around an existing estimator.
    pub fn with_estimator(
        step: usize,
        include_final: bool,
        estimator: HypervolumeEstimator,
    ) -> Result<Self, ParetoError> {
        if step == 0 {
            return Err(ParetoError::InvalidStep);
        }
        Ok(Self {
            step,
            include_final,
            estimator,
        })
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn estimator(&self) -> &HypervolumeEstimator {
        &self.estimator
    }

    /// Track hypervolume over `points`, which must already be in evaluation order.
    pub fn track(&self, points: &[Vec<f64>]) -> Result<HypervolumeSeries, ParetoError> {
        self.track_with_callback(points, |_| {})
    }

    /// Track hypervolume, reporting after every chunk.
    pub fn track_with_callback<F>(
        &self,
        points: &[Vec<f64>],
        callback: F,
    ) -> Result<HypervolumeSeries, ParetoError>
    where
        F: Fn(&TrackerProgress),
    {
        let mut builder = SeriesBuilder::new(&self.estimator);

        let full_chunks = points.len() / self.step;
        for c in 1..=full_chunks {
            let end = c * self.step;
            let window = &points[end - self.step..end];
            callback(&builder.advance(end, window.iter().map(Vec::as_slice))?);
        }

        let tail = &points[full_chunks * self.step..];
        if self.include_final && !tail.is_empty() {
            callback(&builder.advance(points.len(), tail.iter().map(Vec::as_slice))?);
        }

        Ok(builder.finish().0)
    }
}
