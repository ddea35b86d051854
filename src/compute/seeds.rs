//! Hypervolume progress across several independent seeds.
//!
//! Seeds are interleaved round by round into one shared archive so the
//! combined series reflects what all seeds found after the same per-seed
//! budget. Each seed's own series is also tracked, in parallel.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::SeedId;

use super::error::ParetoError;
use super::progress::{HypervolumeSeries, ProgressTracker, SeriesBuilder, TrackerProgress};

/// Time-ordered oriented objective vectors per seed.
pub type SeedStreams = BTreeMap<SeedId, Vec<Vec<f64>>>;

/// Combined and per-seed hypervolume series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Series over the interleaved seeds, nfe expressed per seed.
    pub combined: HypervolumeSeries,
    pub per_seed: BTreeMap<SeedId, HypervolumeSeries>,
    /// Seeds that could not be tracked, with the reason.
    pub failures: BTreeMap<SeedId, String>,
}

impl ProgressReport {
    /// Seeds that contributed to the combined series.
    pub fn contributing(&self) -> impl Iterator<Item = &SeedId> {
        self.per_seed.keys()
    }
}

/// Round-robin aggregation of per-seed streams.
#[derive(Debug, Clone)]
pub struct MultiSeedAggregator {
    tracker: ProgressTracker,
}

impl MultiSeedAggregator {
    pub fn new(tracker: ProgressTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Split seeds into those with at least one full step and the rest.
    pub fn partition<'s>(
        &self,
        seeds: &'s SeedStreams,
    ) -> (Vec<(&'s SeedId, &'s [Vec<f64>])>, BTreeMap<SeedId, ParetoError>) {
        let step = self.tracker.step();
        let mut usable = Vec::with_capacity(seeds.len());
        let mut rejected = BTreeMap::new();
        for (seed, stream) in seeds {
            if stream.len() < step {
                rejected.insert(
                    seed.clone(),
                    ParetoError::InsufficientData {
                        seed: seed.clone(),
                        count: stream.len(),
                        step,
                    },
                );
            } else {
                usable.push((seed, stream.as_slice()));
            }
        }
        (usable, rejected)
    }

    /// Combined series over all usable seeds.
    pub fn combined(&self, seeds: &SeedStreams) -> Result<HypervolumeSeries, ParetoError> {
        self.combined_with_callback(seeds, |_| {})
    }

    /// Combined series, reporting after every round.
    ///
    /// A single usable seed is tracked as one plain stream.
    pub fn combined_with_callback<F>(
        &self,
        seeds: &SeedStreams,
        callback: F,
    ) -> Result<HypervolumeSeries, ParetoError>
    where
        F: Fn(&TrackerProgress),
    {
        let (usable, rejected) = self.partition(seeds);
        warn_rejected(&rejected);
        self.combine(&usable, callback)
    }

    fn combine<F>(
        &self,
        usable: &[(&SeedId, &[Vec<f64>])],
        callback: F,
    ) -> Result<HypervolumeSeries, ParetoError>
    where
        F: Fn(&TrackerProgress),
    {
        match usable {
            [] => Err(ParetoError::NoUsableSeeds),
            [(_, stream)] => self.tracker.track_with_callback(stream, callback),
            _ => self.interleave(usable, callback),
        }
    }

    fn interleave<F>(
        &self,
        usable: &[(&SeedId, &[Vec<f64>])],
        callback: F,
    ) -> Result<HypervolumeSeries, ParetoError>
    where
        F: Fn(&TrackerProgress),
    {
        let step = self.tracker.step();
        let longest = usable.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
        let mut builder = SeriesBuilder::new(self.tracker.estimator());

        let mut i = step;
        while i <= longest {
            // Seeds that ran out repeat their last full chunk, which the archive absorbs.
            let round = usable.iter().flat_map(|(_, stream)| {
                let end = i.min(stream.len());
                stream[end - step..end].iter().map(Vec::as_slice)
            });
            callback(&builder.advance(i, round)?);
            i += step;
        }

        let (mut series, _) = builder.finish();
        series.scale_nfe(usable.len() as f64);
        log::info!(
            "Interleaved {} seeds over {} rounds of {} evaluations",
            usable.len(),
            series.len(),
            step
        );
        Ok(series)
    }

    /// Combined series plus one series per seed, tracked in parallel.
    ///
    /// Runs on the current rayon pool; install a bounded pool to cap workers.
    pub fn report(&self, seeds: &SeedStreams) -> Result<ProgressReport, ParetoError> {
        let (usable, rejected) = self.partition(seeds);
        warn_rejected(&rejected);
        if usable.is_empty() {
            return Err(ParetoError::NoUsableSeeds);
        }

        let (combined, per_seed) = rayon::join(
            || self.combine(&usable, |_| {}),
            || {
                usable
                    .par_iter()
                    .map(|(seed, stream)| ((*seed).clone(), self.tracker.track(stream)))
                    .collect::<Vec<_>>()
            },
        );

        let mut report = ProgressReport {
            combined: combined?,
            ..Default::default()
        };
        for (seed, err) in rejected {
            report.failures.insert(seed, err.to_string());
        }
        for (seed, result) in per_seed {
            match result {
                Ok(series) => {
                    report.per_seed.insert(seed, series);
                }
                Err(err) => {
                    log::warn!("Seed {} failed: {}", seed, err);
                    report.failures.insert(seed, err.to_string());
                }
            }
        }
        Ok(report)
    }
}

fn warn_rejected(rejected: &BTreeMap<SeedId, ParetoError>) {
    for err in rejected.values() {
        log::warn!("{}; excluded from the combined series", err);
    }
}
