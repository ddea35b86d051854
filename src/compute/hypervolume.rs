//! Hypervolume indicator.
//!
//! Points are oriented ("lower is better"). A point only contributes when it
//! is strictly better than the reference point on every objective; anything
//! else adds zero volume.
//!
//! # Methods
//!
//! - 1 objective: distance from the best value to the reference.
//! - 2 objectives: exact staircase sweep, O(n log n).
//! - up to `exact_max_objectives`: exact slicing over the last objective
//!   (hypervolume by slicing objectives), recursing down to the 2-D sweep.
//! - above that: Monte-Carlo estimate. Samples are drawn once, uniformly in
//!   the box `[lower_bound, reference)`, from a `StdRng` seeded with
//!   `monte_carlo_seed`, and reused for every call. The estimate is therefore
//!   deterministic for a given `rand` version and can only grow as the
//!   archive improves, since any sample covered by the old front is covered
//!   by the new one.

use rand::prelude::*;
use rayon::prelude::*;

use crate::schema::HypervolumeConfig;

use super::archive::ParetoArchive;
use super::dominance::dominates_oriented;
use super::error::{ParetoError, check_dims};
use super::front::validate_points;

/// How an estimator computes volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HypervolumeMethod {
    Exact,
    MonteCarlo { samples: usize },
}

/// Hypervolume calculator bound to one reference point.
#[derive(Debug, Clone)]
pub struct HypervolumeEstimator {
    reference: Vec<f64>,
    method: HypervolumeMethod,
    /// Row-major Monte-Carlo samples (empty for exact estimators).
    samples: Vec<f64>,
    /// Volume of the sampling box.
    box_volume: f64,
}

impl HypervolumeEstimator {
    /// Create an estimator for `reference`.
    pub fn new(reference: Vec<f64>, config: &HypervolumeConfig) -> Result<Self, ParetoError> {
        let dims = reference.len();
        if dims == 0 {
            return Err(ParetoError::EmptyObjectives);
        }
        if reference.iter().any(|v| !v.is_finite()) {
            return Err(ParetoError::NonFinite);
        }

        if dims <= config.exact_max_objectives.max(2) {
            return Ok(Self {
                reference,
                method: HypervolumeMethod::Exact,
                samples: Vec::new(),
                box_volume: 0.0,
            });
        }

        let lower = config
            .lower_bound
            .clone()
            .unwrap_or_else(|| vec![0.0; dims]);
        check_dims(dims, lower.len())?;
        if lower.iter().zip(&reference).any(|(l, r)| !l.is_finite() || l >= r) {
            return Err(ParetoError::EmptySamplingBox);
        }

        let count = config.monte_carlo_samples.max(1);
        let mut rng = StdRng::seed_from_u64(config.monte_carlo_seed);
        let mut samples = Vec::with_capacity(count * dims);
        for _ in 0..count {
            for (l, r) in lower.iter().zip(&reference) {
                samples.push(l + rng.r#gen::<f64>() * (r - l));
            }
        }
        let box_volume = lower.iter().zip(&reference).map(|(l, r)| r - l).product();

        log::debug!(
            "Monte-Carlo hypervolume: {} objectives, {} samples, seed {:#x}",
            dims,
            count,
            config.monte_carlo_seed
        );

        Ok(Self {
            reference,
            method: HypervolumeMethod::MonteCarlo { samples: count },
            samples,
            box_volume,
        })
    }

    /// Estimator that computes exactly whatever the objective count.
    pub fn exact(reference: Vec<f64>) -> Result<Self, ParetoError> {
        let config = HypervolumeConfig {
            exact_max_objectives: reference.len().max(2),
            ..Default::default()
        };
        Self::new(reference, &config)
    }

    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    pub fn method(&self) -> HypervolumeMethod {
        self.method
    }

    /// Hypervolume dominated by `front` relative to the reference point.
    pub fn compute<'a, I>(&self, front: I) -> Result<f64, ParetoError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let points: Vec<&[f64]> = front.into_iter().collect();
        if let Some(dims) = validate_points(&points)? {
            check_dims(self.reference.len(), dims)?;
        }

        let contributing: Vec<&[f64]> = points
            .into_iter()
            .filter(|p| p.iter().zip(&self.reference).all(|(v, r)| v < r))
            .collect();
        if contributing.is_empty() {
            return Ok(0.0);
        }

        Ok(match self.method {
            HypervolumeMethod::Exact => exact_volume(contributing, &self.reference),
            HypervolumeMethod::MonteCarlo { samples } => {
                self.monte_carlo_volume(&contributing, samples)
            }
        })
    }

    /// Hypervolume of an archive.
    pub fn compute_archive(&self, archive: &ParetoArchive) -> Result<f64, ParetoError> {
        self.compute(archive.rows())
    }

    fn monte_carlo_volume(&self, points: &[&[f64]], samples: usize) -> f64 {
        let dims = self.reference.len();
        // Samples lie above the lower bound, so points below it are clipped implicitly.
        let covered = self
            .samples
            .par_chunks(dims)
            .filter(|s| points.iter().any(|p| p.iter().zip(*s).all(|(pv, sv)| pv <= sv)))
            .count();
        self.box_volume * covered as f64 / samples as f64
    }
}

/// Exact hypervolume of oriented `front` against `reference`.
pub fn hypervolume(front: &[&[f64]], reference: &[f64]) -> Result<f64, ParetoError> {
    HypervolumeEstimator::exact(reference.to_vec())?.compute(front.iter().copied())
}

/// Points must strictly dominate `reference`.
fn exact_volume(points: Vec<&[f64]>, reference: &[f64]) -> f64 {
    match reference.len() {
        1 => {
            let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
            reference[0] - best
        }
        2 => staircase_area(points, reference),
        _ => sliced_volume(points, reference),
    }
}

/// 2-D sweep: sort by the first objective and add one rectangle per step.
fn staircase_area(mut points: Vec<&[f64]>, reference: &[f64]) -> f64 {
    points.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));

    let mut area = 0.0;
    let mut ceiling = reference[1];
    for p in points {
        if p[1] < ceiling {
            area += (reference[0] - p[0]) * (ceiling - p[1]);
            ceiling = p[1];
        }
    }
    area
}

/// Slice along the last objective; each slab is a (d-1)-dimensional problem
/// over the points already swept.
fn sliced_volume(mut points: Vec<&[f64]>, reference: &[f64]) -> f64 {
    let last = reference.len() - 1;
    points.sort_by(|a, b| a[last].total_cmp(&b[last]));

    let mut volume = 0.0;
    let mut active: Vec<&[f64]> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        active.push(&p[..last]);
        let upper = points.get(i + 1).map_or(reference[last], |next| next[last]);
        let depth = upper - p[last];
        if depth <= 0.0 {
            continue;
        }
        active = prune(active);
        volume += depth * exact_volume(active.clone(), &reference[..last]);
    }
    volume
}

/// Drop dominated and repeated points.
fn prune(points: Vec<&[f64]>) -> Vec<&[f64]> {
    let mut kept: Vec<&[f64]> = Vec::with_capacity(points.len());
    for (i, &p) in points.iter().enumerate() {
        let dominated = points.iter().any(|q| dominates_oriented(q, p));
        let repeated = points[..i].contains(&p);
        if !dominated && !repeated {
            kept.push(p);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn as_refs(points: &[Vec<f64>]) -> Vec<&[f64]> {
        points.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn test_staircase_with_duplicate() {
        let front = vec![
            vec![1.0, 5.0],
            vec![2.0, 4.0],
            vec![3.0, 3.0],
            vec![4.0, 2.0],
            vec![5.0, 1.0],
            vec![3.0, 3.0],
        ];
        // Rectangles of width 1 and heights 1..=5.
        let hv = hypervolume(&as_refs(&front), &[6.0, 6.0]).unwrap();
        assert!((hv - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point() {
        let front = vec![vec![1.0, 2.0, 3.0]];
        let hv = hypervolume(&as_refs(&front), &[2.0, 4.0, 6.0]).unwrap();
        assert!((hv - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_one_objective() {
        let front = vec![vec![0.25], vec![0.5]];
        let hv = hypervolume(&as_refs(&front), &[1.0]).unwrap();
        assert!((hv - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_points_outside_reference_contribute_zero() {
        let front = vec![vec![0.5, 0.5], vec![1.5, 0.2], vec![0.2, 1.0]];
        let hv = hypervolume(&as_refs(&front), &[1.0, 1.0]).unwrap();
        assert!((hv - 0.25).abs() < 1e-12);

        let outside = vec![vec![2.0, 2.0]];
        assert_eq!(hypervolume(&as_refs(&outside), &[1.0, 1.0]).unwrap(), 0.0);
        assert_eq!(hypervolume(&[], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_three_objectives() {
        // Three 2x1x1 boxes whose pairwise and triple overlaps are the same unit cube.
        let front = vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 1.0], vec![1.0, 1.0, 0.0]];
        let hv = hypervolume(&as_refs(&front), &[2.0, 2.0, 2.0]).unwrap();
        assert!((hv - (3.0 * 2.0 - 3.0 * 1.0 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch() {
        let front = vec![vec![0.5, 0.5, 0.5]];
        let err = hypervolume(&as_refs(&front), &[1.0, 1.0]).unwrap_err();
        assert!(matches!(err, ParetoError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_method_selection() {
        let config = HypervolumeConfig::default();
        let exact = HypervolumeEstimator::new(vec![1.0; 3], &config).unwrap();
        assert_eq!(exact.method(), HypervolumeMethod::Exact);

        let config = HypervolumeConfig {
            monte_carlo_samples: 1000,
            ..Default::default()
        };
        let mc = HypervolumeEstimator::new(vec![1.0; 4], &config).unwrap();
        assert_eq!(mc.method(), HypervolumeMethod::MonteCarlo { samples: 1000 });
    }

    #[test]
    fn test_monte_carlo_close_to_exact() {
        let front = vec![
            vec![0.2, 0.6, 0.4, 0.5],
            vec![0.5, 0.3, 0.6, 0.2],
            vec![0.7, 0.7, 0.1, 0.4],
        ];
        let reference = vec![1.0; 4];

        let exact = hypervolume(&as_refs(&front), &reference).unwrap();

        let config = HypervolumeConfig {
            exact_max_objectives: 3,
            monte_carlo_samples: 200_000,
            ..Default::default()
        };
        let mc = HypervolumeEstimator::new(reference, &config).unwrap();
        let estimate = mc.compute(front.iter().map(Vec::as_slice)).unwrap();

        assert!((estimate - exact).abs() < 0.01, "{estimate} vs {exact}");
        // Same samples every call.
        assert_eq!(estimate, mc.compute(front.iter().map(Vec::as_slice)).unwrap());
    }

    #[test]
    fn test_empty_sampling_box() {
        let config = HypervolumeConfig {
            lower_bound: Some(vec![0.0, 0.0, 0.0, 2.0]),
            ..Default::default()
        };
        let err = HypervolumeEstimator::new(vec![1.0; 4], &config).unwrap_err();
        assert_eq!(err, ParetoError::EmptySamplingBox);
    }

    fn front_and_extra() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>)> {
        (2usize..5).prop_flat_map(|dims| {
            (
                prop::collection::vec(prop::collection::vec(0.0f64..1.2, dims), 1..12),
                prop::collection::vec(0.0f64..1.2, dims),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_adding_a_point_never_shrinks_volume((front, extra) in front_and_extra()) {
            let reference = vec![1.0; extra.len()];
            let before = hypervolume(&as_refs(&front), &reference).unwrap();
            let mut grown = front.clone();
            grown.push(extra);
            let after = hypervolume(&as_refs(&grown), &reference).unwrap();
            prop_assert!(after >= before - 1e-12);
        }

        #[test]
        fn prop_volume_bounded_by_box((front, _extra) in front_and_extra()) {
            let reference = vec![1.0; front[0].len()];
            let hv = hypervolume(&as_refs(&front), &reference).unwrap();
            prop_assert!((0.0..=1.0 + 1e-12).contains(&hv));
        }
    }
}
