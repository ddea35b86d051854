//! Non-dominated front extraction.
//!
//! All functions here work on oriented vectors ("lower is better") unless
//! their name says otherwise. Duplicated points are never collapsed: two
//! identical vectors do not dominate each other, so both stay on the front.

use rayon::prelude::*;

use crate::schema::Orientation;

use super::dominance::{dominates_oriented, orient};
use super::error::{ParetoError, check_dims};

/// Below this many points the front is computed on the calling thread.
const PARALLEL_THRESHOLD: usize = 512;

/// Check that every point has the same, non-zero, number of finite objectives.
///
/// Returns the objective count, or `None` for an empty set.
pub(crate) fn validate_points(points: &[&[f64]]) -> Result<Option<usize>, ParetoError> {
    let Some(first) = points.first() else {
        return Ok(None);
    };
    let dims = first.len();
    if dims == 0 {
        return Err(ParetoError::EmptyObjectives);
    }
    for p in points {
        check_dims(dims, p.len())?;
        if p.iter().any(|v| !v.is_finite()) {
            return Err(ParetoError::NonFinite);
        }
    }
    Ok(Some(dims))
}

/// Indices (ascending) of the points not dominated by any other point.
pub fn non_dominated_indices(points: &[&[f64]]) -> Result<Vec<usize>, ParetoError> {
    if validate_points(points)?.is_none() {
        return Ok(Vec::new());
    }

    let is_dominated =
        |i: usize| points.iter().any(|q| dominates_oriented(q, points[i]));

    let front = if points.len() < PARALLEL_THRESHOLD {
        (0..points.len()).filter(|&i| !is_dominated(i)).collect()
    } else {
        (0..points.len())
            .into_par_iter()
            .filter(|&i| !is_dominated(i))
            .collect()
    };
    Ok(front)
}

/// Same as [`non_dominated_indices`] for raw vectors and an orientation.
pub fn non_dominated_indices_oriented(
    points: &[Vec<f64>],
    orientation: &[Orientation],
) -> Result<Vec<usize>, ParetoError> {
    let oriented = points
        .iter()
        .map(|p| orient(p, orientation))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&[f64]> = oriented.iter().map(Vec::as_slice).collect();
    non_dominated_indices(&refs)
}

/// Full non-dominated sorting (Deb et al., 2002).
///
/// `fronts[0]` equals [`non_dominated_indices`]; deeper ranks follow.
pub fn non_dominated_sort(points: &[&[f64]]) -> Result<Vec<Vec<usize>>, ParetoError> {
    if validate_points(points)?.is_none() {
        return Ok(Vec::new());
    }

    let n = points.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates_oriented(points[i], points[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates_oriented(points[j], points[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }
    Ok(fronts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn as_refs(points: &[Vec<f64>]) -> Vec<&[f64]> {
        points.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn test_staircase_keeps_duplicates() {
        let points = vec![
            vec![1.0, 5.0],
            vec![2.0, 4.0],
            vec![3.0, 3.0],
            vec![4.0, 2.0],
            vec![5.0, 1.0],
            vec![3.0, 3.0],
        ];
        let front = non_dominated_indices(&as_refs(&points)).unwrap();
        assert_eq!(front, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dominated_points_removed() {
        let points = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![0.5, 3.0], vec![1.0, 3.0]];
        let front = non_dominated_indices(&as_refs(&points)).unwrap();
        assert_eq!(front, vec![0, 2]);
    }

    #[test]
    fn test_oriented_front() {
        let points = vec![vec![10.0, 1.0], vec![5.0, 1.0], vec![12.0, 2.0]];
        let orientation = [Orientation::Maximize, Orientation::Minimize];
        let front = non_dominated_indices_oriented(&points, &orientation).unwrap();
        assert_eq!(front, vec![0, 2]);
    }

    #[test]
    fn test_empty_and_errors() {
        assert!(non_dominated_indices(&[]).unwrap().is_empty());

        let mixed = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            non_dominated_indices(&as_refs(&mixed)),
            Err(ParetoError::DimensionMismatch { .. })
        ));

        let empty = vec![vec![]];
        assert_eq!(
            non_dominated_indices(&as_refs(&empty)),
            Err(ParetoError::EmptyObjectives)
        );

        let nan = vec![vec![f64::NAN, 1.0]];
        assert_eq!(non_dominated_indices(&as_refs(&nan)), Err(ParetoError::NonFinite));
    }

    #[test]
    fn test_sort_ranks() {
        let points = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0], vec![0.0, 4.0]];
        let fronts = non_dominated_sort(&as_refs(&points)).unwrap();
        assert_eq!(fronts, vec![vec![0, 3], vec![1], vec![2]]);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let points: Vec<Vec<f64>> = (0..(PARALLEL_THRESHOLD * 2))
            .map(|i| {
                let x = (i % 97) as f64;
                let y = ((i * 31) % 89) as f64;
                vec![x, y, (x - y).abs()]
            })
            .collect();
        let refs = as_refs(&points);
        let front = non_dominated_indices(&refs).unwrap();
        let ranks = non_dominated_sort(&refs).unwrap();
        assert_eq!(front, ranks[0]);
    }

    fn point_set() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (1usize..4).prop_flat_map(|dims| {
            prop::collection::vec(prop::collection::vec(0.0f64..10.0, dims), 0..40)
        })
    }

    proptest! {
        #[test]
        fn prop_front_is_mutually_non_dominated(points in point_set()) {
            let refs = as_refs(&points);
            let front = non_dominated_indices(&refs).unwrap();
            for &a in &front {
                for &b in &front {
                    prop_assert!(!dominates_oriented(refs[a], refs[b]));
                }
            }
        }

        #[test]
        fn prop_excluded_points_are_dominated(points in point_set()) {
            let refs = as_refs(&points);
            let front = non_dominated_indices(&refs).unwrap();
            for i in (0..refs.len()).filter(|i| !front.contains(i)) {
                prop_assert!(front.iter().any(|&f| dominates_oriented(refs[f], refs[i])));
            }
        }
    }
}
