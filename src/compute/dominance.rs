//! Pareto dominance between objective vectors.

use crate::schema::Orientation;

use super::error::{ParetoError, check_dims};

/// Relation between two objective vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The first vector dominates the second.
    Dominates,
    /// The second vector dominates the first.
    DominatedBy,
    /// Neither dominates and they differ.
    NonDominated,
    /// Component-wise equal.
    Equal,
}

/// Map raw values onto "lower is better" by negating maximized components.
pub fn orient(values: &[f64], orientation: &[Orientation]) -> Result<Vec<f64>, ParetoError> {
    check_dims(orientation.len(), values.len())?;
    Ok(values
        .iter()
        .zip(orientation)
        .map(|(&v, o)| o.orient(v))
        .collect())
}

/// Compare two raw objective vectors under a per-objective orientation.
pub fn compare(a: &[f64], b: &[f64], orientation: &[Orientation]) -> Result<Dominance, ParetoError> {
    check_dims(orientation.len(), a.len())?;
    check_dims(orientation.len(), b.len())?;

    let mut a_better = false;
    let mut b_better = false;
    for ((&av, &bv), o) in a.iter().zip(b).zip(orientation) {
        let (av, bv) = (o.orient(av), o.orient(bv));
        if av < bv {
            a_better = true;
        } else if bv < av {
            b_better = true;
        }
        if a_better && b_better {
            return Ok(Dominance::NonDominated);
        }
    }

    Ok(match (a_better, b_better) {
        (true, false) => Dominance::Dominates,
        (false, true) => Dominance::DominatedBy,
        (false, false) => Dominance::Equal,
        (true, true) => Dominance::NonDominated,
    })
}

/// True iff `a` strictly Pareto-dominates `b`.
pub fn dominates(a: &[f64], b: &[f64], orientation: &[Orientation]) -> Result<bool, ParetoError> {
    Ok(compare(a, b, orientation)? == Dominance::Dominates)
}

/// Dominance on already-oriented vectors of equal length.
#[inline]
pub(crate) fn dominates_oriented(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    let mut strictly_better = false;
    for (&av, &bv) in a.iter().zip(b) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN2: [Orientation; 2] = [Orientation::Minimize, Orientation::Minimize];

    #[test]
    fn test_compare_minimize() {
        assert_eq!(compare(&[1.0, 1.0], &[2.0, 2.0], &MIN2).unwrap(), Dominance::Dominates);
        assert_eq!(compare(&[2.0, 2.0], &[1.0, 1.0], &MIN2).unwrap(), Dominance::DominatedBy);
        assert_eq!(compare(&[1.0, 3.0], &[2.0, 2.0], &MIN2).unwrap(), Dominance::NonDominated);
        assert_eq!(compare(&[1.0, 2.0], &[1.0, 2.0], &MIN2).unwrap(), Dominance::Equal);
        assert_eq!(compare(&[1.0, 2.0], &[1.0, 3.0], &MIN2).unwrap(), Dominance::Dominates);
    }

    #[test]
    fn test_compare_maximize() {
        let orientation = [Orientation::Maximize, Orientation::Minimize];
        assert!(dominates(&[5.0, 1.0], &[4.0, 1.0], &orientation).unwrap());
        assert!(!dominates(&[4.0, 1.0], &[5.0, 1.0], &orientation).unwrap());
        assert_eq!(
            compare(&[5.0, 2.0], &[4.0, 1.0], &orientation).unwrap(),
            Dominance::NonDominated
        );
    }

    #[test]
    fn test_equal_vectors_do_not_dominate() {
        assert!(!dominates(&[1.0, 1.0], &[1.0, 1.0], &MIN2).unwrap());
        assert!(!dominates_oriented(&[1.0, 1.0], &[1.0, 1.0]));
    }

    #[test]
    fn test_length_mismatch() {
        let err = compare(&[1.0, 2.0, 3.0], &[1.0, 2.0], &MIN2).unwrap_err();
        assert_eq!(
            err,
            ParetoError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
        assert!(orient(&[1.0], &MIN2).is_err());
    }

    #[test]
    fn test_orient() {
        let orientation = [Orientation::Maximize, Orientation::Minimize];
        assert_eq!(orient(&[3.0, 4.0], &orientation).unwrap(), vec![-3.0, 4.0]);
    }
}
