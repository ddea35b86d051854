//! Errors raised by the Pareto and hypervolume engine.

use crate::schema::SeedId;

/// Errors from dominance, archive and hypervolume computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParetoError {
    #[error("Objective vector has {found} components, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("At least one objective is required")]
    EmptyObjectives,
    #[error("Step size must be non-zero")]
    InvalidStep,
    #[error("Objective vector contains a non-finite value")]
    NonFinite,
    #[error("Seed {seed} has {count} evaluations, at least {step} are required")]
    InsufficientData {
        seed: SeedId,
        count: usize,
        step: usize,
    },
    #[error("No seed has enough evaluations to contribute")]
    NoUsableSeeds,
    #[error("Sampling lower bound must be below the reference point on every objective")]
    EmptySamplingBox,
}

/// Fail unless `found == expected`.
#[inline]
pub(crate) fn check_dims(expected: usize, found: usize) -> Result<(), ParetoError> {
    if expected == found {
        Ok(())
    } else {
        Err(ParetoError::DimensionMismatch { expected, found })
    }
}
