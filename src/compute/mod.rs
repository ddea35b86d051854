//! Compute module - Dominance, Pareto archives and hypervolume tracking.
//!
//! Everything here works on oriented objective vectors where lower is
//! better; callers orient raw values once with [`orient`].

mod archive;
mod dominance;
mod error;
mod front;
mod hypervolume;
mod normalize;
mod progress;
mod seeds;

pub use archive::*;
pub use dominance::*;
pub use error::ParetoError;
pub use front::*;
pub use hypervolume::*;
pub use normalize::*;
pub use progress::*;
pub use seeds::*;
