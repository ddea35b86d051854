//! Pareto Tracker - Incremental Pareto archives and hypervolume progress.
//!
//! This crate post-processes the evaluation records of multi-objective
//! searches: it keeps the non-dominated set of a time-ordered stream of
//! evaluations and reports how its hypervolume grows, for one search or
//! several independent seeds interleaved round by round.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Configuration and evaluation record types
//! - `compute`: Dominance, fronts, archives, hypervolume and progress tracking
//! - `export`: Record loading, tables and output formats
//!
//! # Example
//!
//! ```rust
//! use pareto_tracker::{
//!     compute::ProgressTracker,
//!     schema::{HypervolumeConfig, TrackerConfig},
//! };
//!
//! // Two minimized objectives, already scaled to [0, 1].
//! let evaluations: Vec<Vec<f64>> = (0..100)
//!     .map(|i| {
//!         let x = i as f64 / 100.0;
//!         vec![x, 1.0 - x.sqrt()]
//!     })
//!     .collect();
//!
//! let config = TrackerConfig { step: 25, ..Default::default() };
//! let tracker = ProgressTracker::new(&config, &HypervolumeConfig::default(), 2).unwrap();
//! let series = tracker.track(&evaluations).unwrap();
//!
//! assert_eq!(series.len(), 4);
//! assert!(series.is_non_decreasing());
//! ```

pub mod compute;
pub mod export;
pub mod schema;

// Re-export commonly used types
pub use compute::{HypervolumeEstimator, HypervolumeSeries, ParetoArchive, ProgressTracker};
pub use export::{ExportError, ExportPipeline};
pub use schema::{AnalysisConfig, Individual, Orientation};
