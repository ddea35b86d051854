//! Schema module - Configuration and record types for result analysis.

mod config;
mod record;

pub use config::*;
pub use record::*;
