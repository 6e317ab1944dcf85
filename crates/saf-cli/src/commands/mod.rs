//! Subcommand implementations

pub mod analysis;
pub mod dataset;
pub mod predict;
pub mod train;
