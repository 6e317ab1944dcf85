//! HTTP surface of the SAF miles predictor

pub mod api;
pub mod config;
