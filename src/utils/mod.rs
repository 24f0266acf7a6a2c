//! Utility functions shared by the ensembles.

pub mod metrics;
pub mod normalization;

pub use metrics::{smape, smape_tail};
pub use normalization::{min_max, normalize_and_proportion, proportion};
