//! # anofox-ensemble
//!
//! Online combination of forecasts from several models ("experts").
//!
//! Combination weights are learned by regret minimization: the ensemble
//! replays in-sample or cross-validation forecasts row by row, tracks how
//! much worse the mixture did than every expert, and shifts weight toward
//! the experts it regrets ignoring. [`ensembles::MLewa`] implements the
//! adaptive exponentially-weighted average forecaster with per-expert
//! learning rates and optional trimming of the weakest experts.

pub mod core;
pub mod ensembles;
pub mod error;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{CombinedForecast, ForecastTable, Frequency, ScoreTable, WeightTable};
    pub use crate::ensembles::{
        ExponentialWeights, ForecastingEnsemble, LossType, MLewa, Mixture, MixtureConfig,
    };
    pub use crate::error::{ForecastError, Result};
}
