//! Forecast combination rules.
//!
//! - [`base`]: the contract every ensemble follows (roster, trimming,
//!   evaluation, weighted averaging).
//! - [`mixture`]: the regret-minimization driver, generic over an
//!   [`UpdateRule`].
//! - [`mlewa`]: adaptive exponentially-weighted average rule.
//! - [`loss`]: loss strategies used for regret accounting.

pub mod base;
pub mod loss;
pub mod mixture;
pub mod mlewa;

pub use base::{
    assert_fcst, evaluate_base_fcst, get_top_k, weighted_average, weights_from_errors,
    weights_from_scores, EnsembleBase, ForecastingEnsemble, ModelRoster, TrimState,
};
pub use loss::{ExpertLoss, LossType};
pub use mixture::{calc_ensemble_fcst, Mixture, MixtureConfig, MixtureState, UpdateRule};
pub use mlewa::{ExponentialWeights, MLewa};
