//! Exponentially-weighted average forecaster with adaptive learning rates.
//!
//! Each expert carries its own learning rate, shrunk every round by the
//! magnitude of that expert's round regret (ML-Poly / BOA style, as in the
//! `opera` R package). Weights are proportional to `exp(eta * regret)`,
//! with the exponent clipped to avoid overflow.
//!
//! # References
//!
//! - Cesa-Bianchi, N. and Lugosi, G. (2006). *Prediction, Learning, and Games*.
//! - Gaillard, P. and Goude, Y. (2015). Forecasting electricity consumption by
//!   aggregating experts; how to design a good set of experts.
//!
//! # Example
//!
//! ```
//! use anofox_ensemble::prelude::*;
//!
//! let insample = ForecastTable::builder()
//!     .unique_id(vec!["s".into(); 3])
//!     .target(vec![1.0, 2.0, 3.0])
//!     .model("exact", vec![1.0, 2.0, 3.0])
//!     .model("zero", vec![0.0, 0.0, 0.0])
//!     .build()
//!     .unwrap();
//!
//! let config = MixtureConfig::from_key("square", false)
//!     .unwrap()
//!     .with_weight_by_uid(true);
//! let mut ensemble = MLewa::new(config).unwrap();
//! ensemble.fit(&insample).unwrap();
//!
//! let w = ensemble.weights("s").unwrap();
//! assert!(w[0] > w[1]);
//! ```

use crate::ensembles::loss::ExpertLoss;
use crate::ensembles::mixture::{
    calc_ensemble_fcst, Mixture, MixtureConfig, MixtureState, UpdateRule,
};
use crate::error::{ForecastError, Result};

/// Exponent of the initial learning rate. The rate stays effectively
/// infinite for an expert until its round regret is first nonzero.
pub const INITIAL_ETA_EXPONENT: f64 = 350.0;

/// Bound on `|eta * regret|` before exponentiation.
pub const MAX_EXPONENT: f64 = 700.0;

/// Adaptive exponential-weights update rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExponentialWeights;

/// Regret-minimizing ensemble using [`ExponentialWeights`].
pub type MLewa = Mixture<ExponentialWeights>;

impl Mixture<ExponentialWeights> {
    pub fn new(config: MixtureConfig) -> Result<Self> {
        Self::with_rule(ExponentialWeights, config)
    }
}

impl UpdateRule for ExponentialWeights {
    fn alias(&self) -> &str {
        "MLewa"
    }

    fn initialize_state(&self, n_rows: usize, n_experts: usize) -> Result<MixtureState> {
        if n_experts == 0 {
            return Err(ForecastError::EmptyData);
        }
        Ok(MixtureState::new(n_rows, n_experts, INITIAL_ETA_EXPONENT.exp()))
    }

    fn update_mixture(
        &self,
        state: &mut MixtureState,
        forecasts: &[f64],
        actual: f64,
        loss: &ExpertLoss,
    ) -> Result<()> {
        let n = state.n_experts();
        if forecasts.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: forecasts.len(),
            });
        }

        let t = state.row;
        if t + 1 >= state.eta.len() {
            let last = state.eta[state.eta.len() - 1].clone();
            state.eta.resize(t + 2, last);
        }

        let w = self.weights_from_regret(state, Some(t))?;
        let (mixture, fcst_c) = calc_ensemble_fcst(forecasts, &w);

        let loss_experts = loss.evaluate_experts(forecasts, actual, fcst_c);
        let loss_mixture = loss.evaluate_mixture(fcst_c, actual);
        // An undefined loss (e.g. percentage loss at y == 0) carries no regret.
        let round_regret: Vec<f64> = loss_experts
            .iter()
            .map(|l| loss_mixture - l)
            .map(|r| if r.is_finite() { r } else { 0.0 })
            .collect();

        for (regret, r) in state.regret.iter_mut().zip(round_regret.iter()) {
            *regret += r;
        }

        // A single expert keeps weight 1; its rate never matters.
        state.eta[t + 1] = if n < 2 {
            state.eta[t].clone()
        } else {
            let log_n = (n as f64).ln();
            state.eta[t]
                .iter()
                .zip(round_regret.iter())
                .map(|(eta, r)| (log_n / (log_n / eta.powi(2) + r.powi(2))).sqrt())
                .collect()
        };

        state.weights.push(mixture);
        state.ensemble_fcst.push(fcst_c);
        state.row += 1;
        Ok(())
    }

    fn weights_from_regret(
        &self,
        state: &MixtureState,
        iteration: Option<usize>,
    ) -> Result<Vec<f64>> {
        let eta = match iteration {
            Some(i) => state.eta.get(i).ok_or(ForecastError::IndexOutOfBounds {
                index: i,
                size: state.eta.len(),
            })?,
            None => state.eta.last().ok_or(ForecastError::EmptyData)?,
        };

        let n = state.regret.len();
        let max_regret = state.regret.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max_regret > 0.0 {
            let w: Vec<f64> = eta
                .iter()
                .zip(state.regret.iter())
                .map(|(e, r)| truncate_exponent(e * r).exp())
                .collect();
            let total: f64 = w.iter().sum();
            Ok(w.iter().map(|x| x / total).collect())
        } else {
            Ok(vec![1.0 / n as f64; n])
        }
    }
}

/// Clip an exponent to `[-MAX_EXPONENT, MAX_EXPONENT]`.
#[inline]
fn truncate_exponent(x: f64) -> f64 {
    x.clamp(-MAX_EXPONENT, MAX_EXPONENT)
}
