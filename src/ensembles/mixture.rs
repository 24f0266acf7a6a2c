//! Online regret-minimization driver.
//!
//! [`Mixture`] walks a forecast table row by row and delegates every round
//! to an [`UpdateRule`]. The weights left after the last round are cached
//! per series and used to combine out-of-sample forecasts.
//!
//! Two fitting modes are available:
//!
//! - **per series** (`weight_by_uid = true`): each series gets its own pass
//!   over its rows, in table order.
//! - **global** (`weight_by_uid = false`): all rows are sorted by timestamp
//!   and traversed in a single pass; every series shares the final weights.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::core::{CombinedForecast, ForecastTable, Frequency, WeightTable};
use crate::ensembles::base::{
    assert_fcst, weighted_average, EnsembleBase, ForecastingEnsemble, ModelRoster, TrimState,
};
use crate::ensembles::loss::{ExpertLoss, LossType};
use crate::error::{ForecastError, Result};

/// Configuration shared by regret-based ensembles.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureConfig {
    /// Loss used to score ensemble members.
    pub loss_type: LossType,
    /// Use the gradient trick instead of the plain loss.
    pub gradient: bool,
    /// Fraction of members kept at prediction time, in (0, 1].
    pub trim_ratio: f64,
    /// Fit one weight vector per series instead of one for the dataset.
    pub weight_by_uid: bool,
    /// Data frequency; selects the window of windowed evaluation.
    pub frequency: Frequency,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            loss_type: LossType::Square,
            gradient: false,
            trim_ratio: 1.0,
            weight_by_uid: false,
            frequency: Frequency::Unspecified,
        }
    }
}

impl MixtureConfig {
    /// Create a configuration for the given loss.
    pub fn new(loss_type: LossType, gradient: bool) -> Self {
        Self {
            loss_type,
            gradient,
            ..Self::default()
        }
    }

    /// Create a configuration from a loss key such as `"square"`.
    pub fn from_key(loss_type: &str, gradient: bool) -> Result<Self> {
        Ok(Self::new(loss_type.parse()?, gradient))
    }

    /// Set the fraction of members kept at prediction time.
    pub fn with_trim_ratio(mut self, trim_ratio: f64) -> Self {
        self.trim_ratio = trim_ratio;
        self
    }

    /// Fit per series rather than globally.
    pub fn with_weight_by_uid(mut self, weight_by_uid: bool) -> Self {
        self.weight_by_uid = weight_by_uid;
        self
    }

    /// Set the data frequency.
    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the data frequency from the timestamp spacing of a table.
    pub fn with_inferred_frequency(self, table: &ForecastTable) -> Result<Self> {
        let frequency = Frequency::infer(table.timestamps()?)?;
        Ok(self.with_frequency(frequency))
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        self.loss_type.validate()?;
        if !(self.trim_ratio > 0.0 && self.trim_ratio <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "trim_ratio must be in (0, 1], got {}",
                self.trim_ratio
            )));
        }
        Ok(())
    }
}

/// State of one fitting pass.
///
/// Created fresh for every pass and dropped once the final weights have
/// been extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureState {
    /// Learning rate per round and expert; `rows + 1` entries.
    pub eta: Vec<Vec<f64>>,
    /// Cumulative regret per expert.
    pub regret: Vec<f64>,
    /// Weight vector of every completed round.
    pub weights: Vec<Vec<f64>>,
    /// Mixture forecast of every completed round.
    pub ensemble_fcst: Vec<f64>,
    /// Index of the next round.
    pub row: usize,
}

impl MixtureState {
    /// Zero regret and a constant initial learning rate.
    pub fn new(n_rows: usize, n_experts: usize, initial_eta: f64) -> Self {
        Self {
            eta: vec![vec![initial_eta; n_experts]; n_rows + 1],
            regret: vec![0.0; n_experts],
            weights: Vec::with_capacity(n_rows),
            ensemble_fcst: Vec::with_capacity(n_rows),
            row: 0,
        }
    }

    pub fn n_experts(&self) -> usize {
        self.regret.len()
    }

    /// Weights of the last completed round.
    pub fn last_weights(&self) -> Option<&[f64]> {
        self.weights.last().map(Vec::as_slice)
    }
}

/// Round-by-round update of a regret-minimizing mixture.
///
/// The default methods report `NotImplemented`; concrete rules override
/// all three.
pub trait UpdateRule {
    /// Name given to the combined forecast.
    fn alias(&self) -> &str {
        "Mixture"
    }

    /// Fresh state for a pass over `n_rows` rounds.
    fn initialize_state(&self, n_rows: usize, n_experts: usize) -> Result<MixtureState> {
        let _ = (n_rows, n_experts);
        Err(ForecastError::NotImplemented("initialize_state"))
    }

    /// Play round `state.row`: weigh the experts, form the mixture forecast,
    /// then account the round's regret.
    fn update_mixture(
        &self,
        state: &mut MixtureState,
        forecasts: &[f64],
        actual: f64,
        loss: &ExpertLoss,
    ) -> Result<()> {
        let _ = (state, forecasts, actual, loss);
        Err(ForecastError::NotImplemented("update_mixture"))
    }

    /// Weights implied by the current regret and the learning rate of
    /// `iteration` (the last one when `None`).
    fn weights_from_regret(
        &self,
        state: &MixtureState,
        iteration: Option<usize>,
    ) -> Result<Vec<f64>> {
        let _ = (state, iteration);
        Err(ForecastError::NotImplemented("weights_from_regret"))
    }
}

/// Normalize `weights` and form the mixture forecast.
pub fn calc_ensemble_fcst(forecasts: &[f64], weights: &[f64]) -> (Vec<f64>, f64) {
    let total: f64 = weights.iter().sum();
    let mixture: Vec<f64> = weights.iter().map(|w| w / total).collect();
    let fcst_c = forecasts.iter().zip(mixture.iter()).map(|(f, w)| f * w).sum();
    (mixture, fcst_c)
}

/// Outcome of a single pass.
#[derive(Debug, Clone)]
struct PassOutcome {
    weights: Vec<f64>,
    coefficients: Vec<f64>,
    fitted: Vec<f64>,
}

/// Forecast ensemble driven by regret minimization.
#[derive(Debug, Clone)]
pub struct Mixture<R: UpdateRule> {
    rule: R,
    config: MixtureConfig,
    loss: ExpertLoss,
    base: EnsembleBase,
    uid_weights: BTreeMap<String, Vec<f64>>,
    uid_coefficients: BTreeMap<String, Vec<f64>>,
    uid_fitted: BTreeMap<String, Vec<f64>>,
}

impl<R: UpdateRule> Mixture<R> {
    /// Create a mixture; the configuration is validated eagerly.
    pub fn with_rule(rule: R, config: MixtureConfig) -> Result<Self> {
        config.validate()?;
        let loss = ExpertLoss::new(config.loss_type, config.gradient)?;
        let base = EnsembleBase::new(config.trim_ratio, config.frequency.window_size());
        Ok(Self {
            rule,
            config,
            loss,
            base,
            uid_weights: BTreeMap::new(),
            uid_coefficients: BTreeMap::new(),
            uid_fitted: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &MixtureConfig {
        &self.config
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Expert roster, once fitted.
    pub fn model_names(&self) -> Option<&[String]> {
        self.base.roster().map(ModelRoster::names)
    }

    pub fn trim(&self) -> TrimState {
        self.base.trim()
    }

    /// Whether any series has cached weights.
    pub fn is_fitted(&self) -> bool {
        !self.uid_weights.is_empty()
    }

    /// Final weights of a series.
    pub fn weights(&self, id: &str) -> Option<&[f64]> {
        self.uid_weights.get(id).map(Vec::as_slice)
    }

    /// Weights recomputed from the final regret and learning rate of a series.
    pub fn coefficients(&self, id: &str) -> Option<&[f64]> {
        self.uid_coefficients.get(id).map(Vec::as_slice)
    }

    /// In-sample mixture forecasts of the pass that produced a series' weights.
    pub fn fitted_values(&self, id: &str) -> Option<&[f64]> {
        self.uid_fitted.get(id).map(Vec::as_slice)
    }

    /// Untrimmed weights of every fitted series.
    pub fn weight_table(&self) -> Result<WeightTable> {
        let roster = self.base.roster().ok_or(ForecastError::FitRequired)?;
        let mut table = WeightTable::new(roster.names().to_vec());
        for (id, w) in &self.uid_weights {
            table.insert(id.clone(), w.clone())?;
        }
        Ok(table)
    }

    /// Keep only the top `n_models` members of every series and renormalize.
    ///
    /// Members are ranked per series when fitting per series, otherwise by
    /// their mean weight across series.
    pub fn weights_by_uid(&self, weights: &WeightTable) -> Result<WeightTable> {
        let neg = |w: &[f64]| w.iter().map(|x| -x).collect::<Vec<f64>>();
        let top_overall = self.base.top_k(&neg(&weights.column_means()));

        let mut trimmed = WeightTable::new(weights.columns().to_vec());
        for (id, w) in weights.iter() {
            let keep = if self.config.weight_by_uid {
                self.base.top_k(&neg(w))
            } else {
                top_overall.clone()
            };

            let mut kept: Vec<f64> = w
                .iter()
                .enumerate()
                .map(|(i, &x)| if keep.contains(&i) { x } else { 0.0 })
                .collect();
            let total: f64 = kept.iter().sum();
            if total > 0.0 {
                kept.iter_mut().for_each(|x| *x /= total);
            } else {
                let share = 1.0 / keep.len() as f64;
                keep.iter().for_each(|&i| kept[i] = share);
            }
            trimmed.insert(id, kept)?;
        }
        Ok(trimmed)
    }

    fn fit_by_uid(&mut self, insample: &ForecastTable, roster: &ModelRoster) -> Result<()> {
        let y = insample.target()?;
        let columns = roster.forecast_columns(insample)?;

        for (id, rows) in insample.rows_by_id()? {
            let outcome = self.run_pass(&rows, &columns, y)?;
            debug!(
                series = id,
                rows = rows.len(),
                weights = ?outcome.weights,
                "fitted series weights"
            );
            self.store(id, outcome);
        }
        Ok(())
    }

    fn fit_all(&mut self, insample: &ForecastTable, roster: &ModelRoster) -> Result<()> {
        let y = insample.target()?;
        let ids = insample.ids()?;
        let ds = insample.timestamps()?;
        let columns = roster.forecast_columns(insample)?;

        let mut order: Vec<usize> = (0..insample.len()).collect();
        order.sort_by_key(|&r| ds[r]);

        let outcome = self.run_pass(&order, &columns, y)?;
        debug!(
            rows = order.len(),
            weights = ?outcome.weights,
            "fitted global weights"
        );

        let seen: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
        for id in seen {
            self.store(id, outcome.clone());
        }
        Ok(())
    }

    fn run_pass(&self, rows: &[usize], columns: &[&[f64]], y: &[f64]) -> Result<PassOutcome> {
        if rows.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let mut state = self.rule.initialize_state(rows.len(), columns.len())?;
        for &r in rows {
            let forecasts = ModelRoster::row(columns, r);
            self.rule
                .update_mixture(&mut state, &forecasts, y[r], &self.loss)?;
            trace!(row = state.row, regret = ?state.regret, "mixture round");
        }

        let weights = state
            .last_weights()
            .map(<[f64]>::to_vec)
            .ok_or(ForecastError::EmptyData)?;
        let coefficients = self.rule.weights_from_regret(&state, None)?;

        Ok(PassOutcome {
            weights,
            coefficients,
            fitted: state.ensemble_fcst,
        })
    }

    fn store(&mut self, id: &str, outcome: PassOutcome) {
        self.uid_weights.insert(id.to_string(), outcome.weights);
        self.uid_coefficients
            .insert(id.to_string(), outcome.coefficients);
        self.uid_fitted.insert(id.to_string(), outcome.fitted);
    }
}

impl<R: UpdateRule> ForecastingEnsemble for Mixture<R> {
    fn alias(&self) -> &str {
        self.rule.alias()
    }

    fn fit(&mut self, insample: &ForecastTable) -> Result<()> {
        if insample.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let roster = self.base.set_model_names(insample)?.clone();
        self.base.set_n_models();

        if self.config.weight_by_uid {
            self.fit_by_uid(insample, &roster)
        } else {
            self.fit_all(insample, &roster)
        }
    }

    fn predict(&self, fcst: &ForecastTable) -> Result<CombinedForecast> {
        assert_fcst(fcst)?;
        if !self.is_fitted() {
            return Err(ForecastError::FitRequired);
        }

        let mut weights = self.weight_table()?;
        if self.base.trim_ratio() < 1.0 {
            weights = self.weights_by_uid(&weights)?;
        }

        let ids = fcst.ids()?;
        let columns = self
            .base
            .roster()
            .ok_or(ForecastError::FitRequired)?
            .forecast_columns(fcst)?;

        let combined = ids
            .iter()
            .enumerate()
            .map(|(r, id)| weighted_average(&weights, id, &ModelRoster::row(&columns, r)))
            .collect::<Result<Vec<f64>>>()?;

        Ok(CombinedForecast::new(self.alias(), combined))
    }

    fn base(&self) -> &EnsembleBase {
        &self.base
    }
}
