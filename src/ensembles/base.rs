//! Shared lifecycle of forecast combination rules.
//!
//! Every ensemble fixes its model roster on the first fit, derives how many
//! models survive trimming, and combines expert forecasts row by row with a
//! per-series weight vector.

use std::cmp::Ordering;

use crate::core::{CombinedForecast, ForecastTable, ScoreTable, WeightTable};
use crate::error::{ForecastError, Result};
use crate::utils::{normalize_and_proportion, smape, smape_tail};

/// Common interface for forecast ensembles.
pub trait ForecastingEnsemble {
    /// Name given to the combined forecast.
    fn alias(&self) -> &str;

    /// Fit the combination rule on in-sample (or cross-validation) forecasts.
    fn fit(&mut self, insample: &ForecastTable) -> Result<()>;

    /// Combine out-of-sample expert forecasts, one value per row.
    fn predict(&self, fcst: &ForecastTable) -> Result<CombinedForecast>;

    /// Incrementally update weights with newly observed actuals.
    fn update_weights(&mut self, fcst: &ForecastTable) -> Result<()> {
        let _ = fcst;
        Err(ForecastError::NotImplemented("update_weights"))
    }

    /// Shared roster and trimming state.
    fn base(&self) -> &EnsembleBase;

    /// SMAPE of every expert on every series, over the full history or the
    /// trailing window implied by the data frequency.
    ///
    /// Before the first fit the roster is discovered from `insample`.
    fn evaluate_base_fcst(&self, insample: &ForecastTable, use_window: bool) -> Result<ScoreTable> {
        let base = self.base();
        let discovered;
        let roster = match base.roster() {
            Some(roster) => roster,
            None => {
                discovered = ModelRoster::discover(insample)?;
                &discovered
            }
        };
        evaluate_base_fcst(insample, roster, base.window_size(), use_window)
    }
}

/// Ordered set of expert names, frozen at the first fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoster {
    names: Vec<String>,
}

impl ModelRoster {
    /// Build a roster from explicit names.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(Self { names })
    }

    /// Discover experts as the numeric, non-reserved columns of a table.
    pub fn discover(table: &ForecastTable) -> Result<Self> {
        Self::new(
            table
                .expert_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Forecast columns of every roster member, in roster order.
    ///
    /// Fails with `MissingColumn` if the table does not carry the full roster.
    pub fn forecast_columns<'a>(&self, table: &'a ForecastTable) -> Result<Vec<&'a [f64]>> {
        self.names.iter().map(|name| table.numeric(name)).collect()
    }

    /// Require a table to carry exactly the roster's expert columns.
    ///
    /// A missing member is `MissingColumn`; any extra expert column is a
    /// `RosterMismatch`.
    pub fn check(&self, table: &ForecastTable) -> Result<()> {
        self.forecast_columns(table)?;
        let found = table.expert_columns();
        if found.len() != self.names.len() {
            return Err(ForecastError::RosterMismatch {
                expected: self.names.clone(),
                got: found.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(())
    }

    /// Expert forecasts of one row, in roster order.
    pub fn row(columns: &[&[f64]], row: usize) -> Vec<f64> {
        columns.iter().map(|col| col[row]).collect()
    }
}

/// Number of models kept after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrimState {
    /// Roster size.
    pub tot_n_models: usize,
    /// Models kept: `max(1, round(trim_ratio * tot_n_models))`.
    pub n_models: usize,
    /// Models dropped.
    pub n_poor_models: usize,
}

impl TrimState {
    pub fn new(trim_ratio: f64, tot_n_models: usize) -> Self {
        let kept = (trim_ratio * tot_n_models as f64).round() as usize;
        let n_models = kept.clamp(1, tot_n_models.max(1));
        Self {
            tot_n_models,
            n_models,
            n_poor_models: tot_n_models.saturating_sub(n_models),
        }
    }
}

/// Roster, trimming and evaluation-window state shared by all ensembles.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleBase {
    roster: Option<ModelRoster>,
    trim_ratio: f64,
    trim: TrimState,
    window_size: Option<usize>,
}

impl EnsembleBase {
    pub fn new(trim_ratio: f64, window_size: Option<usize>) -> Self {
        Self {
            roster: None,
            trim_ratio,
            trim: TrimState::default(),
            window_size,
        }
    }

    pub fn roster(&self) -> Option<&ModelRoster> {
        self.roster.as_ref()
    }

    pub fn trim_ratio(&self) -> f64 {
        self.trim_ratio
    }

    pub fn trim(&self) -> TrimState {
        self.trim
    }

    pub fn window_size(&self) -> Option<usize> {
        self.window_size
    }

    /// Fix the roster from the first table seen; later tables must carry
    /// the same expert columns.
    pub fn set_model_names(&mut self, table: &ForecastTable) -> Result<&ModelRoster> {
        let roster = match self.roster.take() {
            Some(roster) => roster,
            None => ModelRoster::discover(table)?,
        };
        let checked = roster.check(table);
        let roster = self.roster.insert(roster);
        checked?;
        Ok(&*roster)
    }

    /// Recompute the trim state from the roster size.
    pub fn set_n_models(&mut self) {
        let total = self.roster.as_ref().map_or(0, ModelRoster::len);
        self.trim = TrimState::new(self.trim_ratio, total);
    }

    /// Indices of the `n_models` lowest scores.
    pub fn top_k(&self, scores: &[f64]) -> Vec<usize> {
        get_top_k(scores, self.trim.n_models)
    }
}

/// Indices of the `k` lowest scores (lower is better).
///
/// The sort is stable, so ties keep roster order. NaN ranks last.
pub fn get_top_k(scores: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| match (scores[a].is_nan(), scores[b].is_nan()) {
        (false, false) => scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    order.truncate(k);
    order
}

/// Turn error scores into convex weights: lower error, higher weight.
pub fn weights_from_errors(scores: &[f64]) -> Vec<f64> {
    let negated: Vec<f64> = scores.iter().map(|s| -s).collect();
    normalize_and_proportion(&negated)
}

/// Static error-based weights for every series of a score table.
pub fn weights_from_scores(scores: &ScoreTable) -> Result<WeightTable> {
    let mut weights = WeightTable::new(scores.columns().to_vec());
    for (id, row) in scores.iter() {
        weights.insert(id, weights_from_errors(row))?;
    }
    Ok(weights)
}

/// Weighted average of one row's expert forecasts with its series' weights.
pub fn weighted_average(weights: &WeightTable, id: &str, forecasts: &[f64]) -> Result<f64> {
    let w = weights
        .get(id)
        .ok_or_else(|| ForecastError::UnknownSeries(id.to_string()))?;
    if w.len() != forecasts.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: w.len(),
            got: forecasts.len(),
        });
    }
    Ok(forecasts.iter().zip(w.iter()).map(|(f, w)| f * w).sum())
}

/// Tables passed to `predict` must identify their series.
pub fn assert_fcst(fcst: &ForecastTable) -> Result<()> {
    fcst.ids().map(|_| ())
}

/// Per-series SMAPE of every roster member.
///
/// Windowed scores are NaN where the window is disabled or longer than the
/// series.
pub fn evaluate_base_fcst(
    insample: &ForecastTable,
    roster: &ModelRoster,
    window_size: Option<usize>,
    use_window: bool,
) -> Result<ScoreTable> {
    let y = insample.target()?;
    let columns = roster.forecast_columns(insample)?;

    let mut scores = ScoreTable::new(roster.names().to_vec());
    for (id, rows) in insample.rows_by_id()? {
        let actual: Vec<f64> = rows.iter().map(|&r| y[r]).collect();
        let row_scores = columns
            .iter()
            .map(|col| {
                let fitted: Vec<f64> = rows.iter().map(|&r| col[r]).collect();
                if use_window {
                    smape_tail(&actual, &fitted, window_size)
                } else {
                    smape(&actual, &fitted)
                }
            })
            .collect();
        scores.insert(id, row_scores)?;
    }
    Ok(scores)
}
