//! Expert loss strategies used for regret accounting.
//!
//! Each strategy scores a forecast `x` against the actual `y`. In gradient
//! mode the loss is replaced by its linearization around the mixture
//! forecast `pred`: `l'(pred, y) * x`. The surrogate is linear in `x`, so
//! regret stays bounded even where the plain loss blows up (for example the
//! percentage loss when `y` is near zero).

use std::fmt;
use std::str::FromStr;

use crate::error::{ForecastError, Result};

/// Quantile used by `"pinball"` when parsed from a key.
pub const DEFAULT_PINBALL_TAU: f64 = 0.5;

/// Loss function used to score ensemble members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LossType {
    /// `(x - y)^2`
    Square,
    /// `|x - y|`
    Absolute,
    /// `|x - y| / |y|`; undefined at `y == 0`.
    Percentage,
    /// `-ln(x)`; forecasts are expected to be positive.
    Log,
    /// Quantile loss at level `tau`.
    Pinball { tau: f64 },
}

impl LossType {
    /// Check the loss parameters.
    pub fn validate(&self) -> Result<()> {
        if let LossType::Pinball { tau } = self {
            if !(*tau > 0.0 && *tau < 1.0) {
                return Err(ForecastError::InvalidParameter(format!(
                    "pinball tau must be in (0, 1), got {tau}"
                )));
            }
        }
        Ok(())
    }

    /// Plain loss of forecast `x` against actual `y`.
    pub fn loss(&self, x: f64, y: f64) -> f64 {
        match *self {
            LossType::Square => (x - y).powi(2),
            LossType::Absolute => (x - y).abs(),
            LossType::Percentage => (x - y).abs() / y.abs(),
            LossType::Log => -x.ln(),
            LossType::Pinball { tau } => (indicator(y < x) - tau) * (x - y),
        }
    }

    /// Gradient-trick loss of forecast `x`, linearized at mixture forecast `pred`.
    pub fn gradient(&self, x: f64, y: f64, pred: f64) -> f64 {
        match *self {
            LossType::Square => 2.0 * (pred - y) * x,
            LossType::Absolute => sign(pred - y) * x,
            LossType::Percentage => sign(pred - y) * x / y.abs(),
            LossType::Log => -x / pred,
            LossType::Pinball { tau } => (indicator(y < pred) - tau) * x,
        }
    }

    /// Key accepted by [`FromStr`].
    pub fn key(&self) -> &'static str {
        match self {
            LossType::Square => "square",
            LossType::Absolute => "absolute",
            LossType::Percentage => "percentage",
            LossType::Log => "log",
            LossType::Pinball { .. } => "pinball",
        }
    }
}

impl Default for LossType {
    fn default() -> Self {
        Self::Square
    }
}

impl FromStr for LossType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "square" => Ok(LossType::Square),
            "absolute" => Ok(LossType::Absolute),
            "percentage" => Ok(LossType::Percentage),
            "log" => Ok(LossType::Log),
            "pinball" => Ok(LossType::Pinball {
                tau: DEFAULT_PINBALL_TAU,
            }),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown loss type: {other}"
            ))),
        }
    }
}

impl fmt::Display for LossType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A loss type bound to its evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpertLoss {
    loss_type: LossType,
    gradient: bool,
}

impl ExpertLoss {
    pub fn new(loss_type: LossType, gradient: bool) -> Result<Self> {
        loss_type.validate()?;
        Ok(Self {
            loss_type,
            gradient,
        })
    }

    pub fn loss_type(&self) -> LossType {
        self.loss_type
    }

    pub fn uses_gradient(&self) -> bool {
        self.gradient
    }

    /// Loss of a single forecast `x` given the round's mixture forecast.
    pub fn evaluate(&self, x: f64, y: f64, mixture: f64) -> f64 {
        if self.gradient {
            self.loss_type.gradient(x, y, mixture)
        } else {
            self.loss_type.loss(x, y)
        }
    }

    /// Loss of every expert forecast of a round.
    pub fn evaluate_experts(&self, forecasts: &[f64], y: f64, mixture: f64) -> Vec<f64> {
        forecasts
            .iter()
            .map(|&x| self.evaluate(x, y, mixture))
            .collect()
    }

    /// Loss of the mixture itself, the baseline for round regret.
    pub fn evaluate_mixture(&self, mixture: f64, y: f64) -> f64 {
        self.evaluate(mixture, y, mixture)
    }
}

#[inline]
fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}

/// Sign with `sign(0) == 0`.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
