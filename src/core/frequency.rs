//! Sampling frequency of the forecast table and the evaluation window it implies.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{ForecastError, Result};

const HOUR: i64 = 3_600;
const DAY: i64 = 24 * HOUR;

/// Data frequency, parsed from pandas-style aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    /// `H`
    Hourly,
    /// `D`
    Daily,
    /// `W`
    Weekly,
    /// `M`, `ME`, `MS`
    Monthly,
    /// `Q`, `QS`
    Quarterly,
    /// `Y`
    Yearly,
    /// Empty alias: windowed evaluation is disabled.
    #[default]
    Unspecified,
}

impl Frequency {
    /// Trailing window used for windowed accuracy, `None` when disabled.
    ///
    /// # Example
    ///
    /// ```
    /// use anofox_ensemble::core::Frequency;
    ///
    /// assert_eq!(Frequency::Hourly.window_size(), Some(48));
    /// assert_eq!(Frequency::Unspecified.window_size(), None);
    /// ```
    pub fn window_size(&self) -> Option<usize> {
        match self {
            Frequency::Hourly => Some(48),
            Frequency::Daily => Some(14),
            Frequency::Weekly => Some(16),
            Frequency::Monthly => Some(12),
            Frequency::Quarterly => Some(4),
            Frequency::Yearly => Some(6),
            Frequency::Unspecified => None,
        }
    }

    /// Infer the frequency from the modal spacing of timestamps.
    ///
    /// Timestamps are sorted first, and zero spacings (several series
    /// sharing a timestamp) are ignored.
    pub fn infer(timestamps: &[DateTime<Utc>]) -> Result<Self> {
        let mut sorted = timestamps.to_vec();
        sorted.sort();
        sorted.dedup();

        if sorted.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: sorted.len(),
            });
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for w in sorted.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Ties resolve to the smallest spacing.
        let (&modal, _) = counts
            .iter()
            .rev()
            .max_by_key(|(_, &count)| count)
            .ok_or(ForecastError::FrequencyInference(
                "empty spacing data".to_string(),
            ))?;

        match modal {
            HOUR => Ok(Frequency::Hourly),
            DAY => Ok(Frequency::Daily),
            d if d == 7 * DAY => Ok(Frequency::Weekly),
            d if (28 * DAY..=31 * DAY).contains(&d) => Ok(Frequency::Monthly),
            d if (89 * DAY..=92 * DAY).contains(&d) => Ok(Frequency::Quarterly),
            d if (365 * DAY..=366 * DAY).contains(&d) => Ok(Frequency::Yearly),
            d => Err(ForecastError::FrequencyInference(format!(
                "unsupported spacing of {d} seconds"
            ))),
        }
    }
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "H" => Ok(Frequency::Hourly),
            "D" => Ok(Frequency::Daily),
            "W" => Ok(Frequency::Weekly),
            "M" | "ME" | "MS" => Ok(Frequency::Monthly),
            "Q" | "QS" => Ok(Frequency::Quarterly),
            "Y" => Ok(Frequency::Yearly),
            "" => Ok(Frequency::Unspecified),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown frequency alias: {other}"
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = match self {
            Frequency::Hourly => "H",
            Frequency::Daily => "D",
            Frequency::Weekly => "W",
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Yearly => "Y",
            Frequency::Unspecified => "",
        };
        f.write_str(alias)
    }
}
