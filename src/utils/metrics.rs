//! Accuracy metrics for evaluating expert forecasts.

/// Calculate SMAPE between two slices, in percent (0 to 200).
///
/// Pairs where both values are zero contribute zero error.
/// Returns NaN for empty or mismatched inputs.
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n
}

/// SMAPE over the trailing `window` observations.
///
/// Undefined (NaN) when the window is disabled, empty, or longer than
/// the available history.
pub fn smape_tail(actual: &[f64], predicted: &[f64], window: Option<usize>) -> f64 {
    match window {
        Some(w) if w > 0 && w <= actual.len() && actual.len() == predicted.len() => {
            let start = actual.len() - w;
            smape(&actual[start..], &predicted[start..])
        }
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn standalone_smape() {
        // For equal values, SMAPE should be 0
        assert_relative_eq!(
            smape(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]),
            0.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn smape_known_value() {
        // |1-3| * 2 / 4 = 1 -> 100%
        assert_relative_eq!(smape(&[1.0], &[3.0]), 100.0, epsilon = 1e-10);
        // forecasting zero against a nonzero actual is maximal
        assert_relative_eq!(smape(&[5.0, 5.0], &[0.0, 0.0]), 200.0, epsilon = 1e-10);
    }

    #[test]
    fn smape_zero_pairs() {
        assert_relative_eq!(smape(&[0.0, 2.0], &[0.0, 2.0]), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn smape_invalid_inputs() {
        assert!(smape(&[], &[]).is_nan());
        assert!(smape(&[1.0], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn tail_uses_last_observations() {
        let actual = [10.0, 1.0, 1.0];
        let predicted = [0.0, 1.0, 1.0];
        assert_relative_eq!(smape_tail(&actual, &predicted, Some(2)), 0.0, epsilon = 1e-10);
        assert!(smape(&actual, &predicted) > 0.0);
    }

    #[test]
    fn tail_longer_than_history_is_nan() {
        assert!(smape_tail(&[1.0, 2.0], &[1.0, 2.0], Some(3)).is_nan());
        assert!(smape_tail(&[1.0, 2.0], &[1.0, 2.0], None).is_nan());
        assert!(smape_tail(&[1.0, 2.0], &[1.0, 2.0], Some(0)).is_nan());
    }
}
