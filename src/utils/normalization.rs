//! Rescaling helpers that turn scores into convex weights.

/// Min-max rescale to [0, 1].
///
/// NaN entries stay NaN. A constant input maps to all ones so every
/// entry keeps an equal share after [`proportion`].
pub fn min_max(values: &[f64]) -> Vec<f64> {
    let (min_val, max_val) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max_val - min_val;

    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else if range.abs() < f64::EPSILON {
                1.0
            } else {
                (v - min_val) / range
            }
        })
        .collect()
}

/// Divide by the sum so entries add up to one. NaN entries become zero;
/// a zero total falls back to uniform weights.
pub fn proportion(values: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v })
        .collect();
    let total: f64 = cleaned.iter().sum();

    if total > 0.0 && total.is_finite() {
        cleaned.iter().map(|v| v / total).collect()
    } else if values.is_empty() {
        Vec::new()
    } else {
        vec![1.0 / values.len() as f64; values.len()]
    }
}

/// [`min_max`] followed by [`proportion`].
///
/// # Example
///
/// ```
/// use anofox_ensemble::utils::normalize_and_proportion;
///
/// let w = normalize_and_proportion(&[-3.0, -1.0, -2.0]);
/// assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// assert_eq!(w[0], 0.0);
/// ```
pub fn normalize_and_proportion(values: &[f64]) -> Vec<f64> {
    proportion(&min_max(values))
}
