//! Per-series matrices of expert scores or weights.

use std::collections::BTreeMap;

use crate::error::{ForecastError, Result};

/// A matrix indexed by series identifier, with one column per expert.
///
/// Rows are kept ordered by series identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesFrame {
    columns: Vec<String>,
    rows: BTreeMap<String, Vec<f64>>,
}

/// Accuracy scores by series and expert (lower is better).
pub type ScoreTable = SeriesFrame;

/// Combination weights by series and expert.
pub type WeightTable = SeriesFrame;

impl SeriesFrame {
    /// Create an empty frame with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Insert or replace the row of a series.
    pub fn insert(&mut self, id: impl Into<String>, values: Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.columns.len(),
                got: values.len(),
            });
        }
        self.rows.insert(id.into(), values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row of a series.
    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// Single cell.
    pub fn value(&self, id: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(id).map(|row| row[col])
    }

    /// Series identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.rows.iter().map(|(id, row)| (id.as_str(), row.as_slice()))
    }

    /// Column-wise mean over all series, skipping NaN cells.
    pub fn column_means(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|col| {
                let (sum, count) = self
                    .rows
                    .values()
                    .map(|row| row[col])
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    f64::NAN
                } else {
                    sum / count as f64
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame() -> SeriesFrame {
        let mut frame = SeriesFrame::new(vec!["A".into(), "B".into()]);
        frame.insert("s2", vec![0.2, 0.8]).unwrap();
        frame.insert("s1", vec![0.6, f64::NAN]).unwrap();
        frame
    }

    #[test]
    fn rows_are_sorted_by_id() {
        let f = frame();
        assert_eq!(f.ids().collect::<Vec<_>>(), vec!["s1", "s2"]);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn cell_lookup() {
        let f = frame();
        assert_relative_eq!(f.value("s2", "B").unwrap(), 0.8);
        assert!(f.value("s2", "C").is_none());
        assert!(f.value("s3", "A").is_none());
    }

    #[test]
    fn means_skip_nan() {
        let means = frame().column_means();
        assert_relative_eq!(means[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(means[1], 0.8, epsilon = 1e-12);
    }

    #[test]
    fn insert_checks_width() {
        let mut f = frame();
        assert!(matches!(
            f.insert("s3", vec![1.0]),
            Err(ForecastError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
