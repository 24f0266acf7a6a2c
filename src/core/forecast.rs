//! Combined forecast produced by an ensemble.

/// One combined forecast per input row, named after the ensemble.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedForecast {
    name: String,
    values: Vec<f64>,
}

impl CombinedForecast {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Name of the ensemble that produced the forecast.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_forecast_accessors() {
        let fc = CombinedForecast::new("MLewa", vec![1.0, 2.0]);
        assert_eq!(fc.name(), "MLewa");
        assert_eq!(fc.len(), 2);
        assert!(!fc.is_empty());
        assert_eq!(fc.into_values(), vec![1.0, 2.0]);
    }
}
