//! Tabular container for in-sample and out-of-sample expert forecasts.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{ForecastError, Result};

/// Series identifier column.
pub const UNIQUE_ID: &str = "unique_id";
/// Timestamp column.
pub const DS: &str = "ds";
/// Actual value column.
pub const TARGET: &str = "y";
/// Forecast horizon column.
pub const HORIZON: &str = "h";

/// Column names that are never treated as expert forecasts.
pub const RESERVED_COLUMNS: [&str; 4] = [UNIQUE_ID, DS, TARGET, HORIZON];

/// Values held by a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Labels such as series identifiers or free-form metadata.
    Text(Vec<String>),
    /// Timestamps.
    Time(Vec<DateTime<Utc>>),
    /// Numeric values (actuals, horizons, expert forecasts).
    Numeric(Vec<f64>),
}

impl Column {
    /// Number of entries in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Time(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    /// Whether the column has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numeric values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }
}

/// A forecast table: rows keyed by (series, timestamp), one column per
/// expert plus reserved and metadata columns.
///
/// Columns keep their insertion order, which is also the order in which
/// expert models are discovered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastTable {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

/// Builder for [`ForecastTable`].
///
/// # Example
///
/// ```
/// use anofox_ensemble::core::ForecastTable;
///
/// let table = ForecastTable::builder()
///     .unique_id(vec!["a".into(), "a".into()])
///     .target(vec![1.0, 2.0])
///     .model("Naive", vec![0.9, 1.8])
///     .model("SES", vec![1.2, 2.1])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.expert_columns(), vec!["Naive", "SES"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForecastTableBuilder {
    columns: Vec<(String, Column)>,
}

impl ForecastTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series identifiers.
    pub fn unique_id(self, ids: Vec<String>) -> Self {
        self.column(UNIQUE_ID, Column::Text(ids))
    }

    /// Row timestamps.
    pub fn ds(self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.column(DS, Column::Time(timestamps))
    }

    /// Actual values.
    pub fn target(self, values: Vec<f64>) -> Self {
        self.column(TARGET, Column::Numeric(values))
    }

    /// Forecast horizon of each row.
    pub fn horizon(self, steps: Vec<f64>) -> Self {
        self.column(HORIZON, Column::Numeric(steps))
    }

    /// Forecasts of one expert model.
    pub fn model(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.column(name, Column::Numeric(values))
    }

    /// Text column carried along but never combined.
    pub fn metadata(self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.column(name, Column::Text(values))
    }

    /// Arbitrary column.
    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.push((name.into(), column));
        self
    }

    pub fn build(self) -> Result<ForecastTable> {
        ForecastTable::new(self.columns)
    }
}

impl ForecastTable {
    /// Create a table from named columns.
    ///
    /// All columns must have the same length and distinct names.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);

        let mut seen = HashSet::new();
        for (name, column) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::DuplicateColumn(name.clone()));
            }
            if column.len() != n_rows {
                return Err(ForecastError::DimensionMismatch {
                    expected: n_rows,
                    got: column.len(),
                });
            }
        }

        let (names, columns) = columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Start building a table.
    pub fn builder() -> ForecastTableBuilder {
        ForecastTableBuilder::new()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Series identifiers, one per row.
    pub fn ids(&self) -> Result<&[String]> {
        match self.column(UNIQUE_ID) {
            Some(Column::Text(ids)) => Ok(ids),
            Some(_) => Err(ForecastError::ColumnType {
                name: UNIQUE_ID.to_string(),
                expected: "text",
            }),
            None => Err(ForecastError::MissingColumn(UNIQUE_ID.to_string())),
        }
    }

    /// Row timestamps.
    pub fn timestamps(&self) -> Result<&[DateTime<Utc>]> {
        match self.column(DS) {
            Some(Column::Time(ds)) => Ok(ds),
            Some(_) => Err(ForecastError::ColumnType {
                name: DS.to_string(),
                expected: "timestamps",
            }),
            None => Err(ForecastError::MissingColumn(DS.to_string())),
        }
    }

    /// Actual values.
    pub fn target(&self) -> Result<&[f64]> {
        self.numeric(TARGET)
    }

    /// Values of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        match self.column(name) {
            Some(Column::Numeric(values)) => Ok(values),
            Some(_) => Err(ForecastError::ColumnType {
                name: name.to_string(),
                expected: "numeric",
            }),
            None => Err(ForecastError::MissingColumn(name.to_string())),
        }
    }

    /// Names of the numeric, non-reserved columns, in insertion order.
    pub fn expert_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .filter(|(name, column)| {
                column.is_numeric() && !RESERVED_COLUMNS.contains(&name.as_str())
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Row indices of every series, in original row order, keyed by id.
    pub fn rows_by_id(&self) -> Result<BTreeMap<&str, Vec<usize>>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, id) in self.ids()?.iter().enumerate() {
            groups.entry(id.as_str()).or_default().push(row);
        }
        Ok(groups)
    }
}
