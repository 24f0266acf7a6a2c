//! Core data structures for forecast combination.

mod forecast;
mod frame;
mod frequency;
mod table;

pub use forecast::CombinedForecast;
pub use frame::{ScoreTable, SeriesFrame, WeightTable};
pub use frequency::Frequency;
pub use table::{
    Column, ForecastTable, ForecastTableBuilder, DS, HORIZON, RESERVED_COLUMNS, TARGET, UNIQUE_ID,
};
