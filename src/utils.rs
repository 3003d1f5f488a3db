//! Small helpers shared by the frame-based modules.

use crate::error::{BikeMiError, Result};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Look up a column, reporting its name when absent
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| BikeMiError::MissingColumn {
        column: name.to_string(),
    })
}

/// Timestamps of a datetime or date column, failing on nulls.
///
/// Dates are read as midnight.
pub fn datetime_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDateTime>> {
    let series = require_column(df, name)?.as_materialized_series();
    let series = match series.dtype() {
        DataType::Date => series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        _ => series.clone(),
    };
    let ca = series.datetime()?;

    ca.as_datetime_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| BikeMiError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

/// Numeric column as `f64`, with nulls mapped to NaN
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    Ok(series
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(f64::NAN))
        .collect())
}

/// Build a millisecond datetime series from naive timestamps
pub fn datetime_series(name: &str, values: &[NaiveDateTime]) -> Series {
    DatetimeChunked::from_naive_datetime(name.into(), values.iter().copied(), TimeUnit::Milliseconds)
        .into_series()
}
