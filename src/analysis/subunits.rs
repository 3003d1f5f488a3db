//! Distribution of a series across a calendar subunit (month, weekday, ...).

use crate::error::{BikeMiError, Result};
use crate::utils::{datetime_values, f64_values};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Calendar subunit a series can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSubunit {
    Year,
    Month,
    Weekday,
    Hour,
    Minute,
    Second,
}

impl TimeSubunit {
    pub fn name(&self) -> &'static str {
        match self {
            TimeSubunit::Year => "year",
            TimeSubunit::Month => "month",
            TimeSubunit::Weekday => "weekday",
            TimeSubunit::Hour => "hour",
            TimeSubunit::Minute => "minute",
            TimeSubunit::Second => "second",
        }
    }

    /// `strftime` pattern producing the group label
    pub fn time_format(&self) -> &'static str {
        match self {
            TimeSubunit::Year => "%Y",
            TimeSubunit::Month => "%B",
            TimeSubunit::Weekday => "%A",
            TimeSubunit::Hour => "%H",
            TimeSubunit::Minute => "%M",
            TimeSubunit::Second => "%S",
        }
    }

    pub fn label(&self, ts: &NaiveDateTime) -> String {
        ts.format(self.time_format()).to_string()
    }

    /// Chart title for a boxplot over this subunit
    pub fn title(&self) -> String {
        let name = self.name();
        let mut chars = name.chars();
        let capitalised = chars
            .next()
            .map(|c| c.to_uppercase().collect::<String>() + chars.as_str())
            .unwrap_or_default();
        format!("Bike Rentals {} Boxplot", capitalised)
    }
}

impl FromStr for TimeSubunit {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(TimeSubunit::Year),
            "month" => Ok(TimeSubunit::Month),
            "weekday" => Ok(TimeSubunit::Weekday),
            "hour" => Ok(TimeSubunit::Hour),
            "minute" => Ok(TimeSubunit::Minute),
            "second" => Ok(TimeSubunit::Second),
            other => Err(BikeMiError::unknown("time subunit", other)),
        }
    }
}

/// Five-number summary of `value_column` per subunit of `time_column`.
///
/// Groups keep the order in which they first appear. Missing values are
/// ignored; a group with none left has null statistics. Quartiles are
/// linearly interpolated.
pub fn subunit_summary(
    df: &DataFrame,
    time_column: &str,
    value_column: &str,
    subunit: TimeSubunit,
) -> Result<DataFrame> {
    let labels: Vec<String> = datetime_values(df, time_column)?
        .iter()
        .map(|ts| subunit.label(ts))
        .collect();
    let values: Vec<Option<f64>> = f64_values(df, value_column)?
        .into_iter()
        .map(|v| v.is_finite().then_some(v))
        .collect();

    let key = subunit.name();
    let quantile = |q: f64, name: &str| {
        col(value_column)
            .quantile(lit(q), QuantileMethod::Linear)
            .alias(name)
    };

    let summary = DataFrame::new(vec![
        Series::new(key.into(), labels).into_column(),
        Series::new(value_column.into(), values).into_column(),
    ])?
    .lazy()
    .group_by_stable([col(key)])
    .agg([
        col(value_column).count().cast(DataType::UInt32).alias("count"),
        col(value_column).min().alias("min"),
        quantile(0.25, "q1"),
        col(value_column).median().alias("median"),
        quantile(0.75, "q3"),
        col(value_column).max().alias("max"),
    ])
    .collect()?;

    Ok(summary)
}
