//! Calendar features for time-indexed frames.
//!
//! Every requested feature becomes one derived column computed from the
//! frame's timestamp column. Features are recomputed on each call; the input
//! frame is consumed and returned with the extra columns appended.

pub mod holidays;


use crate::constants::{HOLIDAY_NONE, WEEKEND_ISO_DAYS};
use crate::error::{BikeMiError, Result};
use crate::utils::datetime_values;
use chrono::{Datelike, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use holidays::{Holiday, easter_sunday, holiday_label, holiday_on, holidays_in};

/// A derived calendar column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarFeature {
    Hour,
    Day,
    DayName,
    Weekend,
    Week,
    Month,
    MonthName,
    Year,
    Holiday,
}

impl CalendarFeature {
    pub const ALL: [CalendarFeature; 9] = [
        CalendarFeature::Hour,
        CalendarFeature::Day,
        CalendarFeature::Month,
        CalendarFeature::Weekend,
        CalendarFeature::Week,
        CalendarFeature::Year,
        CalendarFeature::DayName,
        CalendarFeature::MonthName,
        CalendarFeature::Holiday,
    ];

    /// Name of the column the feature is written to
    pub fn column_name(&self) -> &'static str {
        match self {
            CalendarFeature::Hour => "hour",
            CalendarFeature::Day => "day",
            CalendarFeature::DayName => "day_name",
            CalendarFeature::Weekend => "is_weekend",
            CalendarFeature::Week => "week",
            CalendarFeature::Month => "month",
            CalendarFeature::MonthName => "month_name",
            CalendarFeature::Year => "year",
            CalendarFeature::Holiday => "holiday",
        }
    }

    fn series(&self, stamps: &[NaiveDateTime]) -> Series {
        let name = self.column_name().into();
        let ints = |f: fn(&NaiveDateTime) -> i32| -> Vec<i32> { stamps.iter().map(f).collect() };

        match self {
            CalendarFeature::Hour => Series::new(name, ints(|ts| ts.hour() as i32)),
            CalendarFeature::Day => Series::new(name, ints(|ts| ts.day() as i32)),
            CalendarFeature::DayName => Series::new(
                name,
                stamps
                    .iter()
                    .map(|ts| day_name(ts.weekday()))
                    .collect::<Vec<_>>(),
            ),
            CalendarFeature::Weekend => Series::new(name, ints(|ts| is_weekend(ts) as i32)),
            CalendarFeature::Week => Series::new(name, ints(|ts| ts.iso_week().week() as i32)),
            CalendarFeature::Month => Series::new(name, ints(|ts| ts.month() as i32)),
            CalendarFeature::MonthName => Series::new(
                name,
                stamps
                    .iter()
                    .map(|ts| month_name(ts.month()))
                    .collect::<Vec<_>>(),
            ),
            CalendarFeature::Year => Series::new(name, ints(|ts| ts.year())),
            CalendarFeature::Holiday => Series::new(
                name,
                stamps
                    .iter()
                    .map(|ts| holiday_label(ts.date()).unwrap_or(HOLIDAY_NONE))
                    .collect::<Vec<_>>(),
            ),
        }
    }
}

impl fmt::Display for CalendarFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for CalendarFeature {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        let feature = match s.trim().to_lowercase().as_str() {
            "hour" => CalendarFeature::Hour,
            "day" => CalendarFeature::Day,
            "day_name" | "day_names" => CalendarFeature::DayName,
            "weekend" | "weekends" | "is_weekend" => CalendarFeature::Weekend,
            "week" => CalendarFeature::Week,
            "month" => CalendarFeature::Month,
            "month_name" | "month_names" => CalendarFeature::MonthName,
            "year" => CalendarFeature::Year,
            "holiday" | "holidays" => CalendarFeature::Holiday,
            other => return Err(BikeMiError::unknown("calendar feature", other)),
        };
        Ok(feature)
    }
}

/// Saturday or Sunday (ISO weekdays 6 and 7)
pub fn is_weekend(ts: &NaiveDateTime) -> bool {
    WEEKEND_ISO_DAYS.contains(&ts.weekday().number_from_monday())
}

fn day_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[(month as usize).saturating_sub(1) % 12]
}

/// Append the requested calendar columns to `df`.
///
/// `time_column` must hold non-null timestamps. Week numbers are ISO weeks,
/// so the last days of December can belong to week 1 of the next year.
/// Existing columns with a feature's name are replaced.
pub fn create_ts_features(
    mut df: DataFrame,
    time_column: &str,
    features: &[CalendarFeature],
) -> Result<DataFrame> {
    let stamps = datetime_values(&df, time_column)?;

    for feature in features {
        df.with_column(feature.series(&stamps))?;
    }

    debug!(
        "Added {} calendar features to {} rows",
        features.len(),
        df.height()
    );
    Ok(df)
}
