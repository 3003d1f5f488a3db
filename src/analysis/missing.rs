//! Missing-observation profile of a pivoted station flow.

use crate::constants::MISSING_OBS_LABELS;
use crate::error::{BikeMiError, Result};
use crate::utils::require_column;
use polars::prelude::*;
use tracing::debug;

pub const STATION_COLUMN: &str = "stazione";
pub const NULL_OBS_COLUMN: &str = "null_obs";
pub const PCT_NULL_COLUMN: &str = "pct_null";
pub const RANKING_COLUMN: &str = "null_obs_ranking";

/// Index of the equal-width bin (of five) holding `value`; edges are
/// right-inclusive and the lowest bin also holds the minimum
fn bin_index(value: f64, min: f64, max: f64) -> usize {
    let bins = MISSING_OBS_LABELS.len();
    if max <= min {
        return bins / 2;
    }
    let step = (max - min) / bins as f64;
    (0..bins)
        .find(|i| value <= min + (*i + 1) as f64 * step)
        .unwrap_or(bins - 1)
}

/// Count zero or missing observations per station of a wide flow.
///
/// Every column except `time_column` is a station. Returns one row per
/// station with `null_obs`, `pct_null` (share of buckets) and a five-level
/// `null_obs_ranking`, most incomplete stations first.
pub fn station_missing_obs(wide: &DataFrame, time_column: &str) -> Result<DataFrame> {
    require_column(wide, time_column)?;
    let buckets = wide.height();
    if buckets == 0 {
        return Err(BikeMiError::insufficient("missing observation profile", 1, 0));
    }

    let mut profile: Vec<(String, u32)> = Vec::new();
    for column in wide.get_columns() {
        if column.name().as_str() == time_column {
            continue;
        }
        let values = column.as_materialized_series().cast(&DataType::Float64)?;
        let missing = values
            .f64()?
            .into_iter()
            .filter(|v| v.is_none_or(|x| x == 0.0 || x.is_nan()))
            .count();
        profile.push((column.name().to_string(), missing as u32));
    }
    profile.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let shares: Vec<f64> = profile
        .iter()
        .map(|(_, missing)| *missing as f64 / buckets as f64)
        .collect();
    let (min, max) = shares
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(*s), hi.max(*s)));
    let rankings: Vec<&str> = shares
        .iter()
        .map(|s| MISSING_OBS_LABELS[bin_index(*s, min, max)])
        .collect();

    debug!("Profiled missing observations of {} stations", profile.len());

    let (stations, counts): (Vec<String>, Vec<u32>) = profile.into_iter().unzip();
    Ok(DataFrame::new(vec![
        Series::new(STATION_COLUMN.into(), stations).into_column(),
        Series::new(NULL_OBS_COLUMN.into(), counts).into_column(),
        Series::new(PCT_NULL_COLUMN.into(), shares).into_column(),
        Series::new(RANKING_COLUMN.into(), rankings).into_column(),
    ])?)
}
