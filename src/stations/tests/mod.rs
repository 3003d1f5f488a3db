//! Shared test utilities and fixtures for station alignment tests

use polars::prelude::*;


/// Stall layer as exported from the geospatial station file
pub fn create_stalls_frame(names: &[&str]) -> DataFrame {
    let ids: Vec<i32> = (1..=names.len() as i32).collect();
    df!(
        "id_amat" => ids,
        "nome" => names.to_vec(),
    )
    .unwrap()
}

/// Station list as extracted from the rental time series
pub fn create_series_frame(names: &[&str]) -> DataFrame {
    let counts: Vec<i64> = (0..names.len() as i64).map(|i| 10 + i).collect();
    df!(
        "stazione_partenza" => names.to_vec(),
        "count" => counts,
    )
    .unwrap()
}

/// Values of a string series, in order
pub fn string_values(series: &Series) -> Vec<String> {
    series
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap().to_string())
        .collect()
}
