//! Station identifier alignment.
//!
//! Normalises station names into canonical keys and reconciles the station
//! lists of the rental series and the geospatial stall layer.

pub mod normalizer;
pub mod reconcile;

#[cfg(test)]
mod tests;

pub use normalizer::{
    CorrectionRule, clean_frame, clean_series, normalize_station_name, normalize_with_rules,
    station_rules, strip_accents,
};
pub use reconcile::{
    JoinKey, MismatchMode, MismatchSets, anti_join, find_mismatches, mismatches,
};
