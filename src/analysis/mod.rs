//! Univariate time-series diagnostics.
//!
//! Rolling statistics, correlograms, the augmented Dickey-Fuller test and its
//! report, seasonal decomposition, subunit summaries and the missing
//! observation profile of station flows. All functions work on plain `f64`
//! slices or borrowed frames and fail on non-finite input.

pub mod correlation;
pub mod decomposition;
pub mod missing;
pub mod ols;
pub mod report;
pub mod rolling;
pub mod stationarity;
pub mod subunits;

use crate::error::{BikeMiError, Result};

pub use correlation::{Correlogram, acf, pacf};
pub use decomposition::{Decomposition, DecompositionModel, seasonal_decompose};
pub use missing::station_missing_obs;
pub use report::{AdfReport, render_correlogram};
pub use rolling::{RollingKind, RollingStatistics, rolling_mean, rolling_std};
pub use stationarity::{
    AdfOptions, AdfResult, CriticalValues, Regression, adfuller, adfuller_with,
    mackinnon_critical_values, mackinnon_p,
};
pub use subunits::{TimeSubunit, subunit_summary};

/// Reject NaN and infinite observations, naming the first offender
pub(crate) fn ensure_finite(operation: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(BikeMiError::NonFiniteValue {
            operation: operation.to_string(),
            position,
        }),
        None => Ok(()),
    }
}
