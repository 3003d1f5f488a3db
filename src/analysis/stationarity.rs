//! Augmented Dickey-Fuller unit-root test.
//!
//! The null hypothesis is a unit root (non-stationarity). Lag length is
//! chosen by AIC over a common estimation sample; p-values use MacKinnon's
//! (1994) response-surface approximation and critical values MacKinnon's
//! (2010) finite-sample tables, both for a single series.

use super::ensure_finite;
use super::ols::ols;
use crate::constants::ADF_SIGNIFICANCE;
use crate::error::{BikeMiError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Deterministic terms included in the test regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Regression {
    /// Constant only
    Constant,
    /// Constant and linear trend
    #[default]
    ConstantTrend,
}

impl Regression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regression::Constant => "c",
            Regression::ConstantTrend => "ct",
        }
    }

    /// Number of deterministic regressors
    pub fn ntrend(&self) -> usize {
        match self {
            Regression::Constant => 1,
            Regression::ConstantTrend => 2,
        }
    }

    fn tables(&self) -> &'static MacKinnonTables {
        match self {
            Regression::Constant => &CONSTANT,
            Regression::ConstantTrend => &CONSTANT_TREND,
        }
    }
}

impl fmt::Display for Regression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regression {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "c" | "constant" => Ok(Regression::Constant),
            "ct" | "constant-trend" | "trend" => Ok(Regression::ConstantTrend),
            other => Err(BikeMiError::unknown("regression", other)),
        }
    }
}

struct MacKinnonTables {
    max_stat: f64,
    min_stat: f64,
    star_stat: f64,
    small_p: [f64; 3],
    large_p: [f64; 4],
    /// Rows for 1%, 5% and 10%: `c0 + c1/n + c2/n² + c3/n³`
    critical: [[f64; 4]; 3],
}

static CONSTANT: MacKinnonTables = MacKinnonTables {
    max_stat: 2.74,
    min_stat: -18.83,
    star_stat: -1.61,
    small_p: [2.1659, 1.4412, 0.038269],
    large_p: [1.7339, 0.93202, -0.12745, -0.010368],
    critical: [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
};

static CONSTANT_TREND: MacKinnonTables = MacKinnonTables {
    max_stat: 0.7,
    min_stat: -16.18,
    star_stat: -2.89,
    small_p: [3.2512, 1.6047, 0.049588],
    large_p: [2.5261, 0.61654, -0.37956, -0.060285],
    critical: [
        [-3.95877, -9.0531, -28.428, -134.155],
        [-3.41049, -4.3904, -9.036, -45.374],
        [-3.12705, -2.5856, -3.925, -22.380],
    ],
};

/// Evaluate `c[0] + c[1]·x + c[2]·x² + …`
fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// MacKinnon approximate p-value of a Dickey-Fuller statistic
pub fn mackinnon_p(statistic: f64, regression: Regression) -> f64 {
    let tables = regression.tables();
    if statistic > tables.max_stat {
        return 1.0;
    }
    if statistic < tables.min_stat {
        return 0.0;
    }

    let z = if statistic <= tables.star_stat {
        polyval(&tables.small_p, statistic)
    } else {
        polyval(&tables.large_p, statistic)
    };
    Normal::standard().cdf(z)
}

/// Critical values at the 1%, 5% and 10% levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

/// MacKinnon (2010) critical values for `nobs` observations
pub fn mackinnon_critical_values(regression: Regression, nobs: usize) -> CriticalValues {
    let inverse = 1.0 / nobs as f64;
    let [one, five, ten] = regression.tables().critical.map(|row| polyval(&row, inverse));

    CriticalValues {
        one_percent: one,
        five_percent: five,
        ten_percent: ten,
    }
}

/// Settings of an ADF run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdfOptions {
    pub regression: Regression,
    /// Largest lagged difference considered; derived from the length when unset
    pub max_lag: Option<usize>,
    /// Select the lag by AIC; otherwise `max_lag` lags are used
    pub autolag: bool,
}

impl Default for AdfOptions {
    fn default() -> Self {
        Self {
            regression: Regression::default(),
            max_lag: None,
            autolag: true,
        }
    }
}

impl AdfOptions {
    pub fn with_regression(mut self, regression: Regression) -> Self {
        self.regression = regression;
        self
    }

    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    pub fn without_autolag(mut self) -> Self {
        self.autolag = false;
        self
    }
}

/// Outcome of an ADF test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
    /// Best AIC when the lag was selected automatically
    pub icbest: Option<f64>,
    pub regression: Regression,
}

impl AdfResult {
    /// Unit root rejected at the 5% level
    pub fn is_stationary(&self) -> bool {
        self.pvalue <= ADF_SIGNIFICANCE
    }
}

/// Regression of `Δx_t` on deterministic terms, `x_{t-1}` and `lags` lagged
/// differences, over the rows `t ≥ start`.
///
/// Columns are ordered constant, trend (if any), level, lagged differences.
fn design(
    x: &[f64],
    diff: &[f64],
    start: usize,
    lags: usize,
    regression: Regression,
) -> (DMatrix<f64>, DVector<f64>) {
    let rows = diff.len() - start;
    let ntrend = regression.ntrend();
    let cols = ntrend + 1 + lags;

    let matrix = DMatrix::from_fn(rows, cols, |r, c| {
        let t = start + r;
        match c {
            0 => 1.0,
            1 if ntrend == 2 => (r + 1) as f64,
            c if c == ntrend => x[t],
            c => diff[t - (c - ntrend)],
        }
    });
    let target = DVector::from_iterator(rows, diff[start..].iter().copied());
    (matrix, target)
}

/// ADF test with AIC lag selection and the given deterministic terms
pub fn adfuller(values: &[f64], regression: Regression) -> Result<AdfResult> {
    adfuller_with(values, &AdfOptions::default().with_regression(regression))
}

/// ADF test with explicit options
pub fn adfuller_with(values: &[f64], options: &AdfOptions) -> Result<AdfResult> {
    const OPERATION: &str = "adfuller";
    ensure_finite(OPERATION, values)?;

    let regression = options.regression;
    let ntrend = regression.ntrend();
    let n = values.len();
    let required = 2 * (ntrend + 1);
    if n < required {
        return Err(BikeMiError::insufficient(OPERATION, required, n));
    }

    let (lowest, highest) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if lowest == highest {
        return Err(BikeMiError::DegenerateSeries {
            operation: OPERATION.to_string(),
            reason: "series is constant".to_string(),
        });
    }

    let lag_cap = n / 2 - ntrend - 1;
    let max_lag = match options.max_lag {
        Some(lag) if lag > lag_cap => {
            return Err(BikeMiError::insufficient(
                OPERATION,
                2 * (lag + ntrend + 1),
                n,
            ));
        }
        Some(lag) => lag,
        None => ((12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize).min(lag_cap),
    };

    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let (used_lag, icbest) = if options.autolag {
        let mut best: Option<(usize, f64)> = None;
        for lags in 0..=max_lag {
            let (x, y) = design(values, &diff, max_lag, lags, regression);
            let aic = ols(&x, &y, OPERATION)?.aic();
            if best.is_none_or(|(_, current)| aic < current) {
                best = Some((lags, aic));
            }
        }
        let (lag, aic) = best.ok_or_else(|| BikeMiError::insufficient(OPERATION, required, n))?;
        (lag, Some(aic))
    } else {
        (max_lag, None)
    };

    let (x, y) = design(values, &diff, used_lag, used_lag, regression);
    let fit = ols(&x, &y, OPERATION)?;
    let statistic = fit.tvalue(ntrend);
    let nobs = fit.nobs;

    debug!(
        "ADF ({}) used {} lags over {} observations: statistic {:.4}",
        regression, used_lag, nobs, statistic
    );

    Ok(AdfResult {
        statistic,
        pvalue: mackinnon_p(statistic, regression),
        used_lag,
        nobs,
        critical_values: mackinnon_critical_values(regression, nobs),
        icbest,
        regression,
    })
}
