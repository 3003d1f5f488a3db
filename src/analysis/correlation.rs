//! Sample autocorrelation and partial autocorrelation with 95% bands.
//!
//! Autocovariances use the biased (divide by n) estimator. The ACF band
//! follows Bartlett's formula, the PACF band is `±z/√n`.

use super::ensure_finite;
use crate::constants::Z_95;
use crate::error::{BikeMiError, Result};
use serde::{Deserialize, Serialize};

/// Correlation values by lag, starting at lag 0, with confidence intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlogram {
    pub values: Vec<f64>,
    pub confint: Vec<(f64, f64)>,
}

impl Correlogram {
    pub fn nlags(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Lags ≥ 1 whose value lies outside the band around zero
    pub fn significant_lags(&self) -> Vec<usize> {
        self.values
            .iter()
            .zip(&self.confint)
            .enumerate()
            .skip(1)
            .filter(|(_, (value, (lower, _)))| {
                let half_width = *value - *lower;
                value.abs() > half_width
            })
            .map(|(lag, _)| lag)
            .collect()
    }
}

fn default_nlags(n: usize) -> usize {
    ((10.0 * (n as f64).log10()) as usize).min(n - 1)
}

/// Biased autocorrelations for lags `0..=nlags`
fn autocorrelations(values: &[f64], nlags: usize, operation: &str) -> Result<Vec<f64>> {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let centred: Vec<f64> = values.iter().map(|x| x - mean).collect();

    let autocov = |lag: usize| -> f64 {
        centred[lag..]
            .iter()
            .zip(&centred[..n - lag])
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64
    };

    if values.iter().all(|x| *x == values[0]) {
        return Err(BikeMiError::DegenerateSeries {
            operation: operation.to_string(),
            reason: "series has zero variance".to_string(),
        });
    }

    let c0 = autocov(0);
    Ok((0..=nlags).map(|lag| autocov(lag) / c0).collect())
}

/// Autocorrelation function.
///
/// `nlags` defaults to `min(10·log10(n), n - 1)`.
pub fn acf(values: &[f64], nlags: Option<usize>) -> Result<Correlogram> {
    ensure_finite("acf", values)?;
    let n = values.len();
    if n < 2 {
        return Err(BikeMiError::insufficient("acf", 2, n));
    }

    let nlags = nlags.unwrap_or_else(|| default_nlags(n));
    if nlags >= n {
        return Err(BikeMiError::insufficient("acf", nlags + 1, n));
    }

    let values = autocorrelations(values, nlags, "acf")?;

    let nobs = n as f64;
    let mut cumulative: f64 = 0.0;
    let confint = values
        .iter()
        .enumerate()
        .map(|(lag, &r)| {
            let variance = match lag {
                0 => 0.0,
                1 => 1.0 / nobs,
                _ => {
                    cumulative += values[lag - 1].powi(2);
                    (1.0 + 2.0 * cumulative) / nobs
                }
            };
            let half_width = Z_95 * variance.sqrt();
            (r - half_width, r + half_width)
        })
        .collect();

    Ok(Correlogram { values, confint })
}

/// Partial autocorrelation function (Yule-Walker, biased autocovariance).
///
/// Solved with the Durbin-Levinson recursion. `nlags` defaults to
/// `min(10·log10(n), n/2 - 1)` and must stay below `n/2`.
pub fn pacf(values: &[f64], nlags: Option<usize>) -> Result<Correlogram> {
    ensure_finite("pacf", values)?;
    let n = values.len();
    if n < 4 {
        return Err(BikeMiError::insufficient("pacf", 4, n));
    }

    let limit = n / 2;
    let nlags = nlags.unwrap_or_else(|| default_nlags(n).min(limit - 1));
    if nlags >= limit {
        return Err(BikeMiError::insufficient("pacf", 2 * (nlags + 1), n));
    }

    let rho = autocorrelations(values, nlags, "pacf")?;
    let values = durbin_levinson(&rho)?;

    let half_width = Z_95 / (n as f64).sqrt();
    let confint = values
        .iter()
        .enumerate()
        .map(|(lag, &p)| {
            if lag == 0 {
                (p, p)
            } else {
                (p - half_width, p + half_width)
            }
        })
        .collect();

    Ok(Correlogram { values, confint })
}

/// Partial autocorrelations from autocorrelations `rho[0..=k]`
fn durbin_levinson(rho: &[f64]) -> Result<Vec<f64>> {
    let nlags = rho.len() - 1;
    let mut partial = vec![1.0; nlags + 1];
    let mut phi: Vec<f64> = Vec::with_capacity(nlags);
    let mut sigma: f64 = 1.0;

    for k in 1..=nlags {
        let num = rho[k] - (1..k).map(|j| phi[j - 1] * rho[k - j]).sum::<f64>();
        if sigma.abs() < 1e-12 {
            return Err(BikeMiError::Regression {
                operation: "pacf".to_string(),
                reason: format!("Yule-Walker system is singular at lag {}", k),
            });
        }
        let reflection = num / sigma;

        let previous = phi.clone();
        for j in 1..k {
            phi[j - 1] = previous[j - 1] - reflection * previous[k - j - 1];
        }
        phi.push(reflection);

        sigma *= 1.0 - reflection * reflection;
        partial[k] = reflection;
    }

    Ok(partial)
}
