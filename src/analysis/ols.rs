//! Ordinary least squares for the small regressions behind the unit-root test.
//!
//! Solved through an SVD of the design matrix, which also yields the
//! parameter covariance `(XᵀX)⁻¹ = V Σ⁻² Vᵀ` without forming `XᵀX`.

use crate::error::{BikeMiError, Result};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

/// Estimates and fit statistics of one regression
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: DVector<f64>,
    pub bse: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// Number of estimated parameters
    pub fn k(&self) -> usize {
        self.params.len()
    }

    pub fn tvalue(&self, i: usize) -> f64 {
        self.params[i] / self.bse[i]
    }

    /// Gaussian log-likelihood at the estimates
    pub fn llf(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.llf() + 2.0 * self.k() as f64
    }
}

fn failure(operation: &str, reason: impl Into<String>) -> BikeMiError {
    BikeMiError::Regression {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}

/// Fit `y = Xβ + ε`; `operation` names the caller in errors
pub fn ols(x: &DMatrix<f64>, y: &DVector<f64>, operation: &str) -> Result<OlsFit> {
    let (nobs, k) = x.shape();
    if nobs <= k {
        return Err(BikeMiError::insufficient(operation, k + 1, nobs));
    }

    let svd = x.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = largest * nobs.max(k) as f64 * f64::EPSILON;
    if svd.singular_values.iter().any(|s| *s <= tolerance) {
        return Err(failure(operation, "design matrix is rank deficient"));
    }

    let params = svd
        .solve(y, tolerance)
        .map_err(|reason| failure(operation, reason))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| failure(operation, "SVD did not produce right singular vectors"))?;

    let residuals = y - x * &params;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (nobs - k) as f64;

    let mut scaled = v_t.transpose();
    for (mut column, s) in scaled.column_iter_mut().zip(svd.singular_values.iter()) {
        column /= s * s;
    }
    let cov = scaled * v_t;
    let bse = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * cov[(i, i)]).sqrt()));

    if params.iter().chain(bse.iter()).any(|v| !v.is_finite()) {
        return Err(failure(operation, "estimates are not finite"));
    }

    Ok(OlsFit {
        params,
        bse,
        ssr,
        nobs,
    })
}
