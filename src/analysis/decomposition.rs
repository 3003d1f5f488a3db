//! Classical seasonal decomposition by moving averages.

use super::ensure_finite;
use crate::error::{BikeMiError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How trend, seasonal and residual components combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecompositionModel {
    #[default]
    Additive,
    Multiplicative,
}

impl FromStr for DecompositionModel {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "additive" | "add" => Ok(DecompositionModel::Additive),
            "multiplicative" | "mul" => Ok(DecompositionModel::Multiplicative),
            other => Err(BikeMiError::unknown("decomposition model", other)),
        }
    }
}

/// Components of a decomposed series; trend and residual are undefined at
/// the edges the centred moving average cannot reach
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub model: DecompositionModel,
    pub period: usize,
    pub observed: Vec<f64>,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub resid: Vec<Option<f64>>,
}

impl DecompositionModel {
    fn remove(&self, value: f64, component: f64) -> f64 {
        match self {
            DecompositionModel::Additive => value - component,
            DecompositionModel::Multiplicative => value / component,
        }
    }
}

/// Centred moving average over one full period (2×m MA for even periods)
fn centred_trend(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] /= 2.0;
        w[period] /= 2.0;
        w
    } else {
        vec![1.0 / period as f64; period]
    };
    let half = weights.len() / 2;

    (0..values.len())
        .map(|t| {
            if t < half || t + half >= values.len() {
                return None;
            }
            let start = t - half;
            Some(
                weights
                    .iter()
                    .zip(&values[start..start + weights.len()])
                    .map(|(w, v)| w * v)
                    .sum(),
            )
        })
        .collect()
}

/// Split `values` into trend, seasonal and residual components.
///
/// Needs two complete cycles; the multiplicative model needs strictly
/// positive values.
pub fn seasonal_decompose(
    values: &[f64],
    period: usize,
    model: DecompositionModel,
) -> Result<Decomposition> {
    const OPERATION: &str = "seasonal decomposition";
    ensure_finite(OPERATION, values)?;

    if period < 2 {
        return Err(BikeMiError::InvalidWindow {
            window: period,
            len: values.len(),
        });
    }
    if values.len() < 2 * period {
        return Err(BikeMiError::insufficient(OPERATION, 2 * period, values.len()));
    }
    if model == DecompositionModel::Multiplicative {
        if let Some(position) = values.iter().position(|v| *v <= 0.0) {
            return Err(BikeMiError::NonPositiveValue {
                operation: "multiplicative decomposition".to_string(),
                position,
            });
        }
    }

    let trend = centred_trend(values, period);
    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(&trend)
        .map(|(v, t)| t.map(|t| model.remove(*v, t)))
        .collect();

    let mut indices: Vec<f64> = (0..period)
        .map(|phase| {
            let cycle: Vec<f64> = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .flatten()
                .copied()
                .collect();
            cycle.iter().sum::<f64>() / cycle.len() as f64
        })
        .collect();
    let centre = indices.iter().sum::<f64>() / period as f64;
    for index in indices.iter_mut() {
        *index = model.remove(*index, centre);
    }

    let seasonal: Vec<f64> = (0..values.len()).map(|t| indices[t % period]).collect();
    let resid = detrended
        .iter()
        .zip(&seasonal)
        .map(|(d, s)| d.map(|d| model.remove(d, *s)))
        .collect();

    Ok(Decomposition {
        model,
        period,
        observed: values.to_vec(),
        trend,
        seasonal,
        resid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weekly_pattern(weeks: usize) -> Vec<f64> {
        let pattern = [5.0, 3.0, 1.0, -1.0, -2.0, -3.0, -3.0];
        (0..weeks * 7)
            .map(|t| 100.0 + 0.5 * t as f64 + pattern[t % 7])
            .collect()
    }

    #[test]
    fn test_additive_recovers_components() {
        let values = weekly_pattern(6);
        let result = seasonal_decompose(&values, 7, DecompositionModel::Additive).unwrap();

        assert!(result.trend[..3].iter().all(Option::is_none));
        assert_relative_eq!(result.trend[3].unwrap(), 101.5, epsilon = 1e-9);
        assert_relative_eq!(result.seasonal[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(result.seasonal[7], 5.0, epsilon = 1e-9);
        assert_relative_eq!(result.seasonal.iter().take(7).sum::<f64>(), 0.0, epsilon = 1e-9);
        for r in result.resid.iter().flatten() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_even_period_uses_half_weights() {
        let values: Vec<f64> = (0..12).map(|t| t as f64).collect();
        let result = seasonal_decompose(&values, 4, DecompositionModel::Additive).unwrap();

        assert_eq!(result.trend.iter().filter(|t| t.is_some()).count(), 8);
        assert_relative_eq!(result.trend[2].unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_multiplicative_indices_average_one() {
        let values: Vec<f64> = (0..28)
            .map(|t| (50.0 + t as f64) * [1.2, 1.0, 0.9, 0.9][t % 4])
            .collect();
        let result = seasonal_decompose(&values, 4, DecompositionModel::Multiplicative).unwrap();

        let mean = result.seasonal.iter().take(4).sum::<f64>() / 4.0;
        assert_relative_eq!(mean, 1.0, epsilon = 1e-12);
        assert!(result.seasonal[0] > 1.1);
    }

    #[test]
    fn test_rejects_short_and_non_positive_series() {
        assert!(matches!(
            seasonal_decompose(&[1.0; 10], 7, DecompositionModel::Additive),
            Err(BikeMiError::InsufficientData { .. })
        ));
        let mut values = vec![1.0; 20];
        values[4] = 0.0;
        assert!(matches!(
            seasonal_decompose(&values, 4, DecompositionModel::Multiplicative),
            Err(BikeMiError::NonPositiveValue { position: 4, .. })
        ));
    }
}
