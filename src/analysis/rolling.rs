//! Trailing-window rolling statistics.

use super::ensure_finite;
use crate::error::{BikeMiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_window(values: &[f64], window: usize, minimum: usize) -> Result<()> {
    if window < minimum || window > values.len() {
        return Err(BikeMiError::InvalidWindow {
            window,
            len: values.len(),
        });
    }
    Ok(())
}

/// Apply `stat` to every trailing window; the first `window - 1` slots are `None`
fn rolling<F>(values: &[f64], window: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    std::iter::repeat_n(None, window - 1)
        .chain(values.windows(window).map(|w| Some(stat(w))))
        .collect()
}

fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

fn sample_std(window: &[f64]) -> f64 {
    let m = mean(window);
    let ss: f64 = window.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (window.len() - 1) as f64).sqrt()
}

/// Mean of each trailing window of `window` observations
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    ensure_finite("rolling mean", values)?;
    check_window(values, window, 1)?;
    Ok(rolling(values, window, mean))
}

/// Sample standard deviation (ddof = 1) of each trailing window.
///
/// Needs at least two observations per window.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    ensure_finite("rolling standard deviation", values)?;
    check_window(values, window, 2)?;
    Ok(rolling(values, window, sample_std))
}

/// Which rolling statistics to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollingKind {
    Mean,
    Std,
    Both,
}

impl RollingKind {
    fn includes_mean(&self) -> bool {
        matches!(self, RollingKind::Mean | RollingKind::Both)
    }

    fn includes_std(&self) -> bool {
        matches!(self, RollingKind::Std | RollingKind::Both)
    }
}

/// Observed series together with its rolling statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStatistics {
    pub window: usize,
    pub observed: Vec<f64>,
    pub mean: Option<Vec<Option<f64>>>,
    pub std: Option<Vec<Option<f64>>>,
}

impl RollingStatistics {
    pub fn compute(values: &[f64], window: usize, kind: RollingKind) -> Result<Self> {
        let mean = if kind.includes_mean() {
            Some(rolling_mean(values, window)?)
        } else {
            None
        };
        let std = if kind.includes_std() {
            Some(rolling_std(values, window)?)
        } else {
            None
        };

        Ok(Self {
            window,
            observed: values.to_vec(),
            mean,
            std,
        })
    }

    /// Chart title naming the statistics and the window size
    pub fn title(&self) -> String {
        let what = match (self.mean.is_some(), self.std.is_some()) {
            (true, true) => "Rolling Mean and Standard Deviation",
            (true, false) => "Rolling Mean",
            _ => "Rolling Standard Deviation",
        };
        format!("{}\nWindow size: {}", what, self.window)
    }
}

impl fmt::Display for RollingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_default();

        writeln!(f, "{}", self.title())?;
        for (i, observed) in self.observed.iter().enumerate() {
            write!(f, "{:>6} {:>14.4}", i, observed)?;
            if let Some(mean) = &self.mean {
                write!(f, " {:>14}", cell(mean[i]))?;
            }
            if let Some(std) = &self.std {
                write!(f, " {:>14}", cell(std[i]))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rolling_mean_defined_count() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        for window in 1..=10 {
            let out = rolling_mean(&values, window).unwrap();
            assert_eq!(out.len(), 10);
            assert_eq!(out.iter().filter(|v| v.is_none()).count(), window - 1);
            assert_eq!(out.iter().filter(|v| v.is_some()).count(), 10 - window + 1);
        }
    }

    #[test]
    fn test_rolling_mean_values() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let out = rolling_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8).unwrap();
        assert!(out[..7].iter().all(Option::is_none));
        // Population std of this set is 2; sample std is sqrt(32 / 7)
        assert_relative_eq!(out[7].unwrap(), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_windows() {
        let values = [1.0, 2.0, 3.0];
        assert!(matches!(
            rolling_mean(&values, 0),
            Err(BikeMiError::InvalidWindow { window: 0, len: 3 })
        ));
        assert!(matches!(
            rolling_mean(&values, 4),
            Err(BikeMiError::InvalidWindow { window: 4, len: 3 })
        ));
        assert!(matches!(
            rolling_std(&values, 1),
            Err(BikeMiError::InvalidWindow { window: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_input() {
        assert!(matches!(
            rolling_mean(&[1.0, f64::NAN, 3.0], 2),
            Err(BikeMiError::NonFiniteValue { position: 1, .. })
        ));
    }

    #[test]
    fn test_titles() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let both = RollingStatistics::compute(&values, 3, RollingKind::Both).unwrap();
        assert_eq!(both.title(), "Rolling Mean and Standard Deviation\nWindow size: 3");

        let mean = RollingStatistics::compute(&values, 3, RollingKind::Mean).unwrap();
        assert_eq!(mean.title(), "Rolling Mean\nWindow size: 3");
        assert!(mean.std.is_none());

        let std = RollingStatistics::compute(&values, 2, RollingKind::Std).unwrap();
        assert_eq!(std.title(), "Rolling Standard Deviation\nWindow size: 2");
    }
}
