//! Human-readable diagnostic reports.
//!
//! Rendering takes a [`ReportStyle`] so colour and layout are decided by the
//! caller rather than by process-wide state.

use super::correlation::Correlogram;
use super::stationarity::AdfResult;
use crate::config::ReportStyle;
use colored::*;

fn indent_lines(text: &str, style: &ReportStyle) -> String {
    let pad = " ".repeat(style.indent);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed-layout report of an augmented Dickey-Fuller test
#[derive(Debug, Clone, PartialEq)]
pub struct AdfReport {
    pub result: AdfResult,
}

impl AdfReport {
    pub fn new(result: AdfResult) -> Self {
        Self { result }
    }

    /// "stationary" when the p-value is at most 0.05, else "non-stationary"
    pub fn conclusion(&self) -> &'static str {
        if self.result.is_stationary() {
            "stationary"
        } else {
            "non-stationary"
        }
    }

    fn conclusion_line(&self, style: &ReportStyle) -> String {
        if !style.colored {
            return format!("The series is {}", self.conclusion());
        }
        if self.result.is_stationary() {
            format!("{}", "The series is stationary".bold())
        } else {
            format!(
                "{} {}{}",
                "The series is".bold(),
                "non-".red().bold(),
                "stationary".red().bold()
            )
        }
    }

    pub fn render(&self, style: &ReportStyle) -> String {
        let r = &self.result;
        let cv = &r.critical_values;

        let mut text = format!(
            "Test Statistics: {}\n\
             p-value: {}\n\
             \n\
             Number of lags: {}\n\
             Number of observations: {}\n\
             \n\
             Critical Value (1%): {}\n\
             Critical Value (5%): {}\n\
             Critical Value (10%): {}\n\
             \n",
            r.statistic,
            r.pvalue,
            r.used_lag,
            r.nobs,
            cv.one_percent,
            cv.five_percent,
            cv.ten_percent,
        );
        if let Some(aic) = r.icbest {
            text.push_str(&format!("AIC: {}\n\n", aic));
        }
        text.push_str(&self.conclusion_line(style));

        indent_lines(&text, style)
    }
}

/// Table of a correlogram with its confidence band
pub fn render_correlogram(title: &str, correlogram: &Correlogram, style: &ReportStyle) -> String {
    let significant = correlogram.significant_lags();
    let heading = if style.colored {
        title.bright_green().bold().to_string()
    } else {
        title.to_string()
    };

    let mut text = format!("{}\n{:>4} {:>10} {:>10} {:>10}\n", heading, "lag", "value", "lower", "upper");
    for (lag, (value, (lower, upper))) in correlogram
        .values
        .iter()
        .zip(&correlogram.confint)
        .enumerate()
    {
        let row = format!("{:>4} {:>10.4} {:>10.4} {:>10.4}", lag, value, lower, upper);
        if style.colored && significant.contains(&lag) {
            text.push_str(&row.bright_white().bold().to_string());
        } else {
            text.push_str(&row);
        }
        if !style.colored && significant.contains(&lag) {
            text.push_str(" *");
        }
        text.push('\n');
    }

    indent_lines(&text, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stationarity::{CriticalValues, Regression};

    fn result(pvalue: f64, icbest: Option<f64>) -> AdfResult {
        AdfResult {
            statistic: -3.5,
            pvalue,
            used_lag: 7,
            nobs: 357,
            critical_values: CriticalValues {
                one_percent: -3.98,
                five_percent: -3.42,
                ten_percent: -3.13,
            },
            icbest,
            regression: Regression::ConstantTrend,
        }
    }

    #[test]
    fn test_plain_report_layout() {
        let report = AdfReport::new(result(0.04, Some(5120.5)));
        let text = report.render(&ReportStyle::plain());

        assert_eq!(
            text,
            "Test Statistics: -3.5\n\
             p-value: 0.04\n\
             \n\
             Number of lags: 7\n\
             Number of observations: 357\n\
             \n\
             Critical Value (1%): -3.98\n\
             Critical Value (5%): -3.42\n\
             Critical Value (10%): -3.13\n\
             \n\
             AIC: 5120.5\n\
             \n\
             The series is stationary"
        );
    }

    #[test]
    fn test_conclusion_threshold() {
        assert_eq!(AdfReport::new(result(0.05, None)).conclusion(), "stationary");
        assert_eq!(AdfReport::new(result(0.0501, None)).conclusion(), "non-stationary");
    }

    #[test]
    fn test_indent_and_missing_aic() {
        let report = AdfReport::new(result(0.3, None));
        let text = report.render(&ReportStyle::plain().with_indent(4));

        assert!(text.starts_with("    Test Statistics"));
        assert!(!text.contains("AIC"));
        assert!(text.ends_with("    The series is non-stationary"));
    }

    #[test]
    fn test_coloured_report_keeps_wording() {
        let report = AdfReport::new(result(0.3, None));
        let text = report.render(&ReportStyle::default());
        assert!(text.contains("non-"));
        assert!(text.contains("stationary"));
    }

    #[test]
    fn test_correlogram_marks_significant_lags() {
        let correlogram = Correlogram {
            values: vec![1.0, 0.6, 0.05],
            confint: vec![(1.0, 1.0), (0.4, 0.8), (-0.15, 0.25)],
        };
        let text = render_correlogram("Autocorrelation (95% CI)", &correlogram, &ReportStyle::plain());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Autocorrelation (95% CI)");
        assert!(lines[3].ends_with('*'));
        assert!(!lines[4].ends_with('*'));
    }
}
