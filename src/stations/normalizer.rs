//! Station-name normalisation.
//!
//! Turns the free-text station names recorded across several years of
//! rental logs into canonical keys that can be matched against the
//! geospatial station layer. The correction rules are specific to the
//! BikeMi dataset and their order is significant: each rule sees the output
//! of the rules before it.

use crate::constants::CLEAN_PREFIX;
use crate::error::{BikeMiError, Result};
use crate::utils::require_column;
use polars::prelude::*;
use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// What a correction rule looks for
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Plain substring, every occurrence replaced
    Literal(&'static str),
    /// Regular expression, every match replaced
    Regex(Regex),
}

/// One entry of the ordered correction table
#[derive(Debug, Clone)]
pub struct CorrectionRule {
    pattern: Pattern,
    replacement: &'static str,
}

impl CorrectionRule {
    pub fn literal(pattern: &'static str, replacement: &'static str) -> Self {
        Self {
            pattern: Pattern::Literal(pattern),
            replacement,
        }
    }

    pub fn regex(pattern: &str, replacement: &'static str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| BikeMiError::Configuration {
            message: format!("invalid correction pattern '{}': {}", pattern, e),
        })?;
        Ok(Self {
            pattern: Pattern::Regex(regex),
            replacement,
        })
    }

    /// Source text of the pattern, as written in the table
    pub fn pattern(&self) -> &str {
        match &self.pattern {
            Pattern::Literal(literal) => literal,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }

    pub fn replacement(&self) -> &str {
        self.replacement
    }

    pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match &self.pattern {
            Pattern::Literal(literal) => {
                if input.contains(literal) {
                    Cow::Owned(input.replace(literal, self.replacement))
                } else {
                    Cow::Borrowed(input)
                }
            }
            Pattern::Regex(regex) => regex.replace_all(input, NoExpand(self.replacement)),
        }
    }
}

static STATION_RULES: LazyLock<Vec<CorrectionRule>> = LazyLock::new(|| {
    let regex = |pattern: &str, replacement: &'static str| {
        CorrectionRule::regex(pattern, replacement).expect("built-in correction pattern is valid")
    };

    vec![
        regex(r#"['"]"#, ""),
        regex(r"[\s\-./]+", "_"),
        CorrectionRule::literal("gimignano", "giminiano"),
        CorrectionRule::literal("donizzetti", "donizetti"),
        CorrectionRule::literal("soderini", "solderini"),
        CorrectionRule::literal("montenero", "monte_nero"),
        CorrectionRule::literal("d_eril", "deril"),
        regex(r"^bocconi_2", "universita_bocconi_2"),
        // Adjacent abbreviations ("_g_g_") share an underscore, so only the
        // first is expanded per pass and a second pass expands the next
        CorrectionRule::literal("_g_", "_grande_"),
        CorrectionRule::literal("piazza_nizza", "piazzale_nizza"),
        CorrectionRule::literal("_chiusa_provvisoriamente_", ""),
        CorrectionRule::literal("_chiusa_provv_", ""),
    ]
});

/// The built-in correction table, in application order
pub fn station_rules() -> &'static [CorrectionRule] {
    &STATION_RULES
}

/// Remove diacritics by decomposing and dropping combining marks
pub fn strip_accents(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Normalise a label against an explicit rule table
pub fn normalize_with_rules(raw: &str, rules: &[CorrectionRule]) -> String {
    let mut label = strip_accents(&raw.trim().to_lowercase());

    for rule in rules {
        let replaced = match rule.apply(&label) {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };
        if let Some(replaced) = replaced {
            label = replaced;
        }
    }

    label
}

/// Canonical key for a raw station name
pub fn normalize_station_name(raw: &str) -> String {
    normalize_with_rules(raw, station_rules())
}

/// Normalise every label of a string series, keeping length and order.
///
/// Missing values are rejected; fill or drop them first.
pub fn clean_series(series: &Series) -> Result<Series> {
    let labels = series.str()?;

    let cleaned = labels
        .into_iter()
        .enumerate()
        .map(|(row, label)| {
            label
                .map(normalize_station_name)
                .ok_or_else(|| BikeMiError::MissingValue {
                    column: series.name().to_string(),
                    row,
                })
        })
        .collect::<Result<Vec<String>>>()?;

    debug!(
        "Normalised {} labels in column '{}'",
        cleaned.len(),
        series.name()
    );

    Ok(Series::new(series.name().clone(), cleaned))
}

/// Normalise a station-name column of a frame.
///
/// With `in_place` the column is overwritten, otherwise the result is added
/// as `clean_<column>` next to the original.
pub fn clean_frame(mut df: DataFrame, column: &str, in_place: bool) -> Result<DataFrame> {
    let cleaned = clean_series(require_column(&df, column)?.as_materialized_series())?;

    let cleaned = if in_place {
        cleaned
    } else {
        cleaned.with_name(format!("{}{}", CLEAN_PREFIX, column).into())
    };

    df.with_column(cleaned)?;
    Ok(df)
}
