//! Set reconciliation between two station collections.
//!
//! The rental time series and the geospatial stall layer spell station names
//! differently; these helpers report which keys only exist on one side so the
//! correction table can be extended before spatial joins.

use crate::error::{BikeMiError, Result};
use crate::utils::require_column;
use polars::prelude::*;
use std::fmt;
use tracing::info;

/// Columns the two sides are matched on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKey {
    /// Same column name on both sides
    Shared(String),
    /// Different names on the left and right side
    Pair { left: String, right: String },
}

impl JoinKey {
    pub fn shared(name: impl Into<String>) -> Self {
        JoinKey::Shared(name.into())
    }

    pub fn pair(left: impl Into<String>, right: impl Into<String>) -> Self {
        JoinKey::Pair {
            left: left.into(),
            right: right.into(),
        }
    }

    /// One name means a shared column, two names a (left, right) pair.
    /// Anything else is rejected.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        match names {
            [shared] => Ok(JoinKey::shared(shared.as_ref())),
            [left, right] => Ok(JoinKey::pair(left.as_ref(), right.as_ref())),
            _ => Err(BikeMiError::InvalidJoinKey { got: names.len() }),
        }
    }

    pub fn left(&self) -> &str {
        match self {
            JoinKey::Shared(name) => name,
            JoinKey::Pair { left, .. } => left,
        }
    }

    pub fn right(&self) -> &str {
        match self {
            JoinKey::Shared(name) => name,
            JoinKey::Pair { right, .. } => right,
        }
    }

    /// The same key seen from the other side
    pub fn swapped(&self) -> Self {
        match self {
            JoinKey::Shared(name) => JoinKey::Shared(name.clone()),
            JoinKey::Pair { left, right } => JoinKey::pair(right.clone(), left.clone()),
        }
    }
}

impl From<&str> for JoinKey {
    fn from(name: &str) -> Self {
        JoinKey::shared(name)
    }
}

impl From<(&str, &str)> for JoinKey {
    fn from((left, right): (&str, &str)) -> Self {
        JoinKey::pair(left, right)
    }
}

/// Rows of `left` whose key has no match in `right`
pub fn anti_join(left: &DataFrame, right: &DataFrame, on: &JoinKey) -> Result<DataFrame> {
    require_column(left, on.left())?;
    require_column(right, on.right())?;

    let exclusive = left
        .clone()
        .lazy()
        .join(
            right.clone().lazy(),
            [col(on.left())],
            [col(on.right())],
            JoinArgs::new(JoinType::Anti),
        )
        .collect()?;

    Ok(exclusive)
}

/// Keys found on only one side of a reconciliation
#[derive(Debug, Clone)]
pub struct MismatchSets {
    pub left_label: String,
    pub right_label: String,
    /// Left keys with no match on the right
    pub left_only: Series,
    /// Right keys with no match on the left
    pub right_only: Series,
}

impl MismatchSets {
    pub fn with_labels(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_label = left.into();
        self.right_label = right.into();
        self
    }

    pub fn is_reconciled(&self) -> bool {
        self.left_only.is_empty() && self.right_only.is_empty()
    }
}

impl fmt::Display for MismatchSets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} stations are only in the {} data.",
            self.right_only.len(),
            self.right_label
        )?;
        write!(
            f,
            "{} stations are only in the {} data.",
            self.left_only.len(),
            self.left_label
        )
    }
}

/// How `mismatches` hands back its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchMode {
    /// Print the counts and return nothing
    Text,
    /// Return both exclusive key sets
    Frames,
}

/// Anti-join in both directions, returning the exclusive keys of each side
pub fn find_mismatches(
    left: &DataFrame,
    right: &DataFrame,
    left_on: &str,
    right_on: &str,
) -> Result<MismatchSets> {
    let key = JoinKey::pair(left_on, right_on);

    let right_only = anti_join(right, left, &key.swapped())?
        .column(right_on)?
        .as_materialized_series()
        .clone();
    let left_only = anti_join(left, right, &key)?
        .column(left_on)?
        .as_materialized_series()
        .clone();

    Ok(MismatchSets {
        left_label: "stalls".to_string(),
        right_label: "time series".to_string(),
        left_only,
        right_only,
    })
}

/// Report or return the keys that only exist on one side.
///
/// In [`MismatchMode::Text`] the counts are printed and `None` is returned;
/// in [`MismatchMode::Frames`] both exclusive key sets are returned.
pub fn mismatches(
    left: &DataFrame,
    right: &DataFrame,
    left_on: &str,
    right_on: &str,
    mode: MismatchMode,
) -> Result<Option<MismatchSets>> {
    let sets = find_mismatches(left, right, left_on, right_on)?;

    info!(
        left_only = sets.left_only.len(),
        right_only = sets.right_only.len(),
        "Reconciled '{}' against '{}'",
        left_on,
        right_on
    );

    match mode {
        MismatchMode::Text => {
            println!("{}", sets);
            Ok(None)
        }
        MismatchMode::Frames => Ok(Some(sets)),
    }
}
