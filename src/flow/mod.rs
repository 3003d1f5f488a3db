//! Bike flow retrieval.
//!
//! A flow is the number of rentals per truncated timestamp, optionally split
//! by station. Stores answer [`FlowQuery`]s either from PostgreSQL or from an
//! in-memory rental frame; both return the same long-format layout:
//!
//! | column                  | type                   |
//! |-------------------------|------------------------|
//! | time alias              | datetime (ms)          |
//! | station alias, if split | string or i64          |
//! | `count`                 | i64                    |
//!
//! rows sorted ascending by time, then station.

pub mod frame;
pub mod postgres;
pub mod query;

#[cfg(test)]
mod tests;

use crate::constants::COUNT_COLUMN;
use crate::error::Result;
use crate::models::{FlowQuery, RentalTable, StationColumn, TimeColumn};
use crate::utils::{datetime_series, require_column};
use chrono::NaiveDateTime;
use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;
use tracing::{debug, info};

pub use frame::FrameFlowStore;
pub use postgres::PgFlowStore;

/// Source of aggregated rental counts
#[allow(async_fn_in_trait)]
pub trait FlowStore {
    /// Rental counts per bucket (and station) for `query`
    async fn fetch_flow(&self, query: &FlowQuery) -> Result<DataFrame>;

    /// The `limit` stations with the most rentals, most used first
    async fn top_stations(
        &self,
        table: &RentalTable,
        station: StationColumn,
        limit: usize,
    ) -> Result<DataFrame>;
}

/// Retrieve a flow, logging its shape
pub async fn retrieve_bike_flow<S: FlowStore>(store: &S, query: &FlowQuery) -> Result<DataFrame> {
    info!(
        "Retrieving {} flow from {} by {}{}",
        query.time.alias(),
        query.table,
        query.unit,
        query
            .station
            .map(|s| format!(" and {}", s.alias()))
            .unwrap_or_default()
    );

    let flow = store.fetch_flow(query).await?;
    debug!("Flow has {} rows", flow.height());
    Ok(flow)
}

/// Station values of a split flow
#[derive(Debug, Clone, PartialEq)]
pub enum StationValues {
    Names(Vec<Option<String>>),
    Numbers(Vec<Option<i64>>),
}

impl StationValues {
    fn into_column(self, name: &str) -> Column {
        match self {
            StationValues::Names(values) => Series::new(name.into(), values).into_column(),
            StationValues::Numbers(values) => Series::new(name.into(), values).into_column(),
        }
    }
}

/// Assemble the long-format flow frame from decoded rows
pub fn flow_frame(
    query: &FlowQuery,
    buckets: &[NaiveDateTime],
    stations: Option<StationValues>,
    counts: Vec<i64>,
) -> Result<DataFrame> {
    let mut columns = vec![datetime_series(query.time.alias(), buckets).into_column()];
    if let (Some(station), Some(values)) = (query.station, stations) {
        columns.push(values.into_column(station.alias()));
    }
    columns.push(Series::new(COUNT_COLUMN.into(), counts).into_column());

    Ok(DataFrame::new(columns)?)
}

/// Reshape a station-split flow to wide form.
///
/// One row per time bucket, one column per station; combinations with no
/// rentals are null.
pub fn pivot_bike_flow(
    flow: &DataFrame,
    time: TimeColumn,
    station: StationColumn,
) -> Result<DataFrame> {
    require_column(flow, time.alias())?;
    require_column(flow, station.alias())?;
    require_column(flow, COUNT_COLUMN)?;

    let wide = pivot_stable(
        flow,
        [station.alias()],
        Some([time.alias()]),
        Some([COUNT_COLUMN]),
        true,
        None,
        None,
    )?;

    let wide = wide.sort([time.alias()], SortMultipleOptions::default())?;
    debug!(
        "Pivoted flow into {} buckets x {} stations",
        wide.height(),
        wide.width().saturating_sub(1)
    );
    Ok(wide)
}
