//! In-memory flow store over a rental frame.
//!
//! Applies the same truncation and counting rules as the database store, so
//! offline extracts and tests produce identical flows.

use super::FlowStore;
use crate::constants::{COUNT_COLUMN, RENTALS_COLUMN, columns};
use crate::error::Result;
use crate::models::{FlowQuery, RentalRecord, RentalTable, StationColumn};
use crate::utils::{datetime_series, datetime_values, require_column};
use polars::prelude::*;
use tracing::debug;

/// Flow store answering queries from rentals held in memory.
///
/// The frame plays the role of a single rentals table; the table named in a
/// query is not consulted.
#[derive(Debug, Clone)]
pub struct FrameFlowStore {
    rentals: DataFrame,
}

impl FrameFlowStore {
    pub fn new(rentals: DataFrame) -> Self {
        Self { rentals }
    }

    /// Build the rental frame from parsed records
    pub fn from_records(records: &[RentalRecord]) -> Result<Self> {
        let pickups: Vec<_> = records.iter().map(|r| r.data_prelievo).collect();
        let returns: Vec<_> = records.iter().map(|r| r.data_restituzione).collect();

        let frame = DataFrame::new(vec![
            text_column(records, columns::BIKE, |r| &r.bici),
            text_column(records, columns::BIKE_TYPE, |r| &r.tipo_bici),
            text_column(records, columns::CLIENT, |r| &r.cliente_anonimizzato),
            datetime_series(columns::PICKUP_TIME, &pickups).into_column(),
            Series::new(
                columns::PICKUP_STATION_NUMBER.into(),
                records.iter().map(|r| r.numero_stazione_prelievo).collect::<Vec<_>>(),
            )
            .into_column(),
            text_column(records, columns::PICKUP_STATION_NAME, |r| {
                &r.nome_stazione_prelievo
            }),
            datetime_series(columns::RETURN_TIME, &returns).into_column(),
            Series::new(
                columns::RETURN_STATION_NUMBER.into(),
                records.iter().map(|r| r.numero_stazione_restituzione).collect::<Vec<_>>(),
            )
            .into_column(),
            text_column(records, columns::RETURN_STATION_NAME, |r| {
                &r.nome_stazione_restituzione
            }),
            Series::new(
                columns::DURATION.into(),
                records.iter().map(|r| r.durata_noleggio).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                columns::DISTANCE.into(),
                records.iter().map(|r| r.distanza_totale).collect::<Vec<_>>(),
            )
            .into_column(),
        ])?;

        Ok(Self::new(frame))
    }

    pub fn rentals(&self) -> &DataFrame {
        &self.rentals
    }

    /// Station column renamed to its flow alias
    fn station_expr(&self, station: StationColumn) -> Result<Expr> {
        let source = require_column(&self.rentals, station.source())?;
        let expr = col(station.source());
        // Match the database store, which widens station numbers to bigint
        let expr = if station.is_numeric() && source.dtype().is_integer() {
            expr.cast(DataType::Int64)
        } else {
            expr
        };
        Ok(expr.alias(station.alias()))
    }
}

fn text_column(records: &[RentalRecord], name: &str, field: fn(&RentalRecord) -> &str) -> Column {
    let values: Vec<&str> = records.iter().map(field).collect();
    Series::new(name.into(), values).into_column()
}

impl FlowStore for FrameFlowStore {
    async fn fetch_flow(&self, query: &FlowQuery) -> Result<DataFrame> {
        require_column(&self.rentals, columns::BIKE)?;
        let time_alias = query.time.alias();

        let buckets: Vec<_> = datetime_values(&self.rentals, query.time.source())?
            .into_iter()
            .map(|ts| query.unit.truncate(ts))
            .collect();
        debug!(
            "Truncated {} timestamps to {} buckets in memory",
            buckets.len(),
            query.unit
        );

        let mut keys = vec![col(time_alias)];
        let mut order = vec![time_alias];
        if let Some(station) = query.station {
            keys.push(self.station_expr(station)?);
            order.push(station.alias());
        }
        let mut output: Vec<Expr> = order.iter().map(|name| col(*name)).collect();
        output.push(col(COUNT_COLUMN));

        let mut rentals = self.rentals.clone();
        rentals.with_column(datetime_series(time_alias, &buckets))?;

        let flow = rentals
            .lazy()
            .group_by(keys)
            .agg([col(columns::BIKE)
                .count()
                .cast(DataType::Int64)
                .alias(COUNT_COLUMN)])
            // PostgreSQL places nulls last in ascending order
            .sort(order, SortMultipleOptions::default().with_nulls_last(true))
            .select(output)
            .collect()?;

        Ok(flow)
    }

    async fn top_stations(
        &self,
        _table: &RentalTable,
        station: StationColumn,
        limit: usize,
    ) -> Result<DataFrame> {
        let limit = IdxSize::try_from(limit).unwrap_or(IdxSize::MAX);

        let top = self
            .rentals
            .clone()
            .lazy()
            .group_by([self.station_expr(station)?])
            .agg([len().cast(DataType::Int64).alias(RENTALS_COLUMN)])
            .sort(
                [RENTALS_COLUMN, station.alias()],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true),
            )
            .limit(limit)
            .collect()?;

        Ok(top)
    }
}
