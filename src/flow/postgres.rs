//! PostgreSQL-backed flow store.
//!
//! Each call opens its own connection and closes it before returning,
//! whether or not the query succeeded.

use super::query::{flow_sql, top_stations_sql};
use super::{FlowStore, StationValues, flow_frame};
use crate::config::DatabaseConfig;
use crate::constants::RENTALS_COLUMN;
use crate::error::Result;
use crate::models::{FlowQuery, RentalTable, StationColumn};
use chrono::NaiveDateTime;
use polars::prelude::*;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Error as SqlxError};
use tracing::debug;

/// Flow store reading the rentals table of a PostgreSQL database
#[derive(Debug, Clone)]
pub struct PgFlowStore {
    config: DatabaseConfig,
}

impl PgFlowStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .database(&self.config.name);

        match &self.config.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    async fn connect(&self) -> Result<PgConnection> {
        debug!(
            "Connecting to {}@{}:{}/{}",
            self.config.user, self.config.host, self.config.port, self.config.name
        );
        Ok(PgConnection::connect_with(&self.connect_options()).await?)
    }
}

/// Close the connection, then surface the query outcome
async fn release<T>(conn: PgConnection, outcome: std::result::Result<T, SqlxError>) -> Result<T> {
    let closed = conn.close().await;
    let value = outcome?;
    closed?;
    Ok(value)
}

impl FlowStore for PgFlowStore {
    async fn fetch_flow(&self, query: &FlowQuery) -> Result<DataFrame> {
        let sql = flow_sql(query);
        debug!("Flow query: {}", sql);
        let unit = query.unit.as_str();
        let mut conn = self.connect().await?;

        match query.station {
            None => {
                let rows = sqlx::query_as::<_, (NaiveDateTime, i64)>(&sql)
                    .bind(unit)
                    .fetch_all(&mut conn)
                    .await;
                let rows = release(conn, rows).await?;

                let (buckets, counts): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
                flow_frame(query, &buckets, None, counts)
            }
            Some(station) if station.is_numeric() => {
                let rows = sqlx::query_as::<_, (NaiveDateTime, Option<i64>, i64)>(&sql)
                    .bind(unit)
                    .fetch_all(&mut conn)
                    .await;
                let rows = release(conn, rows).await?;

                let mut buckets = Vec::with_capacity(rows.len());
                let mut numbers = Vec::with_capacity(rows.len());
                let mut counts = Vec::with_capacity(rows.len());
                for (bucket, number, count) in rows {
                    buckets.push(bucket);
                    numbers.push(number);
                    counts.push(count);
                }
                flow_frame(query, &buckets, Some(StationValues::Numbers(numbers)), counts)
            }
            Some(_) => {
                let rows = sqlx::query_as::<_, (NaiveDateTime, Option<String>, i64)>(&sql)
                    .bind(unit)
                    .fetch_all(&mut conn)
                    .await;
                let rows = release(conn, rows).await?;

                let mut buckets = Vec::with_capacity(rows.len());
                let mut names = Vec::with_capacity(rows.len());
                let mut counts = Vec::with_capacity(rows.len());
                for (bucket, name, count) in rows {
                    buckets.push(bucket);
                    names.push(name);
                    counts.push(count);
                }
                flow_frame(query, &buckets, Some(StationValues::Names(names)), counts)
            }
        }
    }

    async fn top_stations(
        &self,
        table: &RentalTable,
        station: StationColumn,
        limit: usize,
    ) -> Result<DataFrame> {
        let sql = top_stations_sql(table, station);
        debug!("Top stations query: {}", sql);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.connect().await?;

        let stations = if station.is_numeric() {
            let rows = sqlx::query_as::<_, (Option<i64>, i64)>(&sql)
                .bind(limit)
                .fetch_all(&mut conn)
                .await;
            let (numbers, counts): (Vec<_>, Vec<_>) = release(conn, rows).await?.into_iter().unzip();
            vec![
                Series::new(station.alias().into(), numbers).into_column(),
                Series::new(RENTALS_COLUMN.into(), counts).into_column(),
            ]
        } else {
            let rows = sqlx::query_as::<_, (Option<String>, i64)>(&sql)
                .bind(limit)
                .fetch_all(&mut conn)
                .await;
            let (names, counts): (Vec<_>, Vec<_>) = release(conn, rows).await?.into_iter().unzip();
            vec![
                Series::new(station.alias().into(), names).into_column(),
                Series::new(RENTALS_COLUMN.into(), counts).into_column(),
            ]
        };

        Ok(DataFrame::new(stations)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_keeps_configuration() {
        let config = DatabaseConfig::default().with_name("bikemi_test").with_port(5433);
        let store = PgFlowStore::new(config.clone());
        assert_eq!(store.config(), &config);
    }
}
