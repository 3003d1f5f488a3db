//! SQL text for flow retrieval.
//!
//! Identifiers come from fixed enums or a validated [`RentalTable`]; the
//! truncation unit and limits are bound as parameters, so no caller text is
//! ever spliced into a statement.

use crate::constants::{COUNT_COLUMN, RENTALS_COLUMN, columns};
use crate::models::{FlowQuery, RentalTable, StationColumn};

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

/// Station expression, with numbers widened so they always decode as `i64`
fn station_expr(station: StationColumn) -> String {
    if station.is_numeric() {
        format!("{}::bigint", quote(station.source()))
    } else {
        quote(station.source())
    }
}

/// Aggregation counting rentals per truncated timestamp (and station).
///
/// `$1` is the `date_trunc` field name.
pub fn flow_sql(query: &FlowQuery) -> String {
    let bucket = format!(
        "date_trunc($1, {})::timestamp AS {}",
        quote(query.time.source()),
        quote(query.time.alias())
    );
    let count = format!(
        "COUNT({}) AS {}",
        quote(columns::BIKE),
        quote(COUNT_COLUMN)
    );

    match query.station {
        None => format!(
            "SELECT {}, {} FROM {} GROUP BY 1 ORDER BY 1",
            bucket,
            count,
            query.table.quoted()
        ),
        Some(station) => format!(
            "SELECT {}, {} AS {}, {} FROM {} GROUP BY 1, 2 ORDER BY 1, 2",
            bucket,
            station_expr(station),
            quote(station.alias()),
            count,
            query.table.quoted()
        ),
    }
}

/// Most frequent stations, `$1` being the row limit
pub fn top_stations_sql(table: &RentalTable, station: StationColumn) -> String {
    format!(
        "SELECT {} AS {}, COUNT(*) AS {} FROM {} GROUP BY 1 ORDER BY 2 DESC, 1 LIMIT $1",
        station_expr(station),
        quote(station.alias()),
        quote(RENTALS_COLUMN),
        table.quoted()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TimeColumn, TruncUnit};

    fn table() -> RentalTable {
        RentalTable::new("bikemi_2019").unwrap()
    }

    #[test]
    fn test_city_flow_sql() {
        let sql = flow_sql(&FlowQuery::new(table()));
        assert_eq!(
            sql,
            "SELECT date_trunc($1, \"data_prelievo\")::timestamp AS \"giorno_partenza\", \
             COUNT(\"bici\") AS \"count\" FROM \"bikemi_2019\" GROUP BY 1 ORDER BY 1"
        );
    }

    #[test]
    fn test_station_flow_sql() {
        let query = FlowQuery::new(table())
            .with_unit(TruncUnit::Hour)
            .with_time(TimeColumn::Return)
            .with_station(StationColumn::ReturnName);
        let sql = flow_sql(&query);

        assert!(sql.contains("date_trunc($1, \"data_restituzione\")::timestamp AS \"giorno_restituzione\""));
        assert!(sql.contains("\"nome_stazione_restituzione\" AS \"stazione_arrivo\""));
        assert!(sql.ends_with("GROUP BY 1, 2 ORDER BY 1, 2"));
        // The unit is bound, never inlined
        assert!(!sql.contains("hour"));
    }

    #[test]
    fn test_top_stations_sql() {
        let sql = top_stations_sql(&table(), StationColumn::PickupName);
        assert_eq!(
            sql,
            "SELECT \"nome_stazione_prelievo\" AS \"stazione_partenza\", COUNT(*) AS \"numero_noleggi\" \
             FROM \"bikemi_2019\" GROUP BY 1 ORDER BY 2 DESC, 1 LIMIT $1"
        );
    }

    #[test]
    fn test_station_numbers_are_widened() {
        let query = FlowQuery::new(table()).with_station(StationColumn::PickupNumber);
        assert!(flow_sql(&query).contains("\"numero_stazione_prelievo\"::bigint AS"));
    }
}
