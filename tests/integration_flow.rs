//! Integration tests for the rental analysis workflow
//!
//! A rental extract goes through CSV, flow retrieval, pivoting, missing
//! observation profiling, calendar features and the stationarity report.

use bikemi_analysis::analysis::{
    AdfReport, Regression, RollingKind, RollingStatistics, acf, adfuller, station_missing_obs,
};
use bikemi_analysis::config::ReportStyle;
use bikemi_analysis::features::{CalendarFeature, create_ts_features};
use bikemi_analysis::flow::{FlowStore, FrameFlowStore, pivot_bike_flow, retrieve_bike_flow};
use bikemi_analysis::models::{
    FlowQuery, RentalRecord, RentalTable, StationColumn, TimeColumn, TruncUnit,
};
use bikemi_analysis::output::{read_csv, write_csv};
use bikemi_analysis::stations::{clean_frame, find_mismatches};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tempfile::TempDir;

const STATIONS: [(i32, &str); 3] = [(1, "Duomo"), (2, "Cadorna"), (3, "Brera")];

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 4, 1)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap()
}

/// Deterministic pseudo-random daily volumes between 1 and 6
fn daily_volumes(days: usize) -> Vec<usize> {
    let mut state: u64 = 2019;
    (0..days)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            1 + ((state >> 33) % 6) as usize
        })
        .collect()
}

/// Rentals spread over `days` days; Brera is never used on even days
fn create_rentals(days: usize) -> Vec<RentalRecord> {
    let mut records = Vec::new();
    for (day, volume) in daily_volumes(days).into_iter().enumerate() {
        for trip in 0..volume {
            let pickup = start() + Duration::days(day as i64) + Duration::minutes(37 * trip as i64);
            let stations = if day % 2 == 0 { 2 } else { 3 };
            let from = STATIONS[trip % stations];
            let to = STATIONS[(trip + 1) % stations];
            records.push(RentalRecord {
                bici: format!("bike_{}_{}", day, trip),
                tipo_bici: "Classic".to_string(),
                cliente_anonimizzato: format!("client_{}", trip),
                data_prelievo: pickup,
                numero_stazione_prelievo: Some(from.0),
                nome_stazione_prelievo: from.1.to_string(),
                data_restituzione: pickup + Duration::minutes(12),
                numero_stazione_restituzione: Some(to.0),
                nome_stazione_restituzione: to.1.to_string(),
                durata_noleggio: 12.0,
                distanza_totale: Some(2.0),
            });
        }
    }
    records
}

fn table() -> RentalTable {
    RentalTable::new("bikemi_2019").unwrap()
}

fn i64_column(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_extract_round_trips_through_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rentals.csv");

    let store = FrameFlowStore::from_records(&create_rentals(10)).unwrap();
    let mut rentals = store.rentals().clone();
    write_csv(&mut rentals, &path).unwrap();

    let reloaded = FrameFlowStore::new(read_csv(&path).unwrap());
    let query = FlowQuery::new(table()).with_station(StationColumn::PickupNumber);

    let expected = retrieve_bike_flow(&store, &query).await.unwrap();
    let actual = retrieve_bike_flow(&reloaded, &query).await.unwrap();

    assert_eq!(expected.height(), actual.height());
    assert_eq!(i64_column(&expected, "count"), i64_column(&actual, "count"));
    assert_eq!(
        i64_column(&expected, "numero_stazione_partenza"),
        i64_column(&actual, "numero_stazione_partenza")
    );
}

#[tokio::test]
async fn test_daily_flow_matches_volumes() {
    let volumes = daily_volumes(30);
    let store = FrameFlowStore::from_records(&create_rentals(30)).unwrap();

    let flow = retrieve_bike_flow(&store, &FlowQuery::new(table()))
        .await
        .unwrap();

    let counts: Vec<i64> = i64_column(&flow, "count").into_iter().flatten().collect();
    let expected: Vec<i64> = volumes.iter().map(|v| *v as i64).collect();
    assert_eq!(counts, expected);
}

#[tokio::test]
async fn test_pivot_and_missing_observations() {
    let store = FrameFlowStore::from_records(&create_rentals(20)).unwrap();
    let query = FlowQuery::new(table())
        .with_unit(TruncUnit::Day)
        .with_station(StationColumn::PickupName);

    let flow = retrieve_bike_flow(&store, &query).await.unwrap();
    let wide = pivot_bike_flow(&flow, TimeColumn::Pickup, StationColumn::PickupName).unwrap();
    assert_eq!(wide.height(), 20);
    assert_eq!(wide.width(), 4);

    let profile = station_missing_obs(&wide, "giorno_partenza").unwrap();
    let first = profile
        .column("stazione")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .get(0)
        .map(str::to_string);
    // Brera has no rentals on even days, so it is the least complete
    assert_eq!(first.as_deref(), Some("Brera"));
}

#[tokio::test]
async fn test_top_stations_ranking() {
    let store = FrameFlowStore::from_records(&create_rentals(20)).unwrap();
    let top = store
        .top_stations(&table(), StationColumn::PickupName, 2)
        .await
        .unwrap();

    assert_eq!(top.height(), 2);
    let counts: Vec<i64> = i64_column(&top, "numero_noleggi").into_iter().flatten().collect();
    assert!(counts[0] >= counts[1]);
}

#[tokio::test]
async fn test_diagnostics_on_daily_flow() {
    let store = FrameFlowStore::from_records(&create_rentals(90)).unwrap();
    let flow = retrieve_bike_flow(&store, &FlowQuery::new(table()))
        .await
        .unwrap();

    let flow = create_ts_features(
        flow,
        "giorno_partenza",
        &[CalendarFeature::DayName, CalendarFeature::Weekend, CalendarFeature::Holiday],
    )
    .unwrap();
    let holidays = flow
        .column("holiday")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .flatten()
        .filter(|label| *label != "None")
        .count();
    // Easter Sunday and Monday, 25 April, 1 May and 2 June 2019
    assert_eq!(holidays, 5);

    let values: Vec<f64> = i64_column(&flow, "count")
        .into_iter()
        .map(|v| v.unwrap_or_default() as f64)
        .collect();

    let rolling = RollingStatistics::compute(&values, 7, RollingKind::Both).unwrap();
    assert_eq!(rolling.mean.as_ref().unwrap().len(), 90);

    let correlogram = acf(&values, None).unwrap();
    assert!((correlogram.values[0] - 1.0).abs() < 1e-12);

    let result = adfuller(&values, Regression::Constant).unwrap();
    assert!((0.0..=1.0).contains(&result.pvalue));
    let report = AdfReport::new(result).render(&ReportStyle::plain());
    assert!(report.starts_with("Test Statistics: "));
    assert!(report.contains("Critical Value (5%): "));
}

#[test]
fn test_station_names_reconcile_after_cleaning() {
    let stalls = df!("nome" => ["Duomo", "Cadorna", "Brera"]).unwrap();
    let series = df!("stazione_partenza" => ["DUOMO ", "Cadorna", "Brèra", "Garibaldi"]).unwrap();

    let stalls = clean_frame(stalls, "nome", true).unwrap();
    let series = clean_frame(series, "stazione_partenza", true).unwrap();

    let sets = find_mismatches(&stalls, &series, "nome", "stazione_partenza").unwrap();
    assert_eq!(sets.left_only.len(), 0);
    assert_eq!(sets.right_only.len(), 1);
}
