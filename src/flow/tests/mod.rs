//! Shared fixtures for flow retrieval tests

use crate::flow::FrameFlowStore;
use crate::models::RentalRecord;
use chrono::NaiveDateTime;
use polars::prelude::*;


pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A rental picked up and returned at the given stations
pub fn create_rental(bike: &str, pickup: &str, from: (i32, &str), ret: &str, to: (i32, &str)) -> RentalRecord {
    RentalRecord {
        bici: bike.to_string(),
        tipo_bici: "Classic".to_string(),
        cliente_anonimizzato: format!("client_{}", bike),
        data_prelievo: ts(pickup),
        numero_stazione_prelievo: Some(from.0),
        nome_stazione_prelievo: from.1.to_string(),
        data_restituzione: ts(ret),
        numero_stazione_restituzione: Some(to.0),
        nome_stazione_restituzione: to.1.to_string(),
        durata_noleggio: 10.0,
        distanza_totale: Some(1.5),
    }
}

/// Five rentals over two days between three stations
pub fn create_store() -> FrameFlowStore {
    let duomo = (1, "Duomo");
    let cadorna = (2, "Cadorna");
    let brera = (3, "Brera");

    let records = vec![
        create_rental("b1", "2019-05-01 08:05:00", duomo, "2019-05-01 08:20:00", cadorna),
        create_rental("b2", "2019-05-01 08:40:00", duomo, "2019-05-01 09:02:00", brera),
        create_rental("b3", "2019-05-01 18:10:00", cadorna, "2019-05-01 18:30:00", duomo),
        create_rental("b4", "2019-05-02 07:55:00", brera, "2019-05-02 08:15:00", duomo),
        create_rental("b5", "2019-05-02 08:30:00", duomo, "2019-05-02 08:45:00", cadorna),
    ];
    FrameFlowStore::from_records(&records).unwrap()
}

pub fn i64_values(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
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

pub fn str_values(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap().to_string())
        .collect()
}
