//! Core data structures and types for BikeMi analysis.
//!
//! Defines the rental record, the fixed set of columns flow retrieval may
//! group on, time-bucket units and the validated table identifier used to
//! build queries.

use crate::constants::columns;
use crate::error::{BikeMiError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// One bicycle trip as recorded by the source system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    pub bici: String,
    pub tipo_bici: String,
    pub cliente_anonimizzato: String,
    pub data_prelievo: NaiveDateTime,
    pub numero_stazione_prelievo: Option<i32>,
    pub nome_stazione_prelievo: String,
    pub data_restituzione: NaiveDateTime,
    pub numero_stazione_restituzione: Option<i32>,
    pub nome_stazione_restituzione: String,
    pub durata_noleggio: f64,
    pub distanza_totale: Option<f64>,
}

impl RentalRecord {
    /// Pickup must not follow the return, and the rental must last
    pub fn is_consistent(&self) -> bool {
        self.data_prelievo <= self.data_restituzione && self.durata_noleggio > 0.0
    }
}

/// Timestamp a flow is bucketed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeColumn {
    /// Pickup time, i.e. the outflow from stations
    Pickup,
    /// Return time, i.e. the inflow to stations
    Return,
}

impl TimeColumn {
    pub fn source(&self) -> &'static str {
        match self {
            TimeColumn::Pickup => columns::PICKUP_TIME,
            TimeColumn::Return => columns::RETURN_TIME,
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            TimeColumn::Pickup => "giorno_partenza",
            TimeColumn::Return => "giorno_restituzione",
        }
    }
}

/// Station attribute a flow can be split by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StationColumn {
    PickupName,
    ReturnName,
    PickupNumber,
    ReturnNumber,
}

impl StationColumn {
    pub fn source(&self) -> &'static str {
        match self {
            StationColumn::PickupName => columns::PICKUP_STATION_NAME,
            StationColumn::ReturnName => columns::RETURN_STATION_NAME,
            StationColumn::PickupNumber => columns::PICKUP_STATION_NUMBER,
            StationColumn::ReturnNumber => columns::RETURN_STATION_NUMBER,
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            StationColumn::PickupName => "stazione_partenza",
            StationColumn::ReturnName => "stazione_arrivo",
            StationColumn::PickupNumber => "numero_stazione_partenza",
            StationColumn::ReturnNumber => "numero_stazione_arrivo",
        }
    }

    /// Station numbers are integers in the source schema
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StationColumn::PickupNumber | StationColumn::ReturnNumber
        )
    }
}

impl FromStr for StationColumn {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pickup" | "pickup-name" | "nome_stazione_prelievo" => Ok(StationColumn::PickupName),
            "return" | "return-name" | "nome_stazione_restituzione" => {
                Ok(StationColumn::ReturnName)
            }
            "pickup-number" | "numero_stazione_prelievo" => Ok(StationColumn::PickupNumber),
            "return-number" | "numero_stazione_restituzione" => Ok(StationColumn::ReturnNumber),
            other => Err(BikeMiError::unknown("station column", other)),
        }
    }
}

/// Granularity a timestamp is rounded down to, mirroring PostgreSQL `date_trunc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruncUnit {
    Microseconds,
    Milliseconds,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Decade,
    Century,
    Millennium,
}

impl TruncUnit {
    /// Field name understood by `date_trunc`
    pub fn as_str(&self) -> &'static str {
        match self {
            TruncUnit::Microseconds => "microseconds",
            TruncUnit::Milliseconds => "milliseconds",
            TruncUnit::Second => "second",
            TruncUnit::Minute => "minute",
            TruncUnit::Hour => "hour",
            TruncUnit::Day => "day",
            TruncUnit::Week => "week",
            TruncUnit::Month => "month",
            TruncUnit::Quarter => "quarter",
            TruncUnit::Year => "year",
            TruncUnit::Decade => "decade",
            TruncUnit::Century => "century",
            TruncUnit::Millennium => "millennium",
        }
    }

    /// Round a timestamp down the way `date_trunc` does.
    ///
    /// Weeks start on Monday; centuries and millennia start in years
    /// ending in 01 (2001, 2101, ...).
    pub fn truncate(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        let time = ts.time();
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);
        let first_of = |year: i32, month: u32| {
            NaiveDate::from_ymd_opt(year, month, 1)
                .map(midnight)
                .unwrap_or(ts)
        };

        match self {
            TruncUnit::Microseconds => ts,
            TruncUnit::Milliseconds => {
                let nanos = (time.nanosecond() / 1_000_000) * 1_000_000;
                ts.with_nanosecond(nanos).unwrap_or(ts)
            }
            TruncUnit::Second => ts.with_nanosecond(0).unwrap_or(ts),
            TruncUnit::Minute => date
                .and_hms_opt(time.hour(), time.minute(), 0)
                .unwrap_or(ts),
            TruncUnit::Hour => date.and_hms_opt(time.hour(), 0, 0).unwrap_or(ts),
            TruncUnit::Day => midnight(date),
            TruncUnit::Week => {
                let offset = date.weekday().num_days_from_monday() as u64;
                date.checked_sub_days(chrono::Days::new(offset))
                    .map(midnight)
                    .unwrap_or(ts)
            }
            TruncUnit::Month => first_of(date.year(), date.month()),
            TruncUnit::Quarter => first_of(date.year(), ((date.month() - 1) / 3) * 3 + 1),
            TruncUnit::Year => first_of(date.year(), 1),
            TruncUnit::Decade => first_of(date.year().div_euclid(10) * 10, 1),
            TruncUnit::Century => first_of((date.year() - 1).div_euclid(100) * 100 + 1, 1),
            TruncUnit::Millennium => first_of((date.year() - 1).div_euclid(1000) * 1000 + 1, 1),
        }
    }
}

impl fmt::Display for TruncUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TruncUnit {
    type Err = BikeMiError;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_lowercase().as_str() {
            "microseconds" | "microsecond" => TruncUnit::Microseconds,
            "milliseconds" | "millisecond" => TruncUnit::Milliseconds,
            "second" => TruncUnit::Second,
            "minute" => TruncUnit::Minute,
            "hour" => TruncUnit::Hour,
            "day" => TruncUnit::Day,
            "week" => TruncUnit::Week,
            "month" => TruncUnit::Month,
            "quarter" => TruncUnit::Quarter,
            "year" => TruncUnit::Year,
            "decade" => TruncUnit::Decade,
            "century" => TruncUnit::Century,
            "millennium" => TruncUnit::Millennium,
            other => return Err(BikeMiError::unknown("truncation unit", other)),
        };
        Ok(unit)
    }
}

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?$").expect("identifier pattern is valid")
});

/// A rental table or view name, optionally schema-qualified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RentalTable(String);

impl RentalTable {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.len() > 63 * 2 + 1 {
            return Err(BikeMiError::InvalidIdentifier {
                identifier: name,
                reason: "identifier too long".to_string(),
            });
        }
        if !IDENTIFIER.is_match(&name) {
            return Err(BikeMiError::InvalidIdentifier {
                identifier: name,
                reason: "only lower-case letters, digits and underscores are allowed".to_string(),
            });
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Double-quoted form safe to place in query text
    pub fn quoted(&self) -> String {
        self.0
            .split('.')
            .map(|part| format!("\"{}\"", part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for RentalTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters of a flow retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowQuery {
    pub table: RentalTable,
    pub unit: TruncUnit,
    pub time: TimeColumn,
    pub station: Option<StationColumn>,
}

impl FlowQuery {
    /// Daily outflow for the whole city
    pub fn new(table: RentalTable) -> Self {
        Self {
            table,
            unit: TruncUnit::Day,
            time: TimeColumn::Pickup,
            station: None,
        }
    }

    pub fn with_unit(mut self, unit: TruncUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_time(mut self, time: TimeColumn) -> Self {
        self.time = time;
        self
    }

    pub fn with_station(mut self, station: StationColumn) -> Self {
        self.station = Some(station);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_truncate_day_and_hour() {
        let t = ts("2019-07-14 17:42:09.5");
        assert_eq!(TruncUnit::Day.truncate(t), ts("2019-07-14 00:00:00.0"));
        assert_eq!(TruncUnit::Hour.truncate(t), ts("2019-07-14 17:00:00.0"));
        assert_eq!(TruncUnit::Minute.truncate(t), ts("2019-07-14 17:42:00.0"));
        assert_eq!(TruncUnit::Second.truncate(t), ts("2019-07-14 17:42:09.0"));
    }

    #[test]
    fn test_truncate_week_starts_on_monday() {
        // 2019-07-14 is a Sunday
        let t = ts("2019-07-14 08:00:00.0");
        assert_eq!(TruncUnit::Week.truncate(t), ts("2019-07-08 00:00:00.0"));
    }

    #[test]
    fn test_truncate_calendar_units() {
        let t = ts("2019-08-15 10:00:00.0");
        assert_eq!(TruncUnit::Month.truncate(t), ts("2019-08-01 00:00:00.0"));
        assert_eq!(TruncUnit::Quarter.truncate(t), ts("2019-07-01 00:00:00.0"));
        assert_eq!(TruncUnit::Year.truncate(t), ts("2019-01-01 00:00:00.0"));
        assert_eq!(TruncUnit::Decade.truncate(t), ts("2010-01-01 00:00:00.0"));
        assert_eq!(TruncUnit::Century.truncate(t), ts("2001-01-01 00:00:00.0"));
        assert_eq!(TruncUnit::Millennium.truncate(t), ts("2001-01-01 00:00:00.0"));
    }

    #[test]
    fn test_trunc_unit_parsing() {
        assert_eq!("day".parse::<TruncUnit>().unwrap(), TruncUnit::Day);
        assert_eq!(" Hour ".parse::<TruncUnit>().unwrap(), TruncUnit::Hour);
        assert!("fortnight".parse::<TruncUnit>().is_err());
    }

    #[test]
    fn test_rental_table_validation() {
        assert!(RentalTable::new("bikemi_2019").is_ok());
        assert!(RentalTable::new("_2019_q3").is_ok());
        assert_eq!(
            RentalTable::new("bikemi_rentals.daily_rentals").unwrap().quoted(),
            "\"bikemi_rentals\".\"daily_rentals\""
        );
        assert!(RentalTable::new("bikemi; DROP TABLE x").is_err());
        assert!(RentalTable::new("Bikemi").is_err());
        assert!(RentalTable::new("").is_err());
    }

    #[test]
    fn test_rental_record_consistency() {
        let record = RentalRecord {
            bici: "1234".to_string(),
            tipo_bici: "Classic".to_string(),
            cliente_anonimizzato: "abc".to_string(),
            data_prelievo: ts("2019-05-01 08:00:00.0"),
            numero_stazione_prelievo: Some(1),
            nome_stazione_prelievo: "Duomo".to_string(),
            data_restituzione: ts("2019-05-01 08:12:00.0"),
            numero_stazione_restituzione: Some(2),
            nome_stazione_restituzione: "Cadorna".to_string(),
            durata_noleggio: 12.0,
            distanza_totale: None,
        };
        assert!(record.is_consistent());

        let reversed = RentalRecord {
            data_restituzione: ts("2019-05-01 07:59:00.0"),
            ..record
        };
        assert!(!reversed.is_consistent());
    }
}
