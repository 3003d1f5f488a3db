//! Application constants for the BikeMi analysis tools
//!
//! Column names of the rental source schema, database defaults, holiday
//! calendar settings and the thresholds used by the diagnostics.

// =============================================================================
// Rental Source Schema
// =============================================================================

/// Column names as recorded by the BikeMi source system
pub mod columns {
    pub const BIKE: &str = "bici";
    pub const BIKE_TYPE: &str = "tipo_bici";
    pub const CLIENT: &str = "cliente_anonimizzato";
    pub const PICKUP_TIME: &str = "data_prelievo";
    pub const PICKUP_STATION_NUMBER: &str = "numero_stazione_prelievo";
    pub const PICKUP_STATION_NAME: &str = "nome_stazione_prelievo";
    pub const RETURN_TIME: &str = "data_restituzione";
    pub const RETURN_STATION_NUMBER: &str = "numero_stazione_restituzione";
    pub const RETURN_STATION_NAME: &str = "nome_stazione_restituzione";
    pub const DURATION: &str = "durata_noleggio";
    pub const DISTANCE: &str = "distanza_totale";
}

/// Name of the per-bucket count column produced by flow retrieval
pub const COUNT_COLUMN: &str = "count";

/// Name of the frequency column produced by station rankings
pub const RENTALS_COLUMN: &str = "numero_noleggi";

/// Prefix for the normalised copy of a station-name column
pub const CLEAN_PREFIX: &str = "clean_";

// =============================================================================
// Database Defaults
// =============================================================================

pub const DEFAULT_DB_NAME: &str = "bikemi";
pub const DEFAULT_DB_USER: &str = "luca";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;

/// Environment variables read by the configuration layer
pub mod env_vars {
    pub const DB_NAME: &str = "BIKEMI_DB_NAME";
    pub const DB_USER: &str = "BIKEMI_DB_USER";
    pub const DB_HOST: &str = "BIKEMI_DB_HOST";
    pub const DB_PORT: &str = "BIKEMI_DB_PORT";
    pub const DB_PASSWORD: &str = "BIKEMI_DB_PASSWORD";
}

// =============================================================================
// Calendar Features
// =============================================================================

/// Label used for dates that are not public holidays
pub const HOLIDAY_NONE: &str = "None";

/// ISO weekday numbers flagged as weekend (Saturday, Sunday)
pub const WEEKEND_ISO_DAYS: [u32; 2] = [6, 7];

// =============================================================================
// Diagnostics
// =============================================================================

/// Significance level at which the ADF report declares stationarity
pub const ADF_SIGNIFICANCE: f64 = 0.05;

/// Two-sided 95% standard normal quantile
pub const Z_95: f64 = 1.959_963_984_540_054;

/// Equal-width ranking labels for station missing-observation shares
pub const MISSING_OBS_LABELS: [&str; 5] = ["very_low", "low", "average", "high", "very_high"];

/// Default rolling window, one week of daily buckets
pub const DEFAULT_WINDOW: usize = 7;

/// Stations listed by `flow --top` without an explicit count
pub const DEFAULT_TOP_STATIONS: &str = "10";
