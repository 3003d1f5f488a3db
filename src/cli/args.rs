//! Command-line argument definitions for the BikeMi analysis tool

use crate::analysis::{DecompositionModel, Regression, TimeSubunit};
use crate::config::DatabaseConfig;
use crate::constants::{COUNT_COLUMN, DEFAULT_TOP_STATIONS, DEFAULT_WINDOW};
use crate::features::CalendarFeature;
use crate::models::{StationColumn, TimeColumn, TruncUnit};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the BikeMi rental analysis tool
///
/// Reconciles station names, retrieves bike flows from PostgreSQL or rental
/// extracts, adds calendar features and runs time-series diagnostics.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bikemi",
    version,
    about = "Station reconciliation, flow retrieval and time-series diagnostics for BikeMi rentals"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress output except errors"
    )]
    pub quiet: bool,

    /// Disable coloured report output
    #[arg(long = "plain", global = true, help = "Print reports without colours")]
    pub plain: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Count rentals per time bucket, optionally per station
    Flow(FlowArgs),
    /// Add calendar features to a time-indexed CSV
    Features(FeaturesArgs),
    /// Rolling statistics, correlograms and the ADF test for one column
    Diagnose(DiagnoseArgs),
    /// Normalise station names in two CSVs and report mismatches
    Reconcile(ReconcileArgs),
}

/// Timestamp to bucket rentals on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeArg {
    /// Pickup time (outflow)
    Pickup,
    /// Return time (inflow)
    Return,
}

impl From<TimeArg> for TimeColumn {
    fn from(arg: TimeArg) -> Self {
        match arg {
            TimeArg::Pickup => TimeColumn::Pickup,
            TimeArg::Return => TimeColumn::Return,
        }
    }
}

/// Database connection overrides
#[derive(Debug, Clone, Default, Parser)]
pub struct DatabaseArgs {
    #[arg(long = "db-name", value_name = "NAME", help = "Database name")]
    pub db_name: Option<String>,

    #[arg(long = "db-user", value_name = "USER", help = "Database user")]
    pub db_user: Option<String>,

    #[arg(long = "db-host", value_name = "HOST", help = "Database host")]
    pub db_host: Option<String>,

    #[arg(long = "db-port", value_name = "PORT", help = "Database port")]
    pub db_port: Option<u16>,
}

impl DatabaseArgs {
    /// Layer flag values over an environment-derived configuration
    pub fn apply(&self, mut config: DatabaseConfig) -> DatabaseConfig {
        if let Some(name) = &self.db_name {
            config = config.with_name(name.clone());
        }
        if let Some(user) = &self.db_user {
            config = config.with_user(user.clone());
        }
        if let Some(host) = &self.db_host {
            config = config.with_host(host.clone());
        }
        if let Some(port) = self.db_port {
            config = config.with_port(port);
        }
        config
    }
}

/// Arguments for the flow command
#[derive(Debug, Clone, Parser)]
pub struct FlowArgs {
    /// Rentals table or view, optionally schema-qualified
    #[arg(short = 't', long = "table", value_name = "TABLE")]
    pub table: String,

    /// Bucket unit (any PostgreSQL date_trunc field)
    #[arg(short = 'u', long = "unit", value_name = "UNIT", default_value = "day")]
    pub unit: TruncUnit,

    /// Timestamp to bucket on
    #[arg(long = "time", value_enum, default_value = "pickup")]
    pub time: TimeArg,

    /// Split the flow by station (pickup, return, pickup-number, return-number)
    #[arg(short = 's', long = "station", value_name = "COLUMN")]
    pub station: Option<StationColumn>,

    /// Read rentals from a CSV extract instead of the database
    #[arg(long = "rentals-csv", value_name = "FILE")]
    pub rentals_csv: Option<PathBuf>,

    /// Reshape a station flow to one column per station
    #[arg(long = "pivot", requires = "station")]
    pub pivot: bool,

    /// Report zero or missing observations per station of the pivoted flow
    #[arg(long = "missing-obs", requires = "pivot")]
    pub missing_obs: bool,

    /// List the most used stations instead of a flow
    #[arg(
        long = "top",
        value_name = "COUNT",
        num_args = 0..=1,
        default_missing_value = DEFAULT_TOP_STATIONS,
        requires = "station"
    )]
    pub top: Option<usize>,

    /// Output CSV file; printed to stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Arguments for the features command
#[derive(Debug, Clone, Parser)]
pub struct FeaturesArgs {
    /// Input CSV with a timestamp column
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Timestamp column
    #[arg(long = "time-column", value_name = "COLUMN", default_value = "giorno_partenza")]
    pub time_column: String,

    /// Features to add (comma-separated); all when omitted
    #[arg(
        short = 'f',
        long = "features",
        value_name = "LIST",
        value_delimiter = ','
    )]
    pub features: Vec<CalendarFeature>,

    /// Output CSV file; printed to stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl FeaturesArgs {
    pub fn selected_features(&self) -> Vec<CalendarFeature> {
        if self.features.is_empty() {
            CalendarFeature::ALL.to_vec()
        } else {
            self.features.clone()
        }
    }
}

/// Arguments for the diagnose command
#[derive(Debug, Clone, Parser)]
pub struct DiagnoseArgs {
    /// Input CSV holding the series
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: PathBuf,

    /// Timestamp column
    #[arg(long = "time-column", value_name = "COLUMN", default_value = "giorno_partenza")]
    pub time_column: String,

    /// Column to analyse
    #[arg(long = "value-column", value_name = "COLUMN", default_value = COUNT_COLUMN)]
    pub value_column: String,

    /// Rolling window size
    #[arg(short = 'w', long = "window", default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Deterministic terms of the ADF regression (c or ct)
    #[arg(short = 'r', long = "regression", default_value = "ct")]
    pub regression: Regression,

    /// Number of ACF/PACF lags
    #[arg(long = "nlags", value_name = "LAGS")]
    pub nlags: Option<usize>,

    /// Summarise the series by a calendar subunit
    #[arg(long = "subunit", value_name = "UNIT")]
    pub subunit: Option<TimeSubunit>,

    /// Seasonal period for a classical decomposition
    #[arg(long = "period", value_name = "PERIOD")]
    pub period: Option<usize>,

    /// Decomposition model (additive or multiplicative)
    #[arg(long = "model", default_value = "additive", requires = "period")]
    pub model: DecompositionModel,

    /// Directory for CSV outputs
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the reconcile command
#[derive(Debug, Clone, Parser)]
pub struct ReconcileArgs {
    /// Left CSV (e.g. the stall layer)
    #[arg(long = "left", value_name = "FILE")]
    pub left: PathBuf,

    /// Right CSV (e.g. the stations of the rental series)
    #[arg(long = "right", value_name = "FILE")]
    pub right: PathBuf,

    /// Key column of the left CSV
    #[arg(long = "left-on", value_name = "COLUMN", default_value = "nome")]
    pub left_on: String,

    /// Key column of the right CSV
    #[arg(long = "right-on", value_name = "COLUMN", default_value = "stazione_partenza")]
    pub right_on: String,

    /// Write the exclusive keys of each side as CSV files into this directory
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}
