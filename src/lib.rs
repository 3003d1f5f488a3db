//! BikeMi Analysis Library
//!
//! Tools for studying the rental logs of Milan's BikeMi bike-sharing
//! service:
//! - Normalising free-text station names and reconciling them against the
//!   station layer
//! - Counting rentals per time bucket and station, from PostgreSQL or from
//!   an in-memory rental frame
//! - Calendar features, including the Milan public holidays
//! - Rolling statistics, correlograms, seasonal decomposition and the
//!   augmented Dickey-Fuller test

pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod flow;
pub mod models;
pub mod output;
pub mod stations;
pub mod utils;

pub use config::{BikeMiConfig, DatabaseConfig, ReportStyle};
pub use error::{BikeMiError, Result};
pub use flow::{FlowStore, FrameFlowStore, PgFlowStore, pivot_bike_flow, retrieve_bike_flow};
pub use models::{FlowQuery, RentalRecord, RentalTable, StationColumn, TimeColumn, TruncUnit};
