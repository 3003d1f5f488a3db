//! Configuration management.
//!
//! Database connection details and report styling. Values are layered:
//! built-in defaults, then a `.env` file and the process environment, then
//! whatever the command line overrides.

use crate::constants::{
    DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PORT, DEFAULT_DB_USER, env_vars,
};
use crate::error::{BikeMiError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connection details for the local rental database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            password: None,
        }
    }
}

impl DatabaseConfig {
    /// Defaults overridden by `BIKEMI_DB_*` variables
    pub fn from_env() -> Result<Self> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(env_vars::DB_NAME) {
            config.name = name;
        }
        if let Some(user) = lookup(env_vars::DB_USER) {
            config.user = user;
        }
        if let Some(host) = lookup(env_vars::DB_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(env_vars::DB_PORT) {
            config.port = port.trim().parse().map_err(|_| BikeMiError::Configuration {
                message: format!("{} must be a port number, got '{}'", env_vars::DB_PORT, port),
            })?;
        }
        if let Some(password) = lookup(env_vars::DB_PASSWORD) {
            config.password = Some(password);
        }

        debug!(
            "Database configuration: {}@{}:{}/{}",
            config.user, config.host, config.port, config.name
        );
        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Presentation settings passed explicitly to every report renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStyle {
    /// Emphasise conclusions with terminal colours
    pub colored: bool,
    /// Spaces in front of every report line
    pub indent: usize,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            colored: true,
            indent: 4,
        }
    }
}

impl ReportStyle {
    /// Plain text, suitable for files and tests
    pub fn plain() -> Self {
        Self {
            colored: false,
            indent: 0,
        }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BikeMiConfig {
    pub database: DatabaseConfig,
    pub report: ReportStyle,
}

impl BikeMiConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            report: ReportStyle::default(),
        })
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = database;
        self
    }

    pub fn with_report_style(mut self, report: ReportStyle) -> Self {
        self.report = report;
        self
    }
}
