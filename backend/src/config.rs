//! Configuration management for the FreshControl backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FRESH_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{DEFAULT_MAX_NOTE_LENGTH, DEFAULT_MIN_STOCK};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ledger behaviour
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://freshcontrol.db`
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Threshold used for products without their own minimum stock
    #[serde(default = "default_min_stock")]
    pub default_min_stock: Decimal,

    /// Loss notes longer than this many characters are truncated
    #[serde(default = "default_max_note_length")]
    pub max_note_length: usize,
}

fn default_min_stock() -> Decimal {
    DEFAULT_MIN_STOCK
}

fn default_max_note_length() -> usize {
    DEFAULT_MAX_NOTE_LENGTH
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_min_stock: default_min_stock(),
            max_note_length: default_max_note_length(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FRESH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("database.url", "sqlite://freshcontrol.db")?
            .set_default("database.max_connections", 4)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FRESH_ prefix)
            .add_source(
                Environment::with_prefix("FRESH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }
}
