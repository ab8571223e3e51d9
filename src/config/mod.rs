//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ATTENDANCE_GATE` prefix and nested values use double underscores as separators.
//! An optional YAML file named by `ATTENDANCE_GATE_CONFIG` sits beneath the
//! environment.
//!
//! # Example
//!
//! ```no_run
//! use attendance_gate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod device;
mod error;
mod printer;
mod reconcile;
mod school_api;
mod server;

pub use device::{DeviceConfig, DeviceKind};
pub use error::{ConfigError, ValidationError};
pub use printer::{PrinterConfig, PrinterKind};
pub use reconcile::ReconcileSettings;
pub use school_api::SchoolApiConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_FILE_ENV: &str = "ATTENDANCE_GATE_CONFIG";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads the optional YAML file and
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Attendance terminal
    pub device: DeviceConfig,

    /// School fee-status API
    pub school_api: SchoolApiConfig,

    /// Receipt printer
    #[serde(default)]
    pub printer: PrinterConfig,

    /// Polling loop and dedup ledger
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

impl AppConfig {
    /// Load configuration from the optional file and environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `ATTENDANCE_GATE_CONFIG`, if set
    /// 3. Overlays environment variables with `ATTENDANCE_GATE` prefix,
    ///    using `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ATTENDANCE_GATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ATTENDANCE_GATE__SCHOOL_API__BASE_URL=...` -> `school_api.base_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The named configuration file cannot be read
    /// - Required values are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("ATTENDANCE_GATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - Listen address and timeouts
    /// - URL formats
    /// - Production-specific requirements (HTTPS, API key)
    /// - Loop cadence and ledger limits
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.device.validate()?;
        self.school_api.validate(&self.server.environment)?;
        self.printer.validate()?;
        self.reconcile.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
