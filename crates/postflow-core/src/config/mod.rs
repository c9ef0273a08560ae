//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate
//! from TOML files plus `POSTFLOW__*` environment variables. Each
//! sub-module represents a logical configuration section.

pub mod database;
pub mod endpoints;
pub mod logging;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::endpoints::{CredentialConfig, LedgerConfig, PublishConfig};
pub use self::logging::LoggingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Publication worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// OAuth2 refresh-token exchange settings.
    pub credentials: CredentialConfig,
    /// Listing platform publish endpoint settings.
    pub publish: PublishConfig,
    /// Wallet ledger settings.
    pub ledger: LedgerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges `path` with an optional `config/{POSTFLOW_ENV}` overlay and
    /// environment variables prefixed with `POSTFLOW__`
    /// (e.g. `POSTFLOW__WORKER__BATCH_SIZE=10`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let env = std::env::var("POSTFLOW_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("POSTFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
