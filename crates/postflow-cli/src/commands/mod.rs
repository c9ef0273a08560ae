//! CLI command definitions and dispatch.

pub mod migrate;
pub mod reset;
pub mod run_once;
pub mod status;

use clap::{Parser, Subcommand};

use postflow_core::config::AppConfig;
use postflow_core::error::AppError;
use postflow_database::DatabasePool;

use crate::output::OutputFormat;

/// Postflow: scheduled post publication pipeline
#[derive(Debug, Parser)]
#[command(name = "postflow", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a single publication sweep and print its report
    RunOnce,
    /// Count posts per status
    Status,
    /// Return a failed or abandoned post to `scheduled`
    Reset(reset::ResetArgs),
    /// Apply pending database migrations
    Migrate,
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config)?;
        let db = DatabasePool::connect(&config.database).await?;

        let result = match &self.command {
            Commands::RunOnce => run_once::execute(&config, &db, self.format).await,
            Commands::Status => status::execute(&config, &db, self.format).await,
            Commands::Reset(args) => reset::execute(args, &config, &db).await,
            Commands::Migrate => migrate::execute(&db).await,
        };

        db.close().await;
        result
    }
}
