//! Post status overview.

use serde::Serialize;
use tabled::Tabled;

use postflow_core::config::AppConfig;
use postflow_core::error::AppError;
use postflow_database::DatabasePool;
use postflow_database::repositories::PostRepository;

use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    status: String,
    count: i64,
}

/// Print post counts per status.
pub async fn execute(
    config: &AppConfig,
    db: &DatabasePool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let counts = PostRepository::new(db.pool().clone())
        .count_by_status()
        .await?;

    let rows: Vec<StatusRow> = counts
        .iter()
        .map(|c| StatusRow {
            status: c.status.to_string(),
            count: c.count,
        })
        .collect();

    output::print_rows(&rows, &rows, format);

    if format == OutputFormat::Table {
        println!();
        output::print_kv("Worker enabled", &config.worker.enabled.to_string());
        output::print_kv(
            "Trigger",
            &config.worker.schedule.clone().unwrap_or_else(|| {
                format!("every {}s", config.worker.poll_interval_seconds)
            }),
        );
        output::print_kv("Batch size", &config.worker.batch_size.to_string());
    }
    Ok(())
}
