//! Single publication sweep.

use serde::Serialize;
use tabled::Tabled;

use postflow_core::config::AppConfig;
use postflow_core::error::AppError;
use postflow_database::DatabasePool;
use postflow_worker::RunReport;

use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct StatsRow {
    total: usize,
    processed: usize,
    posted: usize,
    failed: usize,
    skipped: usize,
}

/// Run one sweep against the configured store and endpoints.
pub async fn execute(
    config: &AppConfig,
    db: &DatabasePool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pipeline = postflow_worker::build_pipeline(config, postflow_worker::pg_store(db))?;
    let report = pipeline.run().await;

    print_report(&report, format);

    match report.error {
        Some(error) => Err(AppError::internal(format!("Sweep aborted: {error}"))),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }

    let rows: Vec<StatsRow> = report
        .stats
        .iter()
        .map(|s| StatsRow {
            total: s.total,
            processed: s.processed,
            posted: s.posted,
            failed: s.failed,
            skipped: s.skipped,
        })
        .collect();
    output::print_rows(&rows, report, format);

    println!();
    for line in &report.diagnostics {
        println!("  {line}");
    }
}
