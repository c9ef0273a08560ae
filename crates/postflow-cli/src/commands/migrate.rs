//! Database migration command.

use postflow_core::error::AppError;
use postflow_database::DatabasePool;

use crate::output;

/// Apply all pending migrations.
pub async fn execute(db: &DatabasePool) -> Result<(), AppError> {
    println!("Running database migrations...");
    postflow_database::migration::run_migrations(db.pool()).await?;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
