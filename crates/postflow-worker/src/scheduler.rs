//! Cron trigger for publication sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use postflow_core::error::AppError;

use crate::pipeline::PublicationPipeline;
use crate::runner::log_report;

/// Runs the pipeline on a cron schedule.
pub struct CronScheduler {
    scheduler: JobScheduler,
    pipeline: Arc<PublicationPipeline>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish_non_exhaustive()
    }
}

impl CronScheduler {
    /// Create a scheduler for `pipeline`.
    pub async fn new(pipeline: Arc<PublicationPipeline>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            pipeline,
        })
    }

    /// Register a sweep on `expression` (six fields, seconds first).
    pub async fn register_sweep(&self, expression: &str) -> Result<(), AppError> {
        let pipeline = Arc::clone(&self.pipeline);
        let job = CronJob::new_async(expression, move |_uuid, _lock| {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move {
                tracing::debug!("Cron sweep triggered");
                log_report(&pipeline.run().await);
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid sweep schedule '{expression}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {e}")))?;

        tracing::info!(schedule = expression, "Registered publication sweep");
        Ok(())
    }

    /// Start firing registered jobs.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
