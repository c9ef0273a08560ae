//! Interval trigger: runs a sweep, waits, repeats until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::pipeline::{PublicationPipeline, RunReport};

/// Drives the pipeline on a fixed interval.
#[derive(Debug)]
pub struct SweepRunner {
    pipeline: Arc<PublicationPipeline>,
    interval: Duration,
}

impl SweepRunner {
    /// Create a runner sweeping every `interval`.
    pub fn new(pipeline: Arc<PublicationPipeline>, interval: Duration) -> Self {
        Self { pipeline, interval }
    }

    /// Run until `cancel` turns `true`. A sweep in flight is allowed to
    /// finish; the wait between sweeps is interrupted.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            "Sweep runner started"
        );

        loop {
            if *cancel.borrow() {
                break;
            }

            log_report(&self.pipeline.run().await);

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Sweep runner stopped");
    }
}

/// Emit a sweep summary to the process log.
pub(crate) fn log_report(report: &RunReport) {
    match (&report.stats, &report.error) {
        (Some(stats), _) if stats.total > 0 => tracing::info!(
            total = stats.total,
            posted = stats.posted,
            failed = stats.failed,
            skipped = stats.skipped,
            "Sweep complete"
        ),
        (Some(_), _) => tracing::debug!("Sweep found no due posts"),
        (None, error) => tracing::error!(
            error = error.as_deref().unwrap_or("unknown"),
            "Sweep aborted"
        ),
    }
}

#[cfg(test)]
mod tests {
    use postflow_entity::post::PostStatus;

    use super::*;
    use crate::testing::{Harness, ScriptedListing, StaticCredentials, due_post, location, seed};

    #[tokio::test(start_paused = true)]
    async fn test_runner_sweeps_until_cancelled() {
        let h = Harness::new(StaticCredentials::granting(), ScriptedListing::new());
        let first = seed(&h.store, due_post(vec![location("locations/1")])).await;

        let runner = Arc::new(SweepRunner::new(
            Arc::new(h.pipeline()),
            Duration::from_secs(60),
        ));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn({
            let runner = Arc::clone(&runner);
            async move { runner.run(cancel_rx).await }
        });

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.store.get(first).await.unwrap().status, PostStatus::Posted);

        let second = seed(&h.store, due_post(vec![location("locations/2")])).await;
        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(h.store.get(second).await.unwrap().status, PostStatus::Posted);

        cancel_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_runner_exits_when_already_cancelled() {
        let h = Harness::new(StaticCredentials::granting(), ScriptedListing::new());
        let runner = SweepRunner::new(Arc::new(h.pipeline()), Duration::from_secs(60));
        let (_cancel_tx, cancel_rx) = watch::channel(true);

        runner.run(cancel_rx).await;
        assert!(h.listing.published().is_empty());
    }
}
