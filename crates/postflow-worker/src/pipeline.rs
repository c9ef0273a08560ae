//! One publication sweep: select, claim, publish, report.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use postflow_core::config::AppConfig;

use crate::claimer::JobClaimer;
use crate::credential::CredentialRefresher;
use crate::diagnostics::RunLog;
use crate::ledger::Ledger;
use crate::listing::ListingClient;
use crate::publisher::{JobOutcome, LocationPublisher};
use crate::selector::BatchSelector;
use crate::store::PostStore;

/// Numeric policy of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePolicy {
    /// Maximum posts attempted per sweep.
    pub batch_size: usize,
    /// Age after which a `processing` claim may be taken over.
    pub stale_after: Duration,
    /// Deadline for the token exchange.
    pub refresh_timeout: Duration,
    /// Deadline for each per-location publish call.
    pub publish_timeout: Duration,
    /// Deadline for each debit call.
    pub debit_timeout: Duration,
    /// Units debited per published location.
    pub debit_amount: i64,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            batch_size: 25,
            stale_after: Duration::from_secs(900),
            refresh_timeout: Duration::from_millis(20_000),
            publish_timeout: Duration::from_millis(20_000),
            debit_timeout: Duration::from_millis(20_000),
            debit_amount: 20,
        }
    }
}

impl PipelinePolicy {
    /// Build the policy from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.worker.batch_size,
            stale_after: config.worker.stale_after(),
            refresh_timeout: config.credentials.timeout(),
            publish_timeout: config.publish.timeout(),
            debit_timeout: config.ledger.timeout(),
            debit_amount: config.ledger.debit_amount,
        }
    }
}

/// Aggregate counts for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Ids returned by selection.
    pub total: usize,
    /// Posts this sweep claimed.
    pub processed: usize,
    /// Claim misses and posts whose owner could not be resolved.
    pub skipped: usize,
    /// Posts marked failed.
    pub failed: usize,
    /// Posts fully published.
    pub posted: usize,
}

/// Result of one sweep, handed back to whoever triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `false` only when the sweep could not select work at all.
    pub success: bool,
    /// Counts, absent when the sweep aborted.
    pub stats: Option<RunStats>,
    /// Ordered trace of this sweep.
    pub diagnostics: Vec<String>,
    /// Run-level error, if any.
    pub error: Option<String>,
}

/// The scheduled post publication pipeline.
#[derive(Debug, Clone)]
pub struct PublicationPipeline {
    selector: BatchSelector,
    claimer: JobClaimer,
    publisher: LocationPublisher,
}

impl PublicationPipeline {
    /// Wire the pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn PostStore>,
        credentials: Arc<dyn CredentialRefresher>,
        listing: Arc<dyn ListingClient>,
        ledger: Arc<dyn Ledger>,
        policy: PipelinePolicy,
    ) -> Self {
        Self {
            selector: BatchSelector::new(Arc::clone(&store), policy.batch_size, policy.stale_after),
            claimer: JobClaimer::new(Arc::clone(&store)),
            publisher: LocationPublisher::new(store, credentials, listing, ledger, policy),
        }
    }

    /// Run one sweep. Posts are processed one at a time, in selection order.
    pub async fn run(&self) -> RunReport {
        let mut log = RunLog::new();
        let now = Utc::now();
        log.record(format!("sweep started at {}", now.to_rfc3339()));

        let ids = match self.selector.select(now, &mut log).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Post selection failed, aborting sweep");
                log.record(format!("selection failed: {e}"));
                return RunReport {
                    success: false,
                    stats: None,
                    diagnostics: log.into_entries(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut stats = RunStats {
            total: ids.len(),
            ..RunStats::default()
        };

        for id in ids {
            let claimed_at = Utc::now();
            let stale_before = self.selector.stale_cutoff(claimed_at);
            let post = match self.claimer.claim(id, claimed_at, stale_before, &mut log).await {
                Ok(Some(post)) => post,
                Ok(None) => {
                    stats.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(post_id = %id, error = %e, "Claim failed");
                    log.record(format!("post {id}: claim failed: {e}"));
                    stats.skipped += 1;
                    continue;
                }
            };

            stats.processed += 1;
            match self.publisher.process(post, &mut log).await {
                JobOutcome::Posted => stats.posted += 1,
                JobOutcome::Failed(_) => stats.failed += 1,
                JobOutcome::Skipped(_) => stats.skipped += 1,
            }
        }

        log.record(format!(
            "sweep finished: total={} processed={} posted={} failed={} skipped={}",
            stats.total, stats.processed, stats.posted, stats.failed, stats.skipped
        ));
        info!(
            total = stats.total,
            processed = stats.processed,
            posted = stats.posted,
            failed = stats.failed,
            skipped = stats.skipped,
            "Publication sweep finished"
        );

        RunReport {
            success: true,
            stats: Some(stats),
            diagnostics: log.into_entries(),
            error: None,
        }
    }
}
