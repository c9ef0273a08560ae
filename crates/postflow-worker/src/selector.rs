//! Batch Selector: finds the posts a sweep should attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use postflow_core::result::AppResult;
use postflow_core::types::PostId;

use crate::diagnostics::RunLog;
use crate::store::PostStore;

/// Selects a bounded batch of due post ids, oldest schedule first.
#[derive(Debug, Clone)]
pub struct BatchSelector {
    store: Arc<dyn PostStore>,
    batch_size: usize,
    stale_after: Duration,
}

impl BatchSelector {
    /// Create a selector.
    pub fn new(store: Arc<dyn PostStore>, batch_size: usize, stale_after: Duration) -> Self {
        Self {
            store,
            batch_size,
            stale_after,
        }
    }

    /// Claims taken before this instant are treated as abandoned.
    pub fn stale_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        stale_cutoff(now, self.stale_after)
    }

    /// Return ids only, so the window between selection and claim stays short.
    pub async fn select(&self, now: DateTime<Utc>, log: &mut RunLog) -> AppResult<Vec<PostId>> {
        let ids = self
            .store
            .find_due(now, self.stale_cutoff(now), self.batch_size)
            .await?;

        log.record(format!(
            "selected {} due post(s) (limit {})",
            ids.len(),
            self.batch_size
        ));
        Ok(ids)
    }
}

/// `now - stale_after`, saturating at the earliest representable instant.
pub fn stale_cutoff(now: DateTime<Utc>, stale_after: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(stale_after)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
