//! Job Claimer: exclusive transition into `processing`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use postflow_core::result::AppResult;
use postflow_core::types::PostId;
use postflow_entity::post::ScheduledPost;

use crate::diagnostics::RunLog;
use crate::store::PostStore;

/// Claims posts one at a time with a compare-and-swap update.
#[derive(Debug, Clone)]
pub struct JobClaimer {
    store: Arc<dyn PostStore>,
}

impl JobClaimer {
    /// Create a claimer over `store`.
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Try to take the post. `Ok(None)` is a lost race, not an error.
    pub async fn claim(
        &self,
        id: PostId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        log: &mut RunLog,
    ) -> AppResult<Option<ScheduledPost>> {
        let claimed = self.store.claim(id, now, stale_before).await?;
        match &claimed {
            Some(post) => {
                log.record(format!(
                    "post {id}: claimed ({} of {} location(s) already done)",
                    post.done_count(),
                    post.locations.len()
                ));
            }
            None => {
                debug!(post_id = %id, "Claim lost");
                log.record(format!("post {id}: already claimed elsewhere, skipping"));
            }
        }
        Ok(claimed)
    }
}
