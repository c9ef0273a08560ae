//! Scheduled post entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use postflow_core::error::AppError;
use postflow_core::result::AppResult;
use postflow_core::types::{OwnerId, PostId};

use super::content::PostContent;
use super::location::LocationTask;
use super::status::PostStatus;

/// A post approved for future publication to one or more locations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledPost {
    /// Unique post identifier.
    pub id: PostId,
    /// Account that owns the post and pays for publication.
    pub owner_id: OwnerId,
    /// Current status.
    pub status: PostStatus,
    /// Earliest time the post may be published.
    pub scheduled_at: DateTime<Utc>,
    /// Long-lived OAuth2 refresh token for the listing platform.
    #[serde(skip_serializing)]
    pub refresh_token: String,
    /// Content to publish.
    #[sqlx(flatten)]
    pub content: PostContent,
    /// Locations in publication order.
    #[sqlx(json)]
    pub locations: Vec<LocationTask>,
    /// Last job-level error.
    pub last_error: Option<String>,
    /// When the current claim was taken or last renewed.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Incremented by every claim. Progress writes are fenced on it.
    #[serde(default)]
    pub claim_generation: i64,
    /// When every location finished.
    pub posted_at: Option<DateTime<Utc>>,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ScheduledPost {
    /// Create a new post in `Scheduled` status.
    pub fn new(
        owner_id: OwnerId,
        scheduled_at: DateTime<Utc>,
        refresh_token: impl Into<String>,
        content: PostContent,
        locations: Vec<LocationTask>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new(),
            owner_id,
            status: PostStatus::Scheduled,
            scheduled_at,
            refresh_token: refresh_token.into(),
            content,
            locations,
            last_error: None,
            claimed_at: None,
            claim_generation: 0,
            posted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the post is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_at <= now
    }

    /// Whether a `Processing` claim is older than `stale_before`.
    pub fn is_stale_claim(&self, stale_before: DateTime<Utc>) -> bool {
        self.status == PostStatus::Processing
            && self.claimed_at.is_none_or(|claimed| claimed < stale_before)
    }

    /// Whether every location is done.
    pub fn all_locations_done(&self) -> bool {
        self.locations.iter().all(|task| task.done)
    }

    /// Number of locations marked done.
    pub fn done_count(&self) -> usize {
        self.locations.iter().filter(|task| task.done).count()
    }

    /// Mark the post claimed and start a new claim generation.
    pub fn mark_processing(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(PostStatus::Processing, at)?;
        self.claimed_at = Some(at);
        self.claim_generation += 1;
        Ok(())
    }

    /// Mark the post fully published.
    pub fn mark_posted(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(PostStatus::Posted, at)?;
        self.posted_at = Some(at);
        self.last_error = None;
        Ok(())
    }

    /// Mark the post failed. Location progress is left as is.
    pub fn mark_failed(&mut self, error: impl Into<String>, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(PostStatus::Failed, at)?;
        self.last_error = Some(error.into());
        Ok(())
    }

    /// Return a failed or abandoned post to `Scheduled` for another attempt.
    pub fn reset(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        self.transition(PostStatus::Scheduled, at)?;
        self.claimed_at = None;
        self.last_error = None;
        Ok(())
    }

    fn transition(&mut self, next: PostStatus, at: DateTime<Utc>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Post {} cannot move from {} to {next}",
                self.id, self.status
            )));
        }
        self.status = next;
        self.updated_at = at;
        Ok(())
    }
}
