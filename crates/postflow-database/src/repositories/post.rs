//! Scheduled post repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;

use postflow_core::error::{AppError, ErrorKind};
use postflow_core::result::AppResult;
use postflow_core::types::PostId;
use postflow_entity::post::{PostStatus, ScheduledPost};

/// Number of posts in one status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    /// Post status.
    pub status: PostStatus,
    /// Number of posts in that status.
    pub count: i64,
}

/// Repository for scheduled posts and their claim transitions.
#[derive(Debug, Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    /// Create a new post repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: PostId) -> AppResult<Option<ScheduledPost>> {
        sqlx::query_as::<_, ScheduledPost>("SELECT * FROM scheduled_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find post", e))
    }

    /// Ids of posts that are due, plus stale claims, oldest schedule first.
    pub async fn find_due_ids(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<PostId>> {
        sqlx::query_scalar::<_, PostId>(
            "SELECT id FROM scheduled_posts \
             WHERE (status = 'scheduled' AND scheduled_at <= $1) \
                OR (status = 'processing' AND (claimed_at IS NULL OR claimed_at < $2)) \
             ORDER BY scheduled_at ASC \
             LIMIT $3",
        )
        .bind(now)
        .bind(stale_before)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to select due posts", e))
    }

    /// Conditionally move a post into `processing`.
    ///
    /// Succeeds only while the post is still `scheduled` or holds a stale
    /// claim. Returns `None` when another runner got there first.
    pub async fn claim(
        &self,
        id: PostId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<ScheduledPost>> {
        sqlx::query_as::<_, ScheduledPost>(
            "UPDATE scheduled_posts \
             SET status = 'processing', claimed_at = $2, updated_at = $2, \
                 claim_generation = claim_generation + 1 \
             WHERE id = $1 \
               AND (status = 'scheduled' \
                    OR (status = 'processing' AND (claimed_at IS NULL OR claimed_at < $3))) \
             RETURNING *",
        )
        .bind(id)
        .bind(now)
        .bind(stale_before)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim post", e))
    }

    /// Persist status and location progress for a post held by this claim.
    ///
    /// The write is fenced on `claim_generation`, so a runner whose claim was
    /// revived by someone else cannot overwrite the newer progress. Every
    /// accepted write also renews `claimed_at` to `now`, which keeps a
    /// long-running post from looking abandoned.
    pub async fn save_progress(&self, post: &ScheduledPost, now: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE scheduled_posts \
             SET status = $3, locations = $4, last_error = $5, posted_at = $6, updated_at = $7, \
                 claimed_at = $8 \
             WHERE id = $1 AND status = 'processing' AND claim_generation = $2",
        )
        .bind(post.id)
        .bind(post.claim_generation)
        .bind(post.status)
        .bind(Json(&post.locations))
        .bind(&post.last_error)
        .bind(post.posted_at)
        .bind(post.updated_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save post", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Claim on post {} is no longer held",
                post.id
            )));
        }
        Ok(())
    }

    /// Return a failed post, or one whose claim is older than
    /// `stale_before`, to `scheduled`. Returns `true` if reset.
    ///
    /// A live claim is left alone so its runner keeps sole ownership.
    pub async fn reset(&self, id: PostId, stale_before: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_posts \
             SET status = 'scheduled', claimed_at = NULL, last_error = NULL, updated_at = NOW() \
             WHERE id = $1 \
               AND (status = 'failed' \
                    OR (status = 'processing' AND (claimed_at IS NULL OR claimed_at < $2)))",
        )
        .bind(id)
        .bind(stale_before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reset post", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count posts grouped by status.
    pub async fn count_by_status(&self) -> AppResult<Vec<StatusCount>> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM scheduled_posts GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count posts", e))
    }
}
