//! Persistence port used by the publication pipeline.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use postflow_core::result::AppResult;
use postflow_core::types::{OwnerId, PostId};
use postflow_entity::owner::Owner;
use postflow_entity::post::ScheduledPost;

pub use memory::InMemoryPostStore;
pub use postgres::PgPostStore;

/// Store operations the pipeline depends on.
#[async_trait]
pub trait PostStore: Send + Sync + std::fmt::Debug {
    /// Ids of posts due at `now` plus claims taken before `stale_before`,
    /// ordered by `scheduled_at` ascending and capped at `limit`.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<PostId>>;

    /// Atomically move a post into `processing`. `None` means the claim
    /// was lost (already claimed, or no longer claimable).
    async fn claim(
        &self,
        id: PostId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<ScheduledPost>>;

    /// Persist the full post document. Only the holder of the current
    /// claim generation may write, and each accepted write renews the
    /// claim's `claimed_at`.
    async fn save(&self, post: &ScheduledPost) -> AppResult<()>;

    /// Look up the owner of a post.
    async fn find_owner(&self, id: OwnerId) -> AppResult<Option<Owner>>;

    /// Operator action: return a failed post, or one claimed before
    /// `stale_before`, to `scheduled`. Live claims are left alone.
    async fn reset(&self, id: PostId, stale_before: DateTime<Utc>) -> AppResult<bool>;
}
