//! [`PostStore`] backed by the PostgreSQL repositories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use postflow_core::result::AppResult;
use postflow_core::types::{OwnerId, PostId};
use postflow_database::repositories::{OwnerRepository, PostRepository};
use postflow_entity::owner::Owner;
use postflow_entity::post::ScheduledPost;

use super::PostStore;

/// PostgreSQL implementation of [`PostStore`].
#[derive(Debug, Clone)]
pub struct PgPostStore {
    posts: Arc<PostRepository>,
    owners: Arc<OwnerRepository>,
}

impl PgPostStore {
    /// Create a store over the given repositories.
    pub fn new(posts: Arc<PostRepository>, owners: Arc<OwnerRepository>) -> Self {
        Self { posts, owners }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<PostId>> {
        self.posts.find_due_ids(now, stale_before, limit).await
    }

    async fn claim(
        &self,
        id: PostId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<ScheduledPost>> {
        self.posts.claim(id, now, stale_before).await
    }

    async fn save(&self, post: &ScheduledPost) -> AppResult<()> {
        self.posts.save_progress(post, Utc::now()).await
    }

    async fn find_owner(&self, id: OwnerId) -> AppResult<Option<Owner>> {
        self.owners.find_by_id(id).await
    }

    async fn reset(&self, id: PostId, stale_before: DateTime<Utc>) -> AppResult<bool> {
        self.posts.reset(id, stale_before).await
    }
}
