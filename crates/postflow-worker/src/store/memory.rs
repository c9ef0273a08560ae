//! In-memory [`PostStore`] for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use postflow_core::error::AppError;
use postflow_core::result::AppResult;
use postflow_core::types::{OwnerId, PostId};
use postflow_entity::owner::Owner;
use postflow_entity::post::{PostStatus, ScheduledPost};

use super::PostStore;

/// Posts and owners held in process memory.
///
/// Claims run under a single write lock, which gives the same
/// compare-and-swap guarantee as the conditional `UPDATE` in PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<PostId, ScheduledPost>>,
    owners: RwLock<HashMap<OwnerId, Owner>>,
}

impl InMemoryPostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a post.
    pub async fn insert_post(&self, post: ScheduledPost) {
        self.posts.write().await.insert(post.id, post);
    }

    /// Insert or replace an owner.
    pub async fn insert_owner(&self, owner: Owner) {
        self.owners.write().await.insert(owner.id, owner);
    }

    /// Snapshot of a post.
    pub async fn get(&self, id: PostId) -> Option<ScheduledPost> {
        self.posts.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<PostId>> {
        let posts = self.posts.read().await;
        let mut due: Vec<&ScheduledPost> = posts
            .values()
            .filter(|p| p.is_due(now) || p.is_stale_claim(stale_before))
            .collect();

        due.sort_by_key(|p| p.scheduled_at);
        Ok(due.into_iter().take(limit).map(|p| p.id).collect())
    }

    async fn claim(
        &self,
        id: PostId,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Option<ScheduledPost>> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };

        if post.status == PostStatus::Scheduled || post.is_stale_claim(stale_before) {
            post.mark_processing(now)?;
            return Ok(Some(post.clone()));
        }
        Ok(None)
    }

    async fn save(&self, post: &ScheduledPost) -> AppResult<()> {
        let mut posts = self.posts.write().await;
        let stored = posts
            .get_mut(&post.id)
            .ok_or_else(|| AppError::not_found(format!("Post {} not found", post.id)))?;

        if stored.status != PostStatus::Processing
            || stored.claim_generation != post.claim_generation
        {
            return Err(AppError::conflict(format!(
                "Claim on post {} is no longer held",
                post.id
            )));
        }

        *stored = post.clone();
        stored.claimed_at = Some(Utc::now());
        Ok(())
    }

    async fn find_owner(&self, id: OwnerId) -> AppResult<Option<Owner>> {
        Ok(self.owners.read().await.get(&id).cloned())
    }

    async fn reset(&self, id: PostId, stale_before: DateTime<Utc>) -> AppResult<bool> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&id) {
            Some(post)
                if post.status == PostStatus::Failed || post.is_stale_claim(stale_before) =>
            {
                post.reset(Utc::now())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
