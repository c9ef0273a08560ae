//! Owner repository.

use sqlx::PgPool;

use postflow_core::error::{AppError, ErrorKind};
use postflow_core::result::AppResult;
use postflow_core::types::OwnerId;
use postflow_entity::owner::Owner;

/// Read access to post owners and their wallets.
#[derive(Debug, Clone)]
pub struct OwnerRepository {
    pool: PgPool,
}

impl OwnerRepository {
    /// Create a new owner repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an owner by ID.
    pub async fn find_by_id(&self, id: OwnerId) -> AppResult<Option<Owner>> {
        sqlx::query_as::<_, Owner>("SELECT id, wallet_id, display_name FROM owners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find owner", e))
    }
}
