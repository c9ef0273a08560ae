//! Post owner (account) entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use postflow_core::types::{OwnerId, WalletId};

/// The account that owns scheduled posts and pays for each publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Owner {
    /// Owner identifier.
    pub id: OwnerId,
    /// Wallet debited for published locations.
    pub wallet_id: WalletId,
    /// Display name used in diagnostics.
    pub display_name: String,
}
