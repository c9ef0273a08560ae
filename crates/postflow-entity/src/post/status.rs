//! Scheduled post status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a scheduled post.
///
/// Posts are created elsewhere as `Scheduled`; the publication worker
/// claims them into `Processing` and finishes in `Posted` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Waiting for its scheduled time.
    Scheduled,
    /// Claimed by a worker run.
    Processing,
    /// Every location was published and charged.
    Posted,
    /// A fatal condition stopped publication.
    Failed,
}

impl PostStatus {
    /// Check if the post is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Posted | Self::Failed)
    }

    /// Whether the worker may move a post from `self` to `next`.
    ///
    /// `Processing -> Processing` is the stale-claim revival. The two
    /// edges back to `Scheduled` are only taken by an explicit operator
    /// reset of a failed or abandoned post.
    pub fn can_transition_to(&self, next: PostStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Processing)
                | (Self::Processing, Self::Processing)
                | (Self::Processing, Self::Posted)
                | (Self::Processing, Self::Failed)
                | (Self::Processing, Self::Scheduled)
                | (Self::Failed, Self::Scheduled)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Processing => "processing",
            Self::Posted => "posted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
