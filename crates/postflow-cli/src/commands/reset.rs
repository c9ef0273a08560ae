//! Operator reset of failed or stuck posts.

use chrono::Utc;
use clap::Args;

use postflow_core::config::AppConfig;
use postflow_core::error::AppError;
use postflow_core::types::PostId;
use postflow_database::DatabasePool;
use postflow_database::repositories::PostRepository;
use postflow_entity::post::PostStatus;
use postflow_worker::selector::stale_cutoff;

use crate::output;

/// Arguments for the reset command
#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Id of the post to reschedule
    pub post_id: PostId,
}

/// Move a `failed` post, or one whose claim has gone stale, back to
/// `scheduled`.
///
/// Location progress is kept, so a later sweep only publishes the
/// locations that are not done yet. A post still held by a live runner
/// is left alone.
pub async fn execute(
    args: &ResetArgs,
    config: &AppConfig,
    db: &DatabasePool,
) -> Result<(), AppError> {
    let posts = PostRepository::new(db.pool().clone());
    let stale_before = stale_cutoff(Utc::now(), config.worker.stale_after());

    let Some(post) = posts.find_by_id(args.post_id).await? else {
        return Err(AppError::not_found(format!("Post {} not found", args.post_id)));
    };

    if posts.reset(args.post_id, stale_before).await? {
        output::print_success(&format!(
            "Post {} rescheduled ({} of {} location(s) already done).",
            post.id,
            post.done_count(),
            post.locations.len()
        ));
    } else if post.status == PostStatus::Processing {
        output::print_warning(&format!(
            "Post {} is still claimed by a runner; claims expire after {}s.",
            post.id, config.worker.stale_after_seconds
        ));
    } else {
        output::print_warning(&format!(
            "Post {} is {} and was left unchanged.",
            post.id, post.status
        ));
    }
    Ok(())
}
