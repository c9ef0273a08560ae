//! Deadline wrapper for single external calls.

use std::future::Future;
use std::time::Duration;

/// The wrapped call did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("call did not complete within {}ms", .0.as_millis())]
pub struct DeadlineExceeded(pub Duration);

/// Run `call` with a deadline of `limit`.
///
/// On timeout the in-flight future is dropped, cancelling only that
/// call. What happens next is up to the caller.
pub async fn with_deadline<F, T>(limit: Duration, call: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}
