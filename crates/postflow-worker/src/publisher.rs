//! Location Publisher: the per-post state machine.
//!
//! A claimed post moves through
//! `validating -> refreshing-credential -> publishing(i)... -> posted | failed`.
//! Locations are handled strictly in stored order. Each confirmed publish
//! is persisted before its debit, and each confirmed debit marks the
//! location done and is persisted before the next location starts.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use postflow_core::result::AppResult;
use postflow_entity::owner::Owner;
use postflow_entity::post::ScheduledPost;

use crate::credential::{AccessToken, CredentialError, CredentialRefresher};
use crate::diagnostics::RunLog;
use crate::guard::with_deadline;
use crate::ledger::{DebitMetadata, DebitRequest, Ledger, LedgerError, LedgerOperation};
use crate::listing::{ListingClient, ListingError, LocationDescriptor, PublishRequest};
use crate::pipeline::PipelinePolicy;
use crate::store::PostStore;

/// Where a post is in its processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Checking locations and owner.
    Validating,
    /// Exchanging the refresh token.
    RefreshingCredential,
    /// Publishing the location at this index.
    Publishing(usize),
    /// Every location is done.
    Posted,
    /// Stopped with an error.
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating => write!(f, "validating"),
            Self::RefreshingCredential => write!(f, "refreshing-credential"),
            Self::Publishing(index) => write!(f, "publishing({index})"),
            Self::Posted => write!(f, "posted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How a claimed post ended up in this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// All locations published and charged.
    Posted,
    /// Marked failed with this reason.
    Failed(String),
    /// Marked failed because its owner could not be resolved.
    Skipped(String),
}

/// Drives one claimed post to `posted` or `failed`.
#[derive(Debug, Clone)]
pub struct LocationPublisher {
    store: Arc<dyn PostStore>,
    credentials: Arc<dyn CredentialRefresher>,
    listing: Arc<dyn ListingClient>,
    ledger: Arc<dyn Ledger>,
    policy: PipelinePolicy,
}

/// Per-location result inside the loop.
enum Step {
    Done,
    Abort(String),
}

impl LocationPublisher {
    /// Create a publisher.
    pub fn new(
        store: Arc<dyn PostStore>,
        credentials: Arc<dyn CredentialRefresher>,
        listing: Arc<dyn ListingClient>,
        ledger: Arc<dyn Ledger>,
        policy: PipelinePolicy,
    ) -> Self {
        Self {
            store,
            credentials,
            listing,
            ledger,
            policy,
        }
    }

    /// Process a claimed post. Never returns an error: store failures
    /// are recorded on the post (when still possible) and reported as
    /// [`JobOutcome::Failed`].
    pub async fn process(&self, mut post: ScheduledPost, log: &mut RunLog) -> JobOutcome {
        match self.drive(&mut post, log).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = format!("store error: {e}");
                warn!(post_id = %post.id, error = %e, "Failed to persist post progress");
                log.record(format!("post {}: {reason}", post.id));

                if !post.status.is_terminal() {
                    let recorded = match post.mark_failed(reason.clone(), Utc::now()) {
                        Ok(()) => self.store.save(&post).await,
                        Err(e) => Err(e),
                    };
                    if let Err(save_err) = recorded {
                        warn!(post_id = %post.id, error = %save_err, "Could not record failure");
                    }
                }
                JobOutcome::Failed(reason)
            }
        }
    }

    async fn drive(&self, post: &mut ScheduledPost, log: &mut RunLog) -> AppResult<JobOutcome> {
        enter(post, Phase::Validating, log);

        if post.locations.is_empty() {
            return self
                .fail(post, "post has no locations", log)
                .await
                .map(JobOutcome::Failed);
        }

        let Some(owner) = self.store.find_owner(post.owner_id).await? else {
            let reason = format!("owner {} not found", post.owner_id);
            return self
                .fail(post, reason, log)
                .await
                .map(JobOutcome::Skipped);
        };

        enter(post, Phase::RefreshingCredential, log);
        let token = match self.refresh(&post.refresh_token).await {
            Ok(token) => token,
            Err(e) => {
                return self
                    .fail(post, format!("credential refresh failed: {e}"), log)
                    .await
                    .map(JobOutcome::Failed);
            }
        };

        // Seeded with done ids so no duplicate of a done location is published.
        let mut handled: HashSet<String> = post
            .locations
            .iter()
            .filter(|task| task.done)
            .filter_map(|task| task.location_id().map(str::to_owned))
            .collect();
        for index in 0..post.locations.len() {
            let task = &post.locations[index];
            let Some(location_id) = task.location_id().map(str::to_owned) else {
                log.record(format!(
                    "post {}: location #{index} has no location id, skipping",
                    post.id
                ));
                continue;
            };

            if task.done {
                continue;
            }
            if !handled.insert(location_id.clone()) {
                log.record(format!(
                    "post {}: duplicate location {location_id}, skipping",
                    post.id
                ));
                continue;
            }

            enter(post, Phase::Publishing(index), log);
            match self
                .publish_location(post, index, &location_id, &owner, &token, log)
                .await?
            {
                Step::Done => {}
                Step::Abort(reason) => {
                    return self.fail(post, reason, log).await.map(JobOutcome::Failed);
                }
            }
        }

        if !post.all_locations_done() {
            let pending = post.locations.len() - post.done_count();
            return self
                .fail(
                    post,
                    format!("{pending} location(s) could not be published"),
                    log,
                )
                .await
                .map(JobOutcome::Failed);
        }

        post.mark_posted(Utc::now())?;
        self.store.save(post).await?;
        enter(post, Phase::Posted, log);
        info!(post_id = %post.id, locations = post.locations.len(), "Post published");
        Ok(JobOutcome::Posted)
    }

    /// Publish (unless already published) and charge one location.
    async fn publish_location(
        &self,
        post: &mut ScheduledPost,
        index: usize,
        location_id: &str,
        owner: &Owner,
        token: &AccessToken,
        log: &mut RunLog,
    ) -> AppResult<Step> {
        if post.locations[index].awaiting_charge() {
            log.record(format!(
                "post {}: {location_id} already published, charging only",
                post.id
            ));
        } else {
            let request = self.publish_request(post, index, location_id, token);
            match self.publish(&request).await {
                Ok(receipt) => {
                    post.locations[index].mark_published(receipt.response, Utc::now());
                    self.store.save(post).await?;
                    log.record(format!("post {}: published to {location_id}", post.id));
                }
                Err(e) => {
                    let reason = format!("publish to {location_id} failed: {e}");
                    warn!(post_id = %post.id, location_id, error = %e, "Publish failed");
                    post.locations[index].mark_failed(reason.clone());
                    return Ok(Step::Abort(reason));
                }
            }
        }

        let debit = DebitRequest {
            owner_id: owner.id,
            wallet_id: owner.wallet_id,
            amount: self.policy.debit_amount,
            operation: LedgerOperation::Deduct,
            reason: format!("Scheduled post published to {location_id}"),
            metadata: DebitMetadata {
                post_id: post.id,
                location_id: location_id.to_string(),
                media_ref: post.content.media_ref.clone(),
            },
        };

        let reason = match self.debit(&debit).await {
            Ok(outcome) if outcome.is_debited() => {
                post.locations[index].mark_done(Utc::now());
                self.store.save(post).await?;
                log.record(format!(
                    "post {}: {location_id} done, {outcome}",
                    post.id
                ));
                return Ok(Step::Done);
            }
            Ok(outcome) => format!("debit for {location_id} declined: {outcome}"),
            Err(e) => format!("debit for {location_id} failed: {e}"),
        };

        warn!(post_id = %post.id, location_id, reason = %reason, "Published but not charged");
        post.locations[index].mark_failed(reason.clone());
        Ok(Step::Abort(reason))
    }

    fn publish_request(
        &self,
        post: &ScheduledPost,
        index: usize,
        location_id: &str,
        token: &AccessToken,
    ) -> PublishRequest {
        let task = &post.locations[index];
        PublishRequest {
            account_id: task.external_account_id.clone(),
            locations: vec![LocationDescriptor {
                location_id: location_id.to_string(),
                locality: task.locality.clone(),
                link: post.content.link.clone(),
            }],
            media_ref: post.content.media_ref.clone(),
            description: post.content.description.clone(),
            access_token: token.secret().to_string(),
            content_kind: post.content.content_kind,
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, CredentialError> {
        with_deadline(
            self.policy.refresh_timeout,
            self.credentials.refresh(refresh_token),
        )
        .await?
    }

    async fn publish(
        &self,
        request: &PublishRequest,
    ) -> Result<crate::listing::PublishReceipt, ListingError> {
        with_deadline(self.policy.publish_timeout, self.listing.publish(request)).await?
    }

    async fn debit(
        &self,
        request: &DebitRequest,
    ) -> Result<crate::ledger::DebitOutcome, LedgerError> {
        with_deadline(self.policy.debit_timeout, self.ledger.debit(request)).await?
    }

    /// Mark the post failed and persist it. Returns the recorded reason.
    async fn fail(
        &self,
        post: &mut ScheduledPost,
        reason: impl Into<String>,
        log: &mut RunLog,
    ) -> AppResult<String> {
        let reason = reason.into();
        post.mark_failed(reason.clone(), Utc::now())?;
        self.store.save(post).await?;
        enter(post, Phase::Failed, log);
        log.record(format!("post {}: {reason}", post.id));
        warn!(post_id = %post.id, reason = %reason, "Post failed");
        Ok(reason)
    }
}

fn enter(post: &ScheduledPost, phase: Phase, log: &mut RunLog) {
    log.record(format!("post {}: -> {phase}", post.id));
}
