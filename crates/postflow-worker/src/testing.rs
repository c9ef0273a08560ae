//! In-process fakes for the pipeline's boundaries.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use postflow_core::error::AppError;
use postflow_core::result::AppResult;
use postflow_core::types::{OwnerId, PostId, WalletId};
use postflow_entity::owner::Owner;
use postflow_entity::post::{ContentKind, LocationTask, PostContent, ScheduledPost};

use crate::credential::{AccessToken, CredentialError, CredentialRefresher};
use crate::ledger::{DebitOutcome, DebitRequest, Ledger, LedgerError};
use crate::listing::{ListingClient, ListingError, PublishReceipt, PublishRequest};
use crate::pipeline::{PipelinePolicy, PublicationPipeline};
use crate::store::{InMemoryPostStore, PostStore};

/// A post scheduled five minutes ago.
pub(crate) fn due_post(locations: Vec<LocationTask>) -> ScheduledPost {
    ScheduledPost::new(
        OwnerId::new(),
        Utc::now() - ChronoDuration::minutes(5),
        "refresh-token",
        PostContent {
            media_ref: Some("media/post.jpg".into()),
            description: "Weekend opening hours".into(),
            link: Some("https://example.com/hours".into()),
            content_kind: ContentKind::Photo,
        },
        locations,
    )
}

pub(crate) fn location(id: &str) -> LocationTask {
    LocationTask::new(id, "accounts/1")
}

/// Insert `post` and an owner for it. Returns the post id.
pub(crate) async fn seed(store: &InMemoryPostStore, post: ScheduledPost) -> PostId {
    let id = post.id;
    store
        .insert_owner(Owner {
            id: post.owner_id,
            wallet_id: WalletId::new(),
            display_name: "Corner Bakery".into(),
        })
        .await;
    store.insert_post(post).await;
    id
}

/// Seed a post scheduled at `scheduled_at`.
pub(crate) async fn seed_at(
    store: &InMemoryPostStore,
    locations: Vec<LocationTask>,
    scheduled_at: DateTime<Utc>,
) -> PostId {
    let mut post = due_post(locations);
    post.scheduled_at = scheduled_at;
    seed(store, post).await
}

#[derive(Debug)]
enum CredentialScript {
    Grant,
    Reject,
    Hang,
}

/// Token endpoint that always answers the same way.
#[derive(Debug)]
pub(crate) struct StaticCredentials {
    script: CredentialScript,
    calls: AtomicUsize,
}

impl StaticCredentials {
    pub(crate) fn granting() -> Self {
        Self::with(CredentialScript::Grant)
    }

    pub(crate) fn rejecting() -> Self {
        Self::with(CredentialScript::Reject)
    }

    pub(crate) fn hanging() -> Self {
        Self::with(CredentialScript::Hang)
    }

    fn with(script: CredentialScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialRefresher for StaticCredentials {
    async fn refresh(&self, _refresh_token: &str) -> Result<AccessToken, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            CredentialScript::Grant => Ok(AccessToken::new("access-token", Some(3600))),
            CredentialScript::Reject => Err(CredentialError::Rejected {
                status: 400,
                code: "invalid_grant".into(),
                description: Some("Token has been expired or revoked.".into()),
            }),
            CredentialScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(AccessToken::new("too-late", None))
            }
        }
    }
}

/// Scripted behaviour of the publish endpoint for one location.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ListingStep {
    Fail,
    Hang,
}

/// Publish endpoint that succeeds unless scripted otherwise.
#[derive(Debug, Default)]
pub(crate) struct ScriptedListing {
    script: Mutex<HashMap<String, ListingStep>>,
    calls: Mutex<Vec<PublishRequest>>,
}

impl ScriptedListing {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(self, location_id: &str, step: ListingStep) -> Self {
        self.script
            .lock()
            .unwrap()
            .insert(location_id.to_string(), step);
        self
    }

    /// Location ids of every publish call, in call order.
    pub(crate) fn published(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .flat_map(|r| r.locations.iter().map(|l| l.location_id.clone()))
            .collect()
    }
}

#[async_trait]
impl ListingClient for ScriptedListing {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ListingError> {
        self.calls.lock().unwrap().push(request.clone());
        let location_id = request.locations[0].location_id.clone();
        let step = self.script.lock().unwrap().get(&location_id).copied();
        match step {
            None => Ok(PublishReceipt {
                response: serde_json::json!({ "name": format!("{location_id}/localPosts/1") }),
            }),
            Some(ListingStep::Fail) => Err(ListingError::Rejected(
                serde_json::json!({ "error": "location suspended" }),
            )),
            Some(ListingStep::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ListingError::Decode("unreachable".into()))
            }
        }
    }
}

/// Ledger that records every debit and declines or stalls selected locations.
#[derive(Debug, Default)]
pub(crate) struct RecordingLedger {
    declined: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
    debits: Mutex<Vec<DebitRequest>>,
}

impl RecordingLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn decline(&self, location_id: &str) {
        self.declined
            .lock()
            .unwrap()
            .insert(location_id.to_string());
    }

    /// Never answer for `location_id`.
    pub(crate) fn hang(&self, location_id: &str) {
        self.stalled
            .lock()
            .unwrap()
            .insert(location_id.to_string());
    }

    pub(crate) fn accept(&self, location_id: &str) {
        self.declined.lock().unwrap().remove(location_id);
    }

    /// Successful debits tagged with `post_id`.
    pub(crate) fn debits_for(&self, post_id: PostId) -> Vec<DebitRequest> {
        self.debits
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.metadata.post_id == post_id)
            .cloned()
            .collect()
    }

    pub(crate) fn total(&self) -> usize {
        self.debits.lock().unwrap().len()
    }
}

#[async_trait]
impl Ledger for RecordingLedger {
    async fn debit(&self, request: &DebitRequest) -> Result<DebitOutcome, LedgerError> {
        let stalled = self
            .stalled
            .lock()
            .unwrap()
            .contains(&request.metadata.location_id);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self
            .declined
            .lock()
            .unwrap()
            .contains(&request.metadata.location_id)
        {
            return Ok(DebitOutcome::InsufficientFunds { balance: Some(0) });
        }
        let mut debits = self.debits.lock().unwrap();
        debits.push(request.clone());
        Ok(DebitOutcome::Debited {
            transaction_id: format!("tx-{}", debits.len()),
        })
    }
}

/// A store whose every call fails.
#[derive(Debug)]
pub(crate) struct UnavailableStore;

#[async_trait]
impl PostStore for UnavailableStore {
    async fn find_due(
        &self,
        _now: DateTime<Utc>,
        _stale_before: DateTime<Utc>,
        _limit: usize,
    ) -> AppResult<Vec<PostId>> {
        Err(AppError::database("connection refused"))
    }

    async fn claim(
        &self,
        _id: PostId,
        _now: DateTime<Utc>,
        _stale_before: DateTime<Utc>,
    ) -> AppResult<Option<ScheduledPost>> {
        Err(AppError::database("connection refused"))
    }

    async fn save(&self, _post: &ScheduledPost) -> AppResult<()> {
        Err(AppError::database("connection refused"))
    }

    async fn find_owner(&self, _id: OwnerId) -> AppResult<Option<Owner>> {
        Err(AppError::database("connection refused"))
    }

    async fn reset(&self, _id: PostId, _stale_before: DateTime<Utc>) -> AppResult<bool> {
        Err(AppError::database("connection refused"))
    }
}

/// Everything a pipeline test needs to inspect afterwards.
pub(crate) struct Harness {
    pub store: Arc<InMemoryPostStore>,
    pub credentials: Arc<StaticCredentials>,
    pub listing: Arc<ScriptedListing>,
    pub ledger: Arc<RecordingLedger>,
}

impl Harness {
    pub(crate) fn new(credentials: StaticCredentials, listing: ScriptedListing) -> Self {
        Self {
            store: Arc::new(InMemoryPostStore::new()),
            credentials: Arc::new(credentials),
            listing: Arc::new(listing),
            ledger: Arc::new(RecordingLedger::new()),
        }
    }

    pub(crate) fn pipeline(&self) -> PublicationPipeline {
        PublicationPipeline::new(
            self.store.clone(),
            self.credentials.clone(),
            self.listing.clone(),
            self.ledger.clone(),
            PipelinePolicy::default(),
        )
    }
}
