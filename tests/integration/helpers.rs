//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use postflow_core::config::AppConfig;
use postflow_core::types::{OwnerId, PostId, WalletId};
use postflow_entity::owner::Owner;
use postflow_entity::post::{ContentKind, LocationTask, PostContent, ScheduledPost};
use postflow_worker::PublicationPipeline;
use postflow_worker::store::InMemoryPostStore;

/// Mock token, publish and ledger endpoints plus an in-memory store.
pub struct TestEnv {
    pub token: MockServer,
    pub listing: MockServer,
    pub ledger: MockServer,
    pub store: Arc<InMemoryPostStore>,
    pub config: AppConfig,
}

impl TestEnv {
    /// Start the mock servers. `call_timeout_ms` applies to every endpoint.
    pub async fn start(call_timeout_ms: u64) -> Self {
        let token = MockServer::start().await;
        let listing = MockServer::start().await;
        let ledger = MockServer::start().await;

        let config: AppConfig = serde_json::from_value(json!({
            "database": { "url": "postgres://unused@localhost/unused" },
            "credentials": {
                "token_url": format!("{}/token", token.uri()),
                "client_id": "postflow-client",
                "client_secret": "postflow-secret",
                "timeout_ms": call_timeout_ms
            },
            "publish": {
                "endpoint": format!("{}/local-posts", listing.uri()),
                "timeout_ms": call_timeout_ms
            },
            "ledger": {
                "endpoint": format!("{}/transactions", ledger.uri()),
                "timeout_ms": call_timeout_ms
            }
        }))
        .expect("test config should deserialize");

        Self {
            token,
            listing,
            ledger,
            store: Arc::new(InMemoryPostStore::new()),
            config,
        }
    }

    /// Pipeline wired exactly as the server wires it, over the in-memory store.
    pub fn pipeline(&self) -> PublicationPipeline {
        postflow_worker::build_pipeline(&self.config, self.store.clone())
            .expect("pipeline should build")
    }

    /// Insert a due post with one location per id, plus its owner.
    pub async fn seed_post(&self, location_ids: &[&str], minutes_ago: i64) -> PostId {
        let owner = Owner {
            id: OwnerId::new(),
            wallet_id: WalletId::new(),
            display_name: "Harbour Cafe".into(),
        };
        let locations = location_ids
            .iter()
            .map(|id| LocationTask::new(*id, "accounts/100").with_locality("Harbourside"))
            .collect();
        let post = ScheduledPost::new(
            owner.id,
            Utc::now() - Duration::minutes(minutes_ago),
            "stored-refresh-token",
            PostContent {
                media_ref: Some("https://cdn.example.com/media/42.jpg".into()),
                description: "Live music every Friday".into(),
                link: None,
                content_kind: ContentKind::Photo,
            },
            locations,
        );
        let id = post.id;
        self.store.insert_owner(owner).await;
        self.store.insert_post(post).await;
        id
    }

    pub async fn grant_tokens(&self) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "short-lived",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .mount(&self.token)
            .await;
    }

    /// Publish succeeds for every location, `expected` calls in total.
    pub async fn publish_succeeds(&self, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/local-posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "response": { "name": "accounts/100/localPosts/1", "state": "LIVE" }
            })))
            .expect(expected)
            .mount(&self.listing)
            .await;
    }

    /// Override the publish response for one location.
    pub async fn publish_responds_for(&self, location_id: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/local-posts"))
            .and(body_partial_json(json!({
                "locations": [{ "location_id": location_id }]
            })))
            .respond_with(response)
            .with_priority(1)
            .mount(&self.listing)
            .await;
    }

    /// Ledger answers every debit with `body`, `expected` calls in total.
    pub async fn ledger_answers(&self, status: u16, body: Value, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/transactions"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(expected)
            .mount(&self.ledger)
            .await;
    }

    pub async fn get(&self, id: PostId) -> ScheduledPost {
        self.store.get(id).await.expect("post should exist")
    }
}

pub fn debited() -> Value {
    json!({ "status": "debited", "transaction_id": "tx-1" })
}
