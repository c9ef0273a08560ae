//! Publication sweeps end to end over HTTP.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use postflow_entity::post::PostStatus;
use postflow_worker::RunStats;
use postflow_worker::store::PostStore;

use crate::helpers::{TestEnv, debited};

#[tokio::test]
async fn test_post_published_to_every_location() {
    let env = TestEnv::start(5_000).await;
    env.grant_tokens().await;
    env.publish_succeeds(2).await;
    env.ledger_answers(201, debited(), 2).await;
    let id = env.seed_post(&["locations/1", "locations/2"], 10).await;

    let report = env.pipeline().run().await;

    assert!(report.success);
    assert_eq!(report.stats.unwrap().posted, 1);
    let post = env.get(id).await;
    assert_eq!(post.status, PostStatus::Posted);
    assert!(post.posted_at.is_some());
    assert!(post.locations.iter().all(|l| l.done && l.external_response.is_some()));

    let debits = env.ledger.received_requests().await.unwrap();
    let body: serde_json::Value = debits[0].body_json().unwrap();
    assert_eq!(body["amount"], 20);
    assert_eq!(body["operation"], "deduct");
    assert_eq!(body["metadata"]["post_id"], id.to_string());
    assert_eq!(body["metadata"]["location_id"], "locations/1");
}

#[tokio::test]
async fn test_one_posted_one_timed_out() {
    let env = TestEnv::start(300).await;
    env.grant_tokens().await;
    env.publish_responds_for(
        "locations/j2-b",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "success": true, "response": {} }))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    env.publish_succeeds(2).await;
    env.ledger_answers(201, debited(), 2).await;

    let j1 = env.seed_post(&["locations/j1"], 10).await;
    let j2 = env.seed_post(&["locations/j2-a", "locations/j2-b"], 5).await;

    let report = env.pipeline().run().await;

    assert_eq!(
        report.stats,
        Some(RunStats {
            total: 2,
            processed: 2,
            skipped: 0,
            failed: 1,
            posted: 1,
        })
    );
    assert_eq!(env.get(j1).await.status, PostStatus::Posted);

    let j2 = env.get(j2).await;
    assert_eq!(j2.status, PostStatus::Failed);
    assert!(j2.locations[0].done);
    assert!(!j2.locations[1].done);
    assert!(j2.locations[1].last_error.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_invalid_refresh_token_makes_no_publish_or_debit() {
    let env = TestEnv::start(5_000).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .mount(&env.token)
        .await;
    env.publish_succeeds(0).await;
    env.ledger_answers(201, debited(), 0).await;
    let id = env.seed_post(&["locations/1"], 10).await;

    let report = env.pipeline().run().await;

    assert_eq!(report.stats.unwrap().failed, 1);
    let post = env.get(id).await;
    assert_eq!(post.status, PostStatus::Failed);
    assert!(post.last_error.as_deref().unwrap().contains("invalid_grant"));
}

#[tokio::test]
async fn test_failed_second_location_leaves_third_untouched() {
    let env = TestEnv::start(5_000).await;
    env.grant_tokens().await;
    env.publish_responds_for(
        "locations/2",
        ResponseTemplate::new(500).set_body_string("internal error"),
    )
    .await;
    env.publish_succeeds(1).await;
    env.ledger_answers(201, debited(), 1).await;
    let id = env
        .seed_post(&["locations/1", "locations/2", "locations/3"], 10)
        .await;

    env.pipeline().run().await;

    let post = env.get(id).await;
    assert_eq!(post.status, PostStatus::Failed);
    assert!(post.locations[0].done);
    assert!(post.locations[0].external_response.is_some());
    assert!(!post.locations[1].done);
    assert!(post.locations[1].last_error.as_deref().unwrap().contains("500"));
    assert!(!post.locations[2].done);
    assert!(post.locations[2].last_error.is_none());
    assert!(post.locations[2].published_at.is_none());
}

#[tokio::test]
async fn test_second_sweep_does_not_republish() {
    let env = TestEnv::start(5_000).await;
    env.grant_tokens().await;
    env.publish_succeeds(1).await;
    env.ledger_answers(201, debited(), 1).await;
    env.seed_post(&["locations/1"], 10).await;

    let pipeline = env.pipeline();
    let first = pipeline.run().await;
    let second = pipeline.run().await;

    assert_eq!(first.stats.unwrap().posted, 1);
    assert_eq!(second.stats.unwrap().total, 0);
}

#[tokio::test]
async fn test_insufficient_funds_then_reset_charges_without_republishing() {
    let env = TestEnv::start(5_000).await;
    env.grant_tokens().await;
    env.publish_succeeds(1).await;
    env.ledger_answers(402, json!({ "status": "insufficient_funds", "balance": 5 }), 1)
        .await;
    let id = env.seed_post(&["locations/1"], 10).await;
    let pipeline = env.pipeline();

    pipeline.run().await;
    let post = env.get(id).await;
    assert_eq!(post.status, PostStatus::Failed);
    assert!(post.locations[0].awaiting_charge());
    assert!(post.last_error.as_deref().unwrap().contains("insufficient funds"));

    env.ledger.reset().await;
    env.ledger_answers(201, debited(), 1).await;
    assert!(env.store.reset(id, Utc::now()).await.unwrap());

    let report = pipeline.run().await;
    assert_eq!(report.stats.unwrap().posted, 1);
    let post = env.get(id).await;
    assert_eq!(post.status, PostStatus::Posted);
    assert!(post.locations[0].done);
}

#[tokio::test]
async fn test_batch_attempts_oldest_twenty_five() {
    let env = TestEnv::start(5_000).await;
    env.grant_tokens().await;
    env.publish_succeeds(25).await;
    env.ledger_answers(201, debited(), 25).await;

    let mut ids = Vec::new();
    for i in 0..40 {
        ids.push(env.seed_post(&["locations/1"], 100 - i).await);
    }

    let report = env.pipeline().run().await;
    let stats = report.stats.unwrap();
    assert_eq!(stats.total, 25);
    assert_eq!(stats.posted, 25);

    for id in &ids[..25] {
        assert_eq!(env.get(*id).await.status, PostStatus::Posted);
    }
    for id in &ids[25..] {
        assert_eq!(env.get(*id).await.status, PostStatus::Scheduled);
    }
}
