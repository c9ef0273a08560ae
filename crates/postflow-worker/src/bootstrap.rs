//! Wiring of the production pipeline from configuration.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use postflow_core::config::AppConfig;
use postflow_core::error::{AppError, ErrorKind};
use postflow_database::DatabasePool;
use postflow_database::repositories::{OwnerRepository, PostRepository};

use crate::credential::OAuthRefresher;
use crate::ledger::HttpLedger;
use crate::listing::HttpListingClient;
use crate::pipeline::{PipelinePolicy, PublicationPipeline};
use crate::store::{PgPostStore, PostStore};

/// Shared HTTP client for the three external endpoints. Per-call
/// deadlines are applied by the pipeline, not here.
pub fn http_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(concat!("postflow/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e))
}

/// PostgreSQL-backed store over `db`.
pub fn pg_store(db: &DatabasePool) -> Arc<dyn PostStore> {
    let pool = db.pool().clone();
    Arc::new(PgPostStore::new(
        Arc::new(PostRepository::new(pool.clone())),
        Arc::new(OwnerRepository::new(pool)),
    ))
}

/// Build the pipeline with the HTTP boundaries named in `config`.
pub fn build_pipeline(
    config: &AppConfig,
    store: Arc<dyn PostStore>,
) -> Result<PublicationPipeline, AppError> {
    let http = http_client()?;
    let policy = PipelinePolicy::from_config(config);
    tracing::debug!(?policy, "Publication policy");

    Ok(PublicationPipeline::new(
        store,
        Arc::new(OAuthRefresher::new(http.clone(), &config.credentials)),
        Arc::new(HttpListingClient::new(http.clone(), &config.publish)),
        Arc::new(HttpLedger::new(http, &config.ledger)),
        policy,
    ))
}
