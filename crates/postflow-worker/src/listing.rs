//! Listing platform publish boundary.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use postflow_core::config::PublishConfig;
use postflow_entity::post::ContentKind;

use crate::guard::DeadlineExceeded;

/// Why a publish call did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// Network or protocol failure.
    #[error("publish endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("publish endpoint returned {status}: {body}")]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },
    /// The endpoint answered but reported `success: false`.
    #[error("publish rejected by provider: {0}")]
    Rejected(Value),
    /// The response body was not the expected JSON.
    #[error("malformed publish response: {0}")]
    Decode(String),
    /// The call exceeded its deadline.
    #[error("publish timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),
}

/// One location in a publish call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationDescriptor {
    /// Listing platform location id.
    pub location_id: String,
    /// Locality label shown by the platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    /// Call-to-action link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Body of a publish call.
#[derive(Clone, Serialize)]
pub struct PublishRequest {
    /// Listing platform account id.
    pub account_id: String,
    /// Target locations.
    pub locations: Vec<LocationDescriptor>,
    /// Media reference, if the post carries media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    /// Body text.
    pub description: String,
    /// Short-lived access token.
    pub access_token: String,
    /// Content-type selector.
    pub content_kind: ContentKind,
}

impl fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishRequest")
            .field("account_id", &self.account_id)
            .field("locations", &self.locations)
            .field("media_ref", &self.media_ref)
            .field("content_kind", &self.content_kind)
            .finish_non_exhaustive()
    }
}

/// A confirmed publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    /// Raw provider response body.
    pub response: Value,
}

/// Publishes content to the listing platform.
#[async_trait]
pub trait ListingClient: Send + Sync + fmt::Debug {
    /// Make one publish call.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ListingError>;
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    success: bool,
    #[serde(default)]
    response: Value,
}

/// Longest error body kept in a [`ListingError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// [`ListingClient`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpListingClient {
    http: Client,
    endpoint: String,
}

impl HttpListingClient {
    /// Build a client from configuration, sharing `http`.
    pub fn new(http: Client, config: &PublishConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ListingClient for HttpListingClient {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ListingError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&request.access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ListingError::Status {
                status,
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        let parsed: PublishResponse =
            serde_json::from_str(&body).map_err(|e| ListingError::Decode(e.to_string()))?;
        if !parsed.success {
            return Err(ListingError::Rejected(parsed.response));
        }
        Ok(PublishReceipt {
            response: parsed.response,
        })
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
