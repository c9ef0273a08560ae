//! Per-location publication progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One physical location a post is published to.
///
/// `done` is monotonic: once a location has been published and charged
/// it is never reset. `published_at` records a confirmed publish even
/// when the matching debit has not succeeded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationTask {
    /// Listing platform location id. Tasks without one are skipped.
    #[serde(default)]
    pub location_id: Option<String>,
    /// Listing platform account the location belongs to.
    pub external_account_id: String,
    /// Human-readable locality label sent with the publish call.
    #[serde(default)]
    pub locality: Option<String>,
    /// Whether this location has been published and charged.
    #[serde(default)]
    pub done: bool,
    /// When `done` became true.
    #[serde(default)]
    pub done_at: Option<DateTime<Utc>>,
    /// When the publish endpoint confirmed this location.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Last error recorded for this location.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Raw provider response body from the successful publish.
    #[serde(default)]
    pub external_response: Option<serde_json::Value>,
}

impl LocationTask {
    /// Create a pending task for a location.
    pub fn new(location_id: impl Into<String>, external_account_id: impl Into<String>) -> Self {
        Self {
            location_id: Some(location_id.into()),
            external_account_id: external_account_id.into(),
            locality: None,
            done: false,
            done_at: None,
            published_at: None,
            last_error: None,
            external_response: None,
        }
    }

    /// Set the locality label.
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Usable location id, ignoring blank values.
    pub fn location_id(&self) -> Option<&str> {
        self.location_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Whether the publish side effect already happened but the charge
    /// did not complete.
    pub fn awaiting_charge(&self) -> bool {
        !self.done && self.published_at.is_some()
    }

    /// Record a confirmed publish.
    pub fn mark_published(&mut self, response: serde_json::Value, at: DateTime<Utc>) {
        self.published_at = Some(at);
        self.external_response = Some(response);
        self.last_error = None;
    }

    /// Record that the location has been published and charged.
    pub fn mark_done(&mut self, at: DateTime<Utc>) {
        self.done = true;
        self.done_at = Some(at);
        self.last_error = None;
    }

    /// Record a failure for this location. Never clears `done`.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }
}
