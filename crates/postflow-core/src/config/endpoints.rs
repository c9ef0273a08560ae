//! External endpoint configuration: OAuth2 token exchange, listing
//! publish endpoint, and wallet ledger.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// OAuth2 refresh-token exchange settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Token endpoint URL.
    pub token_url: String,
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Deadline for a single token exchange, in milliseconds.
    #[serde(default = "default_call_timeout")]
    pub timeout_ms: u64,
}

impl CredentialConfig {
    /// Exchange deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Listing platform publish endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Publish endpoint URL.
    pub endpoint: String,
    /// Deadline for a single per-location publish call, in milliseconds.
    #[serde(default = "default_call_timeout")]
    pub timeout_ms: u64,
}

impl PublishConfig {
    /// Publish deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Wallet ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Debit endpoint URL.
    pub endpoint: String,
    /// Units debited for every successfully published location.
    #[serde(default = "default_debit_amount")]
    pub debit_amount: i64,
    /// Deadline for a single debit call, in milliseconds.
    #[serde(default = "default_call_timeout")]
    pub timeout_ms: u64,
}

impl LedgerConfig {
    /// Debit deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_call_timeout() -> u64 {
    20_000
}

fn default_debit_amount() -> i64 {
    20
}
