//! Credential Refresher: OAuth2 refresh-token exchange.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use postflow_core::config::CredentialConfig;

use crate::guard::DeadlineExceeded;

/// Why a refresh token could not be exchanged.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The token endpoint answered with an OAuth error.
    #[error("token endpoint rejected refresh ({status}): {code}{}", detail(.description))]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// OAuth `error` code, or `http_error` when the body had none.
        code: String,
        /// OAuth `error_description`.
        description: Option<String>,
    },
    /// A success response without a usable access token.
    #[error("token endpoint response carried no access token")]
    MissingAccessToken,
    /// Network or protocol failure.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The exchange exceeded its deadline.
    #[error("token refresh timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),
}

fn detail(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// A short-lived access token. Lives in memory only.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    expires_in: Option<i64>,
}

impl AccessToken {
    /// Wrap a raw token value.
    pub fn new(secret: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            secret: secret.into(),
            expires_in,
        }
    }

    /// Raw token for an `Authorization` header or request body.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Lifetime in seconds, when the endpoint reported one.
    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchanges a stored refresh token for an access token.
#[async_trait]
pub trait CredentialRefresher: Send + Sync + fmt::Debug {
    /// Perform one exchange. No retries.
    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, CredentialError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// [`CredentialRefresher`] talking to an OAuth2 token endpoint.
#[derive(Clone)]
pub struct OAuthRefresher {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for OAuthRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthRefresher")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl OAuthRefresher {
    /// Build a refresher from configuration, sharing `http`.
    pub fn new(http: Client, config: &CredentialConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

#[async_trait]
impl CredentialRefresher for OAuthRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, CredentialError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorResponse = response.json().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                code: body.error.unwrap_or_else(|| "http_error".to_string()),
                description: body.error_description,
            });
        }

        let body: TokenResponse = response.json().await?;
        match body.access_token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(AccessToken::new(token, body.expires_in)),
            None => Err(CredentialError::MissingAccessToken),
        }
    }
}
