//! Wallet ledger boundary.
//!
//! The ledger reports every debit as a tagged JSON result, decoded into
//! [`DebitOutcome`]. Only [`DebitOutcome::Debited`] counts as a charge.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use postflow_core::config::LedgerConfig;
use postflow_core::types::{OwnerId, PostId, WalletId};

use crate::guard::DeadlineExceeded;

/// Why the ledger could not be asked, or its answer not understood.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Network or protocol failure.
    #[error("ledger unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success HTTP status without a recognisable result.
    #[error("ledger returned {status}: {body}")]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// Response body.
        body: String,
    },
    /// A success status with an unrecognised body.
    #[error("malformed ledger response: {0}")]
    Decode(String),
    /// The call exceeded its deadline.
    #[error("debit timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),
}

/// Ledger operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerOperation {
    /// Remove units from the wallet.
    Deduct,
}

/// Links a ledger entry back to the publication that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitMetadata {
    /// Post that was published.
    pub post_id: PostId,
    /// Location the post was published to.
    pub location_id: String,
    /// Media reference of the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
}

/// One debit against an owner's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitRequest {
    /// Wallet owner.
    pub owner_id: OwnerId,
    /// Wallet to debit.
    pub wallet_id: WalletId,
    /// Units to remove.
    pub amount: i64,
    /// Operation type.
    pub operation: LedgerOperation,
    /// Human-readable reason stored on the entry.
    pub reason: String,
    /// Post and location the charge belongs to.
    pub metadata: DebitMetadata,
}

/// Structured ledger answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DebitOutcome {
    /// The entry was appended.
    Debited {
        /// Ledger transaction id.
        transaction_id: String,
    },
    /// The wallet balance does not cover the amount.
    InsufficientFunds {
        /// Balance at the time of the attempt, if reported.
        #[serde(default)]
        balance: Option<i64>,
    },
    /// No wallet exists for the owner.
    WalletNotFound,
}

impl DebitOutcome {
    /// Whether a ledger entry was written.
    pub fn is_debited(&self) -> bool {
        matches!(self, Self::Debited { .. })
    }
}

impl std::fmt::Display for DebitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debited { transaction_id } => write!(f, "debited ({transaction_id})"),
            Self::InsufficientFunds {
                balance: Some(balance),
            } => write!(f, "insufficient funds (balance {balance})"),
            Self::InsufficientFunds { balance: None } => write!(f, "insufficient funds"),
            Self::WalletNotFound => write!(f, "wallet not found"),
        }
    }
}

/// Debits owner wallets.
#[async_trait]
pub trait Ledger: Send + Sync + std::fmt::Debug {
    /// Submit one debit. A declined debit is `Ok`, not `Err`.
    async fn debit(&self, request: &DebitRequest) -> Result<DebitOutcome, LedgerError>;
}

/// [`Ledger`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    http: Client,
    endpoint: String,
}

impl HttpLedger {
    /// Build a client from configuration, sharing `http`.
    pub fn new(http: Client, config: &LedgerConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn debit(&self, request: &DebitRequest) -> Result<DebitOutcome, LedgerError> {
        let response = self.http.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(DebitOutcome::WalletNotFound);
        }

        let body = response.text().await?;
        match serde_json::from_str::<DebitOutcome>(&body) {
            Ok(outcome) => Ok(outcome),
            Err(_) if !status.is_success() => Err(LedgerError::Status { status, body }),
            Err(e) => Err(LedgerError::Decode(e.to_string())),
        }
    }
}
