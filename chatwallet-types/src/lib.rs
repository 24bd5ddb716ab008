//! Shared wire types for the chat wallet services.
//!
//! These mirror the JSON shapes exchanged with the transaction builder and
//! record services, so field names follow the services' camelCase spelling.

#![allow(clippy::derive_partial_eq_without_eq)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Free-form key/value payload used for transaction details and event data.
pub type Details = Map<String, Value>;

/// Target chain network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Devnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
        }
    }

    /// Public fullnode URL for this network.
    pub fn fullnode_url(&self) -> String {
        format!("https://fullnode.{}.sui.io:443", self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of transaction a draft was built as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Transfer,
    MoveCall,
    NftMint,
    Aggregate,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::MoveCall => "moveCall",
            Self::NftMint => "nftMint",
            Self::Aggregate => "aggregate",
        }
    }

    /// Path segment of the builder endpoint for this kind.
    pub fn build_path(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::MoveCall => "move-call",
            Self::NftMint => "nft-mint",
            Self::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transfer amount; the builder accepts either a decimal string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(f64),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Amount {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Amount {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub recipient: String,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCallParams {
    pub package_object_id: String,
    pub module: String,
    pub function: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_budget: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMintParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Details>,
}

/// Build parameters tagged with the kind they build.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildParams {
    Transfer(TransferParams),
    MoveCall(MoveCallParams),
    NftMint(NftMintParams),
}

impl BuildParams {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Transfer(_) => TransactionKind::Transfer,
            Self::MoveCall(_) => TransactionKind::MoveCall,
            Self::NftMint(_) => TransactionKind::NftMint,
        }
    }
}

/// Body of the aggregate build request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub transactions: Vec<TransactionDraft>,
}

/// An unsigned transaction as produced by the builder service.
///
/// Drafts are immutable; changing any parameter means building a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub tx_bytes: String,
    pub tx_type: TransactionKind,
    #[serde(default)]
    pub details: Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failure,
}

/// Event emitted by an executed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Details,
}

/// Outcome of a sign-and-execute call. Never mutated once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub digest: String,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at_timestamp: Option<i64>,
    #[serde(default)]
    pub events: Vec<TransactionEvent>,
}

impl TransactionResult {
    pub fn success(digest: impl Into<String>, confirmed_at_timestamp: i64) -> Self {
        Self {
            digest: digest.into(),
            status: TransactionStatus::Success,
            error: None,
            confirmed_at_timestamp: Some(confirmed_at_timestamp),
            events: Vec::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            digest: String::new(),
            status: TransactionStatus::Failure,
            error: Some(error.into()),
            confirmed_at_timestamp: None,
            events: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// Lifecycle status of a stored transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransactionRecord {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionKind,
    pub status: RecordStatus,
    pub details: Details,
}

/// Stored transaction record as returned by the record service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: TransactionKind,
    pub status: RecordStatus,
    #[serde(default)]
    pub tx_digest: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub details: Value,
}

/// Body of `PATCH /transactions/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: RecordStatus,
    pub tx_digest: String,
}
