//! Ledger entry types.
//!
//! Every balance adjustment is an append-only signed entry tagged with a
//! cause and an idempotency key: the external charge ID for top-ups and
//! refunds, or a settlement batch ID for purchases.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::gift::AccountId;

/// Why a ledger adjustment happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerCause {
    /// Balance funded by an external payment.
    TopUp,
    /// Gifts delivered by the auto-purchase engine.
    Purchase,
    /// External payment returned to the payer.
    Refund,
}

impl fmt::Display for LedgerCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopUp => write!(f, "top_up"),
            Self::Purchase => write!(f, "purchase"),
            Self::Refund => write!(f, "refund"),
        }
    }
}

/// One append-only ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account_id: AccountId,
    /// Signed adjustment (positive = credit).
    pub amount: i64,
    pub cause: LedgerCause,
    /// Idempotency key (charge ID or settlement ID).
    pub key: String,
    /// Balance after applying this entry.
    pub balance_after: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Identifier of one settlement batch: unique per (run, account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(String);

impl SettlementId {
    /// Settlement ID for an account within a distribution run.
    pub fn for_purchase(run_id: Uuid, account_id: AccountId) -> Self {
        Self(format!("purchase:{run_id}:{account_id}"))
    }

    /// Wrap an externally chosen key (tests, replays).
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
