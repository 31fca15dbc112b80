//! Ledger Port - Account Balance Interface
//!
//! Holds each account's star balance and its append-only adjustment
//! history. Every mutation is an atomically checked read-modify-write,
//! idempotent per key, so that settlement cannot race with deposit or
//! refund flows running outside the engine.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::gift::AccountId;
use crate::domain::ledger::{LedgerEntry, SettlementId};

/// Ledger operation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Debit larger than the current balance; nothing was applied.
    #[error("insufficient funds for account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        available: u64,
        requested: u64,
    },
    /// The idempotency key was already applied; nothing changed.
    #[error("settlement {key} already applied")]
    DuplicateSettlement { key: String },
    /// Refund requested for a charge that was never credited.
    #[error("charge {charge_id} not found")]
    UnknownCharge { charge_id: String },
    /// Backing store unavailable.
    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Trait for ledger stores.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Current balance (0 for accounts never seen).
    async fn get_balance(&self, account_id: AccountId) -> Result<u64, LedgerError>;

    /// Debit `amount`, keyed by `settlement_id`. Returns the new balance.
    ///
    /// # Errors
    /// `InsufficientFunds` if `amount` exceeds the current balance,
    /// `DuplicateSettlement` if the ID was applied before.
    async fn debit(
        &self,
        account_id: AccountId,
        amount: u64,
        settlement_id: &SettlementId,
    ) -> Result<u64, LedgerError>;

    /// Credit `amount` from an external charge. Returns the new balance.
    ///
    /// # Errors
    /// `DuplicateSettlement` if `charge_id` was already credited.
    async fn credit(
        &self,
        account_id: AccountId,
        amount: u64,
        charge_id: &str,
    ) -> Result<u64, LedgerError>;

    /// Reverse the credit recorded under `charge_id`. Returns the refunded amount.
    ///
    /// # Errors
    /// `UnknownCharge`, `InsufficientFunds`, or `DuplicateSettlement` when the
    /// charge was already refunded.
    async fn refund(&self, account_id: AccountId, charge_id: &str) -> Result<u64, LedgerError>;

    /// All entries for an account, oldest first.
    async fn history(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Sum of all account balances.
    async fn total_balance(&self) -> Result<u64, LedgerError>;
}
