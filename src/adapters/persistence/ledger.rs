//! Ledger Journal - Append-only JSONL Balance Ledger
//!
//! Persists every balance adjustment to `ledger.jsonl`, one JSON entry per
//! line. Balances live in memory and are rebuilt by replaying the journal
//! on open. Each mutation checks, appends, and applies under one lock, so
//! a failed write leaves both the file and the balances untouched.

use std::collections::{HashMap, HashSet};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::domain::gift::AccountId;
use crate::domain::ledger::{LedgerCause, LedgerEntry, SettlementId};
use crate::ports::ledger::{LedgerError, LedgerStore};

/// In-memory view rebuilt from the journal.
#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, u64>,
    entries: Vec<LedgerEntry>,
    /// Applied idempotency keys, per cause.
    applied: HashSet<(LedgerCause, String)>,
    /// Top-up charge ID -> (account, amount), for refunds.
    credits: HashMap<String, (AccountId, u64)>,
}

impl LedgerState {
    fn balance(&self, account_id: AccountId) -> u64 {
        self.balances.get(&account_id).copied().unwrap_or(0)
    }

    fn is_applied(&self, cause: LedgerCause, key: &str) -> bool {
        self.applied.contains(&(cause, key.to_string()))
    }

    fn apply(&mut self, entry: LedgerEntry) {
        self.balances.insert(entry.account_id, entry.balance_after);
        self.applied.insert((entry.cause, entry.key.clone()));
        if entry.cause == LedgerCause::TopUp {
            self.credits
                .insert(entry.key.clone(), (entry.account_id, entry.amount.unsigned_abs()));
        }
        self.entries.push(entry);
    }
}

/// Make the journal end on a line boundary before the next append.
///
/// An unterminated tail that still parses gets its newline. Anything else
/// is a torn write and is cut off, so the next entry starts on a fresh line.
async fn repair_tail(path: &Path, content: &str) -> Result<()> {
    let tail_start = content.rfind('\n').map_or(0, |i| i + 1);
    let tail = &content[tail_start..];
    if tail.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .context("Failed to open ledger journal for repair")?;

    if serde_json::from_str::<LedgerEntry>(tail).is_ok() {
        file.seek(SeekFrom::End(0)).await?;
        file.write_all(b"\n").await?;
        info!("Terminated last ledger entry");
    } else {
        file.set_len(u64::try_from(tail_start)?)
            .await
            .context("Failed to truncate ledger journal")?;
        warn!(
            file = %path.display(),
            dropped_bytes = tail.len(),
            "Truncated partial ledger entry"
        );
    }

    file.sync_data().await.context("Failed to sync ledger journal")?;
    Ok(())
}

/// Append-only JSONL ledger store.
pub struct JsonlLedger {
    /// Path to ledger.jsonl.
    journal_path: PathBuf,
    state: Mutex<LedgerState>,
}

impl JsonlLedger {
    /// Open the ledger in `data_dir`, replaying any existing journal.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        let journal_path = dir.join("ledger.jsonl");
        let mut state = LedgerState::default();

        if journal_path.exists() {
            let content = fs::read_to_string(&journal_path)
                .await
                .context("Failed to read ledger journal")?;

            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LedgerEntry>(line) {
                    Ok(entry) => state.apply(entry),
                    Err(e) => {
                        warn!(
                            file = %journal_path.display(),
                            line = line_no + 1,
                            error = %e,
                            "Skipping malformed ledger entry"
                        );
                    }
                }
            }

            repair_tail(&journal_path, &content).await?;
        }

        info!(
            entries = state.entries.len(),
            accounts = state.balances.len(),
            "Ledger journal loaded"
        );

        Ok(Self {
            journal_path,
            state: Mutex::new(state),
        })
    }

    /// Append one entry to the journal and sync it to disk.
    async fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut json = serde_json::to_string(entry).map_err(storage)?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)
            .await
            .map_err(storage)?;

        file.write_all(json.as_bytes()).await.map_err(storage)?;
        file.sync_data().await.map_err(storage)?;
        Ok(())
    }

    /// Build, persist, and apply an entry. Caller holds the state lock.
    async fn commit(
        &self,
        state: &mut LedgerState,
        account_id: AccountId,
        amount: i64,
        cause: LedgerCause,
        key: &str,
        balance_after: u64,
    ) -> Result<(), LedgerError> {
        let entry = LedgerEntry {
            account_id,
            amount,
            cause,
            key: key.to_string(),
            balance_after,
            recorded_at: Utc::now(),
        };
        self.append(&entry).await?;
        state.apply(entry);
        Ok(())
    }
}

fn storage(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn signed(amount: u64) -> Result<i64, LedgerError> {
    i64::try_from(amount).map_err(|_| LedgerError::Storage(format!("amount {amount} out of range")))
}

#[async_trait]
impl LedgerStore for JsonlLedger {
    async fn get_balance(&self, account_id: AccountId) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.balance(account_id))
    }

    #[instrument(skip(self), fields(settlement_id = %settlement_id))]
    async fn debit(
        &self,
        account_id: AccountId,
        amount: u64,
        settlement_id: &SettlementId,
    ) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().await;
        let key = settlement_id.as_str();

        if state.is_applied(LedgerCause::Purchase, key) {
            return Err(LedgerError::DuplicateSettlement {
                key: key.to_string(),
            });
        }

        let available = state.balance(account_id);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                account_id,
                available,
                requested: amount,
            });
        }

        let balance = available - amount;
        self.commit(&mut state, account_id, -signed(amount)?, LedgerCause::Purchase, key, balance)
            .await?;
        Ok(balance)
    }

    #[instrument(skip(self))]
    async fn credit(
        &self,
        account_id: AccountId,
        amount: u64,
        charge_id: &str,
    ) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().await;

        if state.is_applied(LedgerCause::TopUp, charge_id) {
            return Err(LedgerError::DuplicateSettlement {
                key: charge_id.to_string(),
            });
        }

        let balance = state
            .balance(account_id)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Storage("balance overflow".to_string()))?;
        self.commit(&mut state, account_id, signed(amount)?, LedgerCause::TopUp, charge_id, balance)
            .await?;
        Ok(balance)
    }

    #[instrument(skip(self))]
    async fn refund(&self, account_id: AccountId, charge_id: &str) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().await;

        if state.is_applied(LedgerCause::Refund, charge_id) {
            return Err(LedgerError::DuplicateSettlement {
                key: charge_id.to_string(),
            });
        }

        let amount = match state.credits.get(charge_id) {
            Some(&(owner, amount)) if owner == account_id => amount,
            _ => {
                return Err(LedgerError::UnknownCharge {
                    charge_id: charge_id.to_string(),
                });
            }
        };

        let available = state.balance(account_id);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                account_id,
                available,
                requested: amount,
            });
        }

        let balance = available - amount;
        self.commit(
            &mut state,
            account_id,
            -signed(amount)?,
            LedgerCause::Refund,
            charge_id,
            balance,
        )
        .await?;
        Ok(amount)
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn total_balance(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.balances.values().sum())
    }
}
