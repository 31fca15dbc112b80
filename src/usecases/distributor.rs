//! Distributor - Per-account Purchase Pipeline
//!
//! Runs one account through the full pass:
//! 1. Read the current balance
//! 2. Filter the catalog by the account's preferences
//! 3. Allocate up to `cycles` purchase rounds against the balance
//! 4. Dispatch the plan
//! 5. Settle delivered gifts against the ledger
//! 6. Tell the account what happened (best effort)
//!
//! A ledger failure aborts this account only; the caller moves on.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::config::EngineConfig;
use crate::domain::allocator::allocate;
use crate::domain::eligibility::eligible;
use crate::domain::gift::{AccountId, CatalogItem};
use crate::domain::ledger::SettlementId;
use crate::domain::preferences::AccountPreferences;
use crate::ports::acquisition::AcquisitionApi;
use crate::ports::ledger::{LedgerError, LedgerStore};
use crate::ports::notifier::Notifier;

use super::attempt_memory::AttemptMemory;
use super::dispatcher::Dispatcher;
use super::settlement::Settlement;

/// How one account's pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Zero balance; skipped without notification.
    NoBalance,
    /// Nothing in the catalog matches the preferences.
    NoEligibleItems,
    /// Balance does not cover the cheapest eligible gift.
    InsufficientFunds,
    /// At least one gift delivered and billed.
    Settled {
        amount: u64,
        delivered: usize,
        failure: Option<String>,
    },
    /// Dispatch halted before any delivery; nothing billed.
    DeliveryFailed { reason: String },
}

impl AccountOutcome {
    /// Stars debited in this pass.
    pub fn settled_amount(&self) -> u64 {
        match self {
            Self::Settled { amount, .. } => *amount,
            _ => 0,
        }
    }
}

/// Per-account pipeline: eligibility, allocation, dispatch, settlement.
pub struct Distributor<A: AcquisitionApi, L: LedgerStore, N: Notifier> {
    ledger: Arc<L>,
    notifier: Arc<N>,
    dispatcher: Dispatcher<A>,
    settlement: Settlement<L>,
    memory: Option<Mutex<AttemptMemory>>,
}

impl<A: AcquisitionApi, L: LedgerStore, N: Notifier> Distributor<A, L, N> {
    pub fn new(
        api: Arc<A>,
        ledger: Arc<L>,
        notifier: Arc<N>,
        config: &EngineConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(api, config, Arc::clone(&metrics)),
            settlement: Settlement::new(Arc::clone(&ledger), metrics),
            memory: config.attempt_memory().map(|w| Mutex::new(AttemptMemory::new(w))),
            ledger,
            notifier,
        }
    }

    /// Run one account through the pipeline against a catalog snapshot.
    ///
    /// # Errors
    /// Ledger failures that settlement could not reconcile. Anything already
    /// delivered stays delivered.
    #[instrument(skip(self, prefs, catalog), fields(account_id = prefs.account_id))]
    pub async fn process_account(
        &self,
        run_id: Uuid,
        prefs: &AccountPreferences,
        catalog: &[CatalogItem],
    ) -> Result<AccountOutcome, LedgerError> {
        let account_id = prefs.account_id;
        let balance = self.ledger.get_balance(account_id).await?;
        if balance == 0 {
            info!("No balance, skipping account");
            return Ok(AccountOutcome::NoBalance);
        }

        let mut items = eligible(catalog, prefs);
        if let Some(memory) = &self.memory {
            memory.lock().await.retain_unattempted(account_id, &mut items);
        }
        if items.is_empty() {
            info!(balance, "No eligible gifts for account");
            return Ok(AccountOutcome::NoEligibleItems);
        }

        let plan = allocate(&items, balance, prefs.cycles);
        if plan.is_empty() {
            info!(balance, eligible = items.len(), "Balance below cheapest eligible gift");
            self.notify(account_id, "Insufficient funds to purchase available gifts")
                .await;
            return Ok(AccountOutcome::InsufficientFunds);
        }

        info!(
            balance,
            planned = plan.len(),
            total_cost = plan.total_cost,
            cycles_used = plan.cycles_used,
            "Acquisition plan ready"
        );

        let result = self.dispatcher.dispatch(account_id, &plan).await;
        if let Some(memory) = &self.memory {
            memory.lock().await.record(account_id, &result);
        }

        if result.delivered_count() == 0 {
            let reason = result.failure.unwrap_or_else(|| "no gift delivered".to_string());
            self.notify(account_id, "Gift delivery failed, nothing was charged")
                .await;
            return Ok(AccountOutcome::DeliveryFailed { reason });
        }

        let settlement_id = SettlementId::for_purchase(run_id, account_id);
        let settled = self.settlement.settle(account_id, &result, &settlement_id).await?;

        self.notify(
            account_id,
            &format!("Gifts purchased for a total of {} stars", settled.debited),
        )
        .await;

        Ok(AccountOutcome::Settled {
            amount: settled.debited,
            delivered: result.delivered_count(),
            failure: result.failure,
        })
    }

    /// Best-effort notification; failures are logged and dropped.
    async fn notify(&self, account_id: AccountId, message: &str) {
        if let Err(e) = self.notifier.notify(account_id, message).await {
            warn!(account_id, error = %e, "Failed to notify account");
        }
    }
}
