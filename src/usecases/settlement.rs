//! Settlement Use Case - Billing Confirmed Deliveries
//!
//! Reconciles a dispatch result against the ledger. Only gifts marked
//! delivered are billed, in a single debit keyed by the settlement ID.
//!
//! Settlement flow:
//! 1. Sum the prices of delivered gifts
//! 2. Debit that sum under the settlement ID
//! 3. On insufficient funds (balance drifted since allocation), clip the
//!    debit to the current balance and log a reconciliation warning; the
//!    gifts are already delivered and cannot be taken back. A balance that
//!    keeps dropping is re-clipped until a debit lands or nothing is left
//! 4. On a duplicate settlement ID, report what the earlier debit applied

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::gift::AccountId;
use crate::domain::ledger::{LedgerCause, SettlementId};
use crate::domain::plan::AcquisitionResult;
use crate::ports::ledger::{LedgerError, LedgerStore};

/// Summary of one settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    /// Settlement batch identifier.
    pub settlement_id: SettlementId,
    /// Sum of delivered gift prices.
    pub delivered_total: u64,
    /// Stars actually debited.
    pub debited: u64,
    /// Whether the debit was clipped to the current balance.
    pub clipped: bool,
}

/// Settlement manager that bills delivered gifts.
pub struct Settlement<L: LedgerStore> {
    ledger: Arc<L>,
    metrics: Arc<MetricsRegistry>,
}

impl<L: LedgerStore> Settlement<L> {
    /// Create a new settlement manager.
    pub fn new(ledger: Arc<L>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { ledger, metrics }
    }

    /// Debit the account for every delivered gift in `result`.
    ///
    /// # Errors
    /// Propagates ledger failures other than insufficient funds and
    /// duplicate settlement, which are reconciled here.
    #[instrument(skip(self, result), fields(settlement_id = %settlement_id))]
    pub async fn settle(
        &self,
        account_id: AccountId,
        result: &AcquisitionResult,
        settlement_id: &SettlementId,
    ) -> Result<SettlementOutcome, LedgerError> {
        let delivered_total = result.delivered_total();
        let mut outcome = SettlementOutcome {
            settlement_id: settlement_id.clone(),
            delivered_total,
            debited: 0,
            clipped: false,
        };

        if delivered_total == 0 {
            return Ok(outcome);
        }

        match self.ledger.debit(account_id, delivered_total, settlement_id).await {
            Ok(balance) => {
                info!(amount = delivered_total, balance, "Settlement debited");
                outcome.debited = delivered_total;
            }
            Err(LedgerError::InsufficientFunds { available, .. }) => {
                warn!(
                    delivered_total,
                    available,
                    "Balance below delivered total, clipping settlement"
                );
                self.metrics.settlement_clips.inc();
                outcome.clipped = true;
                outcome.debited = self.clip(account_id, available, settlement_id).await?;
            }
            Err(LedgerError::DuplicateSettlement { .. }) => {
                outcome.debited = self.applied_amount(account_id, settlement_id).await?;
                outcome.clipped = outcome.debited < delivered_total;
                info!(debited = outcome.debited, "Settlement already applied");
                return Ok(outcome);
            }
            Err(e) => return Err(e),
        }

        self.metrics.stars_settled.inc_by(outcome.debited);
        Ok(outcome)
    }

    /// Debit what the balance allows, re-clipping while it keeps dropping.
    async fn clip(
        &self,
        account_id: AccountId,
        mut available: u64,
        settlement_id: &SettlementId,
    ) -> Result<u64, LedgerError> {
        while available > 0 {
            match self.ledger.debit(account_id, available, settlement_id).await {
                Ok(balance) => {
                    info!(amount = available, balance, "Clipped settlement debited");
                    return Ok(available);
                }
                Err(LedgerError::InsufficientFunds { available: now, .. }) if now < available => {
                    warn!(
                        previous = available,
                        available = now,
                        "Balance dropped again, re-clipping"
                    );
                    available = now;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(0)
    }

    /// Amount an earlier debit applied under `settlement_id`.
    async fn applied_amount(
        &self,
        account_id: AccountId,
        settlement_id: &SettlementId,
    ) -> Result<u64, LedgerError> {
        let history = self.ledger.history(account_id).await?;
        Ok(history
            .iter()
            .filter(|e| e.cause == LedgerCause::Purchase && e.key == settlement_id.as_str())
            .map(|e| e.amount.unsigned_abs())
            .sum())
    }
}
