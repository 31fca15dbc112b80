//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to verify that eligibility, allocation, and settlement
//! keep their invariants across random catalogs, balances, and outcomes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;

use gift_autobuy_bot::adapters::metrics::MetricsRegistry;
use gift_autobuy_bot::domain::allocator::allocate;
use gift_autobuy_bot::domain::eligibility::{eligible, is_eligible};
use gift_autobuy_bot::domain::gift::{AccountId, CatalogItem};
use gift_autobuy_bot::domain::ledger::{LedgerCause, LedgerEntry, SettlementId};
use gift_autobuy_bot::domain::plan::{AcquisitionResult, DeliveryRecord, DeliveryStatus};
use gift_autobuy_bot::domain::preferences::AccountPreferences;
use gift_autobuy_bot::ports::ledger::{LedgerError, LedgerStore};
use gift_autobuy_bot::usecases::Settlement;

// ── Strategies ──────────────────────────────────────────────

fn item() -> impl Strategy<Value = CatalogItem> {
    (
        "[a-z]{1,6}",
        1u64..500,
        prop::option::of(1u64..10_000),
    )
        .prop_map(|(id, price, total)| CatalogItem {
            id,
            price,
            total_supply: total,
            remaining_supply: total.map(|t| t / 2),
        })
}

fn prefs() -> impl Strategy<Value = AccountPreferences> {
    (0u64..600, 0u64..600, 0u64..12_000, 1u32..=10).prop_map(|(min, max, supply, cycles)| {
        AccountPreferences {
            enabled: true,
            min_price: min,
            max_price: max,
            supply_limit: supply,
            cycles,
            ..AccountPreferences::defaults(1)
        }
    })
}

// ── Eligibility Properties ──────────────────────────────────

proptest! {
    /// Price bounds exclude exactly what they say; zero bounds never exclude on price.
    #[test]
    fn eligibility_respects_price_bounds(item in item(), prefs in prefs()) {
        let ok = is_eligible(&item, &prefs);
        if prefs.min_price > 0 && item.price < prefs.min_price {
            prop_assert!(!ok);
        }
        if prefs.max_price > 0 && item.price > prefs.max_price {
            prop_assert!(!ok);
        }

        let unbounded = AccountPreferences { min_price: 0, max_price: 0, supply_limit: 0, ..prefs };
        prop_assert!(is_eligible(&item, &unbounded));
    }

    /// Unlimited-supply items never match a nonzero supply limit.
    #[test]
    fn unlimited_never_eligible_under_supply_limit(
        price in 1u64..500,
        supply_limit in 1u64..10_000,
    ) {
        let item = CatalogItem::unlimited("u", price);
        let prefs = AccountPreferences { supply_limit, ..AccountPreferences::defaults(1) };
        prop_assert!(!is_eligible(&item, &prefs));
    }

    /// Filtering preserves the input order.
    #[test]
    fn eligibility_is_order_preserving(items in prop::collection::vec(item(), 0..20), prefs in prefs()) {
        let kept = eligible(&items, &prefs);
        let mut cursor = items.iter();
        for k in &kept {
            prop_assert!(cursor.any(|i| i == k));
        }
    }
}

// ── Allocator Properties ────────────────────────────────────

proptest! {
    /// Spend never decreases as the balance grows.
    #[test]
    fn allocation_monotonic_in_balance(
        items in prop::collection::vec(item(), 1..10),
        b1 in 0u64..5_000,
        extra in 0u64..5_000,
        cycles in 1u32..=10,
    ) {
        let low = allocate(&items, b1, cycles);
        let high = allocate(&items, b1 + extra, cycles);
        prop_assert!(low.total_cost <= high.total_cost);
    }

    /// Every plan prefix stays within the balance, and the total matches the entries.
    #[test]
    fn allocation_prefix_within_balance(
        items in prop::collection::vec(item(), 0..10),
        balance in 0u64..5_000,
        cycles in 1u32..=10,
    ) {
        let plan = allocate(&items, balance, cycles);
        let mut running = 0u64;
        for entry in &plan.items {
            running += entry.price;
            prop_assert!(running <= balance, "prefix {running} exceeds balance {balance}");
        }
        prop_assert_eq!(running, plan.total_cost);
        prop_assert!(plan.cycles_used <= cycles);
    }
}

// ── Settlement Properties ───────────────────────────────────

/// Minimal in-memory ledger: checked debits, idempotent keys.
#[derive(Default)]
struct MemoryLedger {
    balances: Mutex<HashMap<AccountId, u64>>,
    keys: Mutex<HashSet<String>>,
    entries: Mutex<Vec<LedgerEntry>>,
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get_balance(&self, account_id: AccountId) -> Result<u64, LedgerError> {
        Ok(*self.balances.lock().unwrap().get(&account_id).unwrap_or(&0))
    }

    async fn debit(
        &self,
        account_id: AccountId,
        amount: u64,
        settlement_id: &SettlementId,
    ) -> Result<u64, LedgerError> {
        let mut keys = self.keys.lock().unwrap();
        if keys.contains(settlement_id.as_str()) {
            return Err(LedgerError::DuplicateSettlement { key: settlement_id.to_string() });
        }
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(account_id).or_default();
        if amount > *balance {
            return Err(LedgerError::InsufficientFunds {
                account_id,
                available: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        keys.insert(settlement_id.to_string());
        self.entries.lock().unwrap().push(LedgerEntry {
            account_id,
            amount: -(amount as i64),
            cause: LedgerCause::Purchase,
            key: settlement_id.to_string(),
            balance_after: *balance,
            recorded_at: Utc::now(),
        });
        Ok(*balance)
    }

    async fn credit(
        &self,
        account_id: AccountId,
        amount: u64,
        _: &str,
    ) -> Result<u64, LedgerError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(account_id).or_default();
        *balance += amount;
        Ok(*balance)
    }

    async fn refund(&self, _: AccountId, charge_id: &str) -> Result<u64, LedgerError> {
        Err(LedgerError::UnknownCharge { charge_id: charge_id.to_string() })
    }

    async fn history(&self, account_id: AccountId) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn total_balance(&self) -> Result<u64, LedgerError> {
        Ok(self.balances.lock().unwrap().values().sum())
    }
}

fn status() -> impl Strategy<Value = DeliveryStatus> {
    prop_oneof![
        Just(DeliveryStatus::Delivered),
        Just(DeliveryStatus::Failed),
        Just(DeliveryStatus::NotAttempted),
    ]
}

proptest! {
    /// Settlement debits at most the delivered total and at most the pre-run
    /// balance, even when the balance drifts down before settlement.
    #[test]
    fn settlement_bounded_by_delivered_and_balance(
        items in prop::collection::vec(item(), 1..8),
        balance in 0u64..3_000,
        cycles in 1u32..=4,
        statuses in prop::collection::vec(status(), 32),
        drift in 0u64..3_000,
    ) {
        let plan = allocate(&items, balance, cycles);
        let result = AcquisitionResult {
            records: plan
                .items
                .iter()
                .zip(statuses.iter().cycle())
                .map(|(p, s)| DeliveryRecord {
                    gift_id: p.gift_id.clone(),
                    price: p.price,
                    status: *s,
                    attempts: 1,
                })
                .collect(),
            failure: None,
        };

        let ledger = Arc::new(MemoryLedger::default());
        let settlement = Settlement::new(
            Arc::clone(&ledger),
            Arc::new(MetricsRegistry::new().unwrap()),
        );
        let id = SettlementId::from_raw("purchase:prop:1");

        let (outcome, after, again, after_again) = tokio_test::block_on(async {
            ledger.credit(1, balance.saturating_sub(drift), "ch").await.unwrap();
            let outcome = settlement.settle(1, &result, &id).await.unwrap();
            let after = ledger.get_balance(1).await.unwrap();
            let again = settlement.settle(1, &result, &id).await.unwrap();
            let after_again = ledger.get_balance(1).await.unwrap();
            (outcome, after, again, after_again)
        });

        prop_assert!(outcome.debited <= result.delivered_total());
        prop_assert!(outcome.debited <= balance);
        prop_assert_eq!(after, balance.saturating_sub(drift) - outcome.debited);

        // Same settlement ID: exactly one debit.
        prop_assert_eq!(after_again, after);
        prop_assert_eq!(again.debited, outcome.debited);
    }
}
