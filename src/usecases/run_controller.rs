//! Run Controller - Poll Loop and Distribution Lifecycle
//!
//! Owns the engine state machine:
//!
//! ```text
//! Idle -> Polling -> Distributing -> (cool-down) -> Idle
//!            \-> Idle (fetch error or nothing limited)
//! any  -> Stopped (after stop(), once the in-flight pass completes)
//! ```
//!
//! A distribution pass holds the single-flight guard for its whole
//! duration; a tick that finds the guard taken returns `Busy` without
//! touching the catalog. Stop is cooperative: it is observed at the top of
//! every tick and between accounts, never in the middle of a delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::config::EngineConfig;
use crate::domain::gift::{limited_items, AccountId, CatalogItem};
use crate::domain::preferences::{AccountPreferences, PreferenceLimits, PreferenceUpdate};
use crate::ports::acquisition::AcquisitionApi;
use crate::ports::catalog::CatalogProvider;
use crate::ports::ledger::LedgerStore;
use crate::ports::notifier::Notifier;
use crate::ports::settings::{SettingsError, SettingsStore};

use super::distributor::{AccountOutcome, Distributor};

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Polling,
    Distributing,
    Stopped,
}

/// Summary of one distribution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Enabled accounts visited.
    pub accounts: usize,
    /// Accounts with a nonzero settlement.
    pub settled_accounts: usize,
    /// Stars debited across all accounts.
    pub total_settled: u64,
    /// Accounts aborted by a store failure.
    pub failed_accounts: usize,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stop was requested; nothing fetched.
    Stopped,
    /// Another pass holds the single-flight guard.
    Busy,
    /// Catalog fetch failed; the next tick retries.
    FetchFailed,
    /// No item with a bounded, positive total supply.
    NothingLimited,
    /// A distribution pass ran to completion.
    Distributed(PassReport),
}

/// Poll loop driving catalog fetches and distribution passes.
pub struct RunController<C, S, A, L, N>
where
    C: CatalogProvider,
    S: SettingsStore,
    A: AcquisitionApi,
    L: LedgerStore,
    N: Notifier,
{
    catalog: Arc<C>,
    settings: Arc<S>,
    distributor: Distributor<A, L, N>,
    limits: PreferenceLimits,
    poll_interval: Duration,
    cooldown: Duration,
    /// Single-flight guard for distribution passes.
    guard: Mutex<()>,
    state_tx: watch::Sender<EngineState>,
    stop_tx: watch::Sender<bool>,
    metrics: Arc<MetricsRegistry>,
}

impl<C, S, A, L, N> RunController<C, S, A, L, N>
where
    C: CatalogProvider,
    S: SettingsStore,
    A: AcquisitionApi,
    L: LedgerStore,
    N: Notifier,
{
    /// Create a controller in the `Idle` state.
    pub fn new(
        catalog: Arc<C>,
        settings: Arc<S>,
        distributor: Distributor<A, L, N>,
        engine: &EngineConfig,
        limits: PreferenceLimits,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let (state_tx, _) = watch::channel(EngineState::Idle);
        let (stop_tx, _) = watch::channel(false);

        Self {
            catalog,
            settings,
            distributor,
            limits,
            poll_interval: engine.poll_interval(),
            cooldown: engine.cooldown(),
            guard: Mutex::new(()),
            state_tx,
            stop_tx,
            metrics,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle transitions (health endpoint).
    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.state_tx.subscribe()
    }

    /// Request a cooperative stop.
    pub fn stop(&self) {
        info!("Stop requested");
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Spawn the poll loop on the runtime.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run the poll loop until `stop()` is called.
    #[instrument(skip(self), name = "poll_loop")]
    pub async fn run(&self) {
        let poll_interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX);
        info!(
            poll_interval_ms,
            cooldown_s = self.cooldown.as_secs(),
            "Starting auto-purchase engine"
        );

        loop {
            match self.tick().await {
                TickOutcome::Stopped => break,
                TickOutcome::Distributed(report) if report.total_settled > 0 => {
                    info!(
                        cooldown_s = self.cooldown.as_secs(),
                        settled = report.total_settled,
                        "Pass settled gifts, cooling down"
                    );
                    self.pause(self.cooldown).await;
                }
                _ => self.pause(self.poll_interval).await,
            }
        }

        self.state_tx.send_replace(EngineState::Stopped);
        info!("Auto-purchase engine stopped");
    }

    /// Fetch the catalog once and distribute if it lists limited gifts.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> TickOutcome {
        if self.is_stopped() {
            self.state_tx.send_replace(EngineState::Stopped);
            return TickOutcome::Stopped;
        }

        let Ok(_guard) = self.guard.try_lock() else {
            debug!("Distribution in progress, skipping tick");
            return TickOutcome::Busy;
        };

        self.set_state(EngineState::Polling);
        let catalog = match self.catalog.list_catalog().await {
            Ok(catalog) => {
                self.metrics.catalog_polls.with_label_values(&["ok"]).inc();
                catalog
            }
            Err(e) => {
                warn!(error = %e, "Catalog fetch failed");
                self.metrics.catalog_polls.with_label_values(&["error"]).inc();
                self.set_state(EngineState::Idle);
                return TickOutcome::FetchFailed;
            }
        };

        let limited = limited_items(&catalog);
        if limited.is_empty() {
            self.set_state(EngineState::Idle);
            return TickOutcome::NothingLimited;
        }

        info!(
            count = limited.len(),
            gifts = ?limited.iter().map(|g| g.id.as_str()).collect::<Vec<_>>(),
            "Limited gifts found"
        );

        self.set_state(EngineState::Distributing);
        self.metrics.distributing.set(1);
        let report = self.distribute(&limited).await;
        self.metrics.distributing.set(0);
        self.set_state(EngineState::Idle);

        TickOutcome::Distributed(report)
    }

    /// Run every enabled account through the pipeline, one at a time.
    #[instrument(skip(self, catalog), fields(run_id = tracing::field::Empty))]
    async fn distribute(&self, catalog: &[CatalogItem]) -> PassReport {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        self.metrics.distribution_passes.inc();

        let mut report = PassReport::default();
        let accounts = match self.settings.enabled_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!(error = %e, "Failed to load enabled accounts");
                self.metrics.account_errors.inc();
                return report;
            }
        };

        if accounts.is_empty() {
            info!("No enabled accounts for auto-purchase");
            return report;
        }

        for prefs in &accounts {
            if self.is_stopped() {
                info!(remaining = accounts.len() - report.accounts, "Stop requested, ending pass");
                break;
            }
            report.accounts += 1;

            match self.distributor.process_account(run_id, prefs, catalog).await {
                Ok(outcome) => {
                    let amount = outcome.settled_amount();
                    if amount > 0 {
                        report.settled_accounts += 1;
                        report.total_settled += amount;
                    }
                    if let AccountOutcome::Settled { failure: Some(reason), .. } = &outcome {
                        warn!(
                            account_id = prefs.account_id,
                            reason = %reason,
                            "Partial delivery settled"
                        );
                    }
                }
                Err(e) => {
                    error!(account_id = prefs.account_id, error = %e, "Account pass aborted");
                    self.metrics.account_errors.inc();
                    report.failed_accounts += 1;
                }
            }
        }

        info!(
            accounts = report.accounts,
            settled_accounts = report.settled_accounts,
            total_settled = report.total_settled,
            failed_accounts = report.failed_accounts,
            "Distribution pass complete"
        );
        report
    }

    /// Validate and store a preference update from the front-end.
    ///
    /// # Errors
    /// `SettingsError::Validation` leaves the stored preferences unchanged.
    #[instrument(skip(self, update))]
    pub async fn run_preference_update(
        &self,
        account_id: AccountId,
        update: &PreferenceUpdate,
    ) -> Result<AccountPreferences, SettingsError> {
        let current = self.settings.get_preferences(account_id).await?;
        current.apply(update, &self.limits)?;
        let stored = self.settings.update_preferences(account_id, update).await?;
        info!(
            enabled = stored.enabled,
            min_price = stored.min_price,
            max_price = stored.max_price,
            supply_limit = stored.supply_limit,
            cycles = stored.cycles,
            "Preferences updated"
        );
        Ok(stored)
    }

    /// Transition unless already stopped.
    fn set_state(&self, next: EngineState) {
        self.state_tx.send_if_modified(|state| {
            if *state == EngineState::Stopped || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Sleep, waking early on stop.
    async fn pause(&self, duration: Duration) {
        let mut stop_rx = self.stop_tx.subscribe();
        tokio::select! {
            () = tokio::time::sleep(duration) => {}
            _ = stop_rx.wait_for(|stopped| *stopped) => {}
        }
    }
}
