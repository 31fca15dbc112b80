//! Settings Store - Atomic JSON Preference Snapshot
//!
//! Keeps every account's preferences in memory and saves the whole set to
//! `settings.json` after each change, using atomic writes (write to tmp
//! file, then rename). A failed save rolls the in-memory change back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::gift::AccountId;
use crate::domain::preferences::{AccountPreferences, PreferenceLimits, PreferenceUpdate};
use crate::ports::settings::{SettingsError, SettingsStore};

/// Atomic JSON settings store.
pub struct JsonSettingsStore {
    /// Path to settings.json.
    snapshot_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
    /// Bounds applied to every update.
    limits: PreferenceLimits,
    /// Ordered by account ID so scans are stable.
    accounts: Mutex<BTreeMap<AccountId, AccountPreferences>>,
}

impl JsonSettingsStore {
    /// Open the store in `data_dir`, loading the last snapshot if present.
    pub async fn open(data_dir: &str, limits: PreferenceLimits) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        let snapshot_path = dir.join("settings.json");
        let mut accounts = BTreeMap::new();

        if snapshot_path.exists() {
            let json = fs::read_to_string(&snapshot_path)
                .await
                .context("Failed to read settings snapshot")?;
            let list: Vec<AccountPreferences> =
                serde_json::from_str(&json).context("Failed to parse settings JSON")?;
            accounts.extend(list.into_iter().map(|p| (p.account_id, p)));
        } else {
            info!("No settings snapshot found, starting fresh");
        }

        info!(accounts = accounts.len(), "Settings snapshot loaded");

        Ok(Self {
            snapshot_path,
            tmp_path: dir.join("settings.json.tmp"),
            limits,
            accounts: Mutex::new(accounts),
        })
    }

    /// Save all preferences atomically (tmp → rename).
    async fn save(
        &self,
        accounts: &BTreeMap<AccountId, AccountPreferences>,
    ) -> Result<(), SettingsError> {
        let list: Vec<&AccountPreferences> = accounts.values().collect();
        let json = serde_json::to_string_pretty(&list).map_err(storage)?;

        fs::write(&self.tmp_path, &json).await.map_err(storage)?;
        fs::rename(&self.tmp_path, &self.snapshot_path)
            .await
            .map_err(storage)?;

        debug!(accounts = list.len(), "Settings snapshot saved");
        Ok(())
    }

    /// Store `prefs`, restoring the previous value if the save fails.
    async fn put(
        &self,
        accounts: &mut BTreeMap<AccountId, AccountPreferences>,
        prefs: AccountPreferences,
    ) -> Result<(), SettingsError> {
        let previous = accounts.insert(prefs.account_id, prefs.clone());
        if let Err(e) = self.save(accounts).await {
            match previous {
                Some(old) => accounts.insert(prefs.account_id, old),
                None => accounts.remove(&prefs.account_id),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn storage(e: impl std::fmt::Display) -> SettingsError {
    SettingsError::Storage(e.to_string())
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    #[instrument(skip(self))]
    async fn get_preferences(
        &self,
        account_id: AccountId,
    ) -> Result<AccountPreferences, SettingsError> {
        let mut accounts = self.accounts.lock().await;
        if let Some(prefs) = accounts.get(&account_id) {
            return Ok(prefs.clone());
        }

        let prefs = AccountPreferences::defaults(account_id);
        self.put(&mut accounts, prefs.clone()).await?;
        info!("Created default preferences");
        Ok(prefs)
    }

    #[instrument(skip(self, update))]
    async fn update_preferences(
        &self,
        account_id: AccountId,
        update: &PreferenceUpdate,
    ) -> Result<AccountPreferences, SettingsError> {
        let mut accounts = self.accounts.lock().await;
        let current = accounts
            .get(&account_id)
            .cloned()
            .unwrap_or_else(|| AccountPreferences::defaults(account_id));

        let next = current.apply(update, &self.limits)?;
        self.put(&mut accounts, next.clone()).await?;
        Ok(next)
    }

    async fn enabled_accounts(&self) -> Result<Vec<AccountPreferences>, SettingsError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.values().filter(|p| p.enabled).cloned().collect())
    }
}
