//! Settings Port - Auto-purchase Preferences Interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::ValidationError;
use crate::domain::gift::AccountId;
use crate::domain::preferences::{AccountPreferences, PreferenceUpdate};

/// Settings store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// Update rejected; stored preferences are unchanged.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Backing store unavailable.
    #[error("settings storage error: {0}")]
    Storage(String),
}

/// Trait for preference stores.
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Preferences for an account, creating safe defaults on first access.
    async fn get_preferences(
        &self,
        account_id: AccountId,
    ) -> Result<AccountPreferences, SettingsError>;

    /// Validate and apply a partial update. Returns the stored result.
    async fn update_preferences(
        &self,
        account_id: AccountId,
        update: &PreferenceUpdate,
    ) -> Result<AccountPreferences, SettingsError>;

    /// Preferences of every enabled account, in a stable order.
    async fn enabled_accounts(&self) -> Result<Vec<AccountPreferences>, SettingsError>;
}
