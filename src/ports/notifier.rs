//! Notifier Port - Best-effort Account Messaging
//!
//! Callers log and swallow failures; a notification is never retried
//! beyond the single `notify` call.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::gift::AccountId;

/// Notification delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Trait for account notification channels.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Send a plain-text message to an account.
    async fn notify(&self, account_id: AccountId, message: &str) -> Result<(), NotifyError>;
}
