//! Acquisition Port - Gift Delivery Interface
//!
//! Buys one gift and delivers it to an account. Failures are classified so
//! the dispatcher retries only what can succeed on a later attempt.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::gift::AccountId;

/// Delivery failures surfaced by the acquisition API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Network error, rate limit, or server error. Worth retrying.
    #[error("retryable delivery error: {0}")]
    Retryable(String),
    /// The API refused the purchase (sold out, unknown gift, ...).
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

impl DeliveryError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// Trait for gift acquisition providers.
#[async_trait]
pub trait AcquisitionApi: Send + Sync + 'static {
    /// Purchase `gift_id` and deliver it to `account_id`.
    ///
    /// `Ok(())` means delivery is confirmed and the gift may be billed.
    async fn deliver(&self, gift_id: &str, account_id: AccountId) -> Result<(), DeliveryError>;
}
