//! Gift Catalog and Delivery Adapter
//!
//! Implements `CatalogProvider` over `getAvailableGifts` and
//! `AcquisitionApi` over `sendGift`. In dry-run mode deliveries are logged
//! and reported as confirmed without calling the API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::gift::{AccountId, CatalogItem};
use crate::ports::acquisition::{AcquisitionApi, DeliveryError};
use crate::ports::catalog::{CatalogError, CatalogProvider};

use super::client::{ApiCallError, BotApiClient};
use super::types::{Gifts, NoParams, SendGiftRequest};

/// Telegram gift catalog + delivery.
pub struct TelegramGifts {
    client: Arc<BotApiClient>,
    dry_run: bool,
    /// Optional message attached to every sent gift.
    gift_text: Option<String>,
}

impl TelegramGifts {
    pub fn new(client: Arc<BotApiClient>, dry_run: bool, gift_text: Option<String>) -> Self {
        Self {
            client,
            dry_run,
            gift_text,
        }
    }
}

#[async_trait]
impl CatalogProvider for TelegramGifts {
    #[instrument(skip(self))]
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let gifts: Gifts = self
            .client
            .call("getAvailableGifts", &NoParams {})
            .await
            .map_err(catalog_error)?;

        Ok(gifts.gifts.into_iter().map(CatalogItem::from).collect())
    }
}

#[async_trait]
impl AcquisitionApi for TelegramGifts {
    #[instrument(skip(self))]
    async fn deliver(&self, gift_id: &str, account_id: AccountId) -> Result<(), DeliveryError> {
        if self.dry_run {
            info!(gift_id, account_id, "DRY RUN: would send gift");
            return Ok(());
        }

        let request = SendGiftRequest {
            user_id: account_id,
            gift_id,
            text: self.gift_text.as_deref(),
        };
        let sent: bool = self
            .client
            .call("sendGift", &request)
            .await
            .map_err(delivery_error)?;

        if sent {
            Ok(())
        } else {
            Err(DeliveryError::Rejected("sendGift returned false".to_string()))
        }
    }
}

fn catalog_error(e: ApiCallError) -> CatalogError {
    match e {
        ApiCallError::Decode(msg) => CatalogError::Malformed(msg),
        other => CatalogError::Unavailable(other.to_string()),
    }
}

fn delivery_error(e: ApiCallError) -> DeliveryError {
    if e.is_retryable() {
        DeliveryError::Retryable(e.to_string())
    } else {
        DeliveryError::Rejected(e.to_string())
    }
}
