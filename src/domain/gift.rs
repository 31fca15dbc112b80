//! Catalog domain types.
//!
//! A `CatalogItem` is an immutable snapshot of one purchasable gift as
//! observed in a single poll. Supply fields only change between polls.

use serde::{Deserialize, Serialize};

/// Gift identifier as issued by the catalog provider.
pub type GiftId = String;

/// Account (Telegram user) identifier.
pub type AccountId = i64;

/// One purchasable gift in the current catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Provider-assigned gift ID.
    pub id: GiftId,
    /// Unit price in stars.
    pub price: u64,
    /// Total supply (`None` = unlimited).
    pub total_supply: Option<u64>,
    /// Remaining supply (`None` = unlimited).
    pub remaining_supply: Option<u64>,
}

impl CatalogItem {
    /// Build an item with bounded supply.
    pub fn limited(id: impl Into<GiftId>, price: u64, total: u64, remaining: u64) -> Self {
        Self {
            id: id.into(),
            price,
            total_supply: Some(total),
            remaining_supply: Some(remaining),
        }
    }

    /// Build an item with unlimited supply.
    pub fn unlimited(id: impl Into<GiftId>, price: u64) -> Self {
        Self {
            id: id.into(),
            price,
            total_supply: None,
            remaining_supply: None,
        }
    }

    /// Whether the item has a bounded, non-zero total supply.
    pub fn is_limited(&self) -> bool {
        matches!(self.total_supply, Some(total) if total > 0)
    }
}

/// Keep only the items worth distributing: bounded total supply > 0.
///
/// Order-preserving.
pub fn limited_items(catalog: &[CatalogItem]) -> Vec<CatalogItem> {
    catalog.iter().filter(|g| g.is_limited()).cloned().collect()
}
