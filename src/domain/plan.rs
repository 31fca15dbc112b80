//! Acquisition plans and dispatch results.
//!
//! A plan is transient: produced by the allocator and consumed by the
//! dispatcher within one allocation pass. The result records, per planned
//! entry, whether delivery was confirmed; only confirmed entries are billed.

use serde::{Deserialize, Serialize};

use super::gift::GiftId;

/// One planned purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedItem {
    pub gift_id: GiftId,
    pub price: u64,
}

/// Ordered purchase commitment for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionPlan {
    /// Entries in dispatch order, all cycles concatenated.
    pub items: Vec<PlannedItem>,
    /// Sum of entry prices.
    pub total_cost: u64,
    /// Number of cycles that produced at least one entry.
    pub cycles_used: u32,
}

impl AcquisitionPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Per-entry delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Confirmed delivered by the acquisition API.
    Delivered,
    /// Attempted and failed (retries exhausted or rejected).
    Failed,
    /// Skipped because an earlier entry failed.
    NotAttempted,
}

/// Delivery outcome for one planned entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub gift_id: GiftId,
    pub price: u64,
    pub status: DeliveryStatus,
    /// Attempts made (0 when not attempted).
    pub attempts: u32,
}

/// Result of dispatching a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionResult {
    /// One record per planned entry, in plan order.
    pub records: Vec<DeliveryRecord>,
    /// Cause of the halting failure, if dispatch halted early.
    pub failure: Option<String>,
}

impl AcquisitionResult {
    /// Sum of prices of confirmed deliveries.
    pub fn delivered_total(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| r.status == DeliveryStatus::Delivered)
            .map(|r| r.price)
            .sum()
    }

    pub fn delivered_count(&self) -> usize {
        self.count(DeliveryStatus::Delivered)
    }

    pub fn count(&self, status: DeliveryStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Whether dispatch halted before finishing the plan.
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }
}
