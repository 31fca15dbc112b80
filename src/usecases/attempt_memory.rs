//! Cross-poll attempt memory.
//!
//! Remembers (account, gift) pairs that were dispatched, delivered or not,
//! so the next polls within the window do not plan them again.
//! Disabled unless `engine.attempt_memory_seconds` is set.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::gift::{AccountId, CatalogItem, GiftId};
use crate::domain::plan::{AcquisitionResult, DeliveryStatus};

pub struct AttemptMemory {
    window: Duration,
    seen: HashMap<(AccountId, GiftId), Instant>,
}

impl AttemptMemory {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
        }
    }

    /// Drop items this account attempted within the window.
    pub fn retain_unattempted(&mut self, account_id: AccountId, items: &mut Vec<CatalogItem>) {
        let now = Instant::now();
        let window = self.window;
        self.seen.retain(|_, at| now.duration_since(*at) < window);
        items.retain(|item| !self.seen.contains_key(&(account_id, item.id.clone())));
    }

    /// Remember every gift that was attempted in `result`.
    pub fn record(&mut self, account_id: AccountId, result: &AcquisitionResult) {
        let now = Instant::now();
        for r in result.records.iter().filter(|r| r.status != DeliveryStatus::NotAttempted) {
            self.seen.insert((account_id, r.gift_id.clone()), now);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::DeliveryRecord;

    fn failed(id: &str) -> AcquisitionResult {
        AcquisitionResult {
            records: vec![DeliveryRecord {
                gift_id: id.into(),
                price: 10,
                status: DeliveryStatus::Failed,
                attempts: 60,
            }],
            failure: Some("exhausted".into()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_attempted_items_stay_eligible() {
        let mut memory = AttemptMemory::new(Duration::from_secs(30));
        let result = AcquisitionResult {
            records: vec![
                DeliveryRecord {
                    gift_id: "a".into(),
                    price: 10,
                    status: DeliveryStatus::Delivered,
                    attempts: 1,
                },
                DeliveryRecord {
                    gift_id: "b".into(),
                    price: 10,
                    status: DeliveryStatus::NotAttempted,
                    attempts: 0,
                },
            ],
            failure: None,
        };
        memory.record(1, &result);
        assert_eq!(memory.len(), 1);

        let mut items = vec![
            CatalogItem::limited("a", 10, 5, 5),
            CatalogItem::limited("b", 10, 5, 5),
        ];
        memory.retain_unattempted(1, &mut items);
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_gift_skipped_within_window() {
        let mut memory = AttemptMemory::new(Duration::from_secs(30));
        memory.record(1, &failed("a"));

        let mut items = vec![
            CatalogItem::limited("a", 10, 5, 5),
            CatalogItem::limited("b", 10, 5, 5),
        ];
        memory.retain_unattempted(1, &mut items);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");

        // Other accounts are unaffected.
        let mut other = vec![CatalogItem::limited("a", 10, 5, 5)];
        memory.retain_unattempted(2, &mut other);
        assert_eq!(other.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let mut memory = AttemptMemory::new(Duration::from_secs(30));
        memory.record(1, &failed("a"));
        tokio::time::advance(Duration::from_secs(31)).await;

        let mut items = vec![CatalogItem::limited("a", 10, 5, 5)];
        memory.retain_unattempted(1, &mut items);
        assert_eq!(items.len(), 1);
        assert!(memory.is_empty());
    }
}
