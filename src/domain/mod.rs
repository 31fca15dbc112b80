//! Domain layer - Core business logic and models.
//!
//! Pure auto-purchase logic: catalog snapshots, account preferences,
//! eligibility filtering, cycle allocation, and ledger entry types.
//! No I/O here (hexagonal architecture inner ring); every function is
//! deterministic and testable in isolation.

pub mod allocator;
pub mod eligibility;
pub mod error;
pub mod gift;
pub mod ledger;
pub mod plan;
pub mod preferences;

// Re-export core types for convenience
pub use allocator::allocate;
pub use eligibility::eligible;
pub use error::ValidationError;
pub use gift::{limited_items, AccountId, CatalogItem, GiftId};
pub use ledger::{LedgerCause, LedgerEntry, SettlementId};
pub use plan::{AcquisitionPlan, AcquisitionResult, DeliveryRecord, DeliveryStatus, PlannedItem};
pub use preferences::{AccountPreferences, PreferenceLimits, PreferenceUpdate};
