//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `CatalogProvider`: Current gift catalog snapshot
//! - `AcquisitionApi`: Gift purchase + delivery
//! - `LedgerStore`: Star balances and settlement history
//! - `SettingsStore`: Per-account auto-purchase preferences
//! - `Notifier`: Best-effort account messaging

pub mod acquisition;
pub mod catalog;
pub mod ledger;
pub mod notifier;
pub mod settings;

pub use acquisition::{AcquisitionApi, DeliveryError};
pub use catalog::{CatalogError, CatalogProvider};
pub use ledger::{LedgerError, LedgerStore};
pub use notifier::{Notifier, NotifyError};
pub use settings::{SettingsError, SettingsStore};
