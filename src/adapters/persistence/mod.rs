//! Persistence Adapters - JSON File Storage
//!
//! Implements the ledger and settings ports using an append-only JSONL
//! journal for balance adjustments and an atomic JSON snapshot for
//! preferences. No database dependency; lightweight and crash-recoverable.

pub mod ledger;
pub mod settings;

pub use ledger::JsonlLedger;
pub use settings::JsonSettingsStore;
