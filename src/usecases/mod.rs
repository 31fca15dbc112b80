//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bot's core workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `RunController`: Poll loop, single-flight guard, start/stop
//! - `Distributor`: Per-account eligibility -> allocation -> dispatch -> settlement
//! - `Dispatcher`: Sequential delivery with bounded retry
//! - `Settlement`: Ledger debit for confirmed deliveries
//! - `AttemptMemory`: Optional cross-poll suppression of repeat attempts

pub mod attempt_memory;
pub mod dispatcher;
pub mod distributor;
pub mod run_controller;
pub mod settlement;

pub use attempt_memory::AttemptMemory;
pub use dispatcher::Dispatcher;
pub use distributor::{AccountOutcome, Distributor};
pub use run_controller::{EngineState, PassReport, RunController, TickOutcome};
pub use settlement::{Settlement, SettlementOutcome};
