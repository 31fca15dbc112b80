//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, file I/O). Each sub-module groups
//! adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Telegram Bot API client (catalog, delivery, notifications)
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSONL ledger journal and settings snapshot

pub mod api;
pub mod metrics;
pub mod persistence;
