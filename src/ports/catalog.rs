//! Catalog Port - Current Gift Catalog Interface
//!
//! Supplies the list of purchasable gifts on demand. A fetch failure is
//! transient: callers do not retry inline, they simply poll again on the
//! next tick.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::gift::CatalogItem;

/// Catalog fetch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Provider unreachable, rate-limited, or returned a server error.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    /// Provider answered with something we could not interpret.
    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

/// Trait for catalog providers.
///
/// Implementors return an immutable snapshot; iteration order must be
/// stable for the duration of one poll pass.
#[async_trait]
pub trait CatalogProvider: Send + Sync + 'static {
    /// Fetch the current catalog snapshot.
    async fn list_catalog(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}
