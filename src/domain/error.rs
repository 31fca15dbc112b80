//! Domain validation errors.
//!
//! Raised synchronously by preference updates. A validation error never
//! mutates state; the message is suitable for user-facing replies.

use thiserror::Error;

/// Rejection reasons for an auto-purchase preference update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A price or limit field was negative.
    #[error("{field} cannot be negative (got {value})")]
    Negative {
        /// Field name.
        field: &'static str,
        /// Submitted value.
        value: i64,
    },

    /// A price exceeded the sanity ceiling.
    #[error("{field} too high: {value} exceeds {max}")]
    PriceTooHigh {
        /// Field name.
        field: &'static str,
        /// Submitted value.
        value: i64,
        /// Configured ceiling.
        max: u64,
    },

    /// Both bounds set and min above max.
    #[error("min price {min} cannot be greater than max price {max}")]
    MinAboveMax {
        /// Resulting minimum price.
        min: u64,
        /// Resulting maximum price.
        max: u64,
    },

    /// Cycle count outside `[1, max]`.
    #[error("purchase cycles must be between 1 and {max} (got {value})")]
    CyclesOutOfRange {
        /// Submitted value.
        value: i64,
        /// Configured ceiling.
        max: u32,
    },
}
