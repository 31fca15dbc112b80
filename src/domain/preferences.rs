//! Auto-purchase preferences and their validation rules.
//!
//! For every bound, `0` is the "no bound" sentinel. Updates are partial:
//! only the fields present in a `PreferenceUpdate` change, and the merged
//! result is validated as a whole before anything is stored.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::gift::AccountId;

/// Default upper sanity limit for min/max price.
pub const DEFAULT_MAX_PRICE: u64 = 1_000_000;

/// Default upper limit for the cycle count.
pub const DEFAULT_MAX_CYCLES: u32 = 100;

/// Per-account auto-purchase preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPreferences {
    /// Owning account.
    pub account_id: AccountId,
    /// Whether auto-purchase runs for this account.
    pub enabled: bool,
    /// Minimum unit price (0 = no floor).
    pub min_price: u64,
    /// Maximum unit price (0 = no ceiling).
    pub max_price: u64,
    /// Maximum total supply of a qualifying item (0 = no ceiling).
    pub supply_limit: u64,
    /// Number of purchase rounds per distribution pass.
    pub cycles: u32,
}

impl AccountPreferences {
    /// Safe defaults for a newly observed account: disabled, unbounded, one cycle.
    pub fn defaults(account_id: AccountId) -> Self {
        Self {
            account_id,
            enabled: false,
            min_price: 0,
            max_price: 0,
            supply_limit: 0,
            cycles: 1,
        }
    }

    /// Merge a partial update into these preferences and validate the result.
    ///
    /// # Errors
    /// Returns the first violated rule; `self` is never modified.
    pub fn apply(
        &self,
        update: &PreferenceUpdate,
        limits: &PreferenceLimits,
    ) -> Result<Self, ValidationError> {
        let mut next = self.clone();

        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }
        if let Some(min) = update.min_price {
            next.min_price = check_price("min price", min, limits.max_price)?;
        }
        if let Some(max) = update.max_price {
            next.max_price = check_price("max price", max, limits.max_price)?;
        }
        if let Some(supply) = update.supply_limit {
            next.supply_limit = u64::try_from(supply).map_err(|_| ValidationError::Negative {
                field: "supply limit",
                value: supply,
            })?;
        }
        if let Some(cycles) = update.cycles {
            next.cycles = u32::try_from(cycles)
                .ok()
                .filter(|c| (1..=limits.max_cycles).contains(c))
                .ok_or(ValidationError::CyclesOutOfRange {
                    value: cycles,
                    max: limits.max_cycles,
                })?;
        }

        if next.min_price != 0 && next.max_price != 0 && next.min_price > next.max_price {
            return Err(ValidationError::MinAboveMax {
                min: next.min_price,
                max: next.max_price,
            });
        }

        Ok(next)
    }
}

fn check_price(field: &'static str, value: i64, max: u64) -> Result<u64, ValidationError> {
    let price = u64::try_from(value).map_err(|_| ValidationError::Negative { field, value })?;
    if price > max {
        return Err(ValidationError::PriceTooHigh { field, value, max });
    }
    Ok(price)
}

/// Partial preference update as submitted by the front-end.
///
/// Numeric fields are signed so that negative user input reaches
/// validation instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    pub enabled: Option<bool>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub supply_limit: Option<i64>,
    pub cycles: Option<i64>,
}

/// Upper bounds enforced on preference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PreferenceLimits {
    /// Sanity ceiling for min/max price.
    #[serde(default = "default_max_price")]
    pub max_price: u64,
    /// Ceiling for the cycle count.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

impl Default for PreferenceLimits {
    fn default() -> Self {
        Self {
            max_price: DEFAULT_MAX_PRICE,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

fn default_max_price() -> u64 {
    DEFAULT_MAX_PRICE
}

fn default_max_cycles() -> u32 {
    DEFAULT_MAX_CYCLES
}
