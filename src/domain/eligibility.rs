//! Eligibility filter: which catalog items an account is willing to buy.

use super::gift::CatalogItem;
use super::preferences::AccountPreferences;

/// Check one item against an account's price and supply bounds.
///
/// An item with unlimited total supply never matches a non-zero
/// `supply_limit`, since it has no bounded total to compare.
pub fn is_eligible(item: &CatalogItem, prefs: &AccountPreferences) -> bool {
    if prefs.min_price > 0 && item.price < prefs.min_price {
        return false;
    }
    if prefs.max_price > 0 && item.price > prefs.max_price {
        return false;
    }
    if prefs.supply_limit > 0 {
        return matches!(item.total_supply, Some(total) if total <= prefs.supply_limit);
    }
    true
}

/// Subset of `items` the account would buy, in input order.
pub fn eligible(items: &[CatalogItem], prefs: &AccountPreferences) -> Vec<CatalogItem> {
    items
        .iter()
        .filter(|item| is_eligible(item, prefs))
        .cloned()
        .collect()
}
