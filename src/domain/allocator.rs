//! Cycle allocator: greedy, per-cycle, order-fixed budget allocation.
//!
//! Each cycle walks the eligible list once in catalog order and takes every
//! item whose price fits the remaining simulated balance. The first cycle
//! that takes nothing ends allocation. No external state is touched.

use tracing::debug;

use super::gift::CatalogItem;
use super::plan::{AcquisitionPlan, PlannedItem};

/// Simulate up to `cycles` purchase rounds against `balance`.
///
/// Returns the concatenated plan; `plan.total_cost` is the simulated spend
/// and never exceeds `balance` at any prefix of `plan.items`.
pub fn allocate(eligible: &[CatalogItem], balance: u64, cycles: u32) -> AcquisitionPlan {
    let mut plan = AcquisitionPlan::default();

    let Some(cheapest) = eligible.iter().map(|g| g.price).min() else {
        return plan;
    };
    if balance < cheapest {
        debug!(balance, cheapest, "Balance below cheapest eligible item");
        return plan;
    }

    let mut remaining = balance;

    for cycle in 1..=cycles {
        let before = plan.items.len();
        let mut cycle_cost = 0u64;

        for item in eligible {
            if item.price <= remaining {
                remaining -= item.price;
                cycle_cost += item.price;
                plan.items.push(PlannedItem {
                    gift_id: item.id.clone(),
                    price: item.price,
                });
            }
        }

        let added = plan.items.len() - before;
        if added == 0 {
            debug!(cycle, remaining, "Cycle unaffordable, stopping");
            break;
        }

        debug!(cycle, added, cycle_cost, remaining, "Cycle allocated");
        plan.total_cost += cycle_cost;
        plan.cycles_used = cycle;
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(prices: &[u64]) -> Vec<CatalogItem> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| CatalogItem::limited(format!("g{i}"), *p, 1_000, 1_000))
            .collect()
    }

    fn plan_prices(plan: &AcquisitionPlan) -> Vec<u64> {
        plan.items.iter().map(|i| i.price).collect()
    }

    #[test]
    fn test_greedy_takes_first_affordable() {
        let plan = allocate(&priced(&[30, 80]), 100, 1);
        assert_eq!(plan_prices(&plan), vec![30]);
        assert_eq!(plan.total_cost, 30);
        assert_eq!(plan.cycles_used, 1);
    }

    #[test]
    fn test_repeats_across_cycles() {
        let plan = allocate(&priced(&[30]), 100, 3);
        assert_eq!(plan_prices(&plan), vec![30, 30, 30]);
        assert_eq!(plan.total_cost, 90);
        assert_eq!(plan.cycles_used, 3);
    }

    #[test]
    fn test_cheapest_unaffordable_yields_empty_plan() {
        let plan = allocate(&priced(&[30]), 10, 5);
        assert!(plan.is_empty());
        assert_eq!(plan.total_cost, 0);
        assert_eq!(plan.cycles_used, 0);
    }

    #[test]
    fn test_stops_at_first_empty_cycle() {
        // Cycle 1: 40 + 50 = 90 (left 10). Cycle 2: nothing fits -> stop.
        let plan = allocate(&priced(&[40, 50]), 100, 10);
        assert_eq!(plan_prices(&plan), vec![40, 50]);
        assert_eq!(plan.cycles_used, 1);
    }

    #[test]
    fn test_later_cycle_can_take_subset() {
        // Cycle 1: 60 + 20 (left 40). Cycle 2: 60 no, 20 yes (left 20). Cycle 3: 20 (left 0).
        let plan = allocate(&priced(&[60, 20]), 120, 5);
        assert_eq!(plan_prices(&plan), vec![60, 20, 20, 20]);
        assert_eq!(plan.total_cost, 120);
        assert_eq!(plan.cycles_used, 3);
    }

    #[test]
    fn test_empty_eligible_or_zero_cycles() {
        assert!(allocate(&[], 1_000, 3).is_empty());
        assert!(allocate(&priced(&[10]), 1_000, 0).is_empty());
    }
}
