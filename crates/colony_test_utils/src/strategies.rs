//! Proptest strategies for economy types.

use std::sync::Arc;

use colony_core::allocation::AllocationWorkUnit;
use colony_core::buildings::{Building, BuildingId, Location};
use colony_core::data::BuildingType;
use colony_core::planet::AllocationStrategyKind;
use colony_core::resources::{ENERGY, WORKER};
use proptest::prelude::*;

/// Worker demand as building data declares it: a whole headcount.
pub fn arb_worker_demand() -> impl Strategy<Value = f64> {
    (0u32..=60).prop_map(f64::from)
}

/// Energy demand: negative for consumers, non-negative for producers.
pub fn arb_energy_demand() -> impl Strategy<Value = f64> {
    (-60i32..=60).prop_map(f64::from)
}

/// Hit-point ratio in `[0, 1]`.
pub fn arb_efficiency_bound() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0), 0.0f64..=1.0]
}

/// A single work unit with the given id.
pub fn arb_work_unit(id: u32) -> impl Strategy<Value = AllocationWorkUnit> {
    (arb_worker_demand(), arb_energy_demand(), arb_efficiency_bound()).prop_map(
        move |(worker, energy, bound)| AllocationWorkUnit::new(BuildingId(id), worker, energy, bound),
    )
}

/// Up to `max` work units with ids `1..`.
pub fn arb_work_units(max: usize) -> impl Strategy<Value = Vec<AllocationWorkUnit>> {
    prop::collection::vec(
        (arb_worker_demand(), arb_energy_demand(), arb_efficiency_bound()),
        0..=max,
    )
    .prop_map(|demands| {
        demands
            .into_iter()
            .zip(1u32..)
            .map(|((worker, energy, bound), id)| {
                AllocationWorkUnit::new(BuildingId(id), worker, energy, bound)
            })
            .collect()
    })
}

/// Available worker pool.
pub fn arb_worker_pool() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), 0i64..=500, 500i64..=10_000]
}

/// Any allocation strategy.
pub fn arb_strategy_kind() -> impl Strategy<Value = AllocationStrategyKind> {
    prop_oneof![
        Just(AllocationStrategyKind::Zero),
        Just(AllocationStrategyKind::Uniform),
        Just(AllocationStrategyKind::DamageAware),
        Just(AllocationStrategyKind::Battle),
    ]
}

/// A building type with the given worker and energy figures.
#[must_use]
pub fn building_type(worker: f64, energy: f64) -> Arc<BuildingType> {
    let mut resources = std::collections::BTreeMap::new();
    if worker != 0.0 {
        resources.insert(WORKER.to_string(), worker);
    }
    if energy != 0.0 {
        resources.insert(ENERGY.to_string(), energy);
    }
    Arc::new(BuildingType {
        id: "generated".to_string(),
        name: String::new(),
        kind: "Generated".to_string(),
        hitpoints: 1000,
        cost: 0,
        resources,
        upgrades: Vec::new(),
        limit: Default::default(),
    })
}

/// A building in any state: any demand, hit points, assignment, enabled
/// flag and construction progress.
pub fn arb_building() -> impl Strategy<Value = Building> {
    (
        arb_worker_demand(),
        arb_energy_demand(),
        0i32..=1000,
        0i32..=1000,
        -80i32..=80,
        0i32..=80,
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(worker, energy, hitpoints, progress, assigned_energy, assigned_worker, enabled, complete)| {
                let ty = building_type(worker, energy);
                let mut building = if complete {
                    Building::completed(BuildingId(1), ty, Location::default())
                } else {
                    let mut b = Building::new(BuildingId(1), ty, Location::default());
                    b.build_progress = progress.min(999);
                    b
                };
                building.hitpoints = hitpoints;
                building.assigned_energy = assigned_energy;
                building.assigned_worker = assigned_worker;
                building.enabled = enabled;
                building
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn work_units_are_valid(units in arb_work_units(10)) {
            for unit in &units {
                prop_assert!(unit.validate().is_ok());
            }
        }

        #[test]
        fn work_unit_ids_are_distinct(units in arb_work_units(10)) {
            let mut ids: Vec<_> = units.iter().map(|u| u.building).collect();
            ids.dedup();
            prop_assert_eq!(ids.len(), units.len());
        }
    }
}
