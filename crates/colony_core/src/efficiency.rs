//! Building efficiency model.
//!
//! Efficiency is the fraction of its nominal output a building delivers,
//! always in `[0, 1]`. It depends on the workers and energy assigned by the
//! last allocation write-back and on the building's damage.
//!
//! The functions here are pure: they read a [`Building`] and never mutate
//! it, so they can run on any thread holding a shared reference.

use crate::buildings::Building;
use crate::resources::{ENERGY, WORKER};

/// Operational efficiency of a building.
///
/// Zero when the building is disabled or has lost at least half of its hit
/// points; otherwise see [`operating_efficiency`].
#[must_use]
pub fn efficiency(building: &Building) -> f64 {
    if !building.enabled || building.is_severely_damaged() {
        return 0.0;
    }
    operating_efficiency(building)
}

/// Efficiency from staffing, energy supply and damage alone.
///
/// Ignores the enabled toggle and the severe-damage cut-off; the space
/// battle layer uses this directly for defensive structures.
///
/// - Incomplete buildings are at zero.
/// - Energy producers and neutral buildings run at
///   `min(workers, health)`.
/// - Consumers supplied with less than half of their energy drop to zero;
///   otherwise they run at `min(energy, workers, health)`.
#[must_use]
pub fn operating_efficiency(building: &Building) -> f64 {
    if !building.is_complete() {
        return 0.0;
    }

    let worker_demand = building.try_resource(WORKER).unwrap_or(0.0);
    let energy_demand = building.try_resource(ENERGY).unwrap_or(0.0);
    let health = building.health_ratio();
    let workers = ratio(building.assigned_worker, worker_demand);

    let value = if energy_demand >= 0.0 {
        workers.min(health)
    } else {
        // Both sides are negative here: assigned energy carries the sign of
        // the demand, so this reads "less than half supplied".
        let assigned_energy = f64::from(building.assigned_energy);
        if assigned_energy * 2.0 > energy_demand {
            0.0
        } else {
            (assigned_energy / energy_demand).min(workers).min(health)
        }
    };
    value.clamp(0.0, 1.0)
}

/// Whether a building at `efficiency` produces anything.
#[must_use]
pub fn is_operational(efficiency: f64) -> bool {
    efficiency > 0.0
}

/// Assigned over demanded, treating a zero demand as fully satisfied.
fn ratio(assigned: i32, demand: f64) -> f64 {
    if demand == 0.0 {
        1.0
    } else {
        f64::from(assigned) / demand
    }
}
