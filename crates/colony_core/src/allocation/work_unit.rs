//! Per-building demand snapshots for one allocation pass.

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingId};
use crate::error::AllocationError;
use crate::resources::{ENERGY, WORKER};

/// Demand and result of one building in one allocation pass.
///
/// Created fresh from the building at the start of a pass; only the
/// `*_allocated` fields are written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationWorkUnit {
    /// Building this unit stands for.
    pub building: BuildingId,
    /// Workers required (magnitude).
    pub worker_demand: f64,
    /// Energy required; negative for consumers, non-negative for producers.
    pub energy_demand: f64,
    /// Whether the building feeds the planet's energy pool.
    pub produces_energy: bool,
    /// Hit-point ratio of the building.
    pub efficiency_bound: f64,
    /// Workers assigned by the strategy.
    pub worker_allocated: i32,
    /// Energy assigned by the strategy, carrying the demand's sign.
    pub energy_allocated: i32,
}

impl AllocationWorkUnit {
    /// Snapshot a building's demand.
    #[must_use]
    pub fn from_building(building: &Building) -> Self {
        let energy_demand = building.try_resource(ENERGY).unwrap_or(0.0);
        Self {
            building: building.id,
            worker_demand: building.try_resource(WORKER).unwrap_or(0.0).abs(),
            energy_demand,
            produces_energy: energy_demand >= 0.0,
            efficiency_bound: building.health_ratio(),
            worker_allocated: 0,
            energy_allocated: 0,
        }
    }

    /// Create a unit directly from demand figures.
    #[must_use]
    pub fn new(building: BuildingId, worker_demand: f64, energy_demand: f64, efficiency_bound: f64) -> Self {
        Self {
            building,
            worker_demand,
            energy_demand,
            produces_energy: energy_demand >= 0.0,
            efficiency_bound,
            worker_allocated: 0,
            energy_allocated: 0,
        }
    }

    /// Check that the strategies can work with this unit.
    pub fn validate(&self) -> Result<(), AllocationError> {
        let reason = if !self.worker_demand.is_finite() || self.worker_demand < 0.0 {
            Some(format!("worker demand {} is not a head count", self.worker_demand))
        } else if !self.energy_demand.is_finite() {
            Some(format!("energy demand {} is not finite", self.energy_demand))
        } else if !(0.0..=1.0).contains(&self.efficiency_bound) {
            Some(format!(
                "efficiency bound {} is outside [0, 1]",
                self.efficiency_bound
            ))
        } else {
            None
        };
        match reason {
            Some(reason) => Err(AllocationError::InvalidWorkUnit {
                building: self.building,
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Energy the building consumes, as a positive amount.
    #[must_use]
    pub fn energy_need(&self) -> f64 {
        if self.produces_energy {
            0.0
        } else {
            -self.energy_demand
        }
    }

    /// Efficiency the building reaches with its allocated workers.
    ///
    /// Mirrors the efficiency model for producers: limited by staffing and
    /// health, and zero once at or below half health.
    #[must_use]
    pub fn staffed_efficiency(&self) -> f64 {
        if self.efficiency_bound <= 0.5 {
            return 0.0;
        }
        let workers = if self.worker_demand == 0.0 {
            1.0
        } else {
            f64::from(self.worker_allocated) / self.worker_demand
        };
        workers.min(self.efficiency_bound).clamp(0.0, 1.0)
    }

    /// Energy the building adds to the pool with its allocated workers.
    #[must_use]
    pub fn energy_output(&self) -> f64 {
        if self.produces_energy {
            self.energy_demand * self.staffed_efficiency()
        } else {
            0.0
        }
    }

    /// Clear both allocations.
    pub fn clear(&mut self) {
        self.worker_allocated = 0;
        self.energy_allocated = 0;
    }

    /// Copy the allocation into its building.
    pub fn write_back(&self, building: &mut Building) {
        debug_assert_eq!(building.id, self.building);
        building.assigned_worker = self.worker_allocated;
        building.assigned_energy = self.energy_allocated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(AllocationWorkUnit::new(BuildingId(1), 10.0, -5.0, 1.0)
            .validate()
            .is_ok());
        assert!(AllocationWorkUnit::new(BuildingId(1), f64::NAN, -5.0, 1.0)
            .validate()
            .is_err());
        assert!(AllocationWorkUnit::new(BuildingId(1), 10.0, f64::INFINITY, 1.0)
            .validate()
            .is_err());
        assert!(AllocationWorkUnit::new(BuildingId(1), 10.0, 0.0, 1.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_energy_output_follows_staffing() {
        let mut producer = AllocationWorkUnit::new(BuildingId(1), 10.0, 20.0, 1.0);
        assert_eq!(producer.energy_output(), 0.0);
        producer.worker_allocated = 5;
        assert_eq!(producer.energy_output(), 10.0);

        producer.efficiency_bound = 0.5;
        assert_eq!(producer.energy_output(), 0.0);

        let consumer = AllocationWorkUnit::new(BuildingId(2), 5.0, -15.0, 1.0);
        assert_eq!(consumer.energy_output(), 0.0);
        assert_eq!(consumer.energy_need(), 15.0);
    }
}
