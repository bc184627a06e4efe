//! Planet and player statistics.
//!
//! Statistics are never stored: they are recomputed from the current
//! buildings every time they are requested, so they always reflect the
//! last allocation write-back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::buildings::Building;
use crate::resources::{
    FactoryAmounts, LabAmounts, LabKind, ProductionCategory, COLONY_HUB_KIND, CREDIT, ENERGY,
    FOOD, HOSPITAL, HOUSE, MORALE, MULTIPLY, POLICE, REPAIR, WORKER,
};

/// Problems that lower morale by a fixed penalty each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlanetProblem {
    /// Buildings need more workers than the population provides.
    Workforce,
    /// Consumers need more energy than is produced.
    Energy,
    /// At least one building is damaged.
    RepairNeeded,
    /// The planet has no colony hub.
    NoColonyHub,
}

/// Shortages penalised proportionally to the deficit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlanetWarning {
    /// Housing below population.
    Housing,
    /// Food below population.
    Food,
    /// Hospital capacity below population.
    Hospital,
    /// Police coverage below population.
    Police,
}

/// Aggregated figures for one planet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanetStatistics {
    /// Population the figures were computed against.
    pub population: i64,
    /// Workers needed by enabled, completed buildings.
    pub worker_demand: f64,
    /// Workers currently assigned.
    pub worker_assigned: f64,
    /// Energy needed by consumers (positive magnitude).
    pub energy_demand: f64,
    /// Energy produced, scaled by producer efficiency.
    pub energy_produced: f64,
    /// Housing available.
    pub house: f64,
    /// Food available.
    pub food: f64,
    /// Hospital capacity available.
    pub hospital: f64,
    /// Police coverage available.
    pub police: f64,
    /// Flat morale boost from operational buildings.
    pub morale_boost: f64,
    /// Best efficiency among free-repair buildings.
    pub repair_coverage: f64,
    /// Trade credit produced by operational buildings.
    pub trade_credit: f64,
    /// Trade income multiplier.
    pub multiplier: f64,
    /// Lab capacity scaled by efficiency.
    pub active_labs: LabAmounts,
    /// Lab capacity of every completed lab.
    pub nominal_labs: LabAmounts,
    /// Factory capacity scaled by efficiency.
    pub active_production: FactoryAmounts,
    /// Factory capacity of every completed factory.
    pub nominal_production: FactoryAmounts,
    /// Buildings under construction.
    pub constructing: u32,
    /// Completed buildings below full hit points.
    pub damaged: u32,
    /// Whether a colony hub is present.
    pub has_colony_hub: bool,
    /// Morale problems.
    pub problems: BTreeSet<PlanetProblem>,
    /// Availability warnings.
    pub warnings: BTreeSet<PlanetWarning>,
}

impl PlanetStatistics {
    /// Compute statistics over a planet's buildings.
    #[must_use]
    pub fn compute(buildings: &[Building], population: i64) -> Self {
        let mut stats = Self {
            population,
            multiplier: 1.0,
            ..Self::default()
        };

        for building in buildings {
            if building.building_type.kind == COLONY_HUB_KIND {
                stats.has_colony_hub = true;
            }
            if !building.is_complete() {
                stats.constructing += 1;
                continue;
            }
            if building.is_damaged() {
                stats.damaged += 1;
            }
            for kind in LabKind::ALL {
                if let Some(amount) = building.try_resource(kind.resource()) {
                    stats.nominal_labs.add(kind, amount);
                }
            }
            for category in ProductionCategory::ALL {
                if let Some(amount) = building.try_resource(category.resource()) {
                    stats.nominal_production.add(category, amount);
                }
            }
            if !building.enabled {
                continue;
            }

            stats.worker_demand += building.try_resource(WORKER).unwrap_or(0.0).abs();
            stats.worker_assigned += f64::from(building.assigned_worker);

            let efficiency = building.efficiency();
            let energy = building.try_resource(ENERGY).unwrap_or(0.0);
            if energy < 0.0 {
                stats.energy_demand += -energy;
            } else {
                stats.energy_produced += energy * efficiency;
            }

            if building.has_resource(REPAIR) {
                stats.repair_coverage = stats.repair_coverage.max(efficiency);
            }
            if efficiency <= 0.0 {
                continue;
            }

            stats.house += building.primary_output(HOUSE);
            stats.food += building.primary_output(FOOD);
            stats.hospital += building.primary_output(HOSPITAL);
            stats.police += building.primary_output(POLICE);
            stats.morale_boost += building.primary_output(MORALE);
            stats.trade_credit += building.primary_output(CREDIT);
            if let Some(multiply) = building.try_resource(MULTIPLY) {
                stats.multiplier *= multiply;
            }
            for kind in LabKind::ALL {
                stats.active_labs.add(kind, building.primary_output(kind.resource()));
            }
            for category in ProductionCategory::ALL {
                stats
                    .active_production
                    .add(category, building.primary_output(category.resource()));
            }
        }

        stats.classify(!buildings.is_empty());
        stats
    }

    fn classify(&mut self, has_buildings: bool) {
        let population = self.population as f64;
        if self.worker_demand > population {
            self.problems.insert(PlanetProblem::Workforce);
        }
        if self.energy_demand > self.energy_produced {
            self.problems.insert(PlanetProblem::Energy);
        }
        if self.damaged > 0 {
            self.problems.insert(PlanetProblem::RepairNeeded);
        }
        if has_buildings && !self.has_colony_hub {
            self.problems.insert(PlanetProblem::NoColonyHub);
        }

        for (warning, available) in self.availability() {
            if available < population {
                self.warnings.insert(warning);
            }
        }
    }

    /// Availability of each service checked against the population.
    #[must_use]
    pub fn availability(&self) -> [(PlanetWarning, f64); 4] {
        [
            (PlanetWarning::Housing, self.house),
            (PlanetWarning::Food, self.food),
            (PlanetWarning::Hospital, self.hospital),
            (PlanetWarning::Police, self.police),
        ]
    }

    /// Number of morale problems.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.problems.len()
    }

    /// Whether a problem is present.
    #[must_use]
    pub fn has_problem(&self, problem: PlanetProblem) -> bool {
        self.problems.contains(&problem)
    }

    /// Whether a warning is present.
    #[must_use]
    pub fn has_warning(&self, warning: PlanetWarning) -> bool {
        self.warnings.contains(&warning)
    }
}

/// Figures summed over every planet a player owns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatistics {
    /// Planets owned.
    pub planets: u32,
    /// Total population.
    pub population: i64,
    /// Lab capacity scaled by efficiency.
    pub active_labs: LabAmounts,
    /// Lab capacity of every completed lab.
    pub nominal_labs: LabAmounts,
    /// Factory capacity scaled by efficiency.
    pub active_production: FactoryAmounts,
    /// Factory capacity of every completed factory.
    pub nominal_production: FactoryAmounts,
    /// Total morale problems.
    pub problems: usize,
}

impl PlayerStatistics {
    /// Add one planet's figures.
    pub fn add_planet(&mut self, stats: &PlanetStatistics) {
        self.planets += 1;
        self.population += stats.population;
        self.active_labs.accumulate(&stats.active_labs);
        self.nominal_labs.accumulate(&stats.nominal_labs);
        self.active_production.accumulate(&stats.active_production);
        self.nominal_production.accumulate(&stats.nominal_production);
        self.problems += stats.problem_count();
    }
}
