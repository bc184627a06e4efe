//! Economy tick.
//!
//! Each call to [`EconomySimulator::tick`] advances the clock by one fixed
//! quantum and updates research, production, construction and repair for
//! every player and planet. When the day component of the clock changes it
//! also closes the day: morale, population, tax and trade income.
//!
//! # Determinism
//!
//! A tick is a pure function of the world and the rules:
//! - Players and planets are visited in id order
//! - Statistics are computed once, before any mutation
//! - No wall clock or random source is read

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;
use crate::config::EconomyRules;
use crate::economy::{Player, PlayerId};
use crate::planet::{Planet, PlanetId};
use crate::research::{FundingOutcome, ResearchState};
use crate::resources::ProductionCategory;
use crate::statistics::{PlanetStatistics, PlayerStatistics};
use crate::time::GameTime;
use crate::world::World;

/// Something noteworthy that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// A research was paid off.
    ResearchCompleted {
        /// Researching player.
        player: PlayerId,
        /// Research type id.
        research: String,
    },
    /// The running research stopped progressing.
    ResearchBlocked {
        /// Researching player.
        player: PlayerId,
        /// Research type id.
        research: String,
        /// Why it is blocked.
        state: ResearchState,
    },
    /// Production finished units.
    ProductionCompleted {
        /// Producing player.
        player: PlayerId,
        /// Item type id.
        research: String,
        /// Units finished.
        count: i32,
    },
    /// A building finished construction.
    ConstructionCompleted {
        /// Planet hosting the building.
        planet: PlanetId,
        /// The building.
        building: BuildingId,
    },
    /// A colony died out and the planet reverted to uncolonized.
    ColonyLost {
        /// The planet.
        planet: PlanetId,
        /// Its former owner.
        player: PlayerId,
    },
}

/// A modeling fault detected during a tick. The tick still completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyFault {
    /// A treasury fell below zero.
    NegativeTreasury {
        /// The player.
        player: PlayerId,
        /// Treasury after the tick.
        money: i64,
    },
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Time after the tick.
    pub time: GameTime,
    /// Whether the day closed during this tick.
    pub day_rolled: bool,
    /// Events in the order they happened.
    pub events: Vec<EconomyEvent>,
    /// Faults detected.
    pub faults: Vec<EconomyFault>,
}

/// Result of closing the day on one planet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayResult {
    /// Unsmoothed morale target.
    pub new_morale: f64,
    /// Population change.
    pub population_delta: i64,
    /// Tax collected.
    pub tax_income: i64,
    /// Trade income collected.
    pub trade_income: i64,
}

/// Advances the economy one tick at a time.
#[derive(Debug, Clone, Default)]
pub struct EconomySimulator {
    rules: EconomyRules,
}

impl EconomySimulator {
    /// Create a simulator with the given rules.
    #[must_use]
    pub const fn new(rules: EconomyRules) -> Self {
        Self { rules }
    }

    /// The rules in use.
    #[must_use]
    pub const fn rules(&self) -> &EconomyRules {
        &self.rules
    }

    /// Advance the world by one tick.
    pub fn tick(&self, world: &mut World) -> TickReport {
        let day_rolled = world.time.advance(self.rules.tick_minutes);
        let mut report = TickReport {
            time: world.time,
            day_rolled,
            events: Vec::new(),
            faults: Vec::new(),
        };

        let stats: BTreeMap<PlanetId, PlanetStatistics> = world
            .planets
            .iter()
            .map(|(&id, planet)| (id, planet.statistics()))
            .collect();

        for player in world.players.values_mut() {
            let mut totals = PlayerStatistics::default();
            for planet in world.planets.values().filter(|p| p.owner == Some(player.id)) {
                totals.add_planet(&stats[&planet.id]);
            }
            self.fund_research(player, &totals, &mut report);
            Self::fund_production(player, &totals, &mut report);
        }

        for planet in world.planets.values_mut() {
            self.build_and_repair(planet, &stats[&planet.id], &mut world.players, &mut report);
        }

        if day_rolled {
            for player in world.players.values_mut() {
                player.roll_over_day();
            }
            for planet in world.planets.values_mut() {
                self.close_day(planet, &stats[&planet.id], &mut world.players, &mut report);
            }
        }

        for player in world.players.values() {
            if player.money < 0 {
                tracing::error!(player = %player.id, money = player.money, "Treasury is negative");
                report.faults.push(EconomyFault::NegativeTreasury {
                    player: player.id,
                    money: player.money,
                });
            }
        }

        tracing::debug!(
            time = %report.time,
            day_rolled,
            events = report.events.len(),
            "Economy tick"
        );
        report
    }

    fn fund_research(&self, player: &mut Player, totals: &PlayerStatistics, report: &mut TickReport) {
        let Some(id) = player.running_research.clone() else {
            return;
        };
        let Some(research) = player.research.get_mut(&id) else {
            player.running_research = None;
            return;
        };

        let previous = research.state;
        let outcome = research.fund(&mut player.money, &totals.active_labs, self.rules.research_rate);
        let state = research.state;
        match outcome {
            FundingOutcome::Completed { spent } => {
                player.today.research_cost += spent;
                player.complete_research(&id);
                tracing::info!(player = %player.id, research = %id, "Research completed");
                report.events.push(EconomyEvent::ResearchCompleted {
                    player: player.id,
                    research: id,
                });
            }
            FundingOutcome::Progressed { spent } => {
                player.today.research_cost += spent;
            }
            FundingOutcome::BlockedOnMoney { spent } => {
                player.today.research_cost += spent;
                if previous != state {
                    report.events.push(EconomyEvent::ResearchBlocked {
                        player: player.id,
                        research: id,
                        state,
                    });
                }
            }
            FundingOutcome::BlockedOnLabs => {
                if previous != state {
                    report.events.push(EconomyEvent::ResearchBlocked {
                        player: player.id,
                        research: id,
                        state,
                    });
                }
            }
            FundingOutcome::Idle => {}
        }
    }

    fn fund_production(player: &mut Player, totals: &PlayerStatistics, report: &mut TickReport) {
        for category in ProductionCategory::ALL {
            let capacity = totals.active_production.get(category);
            let Some(queue) = player.production.get_mut(&category) else {
                continue;
            };
            let tick = queue.fund(capacity, &mut player.money);
            player.today.production_cost += tick.spent;
            for done in tick.completed {
                *player.inventory.entry(done.research_type.clone()).or_insert(0) +=
                    i64::from(done.count);
                player.today.units_produced += i64::from(done.count);
                report.events.push(EconomyEvent::ProductionCompleted {
                    player: player.id,
                    research: done.research_type,
                    count: done.count,
                });
            }
        }
    }

    fn build_and_repair(
        &self,
        planet: &mut Planet,
        stats: &PlanetStatistics,
        players: &mut BTreeMap<PlayerId, Player>,
        report: &mut TickReport,
    ) {
        let free_repair = stats.repair_coverage >= self.rules.free_repair_threshold;
        let mut owner = planet.owner.and_then(|id| players.get_mut(&id));

        for building in &mut planet.buildings {
            if !building.is_complete() {
                if building.construct(self.rules.construction_points) {
                    report.events.push(EconomyEvent::ConstructionCompleted {
                        planet: planet.id,
                        building: building.id,
                    });
                }
                continue;
            }
            if !building.repairing {
                continue;
            }
            if !building.is_damaged() {
                building.set_repairing(false);
                continue;
            }
            if free_repair {
                building.repair(self.rules.repair_points);
            } else if let Some(player) = owner.as_deref_mut() {
                if player.spend(self.rules.repair_cost) {
                    player.today.repair_cost += self.rules.repair_cost;
                    building.repair(self.rules.repair_points);
                }
            }
        }
    }

    fn close_day(
        &self,
        planet: &mut Planet,
        stats: &PlanetStatistics,
        players: &mut BTreeMap<PlayerId, Player>,
        report: &mut TickReport,
    ) {
        let Some(owner) = planet.owner else {
            return;
        };
        let day = self.roll_over_planet(planet, stats);

        if let Some(player) = players.get_mut(&owner) {
            player.credit(day.tax_income + day.trade_income);
            player.yesterday.tax_income += day.tax_income;
            player.yesterday.trade_income += day.trade_income;
        }

        if planet.population == 0 {
            planet.surrender();
            tracing::info!(planet = %planet.id, player = %owner, "Colony lost");
            report.events.push(EconomyEvent::ColonyLost {
                planet: planet.id,
                player: owner,
            });
        }
    }

    /// Close the day on one planet: morale, population and income.
    ///
    /// Updates the planet and returns what was computed; crediting the
    /// owner is left to the caller.
    pub fn roll_over_planet(&self, planet: &mut Planet, stats: &PlanetStatistics) -> DayResult {
        planet.last_morale = planet.morale;
        planet.last_population = planet.population;

        let new_morale = self.target_morale(planet.morale, planet.tax.percent(), stats);
        let smoothed = self.rules.morale_smoothing * f64::from(planet.morale)
            + (1.0 - self.rules.morale_smoothing) * new_morale;
        planet.morale = smoothed.round().clamp(0.0, 100.0) as i32;

        let population_delta = self.population_delta(planet.population, new_morale);
        planet.population = (planet.population + population_delta).max(0);

        let tax_income = planet.population * i64::from(planet.morale) * planet.tax.percent() / 10_000;
        let trade_income = (stats.trade_credit * stats.multiplier).floor() as i64;
        planet.tax_income = tax_income;
        planet.trade_income = trade_income;

        DayResult {
            new_morale,
            population_delta,
            tax_income,
            trade_income,
        }
    }

    /// Unsmoothed morale a planet is heading toward, clamped to `0..=100`.
    #[must_use]
    pub fn target_morale(&self, morale: i32, tax_percent: i64, stats: &PlanetStatistics) -> f64 {
        let mut value = f64::from(morale) + stats.morale_boost
            - self.rules.problem_penalty * stats.problem_count() as f64
            - tax_percent as f64 / self.rules.tax_morale_divisor;
        for (_, available) in stats.availability() {
            value += deficit_penalty(available, stats.population, self.rules.deficit_scale);
        }
        value.clamp(0.0, 100.0)
    }

    /// Population change for a day ending at `new_morale`.
    #[must_use]
    pub fn population_delta(&self, population: i64, new_morale: f64) -> i64 {
        let scale = if population < self.rules.population_threshold {
            self.rules.low_population_scale
        } else {
            self.rules.high_population_scale
        };
        (scale * (new_morale - 50.0) / self.rules.population_divisor).trunc() as i64
    }
}

/// Morale change caused by a service covering less than the population.
///
/// Zero when `available` covers everyone, otherwise
/// `(available - population) * scale / population`.
#[must_use]
pub fn deficit_penalty(available: f64, population: i64, scale: f64) -> f64 {
    let population = population as f64;
    if population <= 0.0 || available >= population {
        0.0
    } else {
        (available - population) * scale / population
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::buildings::Location;
    use crate::data::{BuildingType, Catalog, LabRequirements, ResearchType};
    use crate::planet::TaxLevel;
    use crate::resources::{
        LabKind, COLONY_HUB_KIND, FOOD, HOSPITAL, HOUSE, MORALE, POLICE, REPAIR,
    };
    use crate::time::MINUTES_PER_DAY;

    fn building_type(id: &str, kind: &str, resources: &[(&str, f64)]) -> Arc<BuildingType> {
        Arc::new(BuildingType {
            id: id.into(),
            name: String::new(),
            kind: kind.into(),
            hitpoints: 1000,
            cost: 0,
            resources: resources
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
            upgrades: Vec::new(),
            limit: Default::default(),
        })
    }

    fn hub(morale: f64) -> Arc<BuildingType> {
        building_type(
            "hub",
            COLONY_HUB_KIND,
            &[
                (HOUSE, 5000.0),
                (FOOD, 5000.0),
                (HOSPITAL, 5000.0),
                (POLICE, 5000.0),
                (MORALE, morale),
            ],
        )
    }

    fn world(population: i64, money: i64) -> World {
        let mut world = World::new(Catalog::new());
        world.add_player(Player::new(PlayerId(1), "Alice", "human", money));
        let mut planet = Planet::new(PlanetId(1), "Terra");
        planet.colonize(PlayerId(1), "human", population);
        planet.tax = TaxLevel::None;
        world.add_planet(planet);
        world
    }

    fn planet(world: &mut World) -> &mut Planet {
        world.planets.get_mut(&PlanetId(1)).unwrap()
    }

    fn before_midnight(world: &mut World) {
        world.time = GameTime::from_minutes(MINUTES_PER_DAY - 10);
    }

    #[test]
    fn test_population_grows_with_morale() {
        let mut world = world(4000, 0);
        planet(&mut world).add_completed(hub(10.0), Location::default());
        before_midnight(&mut world);

        let report = EconomySimulator::default().tick(&mut world);
        assert!(report.day_rolled);
        let terra = planet(&mut world);
        assert_eq!(terra.last_population, 4000);
        assert_eq!(terra.population, 4100);
        assert_eq!(terra.last_morale, 50);
        assert_eq!(terra.morale, 52);
    }

    #[test]
    fn test_high_population_regime() {
        let sim = EconomySimulator::default();
        assert_eq!(sim.population_delta(4999, 60.0), 100);
        assert_eq!(sim.population_delta(5000, 60.0), 50);
        assert_eq!(sim.population_delta(8000, 40.0), -50);
    }

    #[test]
    fn test_deficit_penalty() {
        assert_eq!(deficit_penalty(2000.0, 4000, 50.0), -25.0);
        assert_eq!(deficit_penalty(5000.0, 4000, 50.0), 0.0);
        assert_eq!(deficit_penalty(0.0, 0, 50.0), 0.0);
    }

    #[test]
    fn test_target_morale_penalties() {
        let sim = EconomySimulator::default();
        let stats = PlanetStatistics {
            population: 4000,
            house: 2000.0,
            food: 4000.0,
            hospital: 4000.0,
            police: 4000.0,
            problems: [crate::statistics::PlanetProblem::Energy].into_iter().collect(),
            ..PlanetStatistics::default()
        };
        // 50 - 8 (one problem) - 30/3 (tax) - 25 (housing)
        assert_eq!(sim.target_morale(50, 30, &stats), 7.0);
        assert_eq!(sim.target_morale(0, 100, &stats), 0.0);
    }

    #[test]
    fn test_tax_income_credited() {
        let mut world = world(1000, 0);
        planet(&mut world).add_completed(hub(0.0), Location::default());
        planet(&mut world).tax = TaxLevel::Moderate;
        before_midnight(&mut world);

        EconomySimulator::default().tick(&mut world);
        let terra = &world.planets[&PlanetId(1)];
        // new morale 40, smoothed to 48; population drops by 100
        assert_eq!(terra.morale, 48);
        assert_eq!(terra.population, 900);
        assert_eq!(terra.tax_income, 900 * 48 * 30 / 10_000);
        let alice = &world.players[&PlayerId(1)];
        assert_eq!(alice.money, terra.tax_income);
        assert_eq!(alice.yesterday.tax_income, terra.tax_income);
    }

    #[test]
    fn test_colony_lost_when_population_dies_out() {
        let mut world = world(50, 0);
        planet(&mut world).add_completed(hub(0.0), Location::default());
        planet(&mut world).tax = TaxLevel::Slavery;
        before_midnight(&mut world);

        let report = EconomySimulator::default().tick(&mut world);
        assert!(report.events.contains(&EconomyEvent::ColonyLost {
            planet: PlanetId(1),
            player: PlayerId(1),
        }));
        let terra = &world.planets[&PlanetId(1)];
        assert!(terra.owner.is_none());
        assert!(terra.buildings.is_empty());
    }

    #[test]
    fn test_construction_progress() {
        let mut world = world(100, 0);
        let id = planet(&mut world)
            .place_building(hub(0.0), Location::default())
            .unwrap();
        let sim = EconomySimulator::default();

        for _ in 0..4 {
            assert!(sim.tick(&mut world).events.is_empty());
        }
        let report = sim.tick(&mut world);
        assert_eq!(
            report.events,
            vec![EconomyEvent::ConstructionCompleted {
                planet: PlanetId(1),
                building: id
            }]
        );
        assert!(planet(&mut world).building(id).unwrap().is_complete());
    }

    #[test]
    fn test_paid_repair() {
        let mut world = world(100, 30);
        let id = planet(&mut world).add_completed(hub(0.0), Location::default());
        {
            let b = planet(&mut world).building_mut(id).unwrap();
            b.damage(200);
            b.set_repairing(true);
        }
        let sim = EconomySimulator::default();

        sim.tick(&mut world);
        assert_eq!(planet(&mut world).building(id).unwrap().hitpoints, 850);
        assert_eq!(world.players[&PlayerId(1)].money, 10);
        assert_eq!(world.players[&PlayerId(1)].today.repair_cost, 20);

        // Cannot afford the next increment
        sim.tick(&mut world);
        assert_eq!(planet(&mut world).building(id).unwrap().hitpoints, 850);
        assert_eq!(world.players[&PlayerId(1)].money, 10);
    }

    #[test]
    fn test_free_repair() {
        let mut world = world(100, 0);
        planet(&mut world).add_completed(
            building_type("dock", "Repair", &[(REPAIR, 1.0)]),
            Location::default(),
        );
        let id = planet(&mut world).add_completed(hub(0.0), Location::new(3, 3));
        {
            let b = planet(&mut world).building_mut(id).unwrap();
            b.damage(40);
            b.set_repairing(true);
        }
        let sim = EconomySimulator::default();

        sim.tick(&mut world);
        let b = planet(&mut world).building(id).unwrap();
        assert_eq!(b.hitpoints, 1000);
        assert!(!b.repairing);
        assert_eq!(world.players[&PlayerId(1)].money, 0);
    }

    #[test]
    fn test_research_funding_and_completion() {
        let mut world = world(100, 1000);
        planet(&mut world).add_completed(
            building_type("lab", "Science", &[(LabKind::Civil.resource(), 1.0)]),
            Location::default(),
        );
        let research = world.catalog.insert_research(ResearchType {
            id: "lasers".into(),
            name: String::new(),
            category: String::new(),
            research_cost: 100,
            production_cost: 10,
            production: None,
            labs: LabRequirements {
                civil: 1,
                ..Default::default()
            },
        });
        world
            .players
            .get_mut(&PlayerId(1))
            .unwrap()
            .start_research(research);
        world
            .players
            .get_mut(&PlayerId(1))
            .unwrap()
            .assign_research_money("lasers", 50)
            .unwrap();
        let sim = EconomySimulator::default();

        sim.tick(&mut world);
        let alice = &world.players[&PlayerId(1)];
        assert_eq!(alice.research["lasers"].remaining_money, 80);
        assert_eq!(alice.money, 980);
        assert_eq!(alice.today.research_cost, 20);

        let mut completed = false;
        for _ in 0..20 {
            let report = sim.tick(&mut world);
            if report.events.iter().any(|e| {
                matches!(e, EconomyEvent::ResearchCompleted { research, .. } if research == "lasers")
            }) {
                completed = true;
                break;
            }
        }
        assert!(completed);
        let alice = &world.players[&PlayerId(1)];
        assert!(alice.is_available("lasers"));
        assert_eq!(alice.money, 900);
    }

    #[test]
    fn test_research_blocked_on_money() {
        let mut world = world(100, 0);
        let research = world.catalog.insert_research(ResearchType {
            id: "lasers".into(),
            name: String::new(),
            category: String::new(),
            research_cost: 100,
            production_cost: 10,
            production: None,
            labs: LabRequirements::default(),
        });
        world
            .players
            .get_mut(&PlayerId(1))
            .unwrap()
            .start_research(research);

        let sim = EconomySimulator::default();
        let report = sim.tick(&mut world);
        assert_eq!(
            report.events,
            vec![EconomyEvent::ResearchBlocked {
                player: PlayerId(1),
                research: "lasers".into(),
                state: ResearchState::Money,
            }]
        );
        // Reported once, not every tick
        assert!(sim.tick(&mut world).events.is_empty());
        assert_eq!(world.players[&PlayerId(1)].research["lasers"].remaining_money, 100);
    }

    #[test]
    fn test_production_into_inventory() {
        let mut world = world(100, 1000);
        planet(&mut world).add_completed(
            building_type("yard", "Factory", &[(ProductionCategory::Spaceship.resource(), 50.0)]),
            Location::default(),
        );
        let fighter = world.catalog.insert_research(ResearchType {
            id: "fighter".into(),
            name: String::new(),
            category: String::new(),
            research_cost: 100,
            production_cost: 100,
            production: Some(ProductionCategory::Spaceship),
            labs: LabRequirements::default(),
        });
        let alice = world.players.get_mut(&PlayerId(1)).unwrap();
        alice.complete_research("fighter");
        alice.add_production(fighter, 2).unwrap();

        let sim = EconomySimulator::default();
        let mut produced = 0;
        for _ in 0..4 {
            for event in sim.tick(&mut world).events {
                if let EconomyEvent::ProductionCompleted { count, .. } = event {
                    produced += count;
                }
            }
        }
        assert_eq!(produced, 2);
        let alice = &world.players[&PlayerId(1)];
        assert_eq!(alice.inventory["fighter"], 2);
        assert_eq!(alice.money, 800);
        assert_eq!(alice.today.units_produced, 2);
    }

    #[test]
    fn test_negative_treasury_is_reported_not_fatal() {
        let mut world = world(100, -5);
        let report = EconomySimulator::default().tick(&mut world);
        assert_eq!(
            report.faults,
            vec![EconomyFault::NegativeTreasury {
                player: PlayerId(1),
                money: -5
            }]
        );
        assert_eq!(report.time.minutes(), 10);
    }
}
