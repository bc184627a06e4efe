//! Headless economy runs.
//!
//! A run builds the scenario's world, steps the engine synchronously for a
//! number of in-game days and reports the end state as JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use colony_core::config::EngineConfig;
use colony_core::economy::{DailyLedger, Player};
use colony_core::engine::Engine;
use colony_core::planet::{AllocationStrategyKind, Planet, TaxLevel};
use colony_core::simulation::EconomyFault;
use colony_core::statistics::{PlanetProblem, PlanetWarning};
use colony_core::world::World;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{DaySummary, EventCounts, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// End state of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    /// Player id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Treasury.
    pub money: i64,
    /// Finished research.
    pub technologies: Vec<String>,
    /// Research still running and its progress in percent.
    pub research: Option<(String, f64)>,
    /// Units in storage.
    pub inventory: BTreeMap<String, i64>,
    /// Money flows of the last closed day.
    pub yesterday: DailyLedger,
}

impl PlayerReport {
    fn new(player: &Player) -> Self {
        Self {
            id: player.id.0,
            name: player.name.clone(),
            money: player.money,
            technologies: player.available_technologies.iter().cloned().collect(),
            research: player
                .running()
                .map(|r| (r.research_type.id.clone(), r.percent_complete())),
            inventory: player.inventory.clone(),
            yesterday: player.yesterday,
        }
    }
}

/// End state of one planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetReport {
    /// Planet id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Owning player.
    pub owner: Option<u32>,
    /// Population.
    pub population: i64,
    /// Morale.
    pub morale: i32,
    /// Tax level.
    pub tax: TaxLevel,
    /// Allocation strategy.
    pub allocation: AllocationStrategyKind,
    /// Tax collected at the last rollover.
    pub tax_income: i64,
    /// Trade income collected at the last rollover.
    pub trade_income: i64,
    /// Buildings, finished or not.
    pub buildings: usize,
    /// Workers assigned over demanded.
    pub workers: (f64, f64),
    /// Energy produced over consumed.
    pub energy: (f64, f64),
    /// Active morale problems.
    pub problems: Vec<PlanetProblem>,
    /// Active availability warnings.
    pub warnings: Vec<PlanetWarning>,
}

impl PlanetReport {
    fn new(planet: &Planet) -> Self {
        let stats = planet.statistics();
        Self {
            id: planet.id.0,
            name: planet.name.clone(),
            owner: planet.owner.map(|p| p.0),
            population: planet.population,
            morale: planet.morale,
            tax: planet.tax,
            allocation: planet.allocation,
            tax_income: planet.tax_income,
            trade_income: planet.trade_income,
            buildings: planet.buildings.len(),
            workers: (stats.worker_assigned, stats.worker_demand),
            energy: (stats.energy_produced, stats.energy_demand),
            problems: stats.problems.into_iter().collect(),
            warnings: stats.warnings.into_iter().collect(),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Days simulated.
    pub days: u64,
    /// Economy ticks run.
    pub ticks: u64,
    /// Game time at the end, in minutes.
    pub minutes: u64,
    /// Hash of the saved end state.
    pub state_hash: u64,
    /// Players at the end.
    pub players: Vec<PlayerReport>,
    /// Planets at the end.
    pub planets: Vec<PlanetReport>,
    /// Events over the run.
    pub events: EventCounts,
    /// Units produced per item.
    pub units: BTreeMap<String, i64>,
    /// Faults over the run.
    pub faults: Vec<EconomyFault>,
    /// One summary per closed day.
    pub daily: Vec<DaySummary>,
    /// Wall clock time of the run.
    pub duration_seconds: f64,
}

impl RunReport {
    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read back a report.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Build the scenario's world and run it for `days` in-game days.
pub fn run_scenario(scenario: &Scenario, days: u64) -> Result<RunReport, ScenarioError> {
    let world = scenario.build_world()?;
    let (report, _) = run_world(&scenario.name, world, &scenario.config, days)?;
    Ok(report)
}

/// Run an existing world for `days` in-game days.
///
/// Returns the report and the engine, so the caller can save the end state.
pub fn run_world(
    name: &str,
    world: World,
    config: &EngineConfig,
    days: u64,
) -> Result<(RunReport, Engine), ScenarioError> {
    let start = Instant::now();
    let mut engine = Engine::new(world, config)?;
    let mut metrics = MetricsCollector::new();

    info!(scenario = %name, days, "Starting run");
    let target = engine.world().time.day() + days;
    while engine.world().time.day() < target {
        let tick = engine.step_synchronous();
        for fault in &tick.faults {
            warn!(?fault, "Economy fault");
        }
        metrics.record(&tick, engine.world());
        if tick.day_rolled {
            debug!(day = engine.world().time.day(), "Day closed");
        }
    }

    let world = engine.world();
    let report = RunReport {
        scenario: name.to_string(),
        days,
        ticks: metrics.ticks(),
        minutes: world.time.minutes(),
        state_hash: engine.state_hash()?,
        players: world.players.values().map(PlayerReport::new).collect(),
        planets: world.planets.values().map(PlanetReport::new).collect(),
        events: metrics.events(),
        units: metrics.units().clone(),
        faults: metrics.faults().to_vec(),
        daily: metrics.into_days(),
        duration_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        scenario = %name,
        ticks = report.ticks,
        hash = report.state_hash,
        "Run complete in {:.2}s",
        report.duration_seconds
    );
    Ok((report, engine))
}
