//! Economy metrics collected during a headless run.

use std::collections::BTreeMap;

use colony_core::economy::DailyLedger;
use colony_core::simulation::{EconomyEvent, EconomyFault, TickReport};
use colony_core::world::World;
use serde::{Deserialize, Serialize};

/// Event counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    /// Research completions.
    pub research_completed: u32,
    /// Research blocked transitions.
    pub research_blocked: u32,
    /// Production completions (events, not units).
    pub production_completed: u32,
    /// Finished constructions.
    pub construction_completed: u32,
    /// Colonies lost.
    pub colonies_lost: u32,
}

impl EventCounts {
    /// Count one event.
    pub fn record(&mut self, event: &EconomyEvent) {
        match event {
            EconomyEvent::ResearchCompleted { .. } => self.research_completed += 1,
            EconomyEvent::ResearchBlocked { .. } => self.research_blocked += 1,
            EconomyEvent::ProductionCompleted { .. } => self.production_completed += 1,
            EconomyEvent::ConstructionCompleted { .. } => self.construction_completed += 1,
            EconomyEvent::ColonyLost { .. } => self.colonies_lost += 1,
        }
    }
}

/// One player's figures at the end of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDay {
    /// Player id.
    pub player: u32,
    /// Treasury.
    pub money: i64,
    /// Population over all owned planets.
    pub population: i64,
    /// Planets owned.
    pub planets: u32,
    /// Money flows of the day just closed.
    pub ledger: DailyLedger,
}

/// Snapshot taken at each day rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Day that just started.
    pub day: u64,
    /// Per-player figures.
    pub players: Vec<PlayerDay>,
}

impl DaySummary {
    /// Summarize a world right after a rollover.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let players = world
            .players
            .values()
            .map(|player| {
                let stats = world.player_statistics(player.id);
                PlayerDay {
                    player: player.id.0,
                    money: player.money,
                    population: stats.population,
                    planets: stats.planets,
                    ledger: player.yesterday,
                }
            })
            .collect();
        Self {
            day: world.time.day(),
            players,
        }
    }
}

/// Collects tick reports into run metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    ticks: u64,
    events: EventCounts,
    units: BTreeMap<String, i64>,
    faults: Vec<EconomyFault>,
    days: Vec<DaySummary>,
}

impl MetricsCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick; `world` is the state after it.
    pub fn record(&mut self, report: &TickReport, world: &World) {
        self.ticks += 1;
        for event in &report.events {
            self.events.record(event);
            if let EconomyEvent::ProductionCompleted {
                research, count, ..
            } = event
            {
                *self.units.entry(research.clone()).or_insert(0) += i64::from(*count);
            }
        }
        self.faults.extend(report.faults.iter().cloned());
        if report.day_rolled {
            self.days.push(DaySummary::capture(world));
        }
    }

    /// Ticks recorded.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Event counts so far.
    #[must_use]
    pub const fn events(&self) -> EventCounts {
        self.events
    }

    /// Units produced per item.
    #[must_use]
    pub fn units(&self) -> &BTreeMap<String, i64> {
        &self.units
    }

    /// Faults so far.
    #[must_use]
    pub fn faults(&self) -> &[EconomyFault] {
        &self.faults
    }

    /// Day summaries so far.
    #[must_use]
    pub fn days(&self) -> &[DaySummary] {
        &self.days
    }

    /// Consume the collector, keeping the day summaries.
    #[must_use]
    pub fn into_days(self) -> Vec<DaySummary> {
        self.days
    }
}
