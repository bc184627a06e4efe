//! Engine driver tying the clock, the economy tick and allocation passes
//! together.
//!
//! The [`Engine`] owns the [`World`] and runs on the authoritative thread.
//! Two timers decide what is due: the economy tick and the (shorter)
//! allocation pass. [`Engine::advance`] is the only entry point that
//! mutates the world on a schedule.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::allocation::{AllocationOrchestrator, DrainReport};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::persistence::WorldSave;
use crate::planet::PlanetId;
use crate::simulation::{EconomySimulator, TickReport};
use crate::time::PeriodicTimer;
use crate::world::World;

/// What one call to [`Engine::advance`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStep {
    /// Reports of the economy ticks that ran.
    pub ticks: Vec<TickReport>,
    /// Allocation passes dispatched.
    pub passes: u32,
    /// Allocation results merged.
    pub allocation: DrainReport,
}

/// The economy engine.
#[derive(Debug)]
pub struct Engine {
    world: World,
    simulator: EconomySimulator,
    orchestrator: AllocationOrchestrator,
    economy_timer: PeriodicTimer,
    allocation_timer: PeriodicTimer,
}

impl Engine {
    /// Create an engine around a world. Timers start stopped.
    ///
    /// Fails with [`EconomyError::InvalidConfig`](crate::error::EconomyError::InvalidConfig)
    /// when the rules do not pass [`EngineConfig::validate`].
    pub fn new(world: World, config: &EngineConfig) -> Result<Self> {
        config.check()?;
        Ok(Self {
            world,
            simulator: EconomySimulator::new(config.rules.clone()),
            orchestrator: AllocationOrchestrator::new(config.worker_threads)?,
            economy_timer: PeriodicTimer::new(config.economy_period()),
            allocation_timer: PeriodicTimer::new(config.allocation_period()),
        })
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The world, for changes between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Take the world out of the engine.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// The economy simulator.
    #[must_use]
    pub const fn simulator(&self) -> &EconomySimulator {
        &self.simulator
    }

    /// Start both timers.
    pub fn start(&mut self) {
        self.economy_timer.start();
        self.allocation_timer.start();
        tracing::info!("Engine started");
    }

    /// Stop both timers. Work already dispatched is still drained.
    pub fn stop(&mut self) {
        self.economy_timer.stop();
        self.allocation_timer.stop();
        tracing::info!("Engine stopped");
    }

    /// Whether the engine is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.economy_timer.is_running()
    }

    /// Let `elapsed` real time pass.
    ///
    /// Finished allocation results are merged first, then every due economy
    /// tick runs, then due allocation passes are dispatched.
    pub fn advance(&mut self, elapsed: Duration) -> EngineStep {
        let mut step = EngineStep {
            allocation: self.orchestrator.drain(&mut self.world),
            ..EngineStep::default()
        };

        for _ in 0..self.economy_timer.advance(elapsed) {
            step.ticks.push(self.simulator.tick(&mut self.world));
        }

        // Back-to-back passes would snapshot identical demand
        if self.allocation_timer.advance(elapsed) > 0 {
            self.orchestrator.dispatch(&mut self.world);
            step.passes = 1;
        }
        step
    }

    /// Run one allocation pass to completion and then one economy tick.
    ///
    /// Independent of timers and thread scheduling, so repeated runs from
    /// the same world produce the same state.
    pub fn step_synchronous(&mut self) -> TickReport {
        self.orchestrator.run_pass_blocking(&mut self.world);
        self.simulator.tick(&mut self.world)
    }

    /// Run [`step_synchronous`](Self::step_synchronous) for whole in-game days.
    pub fn run_days(&mut self, days: u64) -> Vec<TickReport> {
        let target = self.world.time.day() + days;
        let mut reports = Vec::new();
        while self.world.time.day() < target {
            reports.push(self.step_synchronous());
        }
        reports
    }

    /// Wait for in-flight allocation tasks and merge them.
    pub fn flush_allocations(&mut self) -> DrainReport {
        self.orchestrator.wait_all(&mut self.world)
    }

    /// Recompute one planet's allocation right away.
    pub fn recompute_now(&mut self, planet: PlanetId) -> Result<()> {
        self.orchestrator.recompute_now(&mut self.world, planet)
    }

    /// Capture the world for saving.
    #[must_use]
    pub fn save(&self) -> WorldSave {
        WorldSave::capture(&self.world)
    }

    /// Hash of the saved state, for determinism checks.
    pub fn state_hash(&self) -> Result<u64> {
        let bytes = self.save().to_bytes()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(hasher.finish())
    }
}
