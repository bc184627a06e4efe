//! Parallel allocation passes with single-threaded write-back.
//!
//! A pass snapshots every planet's demand on the authoritative thread,
//! computes each planet on the worker pool, and sends the results back
//! over a channel. Only [`AllocationOrchestrator::drain`] (or one of the
//! blocking helpers) touches buildings, and it runs on the thread that
//! owns the [`World`].
//!
//! Planets never share data inside a pass, so they are computed in
//! parallel without locks. A failing planet is logged and keeps its
//! previous allocation; the others are unaffected.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{AllocationError, Result};
use crate::planet::{AllocationStrategyKind, Planet, PlanetId};
use crate::world::World;

use super::strategies;
use super::work_unit::AllocationWorkUnit;

/// Demand of one planet at the start of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetSnapshot {
    /// Planet the units belong to.
    pub planet: PlanetId,
    /// Strategy selected for the planet.
    pub strategy: AllocationStrategyKind,
    /// Worker pool.
    pub available_workers: i64,
    /// One unit per enabled, completed building.
    pub units: Vec<AllocationWorkUnit>,
}

/// Result of one planet's task.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetAllocation {
    /// Planet computed.
    pub planet: PlanetId,
    /// Pass the result belongs to.
    pub pass: u64,
    /// Allocated units, or why the task failed.
    pub result: std::result::Result<Vec<AllocationWorkUnit>, AllocationError>,
}

/// What happened to the results merged in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Planets whose allocation was written back.
    pub applied: usize,
    /// Planets whose task failed.
    pub failed: usize,
    /// Results dropped because a newer pass was already applied.
    pub stale: usize,
}

impl DrainReport {
    /// Add another report's counts.
    pub fn merge(&mut self, other: Self) {
        self.applied += other.applied;
        self.failed += other.failed;
        self.stale += other.stale;
    }
}

/// Snapshot one planet, zeroing buildings that take no part in the pass.
pub fn prepare_planet(planet: &mut Planet) -> PlanetSnapshot {
    let mut units = Vec::with_capacity(planet.buildings.len());
    for building in &mut planet.buildings {
        if building.enabled && building.is_complete() {
            units.push(AllocationWorkUnit::from_building(building));
        } else {
            building.clear_assignment();
        }
    }
    PlanetSnapshot {
        planet: planet.id,
        strategy: planet.allocation,
        available_workers: planet.available_workers(),
        units,
    }
}

/// Snapshot every planet that has buildings.
pub fn prepare(world: &mut World) -> Vec<PlanetSnapshot> {
    world
        .planets
        .values_mut()
        .filter(|planet| !planet.buildings.is_empty())
        .map(prepare_planet)
        .collect()
}

/// Run a planet's strategy on its snapshot.
pub fn compute_planet(
    snapshot: PlanetSnapshot,
) -> std::result::Result<Vec<AllocationWorkUnit>, AllocationError> {
    let PlanetSnapshot {
        strategy,
        available_workers,
        mut units,
        ..
    } = snapshot;
    strategies::allocate(strategy, &mut units, available_workers)?;
    Ok(units)
}

/// Run a planet task, turning a panic into [`AllocationError::TaskPanicked`].
pub fn run_isolated<F>(
    planet: PlanetId,
    task: F,
) -> std::result::Result<Vec<AllocationWorkUnit>, AllocationError>
where
    F: FnOnce() -> std::result::Result<Vec<AllocationWorkUnit>, AllocationError>,
{
    panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
        Err(AllocationError::TaskPanicked {
            planet,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Copy allocated units into their buildings.
///
/// Buildings that were removed, disabled or reset to construction since
/// the snapshot are left alone. Returns how many buildings were written.
pub fn apply_units(planet: &mut Planet, units: &[AllocationWorkUnit]) -> usize {
    let mut written = 0;
    for unit in units {
        if let Some(building) = planet.building_mut(unit.building) {
            if building.enabled && building.is_complete() {
                unit.write_back(building);
                written += 1;
            }
        }
    }
    written
}

/// Merge finished planet results into the world.
///
/// `applied` records the newest pass written back per planet; a result
/// from an older pass is dropped.
pub fn apply_results<I>(
    world: &mut World,
    applied: &mut BTreeMap<PlanetId, u64>,
    results: I,
) -> DrainReport
where
    I: IntoIterator<Item = PlanetAllocation>,
{
    let mut report = DrainReport::default();
    for allocation in results {
        let PlanetAllocation {
            planet: planet_id,
            pass,
            result,
        } = allocation;

        if applied.get(&planet_id).is_some_and(|&last| pass < last) {
            tracing::debug!(planet = %planet_id, pass, "Dropping stale allocation");
            report.stale += 1;
            continue;
        }

        match result {
            Ok(units) => {
                let Some(planet) = world.planets.get_mut(&planet_id) else {
                    continue;
                };
                apply_units(planet, &units);
                applied.insert(planet_id, pass);
                report.applied += 1;
            }
            Err(error) => {
                tracing::warn!(planet = %planet_id, pass, %error, "Allocation task failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// Periodic allocation driver owning the worker pool.
pub struct AllocationOrchestrator {
    pool: ThreadPool,
    sender: Sender<PlanetAllocation>,
    receiver: Receiver<PlanetAllocation>,
    pass: u64,
    in_flight: usize,
    applied: BTreeMap<PlanetId, u64>,
}

impl std::fmt::Debug for AllocationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationOrchestrator")
            .field("threads", &self.pool.current_num_threads())
            .field("pass", &self.pass)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl AllocationOrchestrator {
    /// Create an orchestrator with `threads` workers (0 picks a default).
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("allocation-{index}"))
            .build()
            .map_err(|e| AllocationError::PoolUnavailable(e.to_string()))?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            pool,
            sender,
            receiver,
            pass: 0,
            in_flight: 0,
            applied: BTreeMap::new(),
        })
    }

    /// Number of the latest pass.
    #[must_use]
    pub const fn pass(&self) -> u64 {
        self.pass
    }

    /// Planet tasks dispatched but not yet drained.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Newest pass written back for a planet.
    #[must_use]
    pub fn last_applied(&self, planet: PlanetId) -> Option<u64> {
        self.applied.get(&planet).copied()
    }

    /// Start a pass: snapshot every planet and hand it to the pool.
    ///
    /// Returns the number of planet tasks submitted.
    pub fn dispatch(&mut self, world: &mut World) -> usize {
        self.pass += 1;
        let pass = self.pass;
        let snapshots = prepare(world);
        let count = snapshots.len();

        for snapshot in snapshots {
            let sender = self.sender.clone();
            self.pool.spawn(move || {
                let planet = snapshot.planet;
                let result = run_isolated(planet, || compute_planet(snapshot));
                // The receiver lives as long as the orchestrator
                let _ = sender.send(PlanetAllocation {
                    planet,
                    pass,
                    result,
                });
            });
        }
        self.in_flight += count;
        tracing::debug!(pass, planets = count, "Allocation pass dispatched");
        count
    }

    /// Apply every finished result without waiting.
    pub fn drain(&mut self, world: &mut World) -> DrainReport {
        let mut finished = Vec::new();
        while let Ok(allocation) = self.receiver.try_recv() {
            finished.push(allocation);
        }
        self.in_flight = self.in_flight.saturating_sub(finished.len());
        apply_results(world, &mut self.applied, finished)
    }

    /// Dispatch a pass and wait for every outstanding task.
    pub fn run_pass_blocking(&mut self, world: &mut World) -> DrainReport {
        self.dispatch(world);
        self.wait_all(world)
    }

    /// Block until every outstanding task has reported, then apply the
    /// results.
    pub fn wait_all(&mut self, world: &mut World) -> DrainReport {
        let mut finished = Vec::with_capacity(self.in_flight);
        while self.in_flight > 0 {
            match self.receiver.recv() {
                Ok(allocation) => {
                    finished.push(allocation);
                    self.in_flight -= 1;
                }
                Err(_) => break,
            }
        }
        apply_results(world, &mut self.applied, finished)
    }

    /// Recompute one planet inline, bypassing the pool.
    ///
    /// Results of earlier passes still in flight for this planet become
    /// stale.
    pub fn recompute_now(&mut self, world: &mut World, planet_id: PlanetId) -> Result<()> {
        let planet = world.planet_mut(planet_id)?;
        let snapshot = prepare_planet(planet);
        let units = compute_planet(snapshot)?;
        self.pass += 1;
        apply_units(planet, &units);
        self.applied.insert(planet_id, self.pass);
        Ok(())
    }
}
