//! Worker and energy distribution strategies.
//!
//! Every strategy works on one planet's units in two passes. Workers are
//! handed out first. The energy the staffed producers then generate is
//! handed to the consumers. Worker shares round half-up and energy shares
//! truncate toward zero; both are capped by what is left in the pool.
//! Units are served in slice order, which is the planet's building order,
//! so when rounding overdraws the pool the last units come up short.

use crate::error::AllocationError;
use crate::planet::AllocationStrategyKind;

use super::work_unit::AllocationWorkUnit;

/// A way of distributing a planet's workers and energy.
pub trait AllocationStrategy: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &'static str;

    /// Fill in `worker_allocated` and `energy_allocated` of every unit.
    fn allocate(&self, units: &mut [AllocationWorkUnit], available_workers: i64);
}

/// Assigns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroStrategy;

/// Gives every building the same fraction of its demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformStrategy;

/// Like [`UniformStrategy`], but damaged buildings claim less.
#[derive(Debug, Clone, Copy, Default)]
pub struct DamageAwareStrategy;

/// Combat-time allocation; currently distributes like [`UniformStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BattleStrategy;

impl AllocationStrategy for ZeroStrategy {
    fn name(&self) -> &'static str {
        "zero"
    }

    fn allocate(&self, units: &mut [AllocationWorkUnit], _available_workers: i64) {
        units.iter_mut().for_each(AllocationWorkUnit::clear);
    }
}

impl AllocationStrategy for UniformStrategy {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn allocate(&self, units: &mut [AllocationWorkUnit], available_workers: i64) {
        units.iter_mut().for_each(AllocationWorkUnit::clear);

        let demand: f64 = units.iter().map(|u| u.worker_demand).sum();
        if demand <= 0.0 {
            return;
        }
        let target = (available_workers as f64 / demand).min(1.0);
        let mut pool = available_workers.max(0);
        for unit in units.iter_mut() {
            let share = round_half_up(unit.worker_demand * target)
                .min(unit.worker_demand.floor() as i64)
                .min(pool)
                .max(0);
            unit.worker_allocated = share as i32;
            pool -= share;
        }

        distribute_energy(units, |unit| unit.energy_need(), |_, target| target);
    }
}

impl AllocationStrategy for DamageAwareStrategy {
    fn name(&self) -> &'static str {
        "damage-aware"
    }

    fn allocate(&self, units: &mut [AllocationWorkUnit], available_workers: i64) {
        units.iter_mut().for_each(AllocationWorkUnit::clear);

        let demand: f64 = units
            .iter()
            .map(|u| u.worker_demand * u.efficiency_bound)
            .sum();
        if demand <= 0.0 {
            return;
        }
        let target = (available_workers as f64 / demand).min(1.0);
        let mut pool = available_workers.max(0);
        for unit in units.iter_mut() {
            let bound = unit.efficiency_bound;
            let share = round_half_up(unit.worker_demand * target.min(bound))
                .min((unit.worker_demand * bound).floor() as i64)
                .min(pool)
                .max(0);
            unit.worker_allocated = share as i32;
            pool -= share;
        }

        distribute_energy(
            units,
            |unit| unit.energy_need() * unit.efficiency_bound,
            |unit, target| target.min(unit.efficiency_bound),
        );
    }
}

impl AllocationStrategy for BattleStrategy {
    fn name(&self) -> &'static str {
        "battle"
    }

    fn allocate(&self, units: &mut [AllocationWorkUnit], available_workers: i64) {
        tracing::debug!(units = units.len(), "Battle allocation uses the uniform distribution");
        UniformStrategy.allocate(units, available_workers);
    }
}

/// Hand the energy of the staffed producers to the consumers.
///
/// `need` is each consumer's claim on the pool and `fraction` turns the
/// planet-wide target into that consumer's share of its raw demand.
fn distribute_energy(
    units: &mut [AllocationWorkUnit],
    need: impl Fn(&AllocationWorkUnit) -> f64,
    fraction: impl Fn(&AllocationWorkUnit, f64) -> f64,
) {
    let available: f64 = units.iter().map(AllocationWorkUnit::energy_output).sum();
    let demand: f64 = units
        .iter()
        .filter(|u| !u.produces_energy)
        .map(&need)
        .sum();
    if demand <= 0.0 {
        return;
    }
    let target = (available / demand).min(1.0);
    let mut pool = available.max(0.0).trunc() as i64;
    for unit in units.iter_mut().filter(|u| !u.produces_energy) {
        let share = ((unit.energy_need() * fraction(unit, target)).trunc() as i64)
            .min(pool)
            .max(0);
        unit.energy_allocated = -(share as i32);
        pool -= share;
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// The strategy implementing `kind`.
#[must_use]
pub fn strategy_for(kind: AllocationStrategyKind) -> &'static dyn AllocationStrategy {
    match kind {
        AllocationStrategyKind::Zero => &ZeroStrategy,
        AllocationStrategyKind::Uniform => &UniformStrategy,
        AllocationStrategyKind::DamageAware => &DamageAwareStrategy,
        AllocationStrategyKind::Battle => &BattleStrategy,
    }
}

/// Validate a planet's units and run the strategy on them.
pub fn allocate(
    kind: AllocationStrategyKind,
    units: &mut [AllocationWorkUnit],
    available_workers: i64,
) -> Result<(), AllocationError> {
    for unit in units.iter() {
        unit.validate()?;
    }
    strategy_for(kind).allocate(units, available_workers);
    Ok(())
}
