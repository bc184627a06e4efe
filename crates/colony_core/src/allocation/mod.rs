//! Worker and energy allocation.
//!
//! - [`work_unit`]: per-building demand snapshots
//! - [`strategies`]: the distribution algorithms
//! - [`orchestrator`]: parallel passes and write-back

pub mod orchestrator;
pub mod strategies;
pub mod work_unit;

pub use orchestrator::{
    apply_results, apply_units, compute_planet, prepare, prepare_planet, run_isolated,
    AllocationOrchestrator, DrainReport, PlanetAllocation, PlanetSnapshot,
};
pub use strategies::{
    allocate, strategy_for, AllocationStrategy, BattleStrategy, DamageAwareStrategy,
    UniformStrategy, ZeroStrategy,
};
pub use work_unit::AllocationWorkUnit;
