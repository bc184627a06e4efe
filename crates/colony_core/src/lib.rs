//! # Colony Core
//!
//! Deterministic economy core for a space-empire strategy game.
//!
//! This crate turns a colony's buildings, workforce and energy budget into
//! operational efficiency, funds research and production, and evolves
//! population and morale over in-game time. It contains:
//! - No rendering
//! - No wall-clock reads
//! - No randomness
//! - No IO beyond explicit load/save helpers
//!
//! This separation enables:
//! - Headless runs and batch verification
//! - Deterministic tests of every rule
//! - Save/restore with exact round-trips
//!
//! ## Crate Structure
//!
//! - [`data`] - Building and research definitions
//! - [`buildings`] - Mutable building state
//! - [`efficiency`] - Building efficiency model
//! - [`allocation`] - Worker/energy strategies and the parallel orchestrator
//! - [`simulation`] - The economy tick
//! - [`engine`] - Timers and the authoritative driver
//! - [`persistence`] - Save and restore

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod allocation;
pub mod buildings;
pub mod config;
pub mod data;
pub mod economy;
pub mod efficiency;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod planet;
pub mod production;
pub mod research;
pub mod resources;
pub mod simulation;
pub mod statistics;
pub mod time;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::allocation::{
        AllocationOrchestrator, AllocationStrategy, AllocationWorkUnit, DrainReport,
    };
    pub use crate::buildings::{Building, BuildingId, Location};
    pub use crate::config::{EconomyRules, EngineConfig};
    pub use crate::data::{BuildLimit, BuildingType, Catalog, CatalogData, ResearchType};
    pub use crate::economy::{Player, PlayerId};
    pub use crate::efficiency::{efficiency, is_operational};
    pub use crate::engine::Engine;
    pub use crate::error::{AllocationError, EconomyError, PersistenceError, Result};
    pub use crate::persistence::WorldSave;
    pub use crate::planet::{AllocationStrategyKind, AutoBuild, Planet, PlanetId, TaxLevel};
    pub use crate::research::ResearchState;
    pub use crate::resources::{LabKind, ProductionCategory};
    pub use crate::simulation::{EconomyEvent, EconomyFault, EconomySimulator, TickReport};
    pub use crate::statistics::{PlanetStatistics, PlayerStatistics};
    pub use crate::time::GameTime;
    pub use crate::world::World;
}
