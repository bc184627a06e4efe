//! Headless colony economy runner for balance testing and CI verification.
//!
//! This crate drives the economy engine without any front end:
//!
//! - **Balance testing**: run a scenario for a number of in-game days and
//!   inspect the JSON report
//! - **CI verification**: check that repeated runs with different
//!   allocation pool sizes end in the same state
//! - **Save verification**: save a running world, load it and continue
//!
//! Scenarios are RON files carrying the catalog, the engine configuration
//! and the starting players and planets. See [`scenario`] for the format.
//!
//! # Example
//!
//! ```bash
//! cargo run -p colony_headless -- run --scenario scenarios/frontier.ron --days 10
//! cargo run -p colony_headless -- verify --scenario scenarios/frontier.ron --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{verify_scenario, VerifyReport, VerifyRun};
pub use metrics::{DaySummary, EventCounts, MetricsCollector};
pub use runner::{run_scenario, run_world, PlanetReport, PlayerReport, RunReport};
pub use scenario::{Scenario, ScenarioError};
