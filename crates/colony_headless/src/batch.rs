//! Determinism verification over repeated runs.
//!
//! The same scenario is run several times in parallel, each run with a
//! different allocation pool size. Every run must end in the same state.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::runner::run_world;
use crate::scenario::{Scenario, ScenarioError};

/// Outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRun {
    /// Run index.
    pub index: u32,
    /// Allocation worker threads used.
    pub worker_threads: usize,
    /// End state hash.
    pub state_hash: u64,
}

/// Result of [`verify_scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Days each run simulated.
    pub days: u64,
    /// Every run, in index order.
    pub runs: Vec<VerifyRun>,
    /// Whether all runs ended in the same state.
    pub deterministic: bool,
    /// Wall clock time of the batch.
    pub duration_seconds: f64,
}

impl VerifyReport {
    /// Index of the first run whose hash differs from run 0.
    #[must_use]
    pub fn first_divergence(&self) -> Option<u32> {
        let first = self.runs.first()?.state_hash;
        self.runs
            .iter()
            .find(|run| run.state_hash != first)
            .map(|run| run.index)
    }
}

/// Pool size for run `index`: 1, 2, 3, 4 and then the pool default.
fn threads_for(index: u32) -> usize {
    match index {
        0..=3 => index as usize + 1,
        _ => 0,
    }
}

/// Run `scenario` `runs` times for `days` days and compare end states.
pub fn verify_scenario(
    scenario: &Scenario,
    runs: u32,
    days: u64,
) -> Result<VerifyReport, ScenarioError> {
    let start = Instant::now();
    info!(scenario = %scenario.name, runs, days, "Verifying determinism");

    let results: Vec<Result<VerifyRun, ScenarioError>> = (0..runs)
        .into_par_iter()
        .map(|index| {
            let worker_threads = threads_for(index);
            let config = scenario.config.clone().with_worker_threads(worker_threads);
            let world = scenario.build_world()?;
            let (report, _) = run_world(&scenario.name, world, &config, days)?;
            Ok(VerifyRun {
                index,
                worker_threads,
                state_hash: report.state_hash,
            })
        })
        .collect();
    let runs = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let mut report = VerifyReport {
        scenario: scenario.name.clone(),
        days,
        runs,
        deterministic: true,
        duration_seconds: start.elapsed().as_secs_f64(),
    };
    if let Some(index) = report.first_divergence() {
        warn!(scenario = %scenario.name, index, "Run diverged");
        report.deterministic = false;
    } else {
        info!(scenario = %scenario.name, "All runs identical");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRONTIER: &str = include_str!("../scenarios/frontier.ron");

    #[test]
    fn test_threads_for() {
        assert_eq!(threads_for(0), 1);
        assert_eq!(threads_for(3), 4);
        assert_eq!(threads_for(4), 0);
    }

    #[test]
    fn test_frontier_is_deterministic() {
        let scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        let report = verify_scenario(&scenario, 5, 1).unwrap();
        assert_eq!(report.runs.len(), 5);
        assert!(report.deterministic, "{report:?}");
        assert_eq!(report.first_divergence(), None);
    }

    #[test]
    fn test_first_divergence() {
        let run = |index, state_hash| VerifyRun {
            index,
            worker_threads: 1,
            state_hash,
        };
        let report = VerifyReport {
            scenario: "x".into(),
            days: 1,
            runs: vec![run(0, 7), run(1, 7), run(2, 9)],
            deterministic: false,
            duration_seconds: 0.0,
        };
        assert_eq!(report.first_divergence(), Some(2));
    }

    #[test]
    fn test_invalid_scenario_fails() {
        let mut scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        scenario.planets[0].owner = Some(99);
        assert!(matches!(
            verify_scenario(&scenario, 2, 1),
            Err(ScenarioError::InvalidData(_))
        ));
    }
}
