//! Determinism verification harness.
//!
//! Runs the same economy several times, sequentially or on separate
//! threads, and compares state hashes. Every run of the engine's
//! synchronous step must agree no matter how many allocation workers it
//! uses.
//!
//! # Example
//!
//! ```ignore
//! use colony_test_utils::determinism::verify_engine_determinism;
//! use colony_test_utils::fixtures::colony_world;
//!
//! let result = verify_engine_determinism(colony_world, 3, 5);
//! result.assert_deterministic();
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use colony_core::config::EngineConfig;
use colony_core::engine::Engine;
use colony_core::persistence::WorldSave;
use colony_core::world::World;

/// Result of a determinism check.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical final state.
    pub is_deterministic: bool,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
    /// Steps each run performed.
    pub steps: u64,
}

impl DeterminismResult {
    /// Distinct hashes, for diagnostics.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert the runs agreed.
    ///
    /// # Panics
    ///
    /// Panics with the distinct hashes if they did not.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "Non-deterministic after {} steps: {} distinct hashes {:?}",
            self.steps,
            self.unique_hashes().len(),
            self.unique_hashes()
        );
    }
}

/// Run `setup`/`step` `runs` times and compare the hashes.
///
/// `setup` creates the initial state, `step` advances it once and `hash`
/// summarizes it.
pub fn verify_determinism<S, F, H, T>(
    runs: usize,
    steps: u64,
    setup: S,
    step: F,
    hash: H,
) -> DeterminismResult
where
    S: Fn() -> T,
    F: Fn(&mut T),
    H: Fn(&T) -> u64,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let mut state = setup();
            for _ in 0..steps {
                step(&mut state);
            }
            hash(&state)
        })
        .collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps,
    }
}

/// Engine over `world` with `threads` allocation workers.
///
/// # Panics
///
/// Panics if the worker pool cannot be created.
#[must_use]
pub fn engine_with_threads(world: World, threads: usize) -> Engine {
    let config = EngineConfig::default().with_worker_threads(threads);
    Engine::new(world, &config).expect("engine starts")
}

/// State hash of an engine.
///
/// # Panics
///
/// Panics if the world cannot be encoded.
#[must_use]
pub fn state_hash(engine: &Engine) -> u64 {
    engine.state_hash().expect("world encodes")
}

/// Run `days` in-game days `runs` times, each with a different number of
/// allocation workers, and compare the final hashes.
pub fn verify_engine_determinism<S>(setup: S, runs: usize, days: u64) -> DeterminismResult
where
    S: Fn() -> World,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|run| {
            let mut engine = engine_with_threads(setup(), run % 4 + 1);
            engine.run_days(days);
            state_hash(&engine)
        })
        .collect();
    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: days,
    }
}

/// Result of runs executed on parallel threads.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Whether all runs agreed.
    pub is_deterministic: bool,
    /// Final hash of each run, in spawn order.
    pub hashes: Vec<u64>,
}

/// Run `runs` engines on scoped threads at once.
///
/// Catches interference through shared state: every engine has its own
/// pool, but they all compete for the same cores.
///
/// # Panics
///
/// Panics if a run panics.
pub fn run_parallel_engines<S>(setup: S, runs: usize, days: u64) -> ParallelRunResult
where
    S: Fn() -> World + Sync,
{
    let hashes: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|run| {
                let setup = &setup;
                scope.spawn(move || {
                    let mut engine = engine_with_threads(setup(), run % 3 + 1);
                    engine.run_days(days);
                    state_hash(&engine)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("run panicked"))
            .collect()
    });
    ParallelRunResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
    }
}

/// First synchronous step at which two worlds diverge, or `None` if they
/// agree for `max_steps` steps.
#[must_use]
pub fn find_first_divergence(a: World, b: World, max_steps: u64) -> Option<u64> {
    let mut first = engine_with_threads(a, 1);
    let mut second = engine_with_threads(b, 2);
    if state_hash(&first) != state_hash(&second) {
        return Some(0);
    }
    for step in 1..=max_steps {
        first.step_synchronous();
        second.step_synchronous();
        if state_hash(&first) != state_hash(&second) {
            return Some(step);
        }
    }
    None
}

/// Whether a world survives a bincode and a RON round trip unchanged.
///
/// # Panics
///
/// Panics if encoding or restoring fails.
#[must_use]
pub fn verify_save_round_trip(world: &World) -> bool {
    let save = WorldSave::capture(world);

    let bytes = save.to_bytes().expect("bincode encodes");
    let from_bytes = WorldSave::from_bytes(&bytes).expect("bincode decodes");
    let ron = save.to_ron().expect("ron encodes");
    let from_ron = WorldSave::from_ron(&ron).expect("ron decodes");

    let restored = from_bytes
        .clone()
        .restore(world.catalog.clone())
        .expect("save restores");
    from_bytes == save && from_ron == save && WorldSave::capture(&restored) == save
}

/// Hash any hashable value.
#[must_use]
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
