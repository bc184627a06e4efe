//! Engine configuration.
//!
//! Every tunable number of the economy lives in [`EconomyRules`]. The
//! defaults are the values the game ships with.
//!
//! # Example RON
//!
//! ```ron
//! EngineConfig(
//!     economy_period_ms: 1000,
//!     allocation_period_ms: 500,
//!     worker_threads: 4,
//!     rules: EconomyRules(construction_points: 400),
//! )
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, Result};
use crate::time::MINUTES_PER_DAY;

/// Numbers driving the economy tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// In-game minutes per economy tick.
    pub tick_minutes: u64,
    /// Construction progress per tick.
    pub construction_points: i32,
    /// Hit points restored per tick while repairing.
    pub repair_points: i32,
    /// Money charged per repair increment without free repair.
    pub repair_cost: i64,
    /// Free-repair building efficiency needed to repair for free.
    pub free_repair_threshold: f64,
    /// Research funding rate.
    pub research_rate: f64,
    /// Morale lost per planet problem.
    pub problem_penalty: f64,
    /// Tax percent is divided by this to get its morale cost.
    pub tax_morale_divisor: f64,
    /// Scale of the morale penalty for a service deficit.
    pub deficit_scale: f64,
    /// Weight of the old morale when smoothing.
    pub morale_smoothing: f64,
    /// Population splitting the two growth regimes.
    pub population_threshold: i64,
    /// Growth scale below the threshold.
    pub low_population_scale: f64,
    /// Growth scale at or above the threshold.
    pub high_population_scale: f64,
    /// Divisor applied to the scaled morale deviation.
    pub population_divisor: f64,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            tick_minutes: 10,
            construction_points: 200,
            repair_points: 50,
            repair_cost: 20,
            free_repair_threshold: 0.5,
            research_rate: 40.0,
            problem_penalty: 8.0,
            tax_morale_divisor: 3.0,
            deficit_scale: 50.0,
            morale_smoothing: 0.8,
            population_threshold: 5000,
            low_population_scale: 10_000.0,
            high_population_scale: 5_000.0,
            population_divisor: 1000.0,
        }
    }
}

impl EconomyRules {
    /// Check the rules for values the tick cannot work with.
    ///
    /// Returns a human-readable message for each problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.tick_minutes == 0 || self.tick_minutes > MINUTES_PER_DAY {
            issues.push(format!(
                "tick_minutes must be within 1..={MINUTES_PER_DAY}, got {}",
                self.tick_minutes
            ));
        }
        if self.construction_points <= 0 {
            issues.push("construction_points must be positive".to_string());
        }
        if self.repair_points <= 0 {
            issues.push("repair_points must be positive".to_string());
        }
        if self.repair_cost < 0 {
            issues.push("repair_cost must not be negative".to_string());
        }
        if self.population_threshold <= 0 {
            issues.push("population_threshold must be positive".to_string());
        }

        let positive = [
            ("research_rate", self.research_rate),
            ("tax_morale_divisor", self.tax_morale_divisor),
            ("low_population_scale", self.low_population_scale),
            ("high_population_scale", self.high_population_scale),
            ("population_divisor", self.population_divisor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                issues.push(format!("{name} must be positive, got {value}"));
            }
        }
        let non_negative = [
            ("free_repair_threshold", self.free_repair_threshold),
            ("problem_penalty", self.problem_penalty),
            ("deficit_scale", self.deficit_scale),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                issues.push(format!("{name} must not be negative, got {value}"));
            }
        }
        if !(0.0..=1.0).contains(&self.morale_smoothing) {
            issues.push(format!(
                "morale_smoothing must be within 0..=1, got {}",
                self.morale_smoothing
            ));
        }
        issues
    }
}

/// Scheduling and rules for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Real time between economy ticks, in milliseconds.
    pub economy_period_ms: u64,
    /// Real time between allocation passes, in milliseconds.
    pub allocation_period_ms: u64,
    /// Allocation worker threads; 0 lets the pool pick.
    pub worker_threads: usize,
    /// Economy rules.
    pub rules: EconomyRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            economy_period_ms: 1000,
            allocation_period_ms: 500,
            worker_threads: 0,
            rules: EconomyRules::default(),
        }
    }
}

impl EngineConfig {
    /// Economy tick period.
    #[must_use]
    pub const fn economy_period(&self) -> Duration {
        Duration::from_millis(self.economy_period_ms)
    }

    /// Allocation pass period.
    #[must_use]
    pub const fn allocation_period(&self) -> Duration {
        Duration::from_millis(self.allocation_period_ms)
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Check the configuration; see [`EconomyRules::validate`].
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        self.rules.validate()
    }

    /// Fail with [`EconomyError::InvalidConfig`] if validation finds issues.
    pub fn check(&self) -> Result<()> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(EconomyError::InvalidConfig(issues))
        }
    }

    /// Parse and check a configuration from RON.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron).map_err(|e| EconomyError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load and check a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| EconomyError::DataParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let config: Self = ron::from_str(&contents).map_err(|e| EconomyError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.check()?;
        Ok(config)
    }
}
