//! Buildings placed on a planet surface.
//!
//! A [`Building`] is the long-lived mutable state of one structure: its
//! construction and damage progress, the workers and energy assigned to it
//! by the last allocation write-back, its upgrade level and the player's
//! toggles. Static numbers come from its [`BuildingType`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::BuildingType;
use crate::efficiency;
use crate::error::{EconomyError, Result};

/// Identifier of a building, unique within its planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Surface tile of a building's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Location {
    /// Create a location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A building on a planet.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// Identifier within the planet.
    pub id: BuildingId,
    /// Static definition.
    pub building_type: Arc<BuildingType>,
    /// Placement on the surface.
    pub location: Location,
    /// Construction progress, `0..=type.hitpoints`.
    pub build_progress: i32,
    /// Current hit points, `0..=type.hitpoints`.
    pub hitpoints: i32,
    /// Energy assigned by the last allocation write-back.
    ///
    /// Consumers carry the sign of their demand (negative).
    pub assigned_energy: i32,
    /// Workers assigned by the last allocation write-back.
    pub assigned_worker: i32,
    /// Active upgrade, 0 for the base level.
    pub upgrade_level: u32,
    /// Player toggle; disabled buildings are not staffed.
    pub enabled: bool,
    /// Whether damage is being repaired.
    pub repairing: bool,
}

impl Building {
    /// Create a building whose construction just started.
    #[must_use]
    pub fn new(id: BuildingId, building_type: Arc<BuildingType>, location: Location) -> Self {
        Self {
            id,
            building_type,
            location,
            build_progress: 0,
            hitpoints: 0,
            assigned_energy: 0,
            assigned_worker: 0,
            upgrade_level: 0,
            enabled: true,
            repairing: false,
        }
    }

    /// Create a fully constructed, undamaged building.
    #[must_use]
    pub fn completed(id: BuildingId, building_type: Arc<BuildingType>, location: Location) -> Self {
        let hp = building_type.hitpoints;
        Self {
            build_progress: hp,
            hitpoints: hp,
            ..Self::new(id, building_type, location)
        }
    }

    /// Hit-point capacity of the type.
    #[must_use]
    pub fn max_hitpoints(&self) -> i32 {
        self.building_type.hitpoints
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.build_progress >= self.max_hitpoints()
    }

    /// Whether a completed building has lost hit points.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.is_complete() && self.hitpoints < self.max_hitpoints()
    }

    /// Whether the building is at or below half of its hit points.
    #[must_use]
    pub fn is_severely_damaged(&self) -> bool {
        self.hitpoints * 2 <= self.max_hitpoints()
    }

    /// Hit points as a fraction of capacity.
    #[must_use]
    pub fn health_ratio(&self) -> f64 {
        let max = self.max_hitpoints();
        if max <= 0 {
            return 0.0;
        }
        f64::from(self.hitpoints) / f64::from(max)
    }

    /// Get construction progress as a percentage (0-100).
    #[must_use]
    pub fn construction_percentage(&self) -> u32 {
        let max = self.max_hitpoints();
        if max <= 0 {
            return 100;
        }
        (self.build_progress.clamp(0, max) as u32 * 100) / max as u32
    }

    /// Whether the active resource table declares `name`.
    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.building_type.has_resource(name)
    }

    /// Resource amount with the active upgrade applied, if declared.
    #[must_use]
    pub fn try_resource(&self, name: &str) -> Option<f64> {
        self.building_type.resource_at(self.upgrade_level, name)
    }

    /// Resource amount with the active upgrade applied.
    ///
    /// Callers must check [`has_resource`](Self::has_resource) first; an
    /// undeclared resource is a programming error that asserts in debug
    /// builds and reads as zero otherwise.
    #[must_use]
    pub fn resource(&self, name: &str) -> f64 {
        debug_assert!(
            self.has_resource(name),
            "building type '{}' does not declare resource '{}'",
            self.building_type.id,
            name
        );
        self.try_resource(name).unwrap_or_else(|| {
            tracing::error!(
                building_type = %self.building_type.id,
                resource = name,
                "Undeclared resource looked up"
            );
            0.0
        })
    }

    /// Operational efficiency in `[0, 1]`.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        efficiency::efficiency(self)
    }

    /// Whether the building currently produces anything.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        efficiency::is_operational(self.efficiency())
    }

    /// Output of a declared resource scaled by current efficiency.
    ///
    /// Returns zero for undeclared resources.
    #[must_use]
    pub fn primary_output(&self, name: &str) -> f64 {
        self.try_resource(name)
            .map_or(0.0, |amount| amount * self.efficiency())
    }

    /// Select an upgrade level.
    pub fn set_upgrade(&mut self, level: u32) -> Result<()> {
        let max = self.building_type.max_upgrade_level();
        if level > max {
            return Err(EconomyError::InvalidUpgradeLevel {
                building_type: self.building_type.id.clone(),
                level,
                max,
            });
        }
        self.upgrade_level = level;
        Ok(())
    }

    /// Enable or disable the building. Disabling drops its assignment.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear_assignment();
        }
    }

    /// Start or stop repairing.
    pub fn set_repairing(&mut self, repairing: bool) {
        self.repairing = repairing;
    }

    /// Drop the current worker/energy assignment.
    pub fn clear_assignment(&mut self) {
        self.assigned_energy = 0;
        self.assigned_worker = 0;
    }

    /// Advance construction by `points`, clamped to the type's capacity.
    ///
    /// Returns `true` if this call completed the building.
    pub fn construct(&mut self, points: i32) -> bool {
        if self.is_complete() {
            return false;
        }
        let max = self.max_hitpoints();
        self.build_progress = (self.build_progress + points).min(max);
        self.hitpoints = (self.hitpoints + points).min(max);
        self.is_complete()
    }

    /// Restore up to `points` hit points.
    ///
    /// Returns `true` once the building is fully repaired; the repairing
    /// flag is cleared at that point.
    pub fn repair(&mut self, points: i32) -> bool {
        let max = self.max_hitpoints();
        self.hitpoints = (self.hitpoints + points).min(max);
        if self.hitpoints >= max {
            self.repairing = false;
            true
        } else {
            false
        }
    }

    /// Apply damage, never dropping below zero.
    pub fn damage(&mut self, points: i32) {
        self.hitpoints = (self.hitpoints - points).max(0);
    }
}
