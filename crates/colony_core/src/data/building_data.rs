//! Building type definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Data-driven building type definition.
///
/// Building types are immutable once loaded. A type declares its resource
/// table (what it needs and what it provides at full efficiency) and an
/// ordered list of upgrade levels that override parts of that table.
///
/// # Example RON
///
/// ```ron
/// BuildingType(
///     id: "solar_plant",
///     name: "Solar Plant",
///     kind: "PowerPlant",
///     hitpoints: 1000,
///     cost: 1500,
///     resources: { "worker": 10.0, "energy": 20.0 },
///     upgrades: [ Upgrade(resources: { "energy": 1.5 }) ],
///     limit: Unlimited,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Building kind, shared by related types (e.g. "MainBuilding").
    pub kind: String,

    /// Hit-point capacity; construction completes when progress reaches it.
    pub hitpoints: i32,

    /// Money deducted when construction starts.
    pub cost: i64,

    /// Resource amounts keyed by resource name.
    pub resources: BTreeMap<String, f64>,

    /// Upgrade levels; level `n` selects `upgrades[n - 1]`.
    #[serde(default)]
    pub upgrades: Vec<Upgrade>,

    /// How many of this type one planet may host.
    #[serde(default)]
    pub limit: BuildLimit,
}

/// One upgrade level of a building type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Upgrade {
    /// Description for the UI.
    #[serde(default)]
    pub description: String,

    /// Multipliers applied to the base amount of each listed resource.
    pub resources: BTreeMap<String, f64>,
}

/// Placement limit of a building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildLimit {
    /// Any number per planet.
    #[default]
    Unlimited,
    /// At most this many buildings of the same type per planet.
    PerType(u32),
    /// At most this many buildings of the same kind per planet.
    PerKind(u32),
}

impl BuildingType {
    /// Whether the base table declares `name`.
    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Base amount of a resource, ignoring upgrades.
    #[must_use]
    pub fn base_resource(&self, name: &str) -> Option<f64> {
        self.resources.get(name).copied()
    }

    /// Highest valid upgrade level.
    #[must_use]
    pub fn max_upgrade_level(&self) -> u32 {
        self.upgrades.len() as u32
    }

    /// Upgrade selected by `level`, `None` for the base level.
    #[must_use]
    pub fn upgrade(&self, level: u32) -> Option<&Upgrade> {
        if level == 0 {
            return None;
        }
        self.upgrades.get(level as usize - 1)
    }

    /// Amount of a resource at an upgrade level.
    ///
    /// An upgrade that lists the resource multiplies the base amount;
    /// otherwise the base amount is used unmodified.
    #[must_use]
    pub fn resource_at(&self, level: u32, name: &str) -> Option<f64> {
        let base = self.base_resource(name)?;
        let factor = self
            .upgrade(level)
            .and_then(|u| u.resources.get(name).copied())
            .unwrap_or(1.0);
        Some(base * factor)
    }

    /// Check the definition for obvious data errors.
    ///
    /// Returns a human-readable message for each problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.id.is_empty() {
            issues.push("building type has an empty id".to_string());
        }
        if self.hitpoints <= 0 {
            issues.push(format!("'{}': hitpoints must be positive", self.id));
        }
        if self.cost < 0 {
            issues.push(format!("'{}': cost must not be negative", self.id));
        }
        if let Some(worker) = self.base_resource(crate::resources::WORKER) {
            if worker < 0.0 {
                issues.push(format!("'{}': worker demand must not be negative", self.id));
            }
        }
        for (level, upgrade) in self.upgrades.iter().enumerate() {
            for name in upgrade.resources.keys() {
                if !self.has_resource(name) {
                    issues.push(format!(
                        "'{}': upgrade {} overrides undeclared resource '{}'",
                        self.id,
                        level + 1,
                        name
                    ));
                }
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> BuildingType {
        BuildingType {
            id: "plant".into(),
            name: "Plant".into(),
            kind: "PowerPlant".into(),
            hitpoints: 1000,
            cost: 100,
            resources: [("worker".to_string(), 10.0), ("energy".to_string(), 20.0)]
                .into_iter()
                .collect(),
            upgrades: vec![Upgrade {
                description: String::new(),
                resources: [("energy".to_string(), 1.5)].into_iter().collect(),
            }],
            limit: BuildLimit::Unlimited,
        }
    }

    #[test]
    fn test_upgrade_multiplies_listed_resource() {
        let ty = plant();
        assert_eq!(ty.resource_at(0, "energy"), Some(20.0));
        assert_eq!(ty.resource_at(1, "energy"), Some(30.0));
        // Not overridden by the upgrade
        assert_eq!(ty.resource_at(1, "worker"), Some(10.0));
        assert_eq!(ty.resource_at(1, "food"), None);
    }

    #[test]
    fn test_upgrade_level_lookup() {
        let ty = plant();
        assert!(ty.upgrade(0).is_none());
        assert!(ty.upgrade(1).is_some());
        assert!(ty.upgrade(2).is_none());
        assert_eq!(ty.max_upgrade_level(), 1);
    }

    #[test]
    fn test_validate_flags_bad_data() {
        let mut ty = plant();
        assert!(ty.validate().is_empty());

        ty.hitpoints = 0;
        ty.upgrades[0].resources.insert("food".into(), 2.0);
        let issues = ty.validate();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_deserialize_from_ron() {
        let ron = r#"
            BuildingType(
                id: "hub",
                kind: "MainBuilding",
                hitpoints: 4000,
                cost: 0,
                resources: { "house": 5000.0, "worker": 0.0 },
                limit: PerKind(1),
            )
        "#;
        let ty: BuildingType = ron::from_str(ron).unwrap();
        assert_eq!(ty.limit, BuildLimit::PerKind(1));
        assert!(ty.upgrades.is_empty());
        assert_eq!(ty.base_resource("house"), Some(5000.0));
    }
}
