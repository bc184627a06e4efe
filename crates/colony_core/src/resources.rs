//! Resource vocabulary shared by building definitions, statistics and the
//! economy tick.
//!
//! Resources are looked up by name in a building type's resource table.
//! `worker` is a positive head count a building needs to run. `energy` is
//! negative for consumers and positive for producers.

use serde::{Deserialize, Serialize};

/// Workers required to run the building.
pub const WORKER: &str = "worker";
/// Energy produced (positive) or consumed (negative).
pub const ENERGY: &str = "energy";
/// Housing capacity.
pub const HOUSE: &str = "house";
/// Food supply.
pub const FOOD: &str = "food";
/// Hospital capacity.
pub const HOSPITAL: &str = "hospital";
/// Police coverage.
pub const POLICE: &str = "police";
/// Flat morale boost.
pub const MORALE: &str = "morale";
/// Free repair coverage.
pub const REPAIR: &str = "repair";
/// Daily trade credit.
pub const CREDIT: &str = "credit";
/// Trade income multiplier.
pub const MULTIPLY: &str = "multiply";
/// Radar range, carried for the defence layer.
pub const RADAR: &str = "radar";

/// Building kind of the colony hub.
pub const COLONY_HUB_KIND: &str = "MainBuilding";

/// Kinds of research laboratories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabKind {
    /// Civil engineering.
    Civil,
    /// Mechanical engineering.
    Mechanical,
    /// Computers.
    Computer,
    /// Artificial intelligence.
    Ai,
    /// Military.
    Military,
}

impl LabKind {
    /// Every lab kind, in a fixed order.
    pub const ALL: [Self; 5] = [
        Self::Civil,
        Self::Mechanical,
        Self::Computer,
        Self::Ai,
        Self::Military,
    ];

    /// Resource name a lab building declares its capacity under.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Civil => "civil",
            Self::Mechanical => "mechanical",
            Self::Computer => "computer",
            Self::Ai => "ai",
            Self::Military => "military",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Production categories, each with its own factory capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductionCategory {
    /// Ships and stations.
    Spaceship,
    /// Ship equipment.
    Equipment,
    /// Weapons and ground units.
    Weapon,
}

impl ProductionCategory {
    /// Every category, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Spaceship, Self::Equipment, Self::Weapon];

    /// Resource name a factory declares its capacity under.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Spaceship => "spaceship",
            Self::Equipment => "equipment",
            Self::Weapon => "weapon",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Amount per lab kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabAmounts([f64; 5]);

impl LabAmounts {
    /// Amount for one lab kind.
    #[must_use]
    pub const fn get(&self, kind: LabKind) -> f64 {
        self.0[kind.index()]
    }

    /// Add to one lab kind.
    pub fn add(&mut self, kind: LabKind, amount: f64) {
        self.0[kind.index()] += amount;
    }

    /// Add another set component-wise.
    pub fn accumulate(&mut self, other: &Self) {
        for kind in LabKind::ALL {
            self.add(kind, other.get(kind));
        }
    }
}

/// Amount per production category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactoryAmounts([f64; 3]);

impl FactoryAmounts {
    /// Amount for one category.
    #[must_use]
    pub const fn get(&self, category: ProductionCategory) -> f64 {
        self.0[category.index()]
    }

    /// Add to one category.
    pub fn add(&mut self, category: ProductionCategory, amount: f64) {
        self.0[category.index()] += amount;
    }

    /// Add another set component-wise.
    pub fn accumulate(&mut self, other: &Self) {
        for category in ProductionCategory::ALL {
            self.add(category, other.get(category));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lab_amounts_accumulate() {
        let mut a = LabAmounts::default();
        a.add(LabKind::Civil, 1.0);
        let mut b = LabAmounts::default();
        b.add(LabKind::Civil, 0.5);
        b.add(LabKind::Ai, 2.0);

        a.accumulate(&b);
        assert!((a.get(LabKind::Civil) - 1.5).abs() < f64::EPSILON);
        assert!((a.get(LabKind::Ai) - 2.0).abs() < f64::EPSILON);
        assert_eq!(a.get(LabKind::Military), 0.0);
    }

    #[test]
    fn test_resource_names_are_distinct() {
        let mut names: Vec<&str> = LabKind::ALL.iter().map(|k| k.resource()).collect();
        names.extend(ProductionCategory::ALL.iter().map(|c| c.resource()));
        let len = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), len);
    }
}
