//! Research (technology) definitions.

use serde::{Deserialize, Serialize};

use crate::resources::{LabAmounts, LabKind, ProductionCategory};

/// Data-driven research definition.
///
/// A research type is both a technology to fund and, once researched, an
/// item that can be put into production when it has a production
/// category.
///
/// # Example RON
///
/// ```ron
/// ResearchType(
///     id: "fighter_mk1",
///     category: "Spaceships",
///     research_cost: 2000,
///     production_cost: 400,
///     production: Some(Spaceship),
///     labs: LabRequirements(civil: 1, mechanical: 1),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchType {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Research tree category, for the UI.
    #[serde(default)]
    pub category: String,

    /// Money needed to complete the research.
    pub research_cost: i64,

    /// Money needed to produce one unit.
    #[serde(default)]
    pub production_cost: i64,

    /// Factory category that builds this item, if it can be built.
    #[serde(default)]
    pub production: Option<ProductionCategory>,

    /// Active laboratories needed to reach full progress.
    #[serde(default)]
    pub labs: LabRequirements,
}

/// Number of active laboratories a research needs per lab kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabRequirements {
    /// Civil engineering labs.
    #[serde(default)]
    pub civil: u32,
    /// Mechanical engineering labs.
    #[serde(default)]
    pub mechanical: u32,
    /// Computer labs.
    #[serde(default)]
    pub computer: u32,
    /// AI labs.
    #[serde(default)]
    pub ai: u32,
    /// Military labs.
    #[serde(default)]
    pub military: u32,
}

impl LabRequirements {
    /// Requirement for one lab kind.
    #[must_use]
    pub const fn get(&self, kind: LabKind) -> u32 {
        match kind {
            LabKind::Civil => self.civil,
            LabKind::Mechanical => self.mechanical,
            LabKind::Computer => self.computer,
            LabKind::Ai => self.ai,
            LabKind::Military => self.military,
        }
    }

    /// Sum of all requirements.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.civil + self.mechanical + self.computer + self.ai + self.military
    }

    /// Highest percent a research may reach with the given active labs.
    ///
    /// Each required lab counts toward the cap only up to its requirement,
    /// so surplus labs of one kind do not make up for missing labs of
    /// another. A research without requirements is capped at 100.
    #[must_use]
    pub fn max_percent(&self, active: &LabAmounts) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        let covered: f64 = LabKind::ALL
            .iter()
            .map(|&kind| {
                let required = f64::from(self.get(kind));
                active.get(kind).min(required)
            })
            .sum();
        100.0 * covered / f64::from(total)
    }
}

impl ResearchType {
    /// Whether finished research can be put into production.
    #[must_use]
    pub const fn is_producible(&self) -> bool {
        self.production.is_some()
    }

    /// Check the definition for obvious data errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.id.is_empty() {
            issues.push("research type has an empty id".to_string());
        }
        if self.research_cost <= 0 {
            issues.push(format!("'{}': research cost must be positive", self.id));
        }
        if self.production.is_some() && self.production_cost <= 0 {
            issues.push(format!(
                "'{}': producible research needs a positive production cost",
                self.id
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_percent_without_requirements() {
        let labs = LabRequirements::default();
        assert_eq!(labs.max_percent(&LabAmounts::default()), 100.0);
    }

    #[test]
    fn test_max_percent_partial_labs() {
        let labs = LabRequirements {
            civil: 1,
            mechanical: 1,
            ..Default::default()
        };
        let mut active = LabAmounts::default();
        active.add(LabKind::Civil, 3.0);
        // Surplus civil labs do not cover the missing mechanical lab
        assert_eq!(labs.max_percent(&active), 50.0);

        active.add(LabKind::Mechanical, 1.0);
        assert_eq!(labs.max_percent(&active), 100.0);
    }

    #[test]
    fn test_validate_producible_without_cost() {
        let ty = ResearchType {
            id: "laser".into(),
            name: String::new(),
            category: String::new(),
            research_cost: 100,
            production_cost: 0,
            production: Some(ProductionCategory::Weapon),
            labs: LabRequirements::default(),
        };
        assert_eq!(ty.validate().len(), 1);
    }
}
