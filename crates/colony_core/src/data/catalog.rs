//! Registry of loaded building and research definitions.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BuildingType, ResearchType};
use crate::error::{EconomyError, Result};

/// Serialized form of a catalog, as it appears in data files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Building definitions.
    #[serde(default)]
    pub buildings: Vec<BuildingType>,
    /// Research definitions.
    #[serde(default)]
    pub research: Vec<ResearchType>,
}

/// Read-only lookup of building and research types by id.
///
/// Types are shared via [`Arc`] so buildings and production lines can hold
/// a reference to their definition without copying it.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    buildings: BTreeMap<String, Arc<BuildingType>>,
    research: BTreeMap<String, Arc<ResearchType>>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from its serialized form.
    ///
    /// Later definitions replace earlier ones with the same id.
    #[must_use]
    pub fn from_data(data: CatalogData) -> Self {
        let mut catalog = Self::new();
        for ty in data.buildings {
            catalog.insert_building(ty);
        }
        for ty in data.research {
            catalog.insert_research(ty);
        }
        catalog
    }

    /// Parse a catalog from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let data: CatalogData = ron::from_str(ron).map_err(|e| EconomyError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_data(data))
    }

    /// Load a catalog from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| EconomyError::DataParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let data: CatalogData =
            ron::from_str(&contents).map_err(|e| EconomyError::DataParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let catalog = Self::from_data(data);
        tracing::debug!(
            path = %path.display(),
            buildings = catalog.buildings.len(),
            research = catalog.research.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Register a building type.
    pub fn insert_building(&mut self, ty: BuildingType) -> Arc<BuildingType> {
        let ty = Arc::new(ty);
        self.buildings.insert(ty.id.clone(), Arc::clone(&ty));
        ty
    }

    /// Register a research type.
    pub fn insert_research(&mut self, ty: ResearchType) -> Arc<ResearchType> {
        let ty = Arc::new(ty);
        self.research.insert(ty.id.clone(), Arc::clone(&ty));
        ty
    }

    /// Look up a building type.
    #[must_use]
    pub fn building(&self, id: &str) -> Option<&Arc<BuildingType>> {
        self.buildings.get(id)
    }

    /// Look up a research type.
    #[must_use]
    pub fn research(&self, id: &str) -> Option<&Arc<ResearchType>> {
        self.research.get(id)
    }

    /// Look up a building type or fail with [`EconomyError::UnknownBuildingType`].
    pub fn require_building(&self, id: &str) -> Result<Arc<BuildingType>> {
        self.building(id)
            .cloned()
            .ok_or_else(|| EconomyError::UnknownBuildingType(id.to_string()))
    }

    /// Look up a research type or fail with [`EconomyError::UnknownResearchType`].
    pub fn require_research(&self, id: &str) -> Result<Arc<ResearchType>> {
        self.research(id)
            .cloned()
            .ok_or_else(|| EconomyError::UnknownResearchType(id.to_string()))
    }

    /// All building types in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Arc<BuildingType>> {
        self.buildings.values()
    }

    /// All research types in id order.
    pub fn research_types(&self) -> impl Iterator<Item = &Arc<ResearchType>> {
        self.research.values()
    }

    /// Convert back into the serialized form.
    #[must_use]
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            buildings: self.buildings.values().map(|t| (**t).clone()).collect(),
            research: self.research.values().map(|t| (**t).clone()).collect(),
        }
    }

    /// Validate every definition.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .buildings
            .values()
            .flat_map(|ty| ty.validate())
            .collect();
        errors.extend(self.research.values().flat_map(|ty| ty.validate()));
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        CatalogData(
            buildings: [
                BuildingType(
                    id: "hub",
                    kind: "MainBuilding",
                    hitpoints: 4000,
                    cost: 0,
                    resources: { "house": 5000.0 },
                ),
            ],
            research: [
                ResearchType(
                    id: "laser",
                    research_cost: 1000,
                    production_cost: 100,
                    production: Some(Weapon),
                ),
            ],
        )
    "#;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_ron_str(CATALOG).unwrap();
        assert!(catalog.building("hub").is_some());
        assert!(catalog.research("laser").is_some());
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_require_unknown_type() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.require_building("nope"),
            Err(EconomyError::UnknownBuildingType(_))
        ));
        assert!(matches!(
            catalog.require_research("nope"),
            Err(EconomyError::UnknownResearchType(_))
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = Catalog::from_ron_str("CatalogData(buildings: [oops])");
        assert!(matches!(result, Err(EconomyError::DataParseError { .. })));
    }

    #[test]
    fn test_round_trip_through_data() {
        let catalog = Catalog::from_ron_str(CATALOG).unwrap();
        let again = Catalog::from_data(catalog.to_data());
        assert_eq!(again.buildings().count(), 1);
        assert_eq!(again.research_types().count(), 1);
    }
}
