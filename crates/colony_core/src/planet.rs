//! Planets and their colonies.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingId, Location};
use crate::data::{BuildLimit, BuildingType};
use crate::economy::PlayerId;
use crate::error::{EconomyError, Result};
use crate::statistics::PlanetStatistics;

/// Identifier of a planet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "planet-{}", self.0)
    }
}

/// Tax level of a colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaxLevel {
    /// 0%.
    None,
    /// 10%.
    VeryLow,
    /// 20%.
    Low,
    /// 30%.
    #[default]
    Moderate,
    /// 40%.
    AboveModerate,
    /// 50%.
    High,
    /// 60%.
    VeryHigh,
    /// 70%.
    Oppressive,
    /// 80%.
    Exploiter,
    /// 100%.
    Slavery,
}

impl TaxLevel {
    /// Tax rate in percent.
    #[must_use]
    pub const fn percent(self) -> i64 {
        match self {
            Self::None => 0,
            Self::VeryLow => 10,
            Self::Low => 20,
            Self::Moderate => 30,
            Self::AboveModerate => 40,
            Self::High => 50,
            Self::VeryHigh => 60,
            Self::Oppressive => 70,
            Self::Exploiter => 80,
            Self::Slavery => 100,
        }
    }
}

/// Automatic construction mode, consumed by the AI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AutoBuild {
    /// No automatic construction.
    #[default]
    Off,
    /// Civil buildings only.
    Civil,
    /// Economy buildings.
    Economic,
    /// Factories.
    Factory,
    /// Morale and services.
    Social,
    /// Upgrade existing buildings.
    Upgrade,
    /// Let the AI decide.
    Ai,
}

/// Which allocation strategy a planet uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AllocationStrategyKind {
    /// Assign nothing.
    Zero,
    /// Spread workers and energy evenly.
    #[default]
    Uniform,
    /// Favor healthy buildings.
    DamageAware,
    /// Combat-time reallocation.
    Battle,
}

/// A planet and the colony on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    /// Identifier.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owning player, `None` while uncolonized.
    pub owner: Option<PlayerId>,
    /// Race of the colonists.
    pub race: Option<String>,
    /// Current population.
    pub population: i64,
    /// Population at the previous day rollover.
    pub last_population: i64,
    /// Current morale, `0..=100`.
    pub morale: i32,
    /// Morale at the previous day rollover.
    pub last_morale: i32,
    /// Tax level.
    pub tax: TaxLevel,
    /// Automatic construction mode.
    pub auto_build: AutoBuild,
    /// Allocation strategy.
    pub allocation: AllocationStrategyKind,
    /// Tax collected at the previous day rollover.
    pub tax_income: i64,
    /// Trade income collected at the previous day rollover.
    pub trade_income: i64,
    /// Buildings on the surface, in placement order.
    pub buildings: Vec<Building>,
    /// Identifier handed to the next placed building.
    pub next_building_id: u32,
}

impl Planet {
    /// Create an uncolonized planet.
    #[must_use]
    pub fn new(id: PlanetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner: None,
            race: None,
            population: 0,
            last_population: 0,
            morale: 50,
            last_morale: 50,
            tax: TaxLevel::default(),
            auto_build: AutoBuild::default(),
            allocation: AllocationStrategyKind::default(),
            tax_income: 0,
            trade_income: 0,
            buildings: Vec::new(),
            next_building_id: 1,
        }
    }

    /// Hand the planet to a player.
    pub fn colonize(&mut self, owner: PlayerId, race: impl Into<String>, population: i64) {
        self.owner = Some(owner);
        self.race = Some(race.into());
        self.population = population.max(0);
        self.last_population = self.population;
        self.morale = 50;
        self.last_morale = 50;
    }

    /// Revert the planet to uncolonized, clearing every building.
    pub fn surrender(&mut self) {
        self.owner = None;
        self.race = None;
        self.population = 0;
        self.buildings.clear();
        self.tax_income = 0;
        self.trade_income = 0;
    }

    /// Whether the planet has an owner.
    #[must_use]
    pub const fn is_colonized(&self) -> bool {
        self.owner.is_some()
    }

    /// Whether another building of `building_type` fits its placement limit.
    #[must_use]
    pub fn can_place(&self, building_type: &BuildingType) -> bool {
        match building_type.limit {
            BuildLimit::Unlimited => true,
            BuildLimit::PerType(max) => {
                self.count_where(|b| b.building_type.id == building_type.id) < max as usize
            }
            BuildLimit::PerKind(max) => {
                self.count_where(|b| b.building_type.kind == building_type.kind) < max as usize
            }
        }
    }

    fn count_where(&self, predicate: impl Fn(&Building) -> bool) -> usize {
        self.buildings.iter().filter(|b| predicate(b)).count()
    }

    /// Start construction of a building.
    ///
    /// Payment is the caller's business; see `World::build`.
    pub fn place_building(
        &mut self,
        building_type: Arc<BuildingType>,
        location: Location,
    ) -> Result<BuildingId> {
        if !self.can_place(&building_type) {
            return Err(EconomyError::BuildLimitReached(building_type.id.clone()));
        }
        let id = self.allocate_building_id();
        self.buildings
            .push(Building::new(id, building_type, location));
        Ok(id)
    }

    /// Add an already constructed building, ignoring placement limits.
    pub fn add_completed(&mut self, building_type: Arc<BuildingType>, location: Location) -> BuildingId {
        let id = self.allocate_building_id();
        self.buildings
            .push(Building::completed(id, building_type, location));
        id
    }

    fn allocate_building_id(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        id
    }

    /// Look up a building.
    #[must_use]
    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Look up a building for mutation.
    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == id)
    }

    /// Look up a building or fail.
    pub fn require_building_mut(&mut self, id: BuildingId) -> Result<&mut Building> {
        let planet = self.id;
        self.building_mut(id)
            .ok_or(EconomyError::BuildingNotFound { planet, building: id })
    }

    /// Demolish a building.
    pub fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        let index = self.buildings.iter().position(|b| b.id == id)?;
        Some(self.buildings.remove(index))
    }

    /// Recompute statistics from the current buildings.
    #[must_use]
    pub fn statistics(&self) -> PlanetStatistics {
        PlanetStatistics::compute(&self.buildings, self.population)
    }

    /// Workers available to the allocation strategies.
    #[must_use]
    pub fn available_workers(&self) -> i64 {
        self.population.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(id: &str, kind: &str, limit: BuildLimit) -> Arc<BuildingType> {
        Arc::new(BuildingType {
            id: id.into(),
            name: String::new(),
            kind: kind.into(),
            hitpoints: 100,
            cost: 10,
            resources: Default::default(),
            upgrades: Vec::new(),
            limit,
        })
    }

    #[test]
    fn test_tax_percent() {
        assert_eq!(TaxLevel::default().percent(), 30);
        assert_eq!(TaxLevel::None.percent(), 0);
        assert_eq!(TaxLevel::Slavery.percent(), 100);
    }

    #[test]
    fn test_place_respects_limits() {
        let mut planet = Planet::new(PlanetId(1), "Terra");
        let hub = ty("hub", "MainBuilding", BuildLimit::PerKind(1));
        let other_hub = ty("hub2", "MainBuilding", BuildLimit::PerKind(1));
        let lab = ty("lab", "Science", BuildLimit::PerType(2));

        planet.place_building(hub, Location::new(0, 0)).unwrap();
        assert!(matches!(
            planet.place_building(other_hub, Location::new(1, 0)),
            Err(EconomyError::BuildLimitReached(_))
        ));

        let a = planet.place_building(Arc::clone(&lab), Location::new(2, 0)).unwrap();
        let b = planet.place_building(Arc::clone(&lab), Location::new(3, 0)).unwrap();
        assert_ne!(a, b);
        assert!(!planet.can_place(&lab));

        planet.remove_building(a);
        assert!(planet.can_place(&lab));
    }

    #[test]
    fn test_surrender_clears_colony() {
        let mut planet = Planet::new(PlanetId(1), "Terra");
        planet.colonize(PlayerId(1), "human", 1000);
        planet.add_completed(ty("hub", "MainBuilding", BuildLimit::Unlimited), Location::default());
        assert!(planet.is_colonized());

        planet.surrender();
        assert!(!planet.is_colonized());
        assert!(planet.race.is_none());
        assert!(planet.buildings.is_empty());
    }
}
