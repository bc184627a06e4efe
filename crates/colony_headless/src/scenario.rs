//! Scenario loading and world setup.
//!
//! A scenario carries everything a headless run needs: the building and
//! research catalog, the engine configuration, and the starting players
//! and planets.

use std::collections::BTreeSet;
use std::path::Path;

use colony_core::buildings::Location;
use colony_core::config::EngineConfig;
use colony_core::data::{Catalog, CatalogData};
use colony_core::economy::{Player, PlayerId};
use colony_core::error::{EconomyError, PersistenceError};
use colony_core::planet::{AllocationStrategyKind, Planet, PlanetId, TaxLevel};
use colony_core::world::World;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario refers to something that does not exist.
    #[error("Invalid scenario: {0}")]
    Economy(#[from] EconomyError),
    /// Saving or loading failed.
    #[error("Save error: {0}")]
    Persistence(#[from] PersistenceError),
    /// Data checks failed.
    #[error("Scenario has {} data issue(s)", .0.len())]
    InvalidData(Vec<String>),
    /// Writing a report failed.
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Engine configuration.
    #[serde(default)]
    pub config: EngineConfig,
    /// Building and research definitions.
    pub catalog: CatalogData,
    /// Starting players.
    pub players: Vec<PlayerSetup>,
    /// Starting planets.
    pub planets: Vec<PlanetSetup>,
}

/// Starting state of a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Race.
    #[serde(default = "default_race")]
    pub race: String,
    /// Treasury.
    pub money: i64,
    /// Technologies already researched.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Research to run from the start.
    #[serde(default)]
    pub research: Option<ResearchSetup>,
    /// Production orders.
    #[serde(default)]
    pub production: Vec<ProductionSetup>,
}

/// A research to start with its funding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSetup {
    /// Research type id.
    pub id: String,
    /// Money assigned to it.
    pub money: i64,
}

/// A production order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSetup {
    /// Research type id of the item.
    pub item: String,
    /// Units to build.
    pub count: i32,
    /// Line priority; the default priority when absent.
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Starting state of a planet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetSetup {
    /// Planet id.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Owning player; uncolonized when absent.
    #[serde(default)]
    pub owner: Option<u32>,
    /// Starting population.
    #[serde(default)]
    pub population: i64,
    /// Tax level.
    #[serde(default)]
    pub tax: TaxLevel,
    /// Allocation strategy.
    #[serde(default)]
    pub allocation: AllocationStrategyKind,
    /// Starting buildings.
    #[serde(default)]
    pub buildings: Vec<BuildingPlacement>,
}

/// A building placed at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Building type id.
    pub kind: String,
    /// Top-left tile.
    pub position: (i32, i32),
    /// Start as a construction site instead of a finished building.
    #[serde(default)]
    pub under_construction: bool,
}

impl BuildingPlacement {
    /// A finished building.
    #[must_use]
    pub fn new(kind: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            kind: kind.into(),
            position: (x, y),
            under_construction: false,
        }
    }
}

fn default_race() -> String {
    "human".to_string()
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        tracing::debug!(path = %path.display(), name = %scenario.name, "Loaded scenario");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The scenario's catalog.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::from_data(self.catalog.clone())
    }

    /// Check the catalog and every reference the scenario makes.
    ///
    /// Returns one message per issue; an empty list means the scenario is
    /// usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let catalog = self.catalog();
        let mut issues = catalog.validate();
        issues.extend(
            self.config
                .validate()
                .into_iter()
                .map(|issue| format!("config: {issue}")),
        );

        let mut player_ids = BTreeSet::new();
        for player in &self.players {
            if !player_ids.insert(player.id) {
                issues.push(format!("player {} is defined twice", player.id));
            }
            let research = player.research.iter().map(|r| &r.id);
            let items = player.production.iter().map(|p| &p.item);
            for id in player.technologies.iter().chain(research).chain(items) {
                if catalog.research(id).is_none() {
                    issues.push(format!("player {}: unknown research '{id}'", player.id));
                }
            }
            for order in &player.production {
                match catalog.research(&order.item) {
                    Some(item) if !item.is_producible() => {
                        issues.push(format!(
                            "player {}: '{}' cannot be produced",
                            player.id, order.item
                        ));
                    }
                    _ => {}
                }
                if !player.technologies.contains(&order.item) {
                    issues.push(format!(
                        "player {}: '{}' is queued before it is researched",
                        player.id, order.item
                    ));
                }
                if order.count <= 0 {
                    issues.push(format!(
                        "player {}: production count for '{}' must be positive",
                        player.id, order.item
                    ));
                }
            }
        }

        let mut planet_ids = BTreeSet::new();
        for planet in &self.planets {
            if !planet_ids.insert(planet.id) {
                issues.push(format!("planet {} is defined twice", planet.id));
            }
            if let Some(owner) = planet.owner {
                if !player_ids.contains(&owner) {
                    issues.push(format!("planet {}: unknown owner {owner}", planet.id));
                }
            } else if !planet.buildings.is_empty() {
                issues.push(format!("planet {}: buildings on an uncolonized planet", planet.id));
            }
            if planet.population < 0 {
                issues.push(format!("planet {}: negative population", planet.id));
            }
            for placement in &planet.buildings {
                if catalog.building(&placement.kind).is_none() {
                    issues.push(format!(
                        "planet {}: unknown building type '{}'",
                        planet.id, placement.kind
                    ));
                }
            }
        }
        issues
    }

    /// Build the starting world.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        let issues = self.validate();
        if !issues.is_empty() {
            for issue in &issues {
                tracing::error!(scenario = %self.name, "{issue}");
            }
            return Err(ScenarioError::InvalidData(issues));
        }

        let mut world = World::new(self.catalog());
        for setup in &self.players {
            world.add_player(Player::new(
                PlayerId(setup.id),
                setup.name.clone(),
                setup.race.clone(),
                setup.money,
            ));
        }
        for setup in &self.planets {
            Self::add_planet(&mut world, setup)?;
        }
        for setup in &self.players {
            Self::setup_player(&mut world, setup)?;
        }

        tracing::info!(
            scenario = %self.name,
            players = world.players.len(),
            planets = world.planets.len(),
            "World ready"
        );
        Ok(world)
    }

    fn add_planet(world: &mut World, setup: &PlanetSetup) -> Result<(), ScenarioError> {
        let id = PlanetId(setup.id);
        world.add_planet(Planet::new(id, setup.name.clone()));
        let Some(owner) = setup.owner else {
            return Ok(());
        };
        world.colonize(id, PlayerId(owner), setup.population)?;

        let catalog = world.catalog.clone();
        let planet = world.planet_mut(id)?;
        planet.tax = setup.tax;
        planet.allocation = setup.allocation;
        for placement in &setup.buildings {
            let building_type = catalog.require_building(&placement.kind)?;
            let location = Location::new(placement.position.0, placement.position.1);
            if placement.under_construction {
                planet.place_building(building_type, location)?;
            } else {
                planet.add_completed(building_type, location);
            }
        }
        Ok(())
    }

    fn setup_player(world: &mut World, setup: &PlayerSetup) -> Result<(), ScenarioError> {
        let id = PlayerId(setup.id);
        for technology in &setup.technologies {
            world.player_mut(id)?.complete_research(technology);
        }
        if let Some(research) = &setup.research {
            world.start_research(id, &research.id)?;
            world
                .player_mut(id)?
                .assign_research_money(&research.id, research.money)?;
        }
        for order in &setup.production {
            world.add_production(id, &order.item, order.count)?;
            let item = world.catalog.require_research(&order.item)?;
            if let (Some(priority), Some(category)) = (order.priority, item.production) {
                world
                    .player_mut(id)?
                    .production_queue_mut(category)
                    .set_priority(&order.item, priority);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::resources::ProductionCategory;

    const FRONTIER: &str = include_str!("../scenarios/frontier.ron");

    #[test]
    fn test_frontier_parses_and_validates() {
        let scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        assert_eq!(scenario.players.len(), 2);
        assert!(scenario.validate().is_empty(), "{:?}", scenario.validate());
    }

    #[test]
    fn test_build_world() {
        let scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        let world = scenario.build_world().unwrap();

        assert_eq!(world.players.len(), 2);
        let first = &world.players[&PlayerId(1)];
        assert!(first.running().is_some());
        assert!(first.is_available("fighter"));
        assert!(!first
            .production_queue(ProductionCategory::Spaceship)
            .unwrap()
            .is_empty());

        let capital = &world.planets[&PlanetId(1)];
        assert_eq!(capital.owner, Some(PlayerId(1)));
        assert!(capital.buildings.iter().any(|b| !b.is_complete()));
        assert!(!world.planets[&PlanetId(3)].is_colonized());
    }

    #[test]
    fn test_validate_reports_bad_references() {
        let mut scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        scenario.planets[0].owner = Some(42);
        scenario.planets[0]
            .buildings
            .push(BuildingPlacement::new("moon_base", 0, 0));
        scenario.players[0].technologies.push("warp".into());

        let issues = scenario.validate();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::InvalidData(found)) if found == issues
        ));
    }

    #[test]
    fn test_validate_reports_bad_rules() {
        let mut scenario = Scenario::from_ron_str(FRONTIER).unwrap();
        scenario.config.rules.tick_minutes = 0;
        scenario.config.rules.morale_smoothing = -0.5;

        let issues = scenario.validate();
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues.iter().all(|issue| issue.starts_with("config: ")));
        assert!(matches!(
            scenario.build_world(),
            Err(ScenarioError::InvalidData(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Scenario::from_ron_str("Scenario(name: 1)"),
            Err(ScenarioError::ParseError(_))
        ));
    }
}
