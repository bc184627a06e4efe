//! Saving and restoring the economy.
//!
//! A [`WorldSave`] holds the mutable state of every player, planet and
//! building. Type definitions are not saved: records refer to them by id
//! and are rebound against a [`Catalog`] on restore.
//!
//! Two encodings are supported: pretty RON for inspection and bincode for
//! compact storage. [`WorldSave::save`] picks RON for `.ron` paths and
//! bincode otherwise.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingId, Location};
use crate::data::Catalog;
use crate::economy::{DailyLedger, Player, PlayerId};
use crate::error::PersistenceError;
use crate::planet::{AllocationStrategyKind, AutoBuild, Planet, PlanetId, TaxLevel};
use crate::production::ProductionLine;
use crate::research::{Research, ResearchState};
use crate::resources::ProductionCategory;
use crate::time::GameTime;
use crate::world::World;

/// Save format version for compatibility.
pub const SAVE_VERSION: u32 = 1;

type Result<T> = std::result::Result<T, PersistenceError>;

/// Saved state of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    /// Identifier within the planet.
    pub id: BuildingId,
    /// Building type id.
    pub building_type: String,
    /// Placement.
    pub location: Location,
    /// Construction progress.
    pub build_progress: i32,
    /// Hit points.
    pub hitpoints: i32,
    /// Assigned energy.
    pub assigned_energy: i32,
    /// Assigned workers.
    pub assigned_worker: i32,
    /// Upgrade level.
    pub upgrade_level: u32,
    /// Enabled toggle.
    pub enabled: bool,
    /// Repairing toggle.
    pub repairing: bool,
}

/// Saved state of one planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetRecord {
    /// Identifier.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Owner.
    pub owner: Option<PlayerId>,
    /// Colonist race.
    pub race: Option<String>,
    /// Population.
    pub population: i64,
    /// Population at the previous rollover.
    pub last_population: i64,
    /// Morale.
    pub morale: i32,
    /// Morale at the previous rollover.
    pub last_morale: i32,
    /// Tax level.
    pub tax: TaxLevel,
    /// Automatic construction mode.
    pub auto_build: AutoBuild,
    /// Allocation strategy.
    pub allocation: AllocationStrategyKind,
    /// Tax income of the previous day.
    pub tax_income: i64,
    /// Trade income of the previous day.
    pub trade_income: i64,
    /// Next building id.
    pub next_building_id: u32,
    /// Buildings.
    pub buildings: Vec<BuildingRecord>,
}

/// Saved state of one production line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Category the line belongs to.
    pub category: ProductionCategory,
    /// Item type id.
    pub research_type: String,
    /// Units still to build.
    pub count: i32,
    /// Money accumulated toward the current unit.
    pub progress: i64,
    /// Capacity share weight.
    pub priority: u32,
}

/// Saved state of one research in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
    /// Research type id.
    pub research_type: String,
    /// Assigned funding.
    pub assigned_money: i64,
    /// Money still needed.
    pub remaining_money: i64,
    /// Funding state.
    pub state: ResearchState,
    /// Whether this is the running research.
    pub running: bool,
}

/// Saved state of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Race.
    pub race: String,
    /// Treasury.
    pub money: i64,
    /// Production lines of every category.
    pub production: Vec<ProductionRecord>,
    /// Research in progress.
    pub research: Vec<ResearchRecord>,
    /// Finished research.
    pub available_technologies: BTreeSet<String>,
    /// Finished units in storage.
    pub inventory: BTreeMap<String, i64>,
    /// Money flows so far today.
    pub today: DailyLedger,
    /// Money flows of the previous day.
    pub yesterday: DailyLedger,
}

/// Everything needed to restore a [`World`] given its catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSave {
    /// Format version.
    pub version: u32,
    /// In-game time.
    pub time: GameTime,
    /// Players in id order.
    pub players: Vec<PlayerRecord>,
    /// Planets in id order.
    pub planets: Vec<PlanetRecord>,
}

impl BuildingRecord {
    fn capture(building: &Building) -> Self {
        Self {
            id: building.id,
            building_type: building.building_type.id.clone(),
            location: building.location,
            build_progress: building.build_progress,
            hitpoints: building.hitpoints,
            assigned_energy: building.assigned_energy,
            assigned_worker: building.assigned_worker,
            upgrade_level: building.upgrade_level,
            enabled: building.enabled,
            repairing: building.repairing,
        }
    }

    fn restore(self, catalog: &Catalog) -> Result<Building> {
        let building_type = catalog
            .building(&self.building_type)
            .cloned()
            .ok_or(PersistenceError::UnknownType {
                kind: "building",
                id: self.building_type,
            })?;
        Ok(Building {
            id: self.id,
            building_type,
            location: self.location,
            build_progress: self.build_progress,
            hitpoints: self.hitpoints,
            assigned_energy: self.assigned_energy,
            assigned_worker: self.assigned_worker,
            upgrade_level: self.upgrade_level,
            enabled: self.enabled,
            repairing: self.repairing,
        })
    }
}

impl PlanetRecord {
    fn capture(planet: &Planet) -> Self {
        Self {
            id: planet.id,
            name: planet.name.clone(),
            owner: planet.owner,
            race: planet.race.clone(),
            population: planet.population,
            last_population: planet.last_population,
            morale: planet.morale,
            last_morale: planet.last_morale,
            tax: planet.tax,
            auto_build: planet.auto_build,
            allocation: planet.allocation,
            tax_income: planet.tax_income,
            trade_income: planet.trade_income,
            next_building_id: planet.next_building_id,
            buildings: planet.buildings.iter().map(BuildingRecord::capture).collect(),
        }
    }

    fn restore(self, catalog: &Catalog) -> Result<Planet> {
        let buildings = self
            .buildings
            .into_iter()
            .map(|record| record.restore(catalog))
            .collect::<Result<Vec<_>>>()?;
        Ok(Planet {
            id: self.id,
            name: self.name,
            owner: self.owner,
            race: self.race,
            population: self.population,
            last_population: self.last_population,
            morale: self.morale,
            last_morale: self.last_morale,
            tax: self.tax,
            auto_build: self.auto_build,
            allocation: self.allocation,
            tax_income: self.tax_income,
            trade_income: self.trade_income,
            buildings,
            next_building_id: self.next_building_id,
        })
    }
}

fn research_type(catalog: &Catalog, id: String) -> Result<std::sync::Arc<crate::data::ResearchType>> {
    catalog
        .research(&id)
        .cloned()
        .ok_or(PersistenceError::UnknownType { kind: "research", id })
}

impl PlayerRecord {
    fn capture(player: &Player) -> Self {
        let production = player
            .production
            .iter()
            .flat_map(|(&category, queue)| {
                queue.lines().map(move |line| ProductionRecord {
                    category,
                    research_type: line.research_type.id.clone(),
                    count: line.count,
                    progress: line.progress,
                    priority: line.priority,
                })
            })
            .collect();
        let research = player
            .research
            .iter()
            .map(|(id, research)| ResearchRecord {
                research_type: id.clone(),
                assigned_money: research.assigned_money,
                remaining_money: research.remaining_money,
                state: research.state,
                running: player.running_research.as_deref() == Some(id.as_str()),
            })
            .collect();
        Self {
            id: player.id,
            name: player.name.clone(),
            race: player.race.clone(),
            money: player.money,
            production,
            research,
            available_technologies: player.available_technologies.clone(),
            inventory: player.inventory.clone(),
            today: player.today,
            yesterday: player.yesterday,
        }
    }

    fn restore(self, catalog: &Catalog) -> Result<Player> {
        let mut player = Player::new(self.id, self.name, self.race, self.money);
        player.available_technologies = self.available_technologies;
        player.inventory = self.inventory;
        player.today = self.today;
        player.yesterday = self.yesterday;

        for record in self.production {
            let line = ProductionLine {
                research_type: research_type(catalog, record.research_type)?,
                count: record.count,
                progress: record.progress,
                priority: record.priority,
            };
            player.production_queue_mut(record.category).insert(line);
        }
        for record in self.research {
            let research = Research {
                research_type: research_type(catalog, record.research_type.clone())?,
                remaining_money: record.remaining_money,
                assigned_money: record.assigned_money,
                state: record.state,
            };
            if record.running {
                player.running_research = Some(record.research_type.clone());
            }
            player.research.insert(record.research_type, research);
        }
        Ok(player)
    }
}

impl WorldSave {
    /// Capture the mutable state of a world.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        Self {
            version: SAVE_VERSION,
            time: world.time,
            players: world.players.values().map(PlayerRecord::capture).collect(),
            planets: world.planets.values().map(PlanetRecord::capture).collect(),
        }
    }

    /// Rebuild a world, rebinding type ids against `catalog`.
    pub fn restore(self, catalog: Catalog) -> Result<World> {
        self.check_version()?;
        let mut world = World::new(catalog);
        world.time = self.time;
        for record in self.players {
            let player = record.restore(&world.catalog)?;
            world.add_player(player);
        }
        for record in self.planets {
            let planet = record.restore(&world.catalog)?;
            world.add_planet(planet);
        }
        Ok(world)
    }

    fn check_version(&self) -> Result<()> {
        if self.version == SAVE_VERSION {
            Ok(())
        } else {
            Err(PersistenceError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            })
        }
    }

    /// Encode as bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let save: Self = bincode::deserialize(bytes)?;
        save.check_version()?;
        Ok(save)
    }

    /// Encode as pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Decode from RON.
    pub fn from_ron(text: &str) -> Result<Self> {
        let save: Self = ron::from_str(text)?;
        save.check_version()?;
        Ok(save)
    }

    /// Write to a file; `.ron` paths are written as RON, others as bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if is_ron(path) {
            std::fs::write(path, self.to_ron()?)?;
        } else {
            std::fs::write(path, self.to_bytes()?)?;
        }
        tracing::debug!(path = %path.display(), "Saved world");
        Ok(())
    }

    /// Read a file written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if is_ron(path) {
            Self::from_ron(&std::fs::read_to_string(path)?)
        } else {
            Self::from_bytes(&std::fs::read(path)?)
        }
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ron")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BuildingType, LabRequirements, ResearchType};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_building(BuildingType {
            id: "hub".into(),
            name: String::new(),
            kind: "MainBuilding".into(),
            hitpoints: 1000,
            cost: 0,
            resources: Default::default(),
            upgrades: Vec::new(),
            limit: Default::default(),
        });
        catalog.insert_research(ResearchType {
            id: "fighter".into(),
            name: String::new(),
            category: String::new(),
            research_cost: 100,
            production_cost: 40,
            production: Some(ProductionCategory::Spaceship),
            labs: LabRequirements::default(),
        });
        catalog
    }

    fn world() -> World {
        let mut world = World::new(catalog());
        let mut player = Player::new(PlayerId(3), "Alice", "human", 1234);
        player.complete_research("fighter");
        let fighter = world.catalog.require_research("fighter").unwrap();
        player.add_production(fighter, 4).unwrap();
        world.add_player(player);

        let mut planet = Planet::new(PlanetId(7), "Terra");
        planet.colonize(PlayerId(3), "human", 4321);
        planet.tax = TaxLevel::High;
        let hub = world.catalog.require_building("hub").unwrap();
        let id = planet.add_completed(hub, Location::new(2, 5));
        let building = planet.building_mut(id).unwrap();
        building.damage(300);
        building.set_repairing(true);
        building.assigned_worker = 12;
        building.assigned_energy = -7;
        world.add_planet(planet);
        world.time = GameTime::from_minutes(12_345);
        world
    }

    #[test]
    fn test_bincode_round_trip() {
        let save = WorldSave::capture(&world());
        let decoded = WorldSave::from_bytes(&save.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, save);
    }

    #[test]
    fn test_ron_round_trip_restores_world() {
        let original = world();
        let save = WorldSave::capture(&original);
        let restored = WorldSave::from_ron(&save.to_ron().unwrap())
            .unwrap()
            .restore(catalog())
            .unwrap();

        assert_eq!(restored.time, original.time);
        assert_eq!(restored.planets, original.planets);
        assert_eq!(restored.players, original.players);
    }

    #[test]
    fn test_version_mismatch() {
        let mut save = WorldSave::capture(&world());
        save.version = SAVE_VERSION + 1;
        let bytes = save.to_bytes().unwrap();
        assert!(matches!(
            WorldSave::from_bytes(&bytes),
            Err(PersistenceError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        let save = WorldSave::capture(&world());
        let err = save.restore(Catalog::new()).unwrap_err();
        assert!(matches!(err, PersistenceError::UnknownType { .. }));
    }
}
