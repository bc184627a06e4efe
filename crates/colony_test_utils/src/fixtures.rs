//! Test fixtures and helpers.
//!
//! A small but complete building and research catalog, plus builders for
//! worlds using it.

use colony_core::buildings::Location;
use colony_core::data::Catalog;
use colony_core::economy::{Player, PlayerId};
use colony_core::planet::{Planet, PlanetId, TaxLevel};
use colony_core::world::World;

/// Catalog used across tests, in the same RON format as the game data.
pub const SAMPLE_CATALOG_RON: &str = r#"(
    buildings: [
        (
            id: "colony_hub",
            name: "Colony Hub",
            kind: "MainBuilding",
            hitpoints: 4000,
            cost: 0,
            resources: { "house": 5000.0, "food": 5000.0, "hospital": 5000.0, "police": 5000.0, "morale": 5.0 },
            limit: PerKind(1),
        ),
        (
            id: "solar_plant",
            name: "Solar Plant",
            kind: "PowerPlant",
            hitpoints: 1000,
            cost: 1500,
            resources: { "worker": 10.0, "energy": 20.0 },
            upgrades: [ (description: "Improved cells", resources: { "energy": 1.5 }) ],
        ),
        (
            id: "research_lab",
            name: "Research Lab",
            kind: "Science",
            hitpoints: 1000,
            cost: 2000,
            resources: { "worker": 10.0, "energy": -10.0, "civil": 1.0, "mechanical": 1.0 },
        ),
        (
            id: "shipyard",
            name: "Shipyard",
            kind: "Factory",
            hitpoints: 2000,
            cost: 3000,
            resources: { "worker": 20.0, "energy": -15.0, "spaceship": 100.0 },
        ),
        (
            id: "trade_center",
            name: "Trade Center",
            kind: "Trade",
            hitpoints: 1000,
            cost: 1000,
            resources: { "worker": 5.0, "energy": -5.0, "credit": 200.0 },
        ),
        (
            id: "stock_exchange",
            name: "Stock Exchange",
            kind: "Trade",
            hitpoints: 1000,
            cost: 2500,
            resources: { "worker": 5.0, "multiply": 1.5 },
            limit: PerType(1),
        ),
        (
            id: "repair_dock",
            name: "Repair Dock",
            kind: "Repair",
            hitpoints: 1000,
            cost: 1200,
            resources: { "worker": 5.0, "energy": -5.0, "repair": 1.0 },
        ),
    ],
    research: [
        (
            id: "fusion",
            name: "Fusion Power",
            category: "Buildings",
            research_cost: 600,
            labs: (civil: 1),
        ),
        (
            id: "fighter",
            name: "Fighter",
            category: "Spaceships",
            research_cost: 400,
            production_cost: 300,
            production: Some(Spaceship),
            labs: (mechanical: 1),
        ),
    ],
)"#;

/// The sample catalog.
///
/// # Panics
///
/// Panics if [`SAMPLE_CATALOG_RON`] does not parse.
#[must_use]
pub fn sample_catalog() -> Catalog {
    Catalog::from_ron_str(SAMPLE_CATALOG_RON).expect("sample catalog parses")
}

/// Builder for test worlds.
#[derive(Debug)]
pub struct WorldBuilder {
    world: World,
}

impl WorldBuilder {
    /// Start from an empty world with the sample catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(sample_catalog())
    }

    /// Start from an empty world with the given catalog.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            world: World::new(catalog),
        }
    }

    /// Add a player.
    #[must_use]
    pub fn player(mut self, id: u32, money: i64) -> Self {
        self.world
            .add_player(Player::new(PlayerId(id), format!("Player {id}"), "human", money));
        self
    }

    /// Add an uncolonized planet.
    #[must_use]
    pub fn planet(mut self, id: u32) -> Self {
        self.world
            .add_planet(Planet::new(PlanetId(id), format!("Planet {id}")));
        self
    }

    /// Add a planet colonized by `owner` with no tax.
    ///
    /// # Panics
    ///
    /// Panics if `owner` was not added first.
    #[must_use]
    pub fn colony(mut self, id: u32, owner: u32, population: i64) -> Self {
        self = self.planet(id);
        self.world
            .colonize(PlanetId(id), PlayerId(owner), population)
            .expect("owner exists");
        self.world
            .planets
            .get_mut(&PlanetId(id))
            .expect("planet exists")
            .tax = TaxLevel::None;
        self
    }

    /// Add completed buildings to a planet, one per type id.
    ///
    /// # Panics
    ///
    /// Panics if the planet or a type is unknown.
    #[must_use]
    pub fn buildings(mut self, planet: u32, type_ids: &[&str]) -> Self {
        for (index, type_id) in type_ids.iter().enumerate() {
            let building_type = self
                .world
                .catalog
                .require_building(type_id)
                .expect("building type exists");
            self.world
                .planets
                .get_mut(&PlanetId(planet))
                .expect("planet exists")
                .add_completed(building_type, Location::new(index as i32 * 3, 0));
        }
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> World {
        self.world
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One player with one fully built colony.
#[must_use]
pub fn colony_world() -> World {
    WorldBuilder::new()
        .player(1, 10_000)
        .colony(1, 1, 3000)
        .buildings(
            1,
            &[
                "colony_hub",
                "solar_plant",
                "solar_plant",
                "research_lab",
                "shipyard",
                "trade_center",
            ],
        )
        .build()
}

/// Several players each owning several colonies.
#[must_use]
pub fn empire_world(players: u32, planets_per_player: u32) -> World {
    let mut builder = WorldBuilder::new();
    let mut planet = 1;
    for player in 1..=players {
        builder = builder.player(player, 50_000);
        for _ in 0..planets_per_player {
            builder = builder.colony(planet, player, 2000 + i64::from(planet) * 250).buildings(
                planet,
                &["colony_hub", "solar_plant", "research_lab", "shipyard", "trade_center"],
            );
            planet += 1;
        }
    }
    builder.build()
}
