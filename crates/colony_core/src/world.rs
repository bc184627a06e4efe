//! The authoritative game state.
//!
//! A [`World`] owns every player and planet. It is mutated only by the
//! thread that runs the economy tick and applies allocation results;
//! external code changes it between ticks through the helpers here.

use std::collections::BTreeMap;

use crate::buildings::{BuildingId, Location};
use crate::data::Catalog;
use crate::economy::{Player, PlayerId};
use crate::error::{EconomyError, Result};
use crate::planet::{Planet, PlanetId};
use crate::statistics::PlayerStatistics;
use crate::time::GameTime;

/// Players, planets, the type catalog and the clock.
#[derive(Debug, Clone)]
pub struct World {
    /// Building and research definitions.
    pub catalog: Catalog,
    /// Current in-game time.
    pub time: GameTime,
    /// Players by id.
    pub players: BTreeMap<PlayerId, Player>,
    /// Planets by id.
    pub planets: BTreeMap<PlanetId, Planet>,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            time: GameTime::default(),
            players: BTreeMap::new(),
            planets: BTreeMap::new(),
        }
    }

    /// Add or replace a player.
    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Add or replace a planet.
    pub fn add_planet(&mut self, planet: Planet) {
        self.planets.insert(planet.id, planet);
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(&id).ok_or(EconomyError::PlayerNotFound(id))
    }

    /// Look up a player for mutation.
    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(&id)
            .ok_or(EconomyError::PlayerNotFound(id))
    }

    /// Look up a planet.
    pub fn planet(&self, id: PlanetId) -> Result<&Planet> {
        self.planets.get(&id).ok_or(EconomyError::PlanetNotFound(id))
    }

    /// Look up a planet for mutation.
    pub fn planet_mut(&mut self, id: PlanetId) -> Result<&mut Planet> {
        self.planets
            .get_mut(&id)
            .ok_or(EconomyError::PlanetNotFound(id))
    }

    /// Planets owned by a player.
    pub fn owned_planets(&self, owner: PlayerId) -> impl Iterator<Item = &Planet> {
        self.planets
            .values()
            .filter(move |p| p.owner == Some(owner))
    }

    /// Statistics summed over a player's planets.
    #[must_use]
    pub fn player_statistics(&self, owner: PlayerId) -> PlayerStatistics {
        let mut stats = PlayerStatistics::default();
        for planet in self.owned_planets(owner) {
            stats.add_planet(&planet.statistics());
        }
        stats
    }

    /// Hand a planet to a player, using the player's race.
    pub fn colonize(&mut self, planet: PlanetId, owner: PlayerId, population: i64) -> Result<()> {
        let race = self.player(owner)?.race.clone();
        self.planet_mut(planet)?.colonize(owner, race, population);
        tracing::info!(planet = %planet, player = %owner, "Planet colonized");
        Ok(())
    }

    /// Start constructing a building on an owned planet, charging its owner.
    pub fn build(
        &mut self,
        planet_id: PlanetId,
        type_id: &str,
        location: Location,
    ) -> Result<BuildingId> {
        let building_type = self.catalog.require_building(type_id)?;
        let planet = self
            .planets
            .get_mut(&planet_id)
            .ok_or(EconomyError::PlanetNotFound(planet_id))?;
        let owner = planet
            .owner
            .ok_or(EconomyError::PlanetNotColonized(planet_id))?;
        let player = self
            .players
            .get_mut(&owner)
            .ok_or(EconomyError::PlayerNotFound(owner))?;

        if !planet.can_place(&building_type) {
            return Err(EconomyError::BuildLimitReached(building_type.id.clone()));
        }
        if !player.can_afford(building_type.cost) {
            return Err(EconomyError::InsufficientMoney {
                required: building_type.cost,
                available: player.money,
            });
        }

        let cost = building_type.cost;
        let id = planet.place_building(building_type, location)?;
        player.money -= cost;
        player.today.build_cost += cost;
        tracing::debug!(planet = %planet_id, building = %id, building_type = type_id, "Construction started");
        Ok(id)
    }

    /// Make a research the player's running research.
    pub fn start_research(&mut self, owner: PlayerId, research_id: &str) -> Result<()> {
        let research_type = self.catalog.require_research(research_id)?;
        self.player_mut(owner)?.start_research(research_type);
        Ok(())
    }

    /// Queue units of a researched item.
    pub fn add_production(&mut self, owner: PlayerId, research_id: &str, count: i32) -> Result<()> {
        let research_type = self.catalog.require_research(research_id)?;
        self.player_mut(owner)?.add_production(research_type, count)
    }

    /// Toggle a building.
    pub fn set_building_enabled(
        &mut self,
        planet: PlanetId,
        building: BuildingId,
        enabled: bool,
    ) -> Result<()> {
        self.planet_mut(planet)?
            .require_building_mut(building)?
            .set_enabled(enabled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BuildLimit, BuildingType};

    fn world() -> World {
        let mut catalog = Catalog::new();
        catalog.insert_building(BuildingType {
            id: "hub".into(),
            name: String::new(),
            kind: "MainBuilding".into(),
            hitpoints: 1000,
            cost: 500,
            resources: Default::default(),
            upgrades: Vec::new(),
            limit: BuildLimit::PerKind(1),
        });
        let mut world = World::new(catalog);
        world.add_player(Player::new(PlayerId(1), "Alice", "human", 600));
        world.add_planet(Planet::new(PlanetId(1), "Terra"));
        world.add_planet(Planet::new(PlanetId(2), "Mars"));
        world
    }

    #[test]
    fn test_build_charges_owner() {
        let mut world = world();
        world.colonize(PlanetId(1), PlayerId(1), 1000).unwrap();

        let id = world.build(PlanetId(1), "hub", Location::new(0, 0)).unwrap();
        assert_eq!(world.player(PlayerId(1)).unwrap().money, 100);
        assert_eq!(world.player(PlayerId(1)).unwrap().today.build_cost, 500);
        let building = world.planet(PlanetId(1)).unwrap().building(id).unwrap();
        assert!(!building.is_complete());

        assert!(matches!(
            world.build(PlanetId(1), "hub", Location::new(4, 4)),
            Err(EconomyError::BuildLimitReached(_))
        ));
    }

    #[test]
    fn test_build_requires_money_and_owner() {
        let mut world = world();
        assert!(matches!(
            world.build(PlanetId(2), "hub", Location::default()),
            Err(EconomyError::PlanetNotColonized(_))
        ));

        world.colonize(PlanetId(2), PlayerId(1), 10).unwrap();
        world.player_mut(PlayerId(1)).unwrap().money = 100;
        assert!(matches!(
            world.build(PlanetId(2), "hub", Location::default()),
            Err(EconomyError::InsufficientMoney {
                required: 500,
                available: 100
            })
        ));
        assert!(world.planet(PlanetId(2)).unwrap().buildings.is_empty());
    }

    #[test]
    fn test_owned_planets() {
        let mut world = world();
        world.colonize(PlanetId(2), PlayerId(1), 10).unwrap();
        let owned: Vec<PlanetId> = world.owned_planets(PlayerId(1)).map(|p| p.id).collect();
        assert_eq!(owned, vec![PlanetId(2)]);
        assert_eq!(world.planet(PlanetId(2)).unwrap().race.as_deref(), Some("human"));
    }
}
