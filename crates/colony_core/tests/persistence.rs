//! Save and restore of simulated worlds.

use colony_core::config::EngineConfig;
use colony_core::economy::PlayerId;
use colony_core::engine::Engine;
use colony_core::error::PersistenceError;
use colony_core::persistence::WorldSave;
use colony_core::planet::PlanetId;
use colony_core::world::World;
use colony_test_utils::determinism::verify_save_round_trip;
use colony_test_utils::fixtures::{colony_world, empire_world, sample_catalog};

fn busy_world() -> World {
    let mut world = colony_world();
    world.start_research(PlayerId(1), "fusion").unwrap();
    world
        .player_mut(PlayerId(1))
        .unwrap()
        .assign_research_money("fusion", 150)
        .unwrap();
    world.player_mut(PlayerId(1)).unwrap().complete_research("fighter");
    world.add_production(PlayerId(1), "fighter", 3).unwrap();

    let planet = world.planets.get_mut(&PlanetId(1)).unwrap();
    let shipyard = planet.buildings[4].id;
    let building = planet.building_mut(shipyard).unwrap();
    building.damage(400);
    building.set_repairing(true);
    world
}

fn engine(world: World) -> Engine {
    Engine::new(world, &EngineConfig::default().with_worker_threads(2)).unwrap()
}

#[test]
fn simulated_world_round_trips() {
    let mut engine = engine(busy_world());
    engine.run_days(1);
    for _ in 0..17 {
        engine.step_synchronous();
    }
    assert!(verify_save_round_trip(engine.world()));
}

#[test]
fn restored_world_continues_identically() {
    let mut original = engine(busy_world());
    original.run_days(1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colony.sav");
    original.save().save(&path).unwrap();
    let restored_world = WorldSave::load(&path)
        .unwrap()
        .restore(sample_catalog())
        .unwrap();
    let mut restored = engine(restored_world);
    assert_eq!(restored.state_hash().unwrap(), original.state_hash().unwrap());

    original.run_days(1);
    restored.run_days(1);
    assert_eq!(restored.state_hash().unwrap(), original.state_hash().unwrap());
}

#[test]
fn ron_save_is_readable_text() {
    let world = empire_world(2, 2);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empire.ron");
    WorldSave::capture(&world).save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("colony_hub"));
    assert!(text.contains("version: 1"));

    let loaded = WorldSave::load(&path).unwrap();
    assert_eq!(loaded, WorldSave::capture(&world));
}

#[test]
fn load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        WorldSave::load(dir.path().join("missing.sav")),
        Err(PersistenceError::Io(_))
    ));
}

#[test]
fn corrupt_save_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.sav");
    std::fs::write(&path, [0xff; 7]).unwrap();
    assert!(WorldSave::load(&path).is_err());
}
