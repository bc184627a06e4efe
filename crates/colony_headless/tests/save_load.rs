//! Saving a headless run and continuing from the save.

use colony_core::persistence::WorldSave;
use colony_headless::{run_scenario, run_world, Scenario};

const FRONTIER: &str = include_str!("../scenarios/frontier.ron");

fn frontier() -> Scenario {
    Scenario::from_ron_str(FRONTIER).unwrap()
}

fn save_and_continue(file_name: &str) {
    let scenario = frontier();
    let straight = run_scenario(&scenario, 2).unwrap();

    let world = scenario.build_world().unwrap();
    let (first_half, engine) = run_world(&scenario.name, world, &scenario.config, 1).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    engine.save().save(&path).unwrap();

    let restored = WorldSave::load(&path)
        .unwrap()
        .restore(scenario.catalog())
        .unwrap();
    let (second_half, _) = run_world(&scenario.name, restored, &scenario.config, 1).unwrap();

    assert_ne!(first_half.state_hash, straight.state_hash);
    assert_eq!(second_half.state_hash, straight.state_hash);
    assert_eq!(second_half.players, straight.players);
    assert_eq!(second_half.planets, straight.planets);
}

#[test]
fn binary_save_continues_identically() {
    save_and_continue("frontier.sav");
}

#[test]
fn ron_save_continues_identically() {
    save_and_continue("frontier.ron");
}

#[test]
fn save_needs_matching_catalog() {
    let scenario = frontier();
    let world = scenario.build_world().unwrap();
    let (_, engine) = run_world(&scenario.name, world, &scenario.config, 0).unwrap();

    let mut stripped = scenario.clone();
    stripped.catalog.buildings.retain(|b| b.id != "shipyard");
    let bytes = engine.save().to_bytes().unwrap();
    let restored = WorldSave::from_bytes(&bytes)
        .unwrap()
        .restore(stripped.catalog());
    assert!(restored.is_err());
}
