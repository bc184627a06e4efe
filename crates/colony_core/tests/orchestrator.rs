//! Allocation orchestrator behaviour across threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use colony_core::allocation::{
    apply_results, compute_planet, prepare, run_isolated, AllocationOrchestrator, DrainReport,
    PlanetAllocation,
};
use colony_core::buildings::{BuildingId, Location};
use colony_core::data::BuildingType;
use colony_core::error::{AllocationError, EconomyError};
use colony_core::planet::{AllocationStrategyKind, PlanetId};
use colony_core::world::World;
use colony_test_utils::fixtures::{colony_world, empire_world};

fn drain_all(orchestrator: &mut AllocationOrchestrator, world: &mut World) -> DrainReport {
    let mut report = DrainReport::default();
    while orchestrator.in_flight() > 0 {
        report.merge(orchestrator.drain(world));
        std::thread::yield_now();
    }
    report
}

fn assignments(world: &World) -> Vec<(PlanetId, BuildingId, i32, i32)> {
    world
        .planets
        .values()
        .flat_map(|planet| {
            planet
                .buildings
                .iter()
                .map(move |b| (planet.id, b.id, b.assigned_worker, b.assigned_energy))
        })
        .collect()
}

#[test]
fn parallel_pass_matches_sequential_computation() {
    let mut expected = empire_world(4, 3);
    let snapshots = prepare(&mut expected);
    let mut applied = BTreeMap::new();
    let results = snapshots.into_iter().map(|snapshot| PlanetAllocation {
        planet: snapshot.planet,
        pass: 1,
        result: compute_planet(snapshot),
    });
    let report = apply_results(&mut expected, &mut applied, results);
    assert_eq!(report.applied, 12);

    let mut world = empire_world(4, 3);
    let mut orchestrator = AllocationOrchestrator::new(4).unwrap();
    assert_eq!(orchestrator.dispatch(&mut world), 12);
    let report = drain_all(&mut orchestrator, &mut world);

    assert_eq!(report.applied, 12);
    assert_eq!(report.failed, 0);
    assert_eq!(assignments(&world), assignments(&expected));
}

#[test]
fn failing_planet_keeps_previous_allocation() {
    let mut world = empire_world(1, 2);
    let mut orchestrator = AllocationOrchestrator::new(2).unwrap();
    orchestrator.run_pass_blocking(&mut world);
    let before: Vec<_> = world.planets[&PlanetId(2)]
        .buildings
        .iter()
        .map(|b| b.assigned_worker)
        .collect();

    // A building whose energy figure is not a number fails validation
    let broken = Arc::new(BuildingType {
        id: "broken".into(),
        name: String::new(),
        kind: "Broken".into(),
        hitpoints: 100,
        cost: 0,
        resources: [("worker".to_string(), 1.0), ("energy".to_string(), f64::NAN)]
            .into_iter()
            .collect(),
        upgrades: Vec::new(),
        limit: Default::default(),
    });
    world
        .planets
        .get_mut(&PlanetId(2))
        .unwrap()
        .add_completed(broken, Location::new(40, 40));
    world
        .planets
        .get_mut(&PlanetId(1))
        .unwrap()
        .allocation = AllocationStrategyKind::Zero;

    let report = orchestrator.run_pass_blocking(&mut world);
    assert_eq!(report.applied, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(orchestrator.last_applied(PlanetId(1)), Some(2));
    assert_eq!(orchestrator.last_applied(PlanetId(2)), Some(1));

    let after: Vec<_> = world.planets[&PlanetId(2)]
        .buildings
        .iter()
        .take(before.len())
        .map(|b| b.assigned_worker)
        .collect();
    assert_eq!(after, before);
    assert!(world.planets[&PlanetId(1)]
        .buildings
        .iter()
        .all(|b| b.assigned_worker == 0));
}

#[test]
fn panic_becomes_task_error() {
    let result = run_isolated(PlanetId(7), || panic!("strategy exploded"));
    assert_eq!(
        result,
        Err(AllocationError::TaskPanicked {
            planet: PlanetId(7),
            message: "strategy exploded".into(),
        })
    );

    let mut world = colony_world();
    let mut applied = BTreeMap::new();
    let report = apply_results(
        &mut world,
        &mut applied,
        [PlanetAllocation {
            planet: PlanetId(1),
            pass: 1,
            result,
        }],
    );
    assert_eq!(report.failed, 1);
    assert!(applied.is_empty());
}

#[test]
fn older_pass_is_dropped() {
    let mut world = colony_world();
    let snapshot = prepare(&mut world).remove(0);
    let units = compute_planet(snapshot).unwrap();

    let mut applied = BTreeMap::new();
    let newer = PlanetAllocation {
        planet: PlanetId(1),
        pass: 5,
        result: Ok(units.clone()),
    };
    let mut cleared = units;
    cleared.iter_mut().for_each(|u| u.clear());
    let older = PlanetAllocation {
        planet: PlanetId(1),
        pass: 4,
        result: Ok(cleared),
    };

    let report = apply_results(&mut world, &mut applied, [newer, older]);
    assert_eq!(report.applied, 1);
    assert_eq!(report.stale, 1);
    assert_eq!(applied[&PlanetId(1)], 5);
    assert!(world.planets[&PlanetId(1)]
        .buildings
        .iter()
        .any(|b| b.assigned_worker > 0));
}

#[test]
fn recompute_now_supersedes_in_flight_pass() {
    let mut world = empire_world(1, 3);
    let mut orchestrator = AllocationOrchestrator::new(2).unwrap();
    orchestrator.dispatch(&mut world);
    assert_eq!(orchestrator.pass(), 1);

    orchestrator.recompute_now(&mut world, PlanetId(2)).unwrap();
    assert_eq!(orchestrator.pass(), 2);
    assert_eq!(orchestrator.last_applied(PlanetId(2)), Some(2));

    let report = drain_all(&mut orchestrator, &mut world);
    assert_eq!(report.stale, 1);
    assert_eq!(report.applied, 2);
    assert_eq!(orchestrator.last_applied(PlanetId(2)), Some(2));
    assert_eq!(orchestrator.last_applied(PlanetId(1)), Some(1));
}

#[test]
fn recompute_unknown_planet_fails() {
    let mut world = colony_world();
    let mut orchestrator = AllocationOrchestrator::new(1).unwrap();
    assert!(matches!(
        orchestrator.recompute_now(&mut world, PlanetId(99)),
        Err(EconomyError::PlanetNotFound(PlanetId(99)))
    ));
}

#[test]
fn removed_building_is_not_written() {
    let mut world = colony_world();
    let mut orchestrator = AllocationOrchestrator::new(2).unwrap();
    orchestrator.dispatch(&mut world);

    // Demolished while its pass is in flight
    let removed = world.planets[&PlanetId(1)].buildings[3].id;
    world
        .planets
        .get_mut(&PlanetId(1))
        .unwrap()
        .remove_building(removed);

    let report = drain_all(&mut orchestrator, &mut world);
    assert_eq!(report.applied, 1);
    assert!(world.planets[&PlanetId(1)].building(removed).is_none());
    assert_eq!(world.planets[&PlanetId(1)].buildings.len(), 5);
}
