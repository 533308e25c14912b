//! Coordinator scenarios: missions, yielding, lights and world edges

use std::collections::HashMap;

use emergency_traffic::simulation::{
    Heading, IncidentKind, LightCycle, MissionState, Position, Rect, RoadGrid, SimConfig,
    SimWorld, VehicleClass, VehicleId, BRAKE_RATE, CIVILIAN_MAX_SPEED, FIRE_ARRIVAL_RADIUS,
    LANE_NORMAL,
};

const DT: f32 = 1.0 / 60.0;

fn test_grid() -> RoadGrid {
    let mut grid = RoadGrid::new(
        Rect::new(0.0, 0.0, 1000.0, 700.0),
        vec![200.0, 500.0, 800.0],
        vec![150.0, 350.0, 550.0],
    )
    .expect("valid grid");
    grid.add_facility(VehicleClass::Fire, Position::new(900.0, 75.0));
    grid
}

fn scripted_world() -> SimWorld {
    SimWorld::new_with_seed(test_grid(), SimConfig::scripted(), 7)
}

fn busy_config() -> SimConfig {
    SimConfig {
        civilian_spawn_chance: 0.2,
        fire_chance: 0.01,
        accident_chance: 0.01,
        auto_dispatch: true,
        ..SimConfig::default()
    }
}

#[test]
fn test_fire_mission_round_trip() {
    let mut world = scripted_world();
    let fire_site = Position::new(855.0, 205.0);
    assert!(world.incidents.trigger(IncidentKind::Fire, fire_site));

    let id = world.dispatch(VehicleClass::Fire).unwrap();
    assert_eq!(world.vehicle(id).unwrap().target, Some(fire_site));

    let mut states = vec![MissionState::Deploying];
    let mut extinguish_ticks = 0;
    let mut docked = false;

    for _ in 0..3000 {
        world.tick(DT);
        let Some(truck) = world.vehicle(id) else {
            docked = true;
            break;
        };

        let last = *states.last().unwrap();
        assert!(
            last.can_transition_to(truck.mission_state),
            "illegal transition {:?} -> {:?}",
            last,
            truck.mission_state
        );
        if truck.mission_state != last {
            states.push(truck.mission_state);
        }

        if truck.mission_state == MissionState::Extinguishing {
            assert!(world.incidents.is_active(IncidentKind::Fire));
            assert!(truck.position.distance(&fire_site) < FIRE_ARRIVAL_RADIUS);
            extinguish_ticks += 1;
        }
    }

    assert!(docked, "fire truck never docked");
    assert_eq!(
        states,
        vec![
            MissionState::Deploying,
            MissionState::OnMission,
            MissionState::Extinguishing,
            MissionState::Returning,
            MissionState::Docking,
        ]
    );
    assert!(!world.incidents.is_active(IncidentKind::Fire));
    assert!(
        (175..=185).contains(&extinguish_ticks),
        "extinguished for {} ticks",
        extinguish_ticks
    );
    assert_eq!(world.stats.fires_extinguished, 1);
    assert_eq!(world.stats.responders_docked, 1);
    assert!(world.vehicles.is_empty());
}

#[test]
fn test_police_patrol_returns_home() {
    let mut world = SimWorld::create_default_world(SimConfig::scripted(), Some(3)).unwrap();
    let id = world.dispatch(VehicleClass::Police).unwrap();

    let mut states = vec![MissionState::Deploying];
    for _ in 0..500 {
        world.tick(DT);
        match world.vehicle(id) {
            Some(car) => {
                if car.mission_state != *states.last().unwrap() {
                    states.push(car.mission_state);
                }
            }
            None => break,
        }
    }

    assert!(world.vehicle(id).is_none(), "police car never docked");
    assert_eq!(
        states,
        vec![
            MissionState::Deploying,
            MissionState::OnMission,
            MissionState::Returning,
            MissionState::Docking,
        ]
    );
    assert_eq!(world.stats.responders_docked, 1);
}

#[test]
fn test_deployed_responder_joins_closer_road() {
    let mut grid = test_grid();
    // entry on vertical road x=200, below the world centre
    grid.add_facility(VehicleClass::Police, Position::new(230.0, 450.0));
    let mut world = SimWorld::new_with_seed(grid, SimConfig::scripted(), 7);

    let truck = world.dispatch(VehicleClass::Fire).unwrap();
    let police = world.dispatch(VehicleClass::Police).unwrap();
    assert_eq!(world.vehicle(police).unwrap().home_entry(), Position::new(200.0, 450.0));

    let mut truck_joined = false;
    let mut police_joined = false;
    for _ in 0..100 {
        world.tick(DT);

        let fire = world.vehicle(truck).unwrap();
        if !truck_joined && fire.mission_state == MissionState::OnMission {
            // entry (900, 150) is on the horizontal road, east of the centre
            assert_eq!(fire.heading, Heading::Left);
            assert_eq!(fire.position, Position::new(900.0, 150.0 - LANE_NORMAL));
            truck_joined = true;
        }

        if let Some(car) = world.vehicle(police) {
            if !police_joined && car.mission_state == MissionState::OnMission {
                assert_eq!(car.heading, Heading::Up);
                assert_eq!(car.position, Position::new(200.0 - LANE_NORMAL, 450.0));
                police_joined = true;
            }
        }

        if truck_joined && police_joined {
            break;
        }
    }

    assert!(truck_joined && police_joined);
}

#[test]
fn test_turn_snaps_to_lane_and_starts_cooldown() {
    let mut world = scripted_world();
    let id = world.add_vehicle(VehicleClass::Fire, Position::new(518.0, 335.0), Heading::Down);
    world.vehicle_mut(id).unwrap().target = Some(Position::new(900.0, 350.0));

    world.tick(DT);

    let truck = world.vehicle(id).unwrap();
    assert_eq!(truck.heading, Heading::Right);
    // placed on the right-hand lane of the crossing road, then driven one step
    assert_eq!(truck.position, Position::new(500.0 + truck.speed, 350.0 + LANE_NORMAL));
    assert!((truck.turn_cooldown - 0.8).abs() < 1e-6);

    // still inside the intersection, and the new target asks for a turn north
    world.vehicle_mut(id).unwrap().target = Some(Position::new(500.0, 100.0));
    for _ in 0..10 {
        world.tick(DT);
        let truck = world.vehicle(id).unwrap();
        assert_eq!(truck.heading, Heading::Right);
        assert!(truck.turn_cooldown > 0.0);
    }
}

#[test]
fn test_non_finite_chances_never_fire() {
    let config = SimConfig {
        civilian_spawn_chance: f64::NAN,
        fire_chance: f64::NAN,
        accident_chance: f64::INFINITY,
        auto_dispatch: true,
        ..SimConfig::default()
    };
    let mut world = SimWorld::create_default_world(config, Some(6)).unwrap();

    for _ in 0..100 {
        world.tick(DT);
    }

    assert!(world.vehicles.is_empty());
    assert_eq!(world.stats.fires_started, 0);
    assert_eq!(world.stats.accidents_started, 0);
}

#[test]
fn test_dispatch_without_facility_fails() {
    let mut world = scripted_world();
    assert!(world.dispatch(VehicleClass::Police).is_err());
    assert!(world.dispatch(VehicleClass::Civilian).is_err());
    assert_eq!(world.stats.dispatch_failures, 2);
    assert!(world.vehicles.is_empty());
}

#[test]
fn test_two_ambulances_clear_accident_once() {
    let mut world = scripted_world();
    let crash = Position::new(500.0, 350.0);
    world.incidents.trigger(IncidentKind::Accident, crash);

    let first = world.add_vehicle(VehicleClass::Ambulance, Position::new(500.0, 340.0), Heading::Down);
    let second = world.add_vehicle(VehicleClass::Ambulance, Position::new(500.0, 360.0), Heading::Up);
    for id in [first, second] {
        let ambulance = world.vehicle_mut(id).unwrap();
        ambulance.mission_state = MissionState::OnMission;
        ambulance.target = Some(crash);
    }

    world.tick(DT);
    assert_eq!(world.vehicle(first).unwrap().mission_state, MissionState::Treating);
    assert_eq!(world.vehicle(second).unwrap().mission_state, MissionState::Treating);

    let mut ticks = 1;
    while world.incidents.is_active(IncidentKind::Accident) && ticks < 400 {
        world.tick(DT);
        ticks += 1;
    }

    assert!(!world.incidents.is_active(IncidentKind::Accident));
    assert!((175..=185).contains(&ticks), "treated for {} ticks", ticks);
    assert_eq!(world.stats.accidents_cleared, 1);
    for id in [first, second] {
        let ambulance = world.vehicle(id).unwrap();
        assert_eq!(ambulance.mission_state, MissionState::Returning);
        assert_eq!(ambulance.action_timer, 0.0);
    }
}

#[test]
fn test_action_aborts_when_incident_cleared_elsewhere() {
    let mut world = scripted_world();
    let crash = Position::new(500.0, 350.0);
    world.incidents.trigger(IncidentKind::Accident, crash);

    let id = world.add_vehicle(VehicleClass::Ambulance, Position::new(500.0, 340.0), Heading::Down);
    {
        let ambulance = world.vehicle_mut(id).unwrap();
        ambulance.mission_state = MissionState::OnMission;
        ambulance.target = Some(crash);
    }

    for _ in 0..30 {
        world.tick(DT);
    }
    assert_eq!(world.vehicle(id).unwrap().mission_state, MissionState::Treating);
    assert!(world.vehicle(id).unwrap().action_timer > 0.0);

    world.incidents.clear(IncidentKind::Accident);
    world.tick(DT);

    let ambulance = world.vehicle(id).unwrap();
    assert_eq!(ambulance.mission_state, MissionState::Returning);
    assert_eq!(ambulance.action_timer, 0.0);
    assert_eq!(world.stats.accidents_cleared, 0);
}

#[test]
fn test_responder_without_incident_heads_home() {
    let mut world = scripted_world();
    let start = Position::new(518.0, 600.0);
    let id = world.add_vehicle(VehicleClass::Fire, start, Heading::Up);
    {
        let truck = world.vehicle_mut(id).unwrap();
        truck.mission_state = MissionState::OnMission;
        truck.target = Some(Position::new(100.0, 100.0));
    }

    world.tick(DT);

    // home is where it was placed, so the handoff to docking is immediate
    let truck = world.vehicle(id).unwrap();
    assert!(matches!(
        truck.mission_state,
        MissionState::Returning | MissionState::Docking
    ));
    assert_eq!(truck.target, Some(truck.home_entry()));
}

#[test]
fn test_civilian_yields_to_responder_on_mission() {
    let mut world = scripted_world();
    world
        .incidents
        .trigger(IncidentKind::Fire, Position::new(520.0, 690.0));

    let car = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 100.0), Heading::Down);
    let truck = world.add_vehicle(VehicleClass::Fire, Position::new(506.0, 300.0), Heading::Down);
    {
        let truck = world.vehicle_mut(truck).unwrap();
        truck.mission_state = MissionState::OnMission;
        truck.target = Some(Position::new(520.0, 690.0));
    }

    world.tick(DT);

    let car = world.vehicle(car).unwrap();
    assert!(car.is_yielding);
    assert!(car.lane_offset() < -LANE_NORMAL);
    assert!(car.position.x < 518.0);
    assert!(car.speed < CIVILIAN_MAX_SPEED);
}

#[test]
fn test_civilian_ignores_returning_responder() {
    let mut world = scripted_world();
    let car = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 100.0), Heading::Down);
    let truck = world.add_vehicle(VehicleClass::Fire, Position::new(506.0, 300.0), Heading::Down);
    {
        let truck = world.vehicle_mut(truck).unwrap();
        truck.mission_state = MissionState::Returning;
        truck.target = Some(Position::new(506.0, 690.0));
    }

    world.tick(DT);

    let car = world.vehicle(car).unwrap();
    assert!(!car.is_yielding);
    assert_eq!(car.lane_offset(), LANE_NORMAL);
}

#[test]
fn test_yielding_civilians_keep_their_distance() {
    let mut world = scripted_world();
    world
        .incidents
        .trigger(IncidentKind::Fire, Position::new(520.0, 690.0));

    let leader = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 290.0), Heading::Down);
    let follower = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 260.0), Heading::Down);
    let truck = world.add_vehicle(VehicleClass::Fire, Position::new(506.0, 420.0), Heading::Down);
    {
        let truck = world.vehicle_mut(truck).unwrap();
        truck.mission_state = MissionState::OnMission;
        truck.target = Some(Position::new(520.0, 690.0));
    }

    let initial_gap = 30.0;
    for _ in 0..15 {
        world.tick(DT);
        let lead = world.vehicle(leader).unwrap();
        let follow = world.vehicle(follower).unwrap();
        assert!(lead.is_yielding && follow.is_yielding);
        let gap = lead.position.distance(&follow.position);
        assert!(gap >= initial_gap - 1e-3, "gap shrank to {}", gap);
    }
}

#[test]
fn test_civilian_stops_for_red_light() {
    let mut world = scripted_world();
    let id = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 90.0), Heading::Down);
    world.lights.cycle = LightCycle::HorizontalGreen;

    world.tick(DT);
    let speed = world.vehicle(id).unwrap().speed;
    assert!((speed - CIVILIAN_MAX_SPEED * (1.0 - BRAKE_RATE)).abs() < 1e-4);

    for _ in 0..120 {
        world.lights.timer = 0.0;
        world.tick(DT);
    }

    let car = world.vehicle(id).unwrap();
    assert_eq!(car.speed, 0.0);
    assert!(car.position.y < 110.0, "ran the light at y={}", car.position.y);
    assert!(car.stuck_timer > 1.0);
}

#[test]
fn test_civilian_drives_through_green_light() {
    let mut world = scripted_world();
    let id = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 90.0), Heading::Down);

    world.tick(DT);
    let car = world.vehicle(id).unwrap();
    assert_eq!(car.speed, CIVILIAN_MAX_SPEED);
    assert!(car.position.y > 91.0);
}

#[test]
fn test_responders_ignore_lights() {
    let mut world = scripted_world();
    let id = world.add_vehicle(VehicleClass::Fire, Position::new(506.0, 90.0), Heading::Down);
    world.vehicle_mut(id).unwrap().target = Some(Position::new(506.0, 690.0));
    world.lights.cycle = LightCycle::HorizontalGreen;

    world.tick(DT);
    assert_eq!(world.vehicle(id).unwrap().speed, 4.0);
}

#[test]
fn test_hard_stop_behind_close_vehicle() {
    let mut world = scripted_world();
    let leader = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 300.0), Heading::Down);
    let follower = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 260.0), Heading::Down);

    world.tick(DT);

    assert_eq!(world.vehicle(follower).unwrap().speed, 0.0);
    assert_eq!(world.vehicle(leader).unwrap().speed, CIVILIAN_MAX_SPEED);
}

#[test]
fn test_soft_brake_behind_distant_vehicle() {
    let mut world = scripted_world();
    world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 300.0), Heading::Down);
    let follower = world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 230.0), Heading::Down);

    world.tick(DT);

    let speed = world.vehicle(follower).unwrap().speed;
    assert!(speed > 0.0 && speed < CIVILIAN_MAX_SPEED);
}

#[test]
fn test_untargeted_vehicle_leaves_world() {
    let mut world = scripted_world();
    world.add_vehicle(VehicleClass::Civilian, Position::new(518.0, 799.5), Heading::Down);

    world.tick(DT);

    assert!(world.vehicles.is_empty());
    assert_eq!(world.stats.vehicles_left_world, 1);
}

#[test]
fn test_targeted_vehicle_turns_back_at_edge() {
    let mut world = scripted_world();
    let id = world.add_vehicle(VehicleClass::Fire, Position::new(998.0, 368.0), Heading::Right);
    world.vehicle_mut(id).unwrap().target = Some(Position::new(100.0, 368.0));

    world.tick(DT);

    let truck = world.vehicle(id).unwrap();
    assert!(truck.active);
    assert_eq!(truck.heading, Heading::Left);
    assert!(truck.position.x <= 1000.0);
}

#[test]
fn test_spawned_civilians_never_overlap() {
    let mut world = SimWorld::create_default_world(SimConfig::scripted(), Some(11)).unwrap();
    for _ in 0..40 {
        // failures are expected once the entries fill up
        let _ = world.spawn_civilian();
    }
    assert!(world.stats.civilians_spawned > 0);
    assert_eq!(
        world.stats.civilians_spawned + world.stats.civilian_spawn_failures,
        40
    );

    for (i, a) in world.vehicles.iter().enumerate() {
        for b in world.vehicles.iter().skip(i + 1) {
            assert!(!a.bounding_box().intersects(&b.bounding_box()));
        }
        for facility in world.grid.facilities() {
            assert!(!a.bounding_box().intersects(&facility.bounding_box));
        }
    }
}

#[test]
fn test_vehicle_cap_limits_auto_spawn() {
    let config = SimConfig {
        civilian_spawn_chance: 1.0,
        max_vehicles: 5,
        ..SimConfig::scripted()
    };
    let mut world = SimWorld::create_default_world(config, Some(4)).unwrap();

    for _ in 0..300 {
        world.tick(DT);
        assert!(world.vehicles.len() <= 5);
    }
    assert!(world.stats.civilians_spawned >= 5);
}

#[test]
fn test_incidents_land_on_valid_sites() {
    let config = SimConfig {
        fire_chance: 1.0,
        accident_chance: 1.0,
        ..SimConfig::scripted()
    };
    let mut world = SimWorld::create_default_world(config, Some(17)).unwrap();

    for _ in 0..5 {
        world.tick(DT);
    }

    let crash = world
        .incidents
        .active_location(IncidentKind::Accident)
        .expect("accident started");
    assert!(world.grid.vertical_axes().contains(&crash.x));
    assert!(world.grid.horizontal_axes().contains(&crash.y));

    let fire = world
        .incidents
        .active_location(IncidentKind::Fire)
        .expect("fire started");
    assert!(!world.grid.is_on_facility(fire));
    assert!(world.grid.bounds.contains(fire));

    // an active incident is never replaced
    assert_eq!(world.stats.fires_started, 1);
    assert_eq!(world.stats.accidents_started, 1);
    assert_eq!(world.stats.responders_dispatched, 0);
}

#[test]
fn test_auto_dispatch_sends_matching_responder() {
    let config = SimConfig {
        accident_chance: 1.0,
        auto_dispatch: true,
        ..SimConfig::scripted()
    };
    let mut world = SimWorld::create_default_world(config, Some(2)).unwrap();

    world.tick(DT);

    assert_eq!(world.stats.accidents_started, 1);
    assert_eq!(world.stats.responders_dispatched, 1);
    let ambulance = &world.vehicles[0];
    assert_eq!(ambulance.class(), VehicleClass::Ambulance);
    assert_eq!(
        ambulance.target,
        world.incidents.active_location(IncidentKind::Accident)
    );
}

#[test]
fn test_speed_and_mission_invariants_over_long_run() {
    let mut world = SimWorld::create_default_world(busy_config(), Some(42)).unwrap();
    let mut previous: HashMap<VehicleId, (MissionState, f32)> = HashMap::new();

    for _ in 0..3000 {
        world.tick(DT);

        for vehicle in &world.vehicles {
            assert!(vehicle.speed >= 0.0);
            assert!(vehicle.speed <= vehicle.max_speed() + 1e-5);

            if vehicle.class() == VehicleClass::Civilian {
                assert_eq!(vehicle.mission_state, MissionState::Idle);
            }

            if let Some(&(state, speed)) = previous.get(&vehicle.id) {
                assert!(
                    state.can_transition_to(vehicle.mission_state),
                    "{:?} went {:?} -> {:?}",
                    vehicle.id,
                    state,
                    vehicle.mission_state
                );
                let change = (vehicle.speed - speed).abs();
                assert!(
                    vehicle.speed == 0.0 || change <= BRAKE_RATE * vehicle.max_speed() + 1e-4,
                    "{:?} speed jumped {} -> {}",
                    vehicle.id,
                    speed,
                    vehicle.speed
                );
            }

            if vehicle.mission_state.is_action() {
                let kind = vehicle.class().mission_action().unwrap().incident;
                assert!(world.incidents.is_active(kind));
            }
        }

        previous = world
            .vehicles
            .iter()
            .map(|v| (v.id, (v.mission_state, v.speed)))
            .collect();
    }

    assert!(world.stats.civilians_spawned > 0);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = |seed| {
        let mut world = SimWorld::create_default_world(busy_config(), Some(seed)).unwrap();
        for _ in 0..1500 {
            world.tick(DT);
        }
        let positions: Vec<_> = world.vehicles.iter().map(|v| (v.id, v.position)).collect();
        (world.stats.clone(), positions)
    };

    assert_eq!(run(99), run(99));
}
