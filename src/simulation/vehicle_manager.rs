//! Vehicle spawning and management for the emergency traffic simulation
//!
//! This module contains functions for spawning, updating and retiring
//! vehicles. It separates vehicle management from the main world coordination.

use anyhow::{bail, ensure, Context, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::grid::RoadGrid;
use super::incident::IncidentRegistry;
use super::sensing::SnapshotIndex;
use super::traffic_light::LightCycle;
use super::types::{
    Heading, Position, VehicleClass, VehicleId, LANE_NORMAL, SPAWN_ATTEMPTS, SPAWN_CLEARANCE,
    SPAWN_OFFSET,
};
use super::vehicle::{SimVehicle, TickContext, VehicleUpdateResult};

/// Spawn a civilian just outside the world on a random road
///
/// # Arguments
/// * `vehicle_id` - The pre-generated vehicle ID
/// * `grid` - The road grid to place the vehicle on
/// * `existing` - Vehicles already on the map, used for placement validation
/// * `rng` - Random source for the road, direction and retries
///
/// Returns the new vehicle if free space was found within `SPAWN_ATTEMPTS`
pub fn spawn_civilian(
    vehicle_id: VehicleId,
    grid: &RoadGrid,
    existing: &[SimVehicle],
    rng: &mut StdRng,
) -> Result<SimVehicle> {
    let vertical = grid.vertical_axes();
    let horizontal = grid.horizontal_axes();
    if vertical.is_empty() && horizontal.is_empty() {
        bail!("No roads to spawn a civilian on");
    }

    let bounds = grid.bounds;

    for _ in 0..SPAWN_ATTEMPTS {
        let use_vertical = horizontal.is_empty() || (!vertical.is_empty() && rng.random_bool(0.5));

        let (position, heading) = if use_vertical {
            let axis = *vertical.choose(rng).context("No vertical roads")?;
            let heading = *[Heading::Down, Heading::Up]
                .choose(rng)
                .context("No direction")?;
            let y = match heading {
                Heading::Down => bounds.y - SPAWN_OFFSET,
                _ => bounds.bottom() + SPAWN_OFFSET,
            };
            (Position::new(axis + heading.lane_sign() * LANE_NORMAL, y), heading)
        } else {
            let axis = *horizontal.choose(rng).context("No horizontal roads")?;
            let heading = *[Heading::Right, Heading::Left]
                .choose(rng)
                .context("No direction")?;
            let x = match heading {
                Heading::Right => bounds.x - SPAWN_OFFSET,
                _ => bounds.right() + SPAWN_OFFSET,
            };
            (Position::new(x, axis + heading.lane_sign() * LANE_NORMAL), heading)
        };

        let clearance = SimVehicle::bounding_box_at(position, heading).inflate(SPAWN_CLEARANCE);
        let blocked = existing
            .iter()
            .filter(|v| v.active)
            .any(|v| clearance.intersects(&v.bounding_box()));

        if !blocked {
            return Ok(SimVehicle::new(
                vehicle_id,
                VehicleClass::Civilian,
                position,
                heading,
            ));
        }
    }

    bail!("No free space for a civilian after {} attempts", SPAWN_ATTEMPTS)
}

/// Create a responder inside the facility of its class
///
/// # Arguments
/// * `vehicle_id` - The pre-generated vehicle ID
/// * `class` - Police, Ambulance or Fire
/// * `grid` - The grid holding the facilities
/// * `incidents` - Current incidents; an active matching incident becomes the target
pub fn dispatch_responder(
    vehicle_id: VehicleId,
    class: VehicleClass,
    grid: &RoadGrid,
    incidents: &IncidentRegistry,
) -> Result<SimVehicle> {
    ensure!(class.is_responder(), "{:?} is not a responder class", class);

    let facility = grid
        .facility_for(class)
        .with_context(|| format!("No facility for {:?}", class))?;

    Ok(SimVehicle::deploy_from(vehicle_id, facility, incidents))
}

/// Update all active vehicles in collection order
///
/// Every vehicle senses the same snapshot taken before the first update.
/// Returns a list of (vehicle_id, result) tuples for vehicles that need
/// special handling
pub fn update_vehicles(
    delta_secs: f32,
    cycle: LightCycle,
    vehicles: &mut [SimVehicle],
    grid: &RoadGrid,
    incidents: &mut IncidentRegistry,
    rng: &mut StdRng,
) -> Vec<(VehicleId, VehicleUpdateResult)> {
    let snapshot = SnapshotIndex::capture(vehicles);
    let mut ctx = TickContext {
        delta_secs,
        cycle,
        grid,
        incidents,
        neighbors: &snapshot,
        rng,
    };

    let mut results = Vec::new();
    for vehicle in vehicles.iter_mut().filter(|v| v.active) {
        let result = vehicle.update(&mut ctx);
        if result != VehicleUpdateResult::Continue {
            results.push((vehicle.id, result));
        }
    }

    results
}

/// Remove every inactive vehicle, keeping the order of the rest.
/// Returns how many were removed.
pub fn sweep_inactive(vehicles: &mut Vec<SimVehicle>) -> usize {
    let before = vehicles.len();
    vehicles.retain(|v| v.active);
    before - vehicles.len()
}
