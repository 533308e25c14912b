//! Read-only view of the other vehicles used for yielding and collision checks
//!
//! Every vehicle senses the same tick-start snapshot, so no update observes
//! another vehicle's post-update state.

use super::mission::MissionState;
use super::types::{Heading, Position, Rect, VehicleClass, VehicleId};
use super::vehicle::SimVehicle;

/// What other vehicles can observe about a vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub position: Position,
    pub heading: Heading,
    pub mission_state: MissionState,
    pub active: bool,
}

impl VehicleSnapshot {
    pub fn bounding_box(&self) -> Rect {
        SimVehicle::bounding_box_at(self.position, self.heading)
    }
}

impl From<&SimVehicle> for VehicleSnapshot {
    fn from(vehicle: &SimVehicle) -> Self {
        Self {
            id: vehicle.id,
            class: vehicle.class(),
            position: vehicle.position,
            heading: vehicle.heading,
            mission_state: vehicle.mission_state,
            active: vehicle.active,
        }
    }
}

/// Spatial queries over the vehicles of the current tick.
/// Results are returned in collection order.
pub trait NeighborQuery {
    /// Vehicles whose centre lies strictly within `radius` of `center`
    fn within_radius(&self, center: Position, radius: f32) -> Vec<&VehicleSnapshot>;

    /// Vehicles whose bounding box intersects `area`
    fn intersecting(&self, area: &Rect) -> Vec<&VehicleSnapshot>;
}

/// Linear-scan index over a snapshot of all vehicles
#[derive(Debug, Clone, Default)]
pub struct SnapshotIndex {
    snapshots: Vec<VehicleSnapshot>,
}

impl SnapshotIndex {
    pub fn capture(vehicles: &[SimVehicle]) -> Self {
        Self {
            snapshots: vehicles.iter().map(VehicleSnapshot::from).collect(),
        }
    }
}

impl NeighborQuery for SnapshotIndex {
    fn within_radius(&self, center: Position, radius: f32) -> Vec<&VehicleSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.position.distance(&center) < radius)
            .collect()
    }

    fn intersecting(&self, area: &Rect) -> Vec<&VehicleSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.bounding_box().intersects(area))
            .collect()
    }
}
