//! Standalone emergency traffic simulation module
//!
//! This module contains all the core simulation logic: the road grid,
//! incidents, traffic lights, vehicles and the coordinator that ticks them.
//! It runs without any rendering and can be driven from tests or the CLI.

mod config;
mod grid;
mod incident;
mod mission;
mod sensing;
mod stats;
mod traffic_light;
mod types;
mod vehicle;
mod vehicle_manager;
mod world;

// Re-export public types for external use
pub use config::{
    SimConfig, DEFAULT_CIVILIAN_SPAWN_CHANCE, DEFAULT_FIRE_SEARCH_ATTEMPTS,
    DEFAULT_INCIDENT_CHANCE, DEFAULT_MAX_VEHICLES, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH,
};
pub use grid::{
    nearest_axis, Facility, RoadGrid, FACILITY_SIZE, MAX_ROADS_PER_DIRECTION, TARGET_BLOCK_SIZE,
};
pub use incident::{IncidentKind, IncidentRegistry, IncidentSlot};
pub use mission::{
    MissionAction, MissionState, ACCIDENT_ARRIVAL_RADIUS, ACTION_DURATION, FIRE_ARRIVAL_RADIUS,
};
pub use sensing::{NeighborQuery, SnapshotIndex, VehicleSnapshot};
pub use stats::SimStats;
pub use traffic_light::{LightController, LightCycle, LIGHT_PHASE_DURATION};
pub use types::{
    lerp, Heading, Position, Rect, SimId, VehicleClass, VehicleId, BRAKE_RATE,
    CIVILIAN_MAX_SPEED, CIVILIAN_TURN_CHANCE, DESPAWN_MARGIN, HARD_STOP_DISTANCE, LANE_EMERGENCY,
    LANE_NORMAL, LANE_YIELD, RESPONDER_MAX_SPEED, SPAWN_CLEARANCE, YIELD_RADIUS,
};
pub use vehicle::{civilian_turn_choice, steer_towards, SimVehicle, TickContext, VehicleUpdateResult};
pub use vehicle_manager::{dispatch_responder, spawn_civilian, sweep_inactive, update_vehicles};
pub use world::{SimWorld, STALL_REPORT_SECS};
