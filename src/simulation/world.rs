//! Main simulation world that ties everything together
//!
//! `SimWorld` is the traffic coordinator: it owns the light cycle, the
//! incident registry and the vehicles, and drives them one tick at a time.

use anyhow::Result;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::config::{SimConfig, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};
use super::grid::RoadGrid;
use super::incident::{IncidentKind, IncidentRegistry};
use super::stats::SimStats;
use super::traffic_light::LightController;
use super::types::{Heading, Position, Rect, SimId, VehicleClass, VehicleId};
use super::vehicle::{SimVehicle, VehicleUpdateResult};
use super::vehicle_manager;

/// Seconds without moving after which a vehicle is reported as stalled
pub const STALL_REPORT_SECS: f32 = 5.0;

/// The main simulation world
pub struct SimWorld {
    /// Road grid and facilities
    pub grid: RoadGrid,

    /// Active vehicles in update order
    pub vehicles: Vec<SimVehicle>,

    /// Fire and accident slots
    pub incidents: IncidentRegistry,

    /// Shared light cycle
    pub lights: LightController,

    pub config: SimConfig,

    pub stats: SimStats,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time
    pub time: f32,

    rng: StdRng,
}

impl SimWorld {
    fn new_internal(grid: RoadGrid, config: SimConfig, rng: StdRng) -> Self {
        Self {
            grid,
            vehicles: Vec::new(),
            incidents: IncidentRegistry::new(),
            lights: LightController::new(),
            config,
            stats: SimStats::default(),
            next_id: 0,
            time: 0.0,
            rng,
        }
    }

    pub fn new(grid: RoadGrid, config: SimConfig) -> Self {
        Self::new_internal(grid, config, StdRng::from_os_rng())
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(grid: RoadGrid, config: SimConfig, seed: u64) -> Self {
        Self::new_internal(grid, config, StdRng::seed_from_u64(seed))
    }

    /// Regular grid of the default size with the three facilities
    pub fn create_default_world(config: SimConfig, seed: Option<u64>) -> Result<Self> {
        let bounds = Rect::new(0.0, 0.0, DEFAULT_WORLD_WIDTH, DEFAULT_WORLD_HEIGHT);
        let grid = RoadGrid::regular(bounds)?;
        Ok(match seed {
            Some(seed) => Self::new_with_seed(grid, config, seed),
            None => Self::new(grid, config),
        })
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(SimId(self.next_id));
        self.next_id += 1;
        id
    }

    /// Roll a probability against the world's RNG.
    /// A NaN or infinite probability never fires.
    fn chance(&mut self, probability: f64) -> bool {
        if !probability.is_finite() {
            return false;
        }
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut SimVehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    /// Place a vehicle without placement validation
    pub fn add_vehicle(&mut self, class: VehicleClass, position: Position, heading: Heading) -> VehicleId {
        let id = self.next_vehicle_id();
        self.vehicles
            .push(SimVehicle::new(id, class, position, heading));
        id
    }

    /// Spawn a civilian at a free off-map spot on a random road
    pub fn spawn_civilian(&mut self) -> Result<VehicleId> {
        let id = self.next_vehicle_id();
        match vehicle_manager::spawn_civilian(id, &self.grid, &self.vehicles, &mut self.rng) {
            Ok(vehicle) => {
                self.vehicles.push(vehicle);
                self.stats.civilians_spawned += 1;
                Ok(id)
            }
            Err(e) => {
                self.stats.civilian_spawn_failures += 1;
                Err(e)
            }
        }
    }

    /// Send a responder of `class` out of its facility
    pub fn dispatch(&mut self, class: VehicleClass) -> Result<VehicleId> {
        let id = self.next_vehicle_id();
        match vehicle_manager::dispatch_responder(id, class, &self.grid, &self.incidents) {
            Ok(vehicle) => {
                info!("Dispatched {:?} {:?}", class, id.0);
                self.vehicles.push(vehicle);
                self.stats.responders_dispatched += 1;
                Ok(id)
            }
            Err(e) => {
                warn!("Failed to dispatch {:?}: {}", class, e);
                self.stats.dispatch_failures += 1;
                Err(e)
            }
        }
    }

    /// Start a fire and/or an accident when none of that kind is active
    fn trigger_incidents(&mut self) {
        if !self.incidents.is_active(IncidentKind::Fire) && self.chance(self.config.fire_chance) {
            let site = (0..self.config.fire_search_attempts)
                .find_map(|_| self.grid.fire_site_candidate(&mut self.rng));
            match site {
                Some(location) => self.start_incident(IncidentKind::Fire, location),
                None => debug!("No fire site found this tick"),
            }
        }

        if !self.incidents.is_active(IncidentKind::Accident)
            && self.chance(self.config.accident_chance)
        {
            if let Some(location) = self.grid.random_intersection(&mut self.rng) {
                self.start_incident(IncidentKind::Accident, location);
            }
        }
    }

    fn start_incident(&mut self, kind: IncidentKind, location: Position) {
        if !self.incidents.trigger(kind, location) {
            return;
        }
        info!(
            "{:?} started at ({:.0}, {:.0})",
            kind, location.x, location.y
        );
        self.stats.record_incident_started(kind);

        if self.config.auto_dispatch {
            let _ = self.dispatch(kind.responder());
        }
    }

    fn maybe_spawn_civilian(&mut self) {
        if self.vehicles.len() >= self.config.max_vehicles {
            return;
        }
        if self.chance(self.config.civilian_spawn_chance) {
            if let Err(e) = self.spawn_civilian() {
                debug!("Civilian not spawned: {}", e);
            }
        }
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32) {
        self.time += delta_secs;

        let cycle = self.lights.update(delta_secs);

        self.trigger_incidents();
        self.maybe_spawn_civilian();

        let results = vehicle_manager::update_vehicles(
            delta_secs,
            cycle,
            &mut self.vehicles,
            &self.grid,
            &mut self.incidents,
            &mut self.rng,
        );

        for (vehicle_id, result) in results {
            match result {
                VehicleUpdateResult::ClearedIncident(kind) => {
                    info!("{:?} cleared by vehicle {:?}", kind, vehicle_id.0);
                    self.stats.record_incident_cleared(kind);
                }
                VehicleUpdateResult::Docked => {
                    debug!("Vehicle {:?} docked", vehicle_id.0);
                    self.stats.responders_docked += 1;
                }
                VehicleUpdateResult::LeftWorld => {
                    self.stats.vehicles_left_world += 1;
                }
                VehicleUpdateResult::Continue => {}
            }
        }

        vehicle_manager::sweep_inactive(&mut self.vehicles);
    }

    /// Vehicles that have not moved for a while outside an on-site action
    pub fn stalled_vehicle_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.stuck_timer > STALL_REPORT_SECS)
            .count()
    }

    /// Log a short snapshot of the world state
    pub fn log_status(&self) {
        let yielding = self.vehicles.iter().filter(|v| v.is_yielding).count();
        let responders = self
            .vehicles
            .iter()
            .filter(|v| v.class().is_responder())
            .count();
        info!(
            "t={:.1}s lights={:?} vehicles={} responders={} yielding={} fire={} accident={}",
            self.time,
            self.lights.cycle,
            self.vehicles.len(),
            responders,
            yielding,
            self.incidents.is_active(IncidentKind::Fire),
            self.incidents.is_active(IncidentKind::Accident),
        );
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self) {
        info!(
            "Grid: {} vertical roads, {} horizontal roads, {} intersections",
            self.grid.vertical_axes().len(),
            self.grid.horizontal_axes().len(),
            self.grid.intersection_count()
        );
        self.stats
            .log_summary(self.time, self.vehicles.len(), self.stalled_vehicle_count());
    }
}
