//! Vehicle behaviour for the emergency traffic simulation
//!
//! Each tick a vehicle runs its mission state machine, steers on the lane
//! grid, yields to responders, obeys lights and avoids the vehicles ahead.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use super::grid::{Facility, RoadGrid};
use super::incident::{IncidentKind, IncidentRegistry};
use super::mission::{
    MissionAction, MissionState, DEPLOY_ARRIVAL_DISTANCE, DOCK_ARRIVAL_DISTANCE,
    DOCK_HANDOFF_DISTANCE, GARAGE_STEP, STALE_TARGET_DISTANCE,
};
use super::sensing::NeighborQuery;
use super::traffic_light::LightCycle;
use super::types::{
    lerp, Heading, Position, Rect, VehicleClass, VehicleId, ACCEL_RATE, BRAKE_RATE,
    CIVILIAN_TURN_CHANCE, DESPAWN_MARGIN, EDGE_INSET, HARD_STOP_DISTANCE, INTERSECTION_RADIUS,
    LANE_EMERGENCY, LANE_LOCK_STRENGTH, LANE_NORMAL, LANE_YIELD, LIGHT_STOP_MAX, LIGHT_STOP_MIN,
    SENSOR_BASE_LENGTH, SENSOR_SPEED_GAIN, SOFT_STOP_DISTANCE, STOP_EPSILON,
    TARGET_ALIGN_TOLERANCE, TURN_COOLDOWN, VEHICLE_HALF_LENGTH, VEHICLE_HALF_WIDTH,
    YIELD_RADIUS, YIELD_SPEED, YIELD_STOP_DISTANCE,
};

/// Result of a vehicle update indicating what the coordinator should record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleUpdateResult {
    Continue,                      // Vehicle keeps driving
    ClearedIncident(IncidentKind), // Vehicle finished servicing an incident
    Docked,                        // Responder parked in its facility
    LeftWorld,                     // Untargeted vehicle drove off the map
}

/// Everything a vehicle may read or write during one tick
pub struct TickContext<'a> {
    pub delta_secs: f32,
    pub cycle: LightCycle,
    pub grid: &'a RoadGrid,
    pub incidents: &'a mut IncidentRegistry,
    pub neighbors: &'a dyn NeighborQuery,
    pub rng: &'a mut StdRng,
}

/// A vehicle in the traffic simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub position: Position,
    pub heading: Heading,
    class: VehicleClass,
    /// Distance covered per tick
    pub speed: f32,
    max_speed: f32,
    /// False once the vehicle is pending removal
    pub active: bool,
    pub target: Option<Position>,
    pub mission_state: MissionState,
    home_center: Position,
    home_entry: Position,
    /// Civilian pulled aside for a responder this tick
    pub is_yielding: bool,
    /// Seconds spent stationary outside an on-site action
    pub stuck_timer: f32,
    pub turn_cooldown: f32,
    /// Seconds spent on site servicing the current incident
    pub action_timer: f32,
}

impl SimVehicle {
    /// Create a vehicle at `position` without placement validation.
    /// The home anchors default to the starting position.
    pub fn new(id: VehicleId, class: VehicleClass, position: Position, heading: Heading) -> Self {
        let max_speed = class.max_speed();
        Self {
            id,
            position,
            heading,
            class,
            speed: max_speed,
            max_speed,
            active: true,
            target: None,
            mission_state: MissionState::Idle,
            home_center: position,
            home_entry: position,
            is_yielding: false,
            stuck_timer: 0.0,
            turn_cooldown: 0.0,
            action_timer: 0.0,
        }
    }

    /// Create a responder inside `facility`, ready to deploy.
    /// It heads straight for a matching incident if one is already active.
    pub fn deploy_from(id: VehicleId, facility: &Facility, incidents: &IncidentRegistry) -> Self {
        let mut vehicle = Self::new(id, facility.class, facility.center, Heading::Down);
        vehicle.home_center = facility.center;
        vehicle.home_entry = facility.entry_point;

        let incident_location = facility
            .class
            .mission_action()
            .and_then(|action| incidents.active_location(action.incident));
        vehicle.target = Some(incident_location.unwrap_or(facility.entry_point));
        vehicle.mission_state = MissionState::Deploying;
        vehicle
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn home_center(&self) -> Position {
        self.home_center
    }

    pub fn home_entry(&self) -> Position {
        self.home_entry
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Footprint of a vehicle, longer along its heading
    pub fn bounding_box_at(position: Position, heading: Heading) -> Rect {
        if heading.is_vertical() {
            Rect::centered(position, VEHICLE_HALF_WIDTH * 2.0, VEHICLE_HALF_LENGTH * 2.0)
        } else {
            Rect::centered(position, VEHICLE_HALF_LENGTH * 2.0, VEHICLE_HALF_WIDTH * 2.0)
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Self::bounding_box_at(self.position, self.heading)
    }

    /// Area ahead of the front bumper checked for obstacles.
    /// Grows with speed as a braking-distance proxy.
    pub fn sensor(&self) -> Rect {
        let look_ahead = SENSOR_BASE_LENGTH + self.speed * SENSOR_SPEED_GAIN;
        let width = self.class.sensor_width();
        let p = self.position;
        match self.heading {
            Heading::Up => Rect::new(
                p.x - width / 2.0,
                p.y - VEHICLE_HALF_LENGTH - look_ahead,
                width,
                look_ahead,
            ),
            Heading::Down => Rect::new(p.x - width / 2.0, p.y + VEHICLE_HALF_LENGTH, width, look_ahead),
            Heading::Left => Rect::new(
                p.x - VEHICLE_HALF_LENGTH - look_ahead,
                p.y - width / 2.0,
                look_ahead,
                width,
            ),
            Heading::Right => Rect::new(p.x + VEHICLE_HALF_LENGTH, p.y - width / 2.0, look_ahead, width),
        }
    }

    /// Signed lateral offset from the road axis this vehicle steers towards
    pub fn lane_offset(&self) -> f32 {
        let offset = self.heading.lane_sign();
        if self.class == VehicleClass::Civilian && self.is_yielding {
            // pulled over to the outer edge
            -offset * LANE_YIELD
        } else if self.class.is_responder() && self.mission_state == MissionState::OnMission {
            offset * LANE_EMERGENCY
        } else {
            offset * LANE_NORMAL
        }
    }

    fn set_mission_state(&mut self, next: MissionState) {
        if self.mission_state != next {
            debug!(
                "{:?} {:?}: {:?} -> {:?}",
                self.class, self.id.0, self.mission_state, next
            );
            self.mission_state = next;
        }
    }

    fn begin_return(&mut self) {
        self.set_mission_state(MissionState::Returning);
        self.target = Some(self.home_entry);
    }

    /// Advance this vehicle by one tick
    pub fn update(&mut self, ctx: &mut TickContext<'_>) -> VehicleUpdateResult {
        if !self.active {
            return VehicleUpdateResult::Continue;
        }

        if self.turn_cooldown > 0.0 {
            self.turn_cooldown -= ctx.delta_secs;
        }

        if let Some(action) = self.class.mission_action() {
            if let Some(result) = self.update_action(&action, ctx) {
                return result;
            }
        }

        match self.mission_state {
            MissionState::Deploying => {
                self.update_deploying(ctx.grid);
                return VehicleUpdateResult::Continue;
            }
            MissionState::Docking => return self.update_docking(),
            MissionState::Returning
                if self.position.distance(&self.home_entry) < DOCK_HANDOFF_DISTANCE =>
            {
                self.set_mission_state(MissionState::Docking);
            }
            _ => {}
        }

        if self.class.is_responder() && self.mission_state == MissionState::OnMission {
            self.refresh_target(ctx.incidents);
        }

        self.drive(ctx)
    }

    /// Arrival at the incident and the on-site action.
    /// Returns `Some` when the rest of the tick must be skipped.
    fn update_action(
        &mut self,
        action: &MissionAction,
        ctx: &mut TickContext<'_>,
    ) -> Option<VehicleUpdateResult> {
        if self.mission_state == MissionState::OnMission {
            match ctx.incidents.active_location(action.incident) {
                None => self.begin_return(),
                Some(location) if self.position.distance(&location) < action.arrival_radius => {
                    self.set_mission_state(action.state);
                }
                Some(_) => {}
            }
        }

        if self.mission_state != action.state {
            return None;
        }

        self.speed = lerp(self.speed, 0.0, action.braking);

        if !ctx.incidents.is_active(action.incident) {
            // someone else finished the job
            self.action_timer = 0.0;
            self.begin_return();
            return Some(VehicleUpdateResult::Continue);
        }

        self.action_timer += ctx.delta_secs;
        if self.action_timer > action.duration {
            ctx.incidents.clear(action.incident);
            self.action_timer = 0.0;
            self.begin_return();
            return Some(VehicleUpdateResult::ClearedIncident(action.incident));
        }

        Some(VehicleUpdateResult::Continue)
    }

    fn update_deploying(&mut self, grid: &RoadGrid) {
        if self.position.distance(&self.home_entry) < DEPLOY_ARRIVAL_DISTANCE {
            self.position = self.home_entry;
            self.set_mission_state(MissionState::OnMission);
            self.join_nearest_road(grid);
        } else {
            self.position = self.position.step_towards(&self.home_entry, GARAGE_STEP);
        }
    }

    /// Pick the road just joined (the closer of the two nearest axes), face
    /// towards the middle of the map and move onto the normal lane
    fn join_nearest_road(&mut self, grid: &RoadGrid) {
        let road_x = grid.snap_vertical(self.position.x);
        let road_y = grid.snap_horizontal(self.position.y);
        let center = grid.center();

        if (self.position.x - road_x).abs() < (self.position.y - road_y).abs() {
            self.heading = if self.position.y < center.y {
                Heading::Down
            } else {
                Heading::Up
            };
            self.position.x = road_x + self.heading.lane_sign() * LANE_NORMAL;
        } else {
            self.heading = if self.position.x < center.x {
                Heading::Right
            } else {
                Heading::Left
            };
            self.position.y = road_y + self.heading.lane_sign() * LANE_NORMAL;
        }
    }

    fn update_docking(&mut self) -> VehicleUpdateResult {
        if self.position.distance(&self.home_center) < DOCK_ARRIVAL_DISTANCE {
            self.active = false;
            return VehicleUpdateResult::Docked;
        }
        self.position = self.position.step_towards(&self.home_center, GARAGE_STEP);
        VehicleUpdateResult::Continue
    }

    fn refresh_target(&mut self, incidents: &IncidentRegistry) {
        let live = self
            .class
            .mission_action()
            .and_then(|action| incidents.active_location(action.incident));

        match (live, self.target) {
            (Some(location), _) => self.target = Some(location),
            (None, Some(target)) if self.position.distance(&target) < STALE_TARGET_DISTANCE => {
                self.begin_return();
            }
            _ => {}
        }
    }

    /// Steering, speed control, movement and the world-edge rules
    fn drive(&mut self, ctx: &mut TickContext<'_>) -> VehicleUpdateResult {
        let road_x = ctx.grid.snap_vertical(self.position.x);
        let road_y = ctx.grid.snap_horizontal(self.position.y);
        let at_intersection = (self.position.x - road_x).abs() < INTERSECTION_RADIUS
            && (self.position.y - road_y).abs() < INTERSECTION_RADIUS;

        if at_intersection && self.turn_cooldown <= 0.0 {
            let next = match self.target {
                Some(target) => steer_towards(self.heading, self.position, target, road_x, road_y),
                None if self.class == VehicleClass::Civilian => {
                    civilian_turn_choice(self.heading, ctx.rng)
                }
                None => self.heading,
            };
            if next != self.heading {
                self.turn_onto(next, road_x, road_y);
            }
        }

        let mut desired_speed = self.max_speed;
        let mut hard_stop = false;

        self.is_yielding = self.class == VehicleClass::Civilian
            && ctx
                .neighbors
                .within_radius(self.position, YIELD_RADIUS)
                .iter()
                .any(|other| {
                    other.active
                        && other.class.is_responder()
                        && other.mission_state == MissionState::OnMission
                });
        if self.is_yielding {
            desired_speed = YIELD_SPEED;
        }

        if self.class == VehicleClass::Civilian
            && !self.is_yielding
            && ctx.cycle.stops(self.heading)
            && self.in_braking_window(road_x, road_y)
        {
            desired_speed = 0.0;
        }

        let sensor = self.sensor();
        for other in ctx.neighbors.intersecting(&sensor) {
            if other.id == self.id || !other.active {
                continue;
            }
            if self.is_yielding && other.heading == self.heading.opposite() {
                continue;
            }

            let distance = self.position.distance(&other.position);
            if !self.is_yielding {
                desired_speed = 0.0;
                if distance < HARD_STOP_DISTANCE {
                    hard_stop = true;
                    self.speed = 0.0;
                } else if distance < SOFT_STOP_DISTANCE {
                    hard_stop = true;
                }
            } else if distance < YIELD_STOP_DISTANCE {
                desired_speed = 0.0;
            }
        }

        self.integrate_speed(desired_speed, hard_stop);

        let offset = self.lane_offset();
        let (dx, dy) = self.heading.step();
        self.position.x += dx * self.speed;
        self.position.y += dy * self.speed;

        if self.heading.is_vertical() {
            self.position.x = lerp(self.position.x, road_x + offset, LANE_LOCK_STRENGTH);
        } else {
            self.position.y = lerp(self.position.y, road_y + offset, LANE_LOCK_STRENGTH);
        }

        if self.speed == 0.0 {
            self.stuck_timer += ctx.delta_secs;
        } else {
            self.stuck_timer = 0.0;
        }

        self.apply_world_edges(&ctx.grid.bounds)
    }

    fn turn_onto(&mut self, heading: Heading, road_x: f32, road_y: f32) {
        self.heading = heading;
        let offset = heading.lane_sign() * LANE_NORMAL;
        if heading.is_vertical() {
            self.position = Position::new(road_x + offset, road_y);
        } else {
            self.position = Position::new(road_x, road_y + offset);
        }
        self.turn_cooldown = TURN_COOLDOWN;
    }

    /// True when approaching (not past) the crossing axis and inside the
    /// distance window where a red light means stop
    fn in_braking_window(&self, road_x: f32, road_y: f32) -> bool {
        let p = self.position;
        let (distance, approaching) = match self.heading {
            Heading::Down => ((p.y - road_y).abs(), p.y < road_y),
            Heading::Up => ((p.y - road_y).abs(), p.y > road_y),
            Heading::Right => ((p.x - road_x).abs(), p.x < road_x),
            Heading::Left => ((p.x - road_x).abs(), p.x > road_x),
        };
        approaching && distance > LIGHT_STOP_MIN && distance < LIGHT_STOP_MAX
    }

    fn integrate_speed(&mut self, desired_speed: f32, hard_stop: bool) {
        if hard_stop || desired_speed == 0.0 {
            self.speed = lerp(self.speed, 0.0, BRAKE_RATE);
            if self.speed < STOP_EPSILON {
                self.speed = 0.0;
            }
        } else {
            self.speed = lerp(self.speed, desired_speed, ACCEL_RATE);
        }
    }

    /// Untargeted vehicles leave the world past the margin; targeted ones are
    /// pinned inside and turned back
    fn apply_world_edges(&mut self, bounds: &Rect) -> VehicleUpdateResult {
        let p = &mut self.position;

        if self.target.is_none() {
            if p.x < bounds.x - DESPAWN_MARGIN
                || p.x > bounds.right() + DESPAWN_MARGIN
                || p.y < bounds.y - DESPAWN_MARGIN
                || p.y > bounds.bottom() + DESPAWN_MARGIN
            {
                self.active = false;
                return VehicleUpdateResult::LeftWorld;
            }
            return VehicleUpdateResult::Continue;
        }

        if p.x < bounds.x {
            p.x = bounds.x + EDGE_INSET;
            self.heading = Heading::Right;
        }
        if p.x > bounds.right() {
            p.x = bounds.right() - EDGE_INSET;
            self.heading = Heading::Left;
        }
        if p.y < bounds.y {
            p.y = bounds.y + EDGE_INSET;
            self.heading = Heading::Down;
        }
        if p.y > bounds.bottom() {
            p.y = bounds.bottom() - EDGE_INSET;
            self.heading = Heading::Up;
        }
        VehicleUpdateResult::Continue
    }
}

/// Heading a targeted vehicle takes at an intersection.
/// Lining up with the target's axis wins over general direction correction.
pub fn steer_towards(
    heading: Heading,
    position: Position,
    target: Position,
    road_x: f32,
    road_y: f32,
) -> Heading {
    let tdx = target.x - road_x;
    let tdy = target.y - road_y;

    if heading.is_vertical() {
        if tdy.abs() < TARGET_ALIGN_TOLERANCE {
            return if target.x > position.x {
                Heading::Right
            } else {
                Heading::Left
            };
        }
        if tdx.abs() > tdy.abs() {
            return if tdx > 0.0 { Heading::Right } else { Heading::Left };
        }
    } else {
        if tdx.abs() < TARGET_ALIGN_TOLERANCE {
            return if target.y > position.y {
                Heading::Down
            } else {
                Heading::Up
            };
        }
        if tdy.abs() > tdx.abs() {
            return if tdy > 0.0 { Heading::Down } else { Heading::Up };
        }
    }

    heading
}

/// Heading a wandering civilian takes at an intersection: a perpendicular
/// direction with probability `CIVILIAN_TURN_CHANCE`, otherwise straight on
pub fn civilian_turn_choice(heading: Heading, rng: &mut StdRng) -> Heading {
    if !rng.random_bool(CIVILIAN_TURN_CHANCE) {
        return heading;
    }
    let first = rng.random_bool(0.5);
    match (heading.is_vertical(), first) {
        (true, true) => Heading::Left,
        (true, false) => Heading::Right,
        (false, true) => Heading::Up,
        (false, false) => Heading::Down,
    }
}
