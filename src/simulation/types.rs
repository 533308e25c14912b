//! Core types for the emergency traffic simulation
//!
//! Plain data types and the behavioural constants shared by every module.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

/// Class of vehicle, fixed when the vehicle is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleClass {
    /// Wanders the grid and obeys lights
    Civilian,
    Police,
    Ambulance,
    /// Fire engine, services fires
    Fire,
}

impl VehicleClass {
    pub fn is_responder(&self) -> bool {
        !matches!(self, VehicleClass::Civilian)
    }

    /// Top speed in world units per tick
    pub fn max_speed(&self) -> f32 {
        if self.is_responder() {
            RESPONDER_MAX_SPEED
        } else {
            CIVILIAN_MAX_SPEED
        }
    }

    /// Width of the forward collision sensor
    pub fn sensor_width(&self) -> f32 {
        if self.is_responder() {
            RESPONDER_SENSOR_WIDTH
        } else {
            CIVILIAN_SENSOR_WIDTH
        }
    }
}

/// Direction of travel. Vehicles never move diagonally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// True for headings that travel along a vertical road
    pub fn is_vertical(&self) -> bool {
        matches!(self, Heading::Up | Heading::Down)
    }

    pub fn opposite(&self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    /// Sign of the lane offset for this heading.
    /// Traffic drives on the right: Down/Right take the positive side.
    pub fn lane_sign(&self) -> f32 {
        match self {
            Heading::Down | Heading::Right => 1.0,
            Heading::Up | Heading::Left => -1.0,
        }
    }

    /// Unit step along this heading (screen coordinates, y grows downwards)
    pub fn step(&self) -> (f32, f32) {
        match self {
            Heading::Up => (0.0, -1.0),
            Heading::Down => (0.0, 1.0),
            Heading::Left => (-1.0, 0.0),
            Heading::Right => (1.0, 0.0),
        }
    }
}

/// A 2D position in the simulation (screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move up to `step` units straight towards `other` without overshooting
    pub fn step_towards(&self, other: &Position, step: f32) -> Position {
        let dist = self.distance(other);
        if dist <= step || dist == 0.0 {
            return *other;
        }
        Position {
            x: self.x + (other.x - self.x) / dist * step,
            y: self.y + (other.y - self.y) / dist * step,
        }
    }
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centred on `center`
    pub fn centered(center: Position, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Grow the rectangle by `margin` on every side
    pub fn inflate(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }
}

/// Exponential smoothing step from `from` towards `to`
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Top speed of civilian vehicles (units per tick)
pub const CIVILIAN_MAX_SPEED: f32 = 1.4;

/// Top speed of emergency vehicles (units per tick)
pub const RESPONDER_MAX_SPEED: f32 = 4.0;

/// Half of a vehicle's length along its heading
pub const VEHICLE_HALF_LENGTH: f32 = 13.0;

/// Half of a vehicle's width across its heading
pub const VEHICLE_HALF_WIDTH: f32 = 8.0;

/// Lane offset from the road axis during normal driving
pub const LANE_NORMAL: f32 = 18.0;

/// Lane offset magnitude of a civilian pulled over for a responder
pub const LANE_YIELD: f32 = 22.0;

/// Lane offset of a responder on a mission (priority lane near the centre)
pub const LANE_EMERGENCY: f32 = 6.0;

/// Strength of the per-tick pull towards the lane centre
pub const LANE_LOCK_STRENGTH: f32 = 0.15;

/// Visual width of a road; block zones start half of this from the axis
pub const ROAD_WIDTH: f32 = 70.0;

/// Distance from both axes under which a vehicle counts as in an intersection
pub const INTERSECTION_RADIUS: f32 = 20.0;

/// Seconds before another turn may be evaluated
pub const TURN_COOLDOWN: f32 = 0.8;

/// Probability that a wandering civilian turns at an intersection
pub const CIVILIAN_TURN_CHANCE: f64 = 0.25;

/// Target offset under which a responder aligns with the target's axis
pub const TARGET_ALIGN_TOLERANCE: f32 = 10.0;

/// Radius in which civilians yield to responders on a mission
pub const YIELD_RADIUS: f32 = 250.0;

/// Speed a yielding civilian slows to
pub const YIELD_SPEED: f32 = 1.2;

/// Distance at which a yielding civilian still stops for a vehicle ahead
pub const YIELD_STOP_DISTANCE: f32 = 35.0;

/// Red light braking window, measured from the crossing axis
pub const LIGHT_STOP_MIN: f32 = 40.0;
pub const LIGHT_STOP_MAX: f32 = 95.0;

/// Sensor length with zero speed
pub const SENSOR_BASE_LENGTH: f32 = 70.0;

/// Extra sensor length per unit of speed
pub const SENSOR_SPEED_GAIN: f32 = 25.0;

pub const CIVILIAN_SENSOR_WIDTH: f32 = 14.0;
pub const RESPONDER_SENSOR_WIDTH: f32 = 8.0;

/// Vehicles closer than this inside the sensor cause an immediate stop
pub const HARD_STOP_DISTANCE: f32 = 55.0;

/// Vehicles closer than this inside the sensor cause fast braking
pub const SOFT_STOP_DISTANCE: f32 = 80.0;

/// Smoothing factor used when braking
pub const BRAKE_RATE: f32 = 0.3;

/// Smoothing factor used when accelerating
pub const ACCEL_RATE: f32 = 0.05;

/// Speeds below this snap to zero while braking
pub const STOP_EPSILON: f32 = 0.05;

/// Distance outside the world bounds at which untargeted vehicles are removed
pub const DESPAWN_MARGIN: f32 = 100.0;

/// Inset used when pinning a targeted vehicle inside the world bounds
pub const EDGE_INSET: f32 = 2.0;

/// Distance outside the world bounds where civilians appear
pub const SPAWN_OFFSET: f32 = 90.0;

/// Clearance required around a freshly spawned civilian
pub const SPAWN_CLEARANCE: f32 = 70.0;

/// Placement attempts before civilian construction gives up
pub const SPAWN_ATTEMPTS: usize = 15;
