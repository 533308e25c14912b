//! Tunable parameters of the traffic coordinator

/// Per-tick probability of a new fire or accident when none is active
pub const DEFAULT_INCIDENT_CHANCE: f64 = 3.0 / 1001.0;

/// Per-tick probability of an automatic civilian spawn
pub const DEFAULT_CIVILIAN_SPAWN_CHANCE: f64 = 1.0 / 81.0;

/// Automatic spawning stops once this many vehicles are on the map
pub const DEFAULT_MAX_VEHICLES: usize = 35;

/// Block corners sampled per tick when looking for a fire site
pub const DEFAULT_FIRE_SEARCH_ATTEMPTS: usize = 10;

/// Size of the default world
pub const DEFAULT_WORLD_WIDTH: f32 = 1050.0;
pub const DEFAULT_WORLD_HEIGHT: f32 = 700.0;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub civilian_spawn_chance: f64,
    pub max_vehicles: usize,
    pub fire_chance: f64,
    pub accident_chance: f64,
    pub fire_search_attempts: usize,
    /// Send the matching responder whenever an incident starts
    pub auto_dispatch: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            civilian_spawn_chance: DEFAULT_CIVILIAN_SPAWN_CHANCE,
            max_vehicles: DEFAULT_MAX_VEHICLES,
            fire_chance: DEFAULT_INCIDENT_CHANCE,
            accident_chance: DEFAULT_INCIDENT_CHANCE,
            fire_search_attempts: DEFAULT_FIRE_SEARCH_ATTEMPTS,
            auto_dispatch: false,
        }
    }
}

impl SimConfig {
    /// No random spawns or incidents; everything is scripted by the caller
    pub fn scripted() -> Self {
        Self {
            civilian_spawn_chance: 0.0,
            fire_chance: 0.0,
            accident_chance: 0.0,
            ..Self::default()
        }
    }
}
