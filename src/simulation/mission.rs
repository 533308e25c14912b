//! Emergency mission states and per-class mission capabilities

use super::incident::IncidentKind;
use super::types::VehicleClass;

/// Seconds a responder spends on site before the incident is cleared
pub const ACTION_DURATION: f32 = 3.0;

/// Arrival radius around a fire
pub const FIRE_ARRIVAL_RADIUS: f32 = 70.0;

/// Arrival radius around an accident
pub const ACCIDENT_ARRIVAL_RADIUS: f32 = 30.0;

/// Units per tick covered while leaving or entering a facility
pub const GARAGE_STEP: f32 = 2.5;

/// Distance from the entry point at which deployment completes
pub const DEPLOY_ARRIVAL_DISTANCE: f32 = 8.0;

/// Distance from the facility centre at which docking completes
pub const DOCK_ARRIVAL_DISTANCE: f32 = 5.0;

/// Distance from the entry point at which a returning vehicle starts docking
pub const DOCK_HANDOFF_DISTANCE: f32 = 20.0;

/// A responder this close to a stale target gives up and returns
pub const STALE_TARGET_DISTANCE: f32 = 30.0;

/// State of a vehicle's emergency mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionState {
    /// Not on a mission; civilians never leave this state
    Idle,
    /// Driving out of the facility towards its entry point
    Deploying,
    /// On the road, heading for the incident
    OnMission,
    Extinguishing,
    Treating,
    /// Heading back to the facility entry point
    Returning,
    /// Driving from the entry point into the facility
    Docking,
}

impl MissionState {
    /// Whether a vehicle may move from `self` to `next` within one mission
    pub fn can_transition_to(&self, next: MissionState) -> bool {
        use MissionState::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Idle, Deploying)
                | (Deploying, OnMission)
                | (OnMission, Extinguishing)
                | (OnMission, Treating)
                | (OnMission, Returning)
                | (Extinguishing, Returning)
                | (Treating, Returning)
                | (Returning, Docking)
        )
    }

    /// True for the on-site action sub-states
    pub fn is_action(&self) -> bool {
        matches!(self, MissionState::Extinguishing | MissionState::Treating)
    }
}

/// What a responder class does once it reaches its incident
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionAction {
    /// The incident kind this class services
    pub incident: IncidentKind,
    pub arrival_radius: f32,
    /// Dwell time before the incident is cleared
    pub duration: f32,
    /// Sub-state entered on arrival
    pub state: MissionState,
    /// Smoothing factor used to brake while on site
    pub braking: f32,
}

impl VehicleClass {
    /// On-site capability of this class. Police and civilians have none.
    pub fn mission_action(&self) -> Option<MissionAction> {
        match self {
            VehicleClass::Fire => Some(MissionAction {
                incident: IncidentKind::Fire,
                arrival_radius: FIRE_ARRIVAL_RADIUS,
                duration: ACTION_DURATION,
                state: MissionState::Extinguishing,
                braking: 0.1,
            }),
            VehicleClass::Ambulance => Some(MissionAction {
                incident: IncidentKind::Accident,
                arrival_radius: ACCIDENT_ARRIVAL_RADIUS,
                duration: ACTION_DURATION,
                state: MissionState::Treating,
                braking: 0.2,
            }),
            VehicleClass::Police | VehicleClass::Civilian => None,
        }
    }
}
