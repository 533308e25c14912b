//! Incident registry: the fire and accident slots shared by the whole world

use super::types::{Position, VehicleClass};

/// Kind of incident. At most one of each kind is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncidentKind {
    Fire,
    Accident,
}

impl IncidentKind {
    /// The responder class that services this kind of incident
    pub fn responder(&self) -> VehicleClass {
        match self {
            IncidentKind::Fire => VehicleClass::Fire,
            IncidentKind::Accident => VehicleClass::Ambulance,
        }
    }
}

/// One incident slot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncidentSlot {
    pub active: bool,
    pub location: Position,
}

/// The two independent incident slots
#[derive(Debug, Clone, Default)]
pub struct IncidentRegistry {
    pub fire: IncidentSlot,
    pub accident: IncidentSlot,
}

impl IncidentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, kind: IncidentKind) -> &IncidentSlot {
        match kind {
            IncidentKind::Fire => &self.fire,
            IncidentKind::Accident => &self.accident,
        }
    }

    fn slot_mut(&mut self, kind: IncidentKind) -> &mut IncidentSlot {
        match kind {
            IncidentKind::Fire => &mut self.fire,
            IncidentKind::Accident => &mut self.accident,
        }
    }

    pub fn is_active(&self, kind: IncidentKind) -> bool {
        self.slot(kind).active
    }

    /// Location of the incident if it is currently active
    pub fn active_location(&self, kind: IncidentKind) -> Option<Position> {
        let slot = self.slot(kind);
        slot.active.then_some(slot.location)
    }

    /// Activate an incident at `location`.
    /// Returns false (and changes nothing) if one of that kind is already active.
    pub fn trigger(&mut self, kind: IncidentKind, location: Position) -> bool {
        let slot = self.slot_mut(kind);
        if slot.active {
            return false;
        }
        slot.active = true;
        slot.location = location;
        true
    }

    /// Clear an incident. Returns true if it was active.
    pub fn clear(&mut self, kind: IncidentKind) -> bool {
        let slot = self.slot_mut(kind);
        let was_active = slot.active;
        slot.active = false;
        was_active
    }
}
