//! Running counters for the simulation summary

use log::info;

use super::incident::IncidentKind;

/// Statistics collected by the coordinator over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub civilians_spawned: u32,
    pub civilian_spawn_failures: u32,
    pub responders_dispatched: u32,
    pub dispatch_failures: u32,
    pub responders_docked: u32,
    pub vehicles_left_world: u32,
    pub fires_started: u32,
    pub fires_extinguished: u32,
    pub accidents_started: u32,
    pub accidents_cleared: u32,
}

impl SimStats {
    pub fn record_incident_started(&mut self, kind: IncidentKind) {
        match kind {
            IncidentKind::Fire => self.fires_started += 1,
            IncidentKind::Accident => self.accidents_started += 1,
        }
    }

    pub fn record_incident_cleared(&mut self, kind: IncidentKind) {
        match kind {
            IncidentKind::Fire => self.fires_extinguished += 1,
            IncidentKind::Accident => self.accidents_cleared += 1,
        }
    }

    /// Share of started incidents that a responder cleared, in percent
    pub fn clearance_rate(&self) -> f32 {
        let started = self.fires_started + self.accidents_started;
        if started == 0 {
            return 0.0;
        }
        (self.fires_extinguished + self.accidents_cleared) as f32 / started as f32 * 100.0
    }

    /// Log the run summary
    pub fn log_summary(&self, elapsed_time: f32, active_vehicles: usize, stalled_vehicles: usize) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {:.2}s", elapsed_time);
        info!("Civilians spawned: {}", self.civilians_spawned);
        info!("Civilian spawn failures: {}", self.civilian_spawn_failures);
        info!("Responders dispatched: {}", self.responders_dispatched);
        info!("Responders docked: {}", self.responders_docked);
        info!("Vehicles left world: {}", self.vehicles_left_world);
        info!("Active vehicles: {}", active_vehicles);
        info!("Stalled vehicles: {}", stalled_vehicles);
        info!(
            "Fires: {} started, {} extinguished",
            self.fires_started, self.fires_extinguished
        );
        info!(
            "Accidents: {} started, {} cleared",
            self.accidents_started, self.accidents_cleared
        );
        info!("Clearance rate: {:.1}%", self.clearance_rate());
    }
}
