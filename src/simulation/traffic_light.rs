//! Traffic light logic for the simulation
//!
//! A single cycle drives every intersection at once.

use super::types::Heading;

/// Seconds each phase of the light cycle lasts
pub const LIGHT_PHASE_DURATION: f32 = 3.0;

/// Phase of the shared light cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightCycle {
    #[default]
    VerticalGreen,
    VerticalYellow,
    HorizontalGreen,
    HorizontalYellow,
}

impl LightCycle {
    pub fn next(&self) -> LightCycle {
        match self {
            LightCycle::VerticalGreen => LightCycle::VerticalYellow,
            LightCycle::VerticalYellow => LightCycle::HorizontalGreen,
            LightCycle::HorizontalGreen => LightCycle::HorizontalYellow,
            LightCycle::HorizontalYellow => LightCycle::VerticalGreen,
        }
    }

    /// Whether traffic travelling along `heading` must stop (red or yellow)
    pub fn stops(&self, heading: Heading) -> bool {
        if heading.is_vertical() {
            *self != LightCycle::VerticalGreen
        } else {
            *self != LightCycle::HorizontalGreen
        }
    }
}

/// Owns the light cycle and its dwell timer
#[derive(Debug, Clone)]
pub struct LightController {
    pub cycle: LightCycle,
    /// Time spent in the current phase
    pub timer: f32,
    pub phase_duration: f32,
}

impl Default for LightController {
    fn default() -> Self {
        Self::new()
    }
}

impl LightController {
    pub fn new() -> Self {
        Self {
            cycle: LightCycle::default(),
            timer: 0.0,
            phase_duration: LIGHT_PHASE_DURATION,
        }
    }

    /// Advance the timer, switching phase once it exceeds the phase duration.
    /// Returns the cycle in effect for this tick.
    pub fn update(&mut self, delta_secs: f32) -> LightCycle {
        self.timer += delta_secs;
        if self.timer > self.phase_duration {
            self.cycle = self.cycle.next();
            self.timer = 0.0;
        }
        self.cycle
    }
}
