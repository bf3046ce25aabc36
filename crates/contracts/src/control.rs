//! Vehicle control command echoed back to the simulator each tick.

use serde::{Deserialize, Serialize};

/// Vehicle control command
///
/// The server sends the control the in-game autopilot would apply this frame;
/// the client echoes it back (optionally perturbed) to keep autopilot driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// Steering in [-1.0, 1.0]
    pub steer: f64,

    /// Throttle in [0.0, 1.0]
    pub throttle: f64,

    /// Brake in [0.0, 1.0]
    pub brake: f64,

    pub hand_brake: bool,

    pub reverse: bool,
}

impl VehicleControl {
    /// Copy of this control with a steering offset, clamped to [-1.0, 1.0]
    pub fn with_steer_offset(mut self, offset: f64) -> Self {
        self.steer = (self.steer + offset).clamp(-1.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steer_offset_clamps() {
        let control = VehicleControl {
            steer: 0.95,
            ..Default::default()
        };
        assert_eq!(control.with_steer_offset(0.1).steer, 1.0);
        assert_eq!(control.with_steer_offset(-0.05).steer, 0.9);
    }
}
