//! Measurements - per-tick vehicle telemetry
//!
//! One simulator tick's player state as reported by the server.

use serde::{Deserialize, Serialize};

use crate::{Transform, VehicleControl};

/// Full telemetry snapshot for one simulation tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Player (ego vehicle) measurements
    pub player: PlayerMeasurements,

    /// Number of non-player agents currently in the scene
    pub non_player_agent_count: usize,
}

/// Ego vehicle state for one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerMeasurements {
    /// World pose of the vehicle
    pub transform: Transform,

    /// Forward speed in m/s
    pub forward_speed: f64,

    /// Accumulated collision intensity with other vehicles
    pub collision_vehicles: f64,

    /// Accumulated collision intensity with pedestrians
    pub collision_pedestrians: f64,

    /// Accumulated collision intensity with everything else
    pub collision_other: f64,

    /// Fraction of the vehicle footprint over the opposite lane (0..1)
    pub intersection_otherlane: f64,

    /// Fraction of the vehicle footprint off the road (0..1)
    pub intersection_offroad: f64,

    /// Control the in-game autopilot suggests for this frame
    pub autopilot_control: VehicleControl,
}

impl PlayerMeasurements {
    /// Forward speed converted to km/h
    pub fn speed_kmh(&self) -> f64 {
        self.forward_speed * 3.6
    }

    /// Ground-plane position (x, y) used by the novelty filter
    pub fn position_2d(&self) -> (f64, f64) {
        (self.transform.location.x, self.transform.location.y)
    }
}
