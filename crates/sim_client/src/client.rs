//! Simulator client abstraction
//!
//! Defines the episode contract for interacting with the simulator,
//! supporting real implementation and mock testing.

use std::future::Future;

use contracts::{EpisodeSettings, Measurements, Scene, SensorFrame, VehicleControl};

use crate::error::Result;

/// Simulator client trait
///
/// Strictly sequential request/response: every call is one blocking round
/// trip with the server, there is no overlap between request and processing.
/// Supports unified interface for real CARLA client and Mock client.
pub trait SimulatorClient: Send {
    /// Connect to the simulator server
    ///
    /// Fails with [`crate::ClientError::Transport`] when the server is
    /// unreachable.
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<()>> + Send;

    /// Submit episode settings, receive the scene description
    ///
    /// The returned [`Scene`] lists the candidate player start spots.
    fn load_settings(
        &mut self,
        settings: &EpisodeSettings,
    ) -> impl Future<Output = Result<Scene>> + Send;

    /// Start a new episode at the given start-spot index
    ///
    /// Resolves once the server acknowledges the episode is ready.
    fn start_episode(&mut self, start_index: usize) -> impl Future<Output = Result<()>> + Send;

    /// Read the next frame: telemetry plus named sensor readings
    fn read_data(&mut self) -> impl Future<Output = Result<(Measurements, SensorFrame)>> + Send;

    /// Send a control command, advancing the simulation
    fn send_control(
        &mut self,
        control: &VehicleControl,
    ) -> impl Future<Output = Result<()>> + Send;
}
