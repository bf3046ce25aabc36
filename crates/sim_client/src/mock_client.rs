//! Mock simulator client
//!
//! Scriptable implementation for unit/e2e tests and serverless runs,
//! supports injecting connect and transport failure scenarios.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{
    EpisodeSettings, ImageData, ImageFormat, Measurements, PlayerMeasurements, PointCloudData,
    PostProcessing, Scene, SensorFrame, SensorPayload, Transform, VehicleControl,
};
use tracing::instrument;

use crate::client::SimulatorClient;
use crate::error::{ClientError, Result};

/// Scripted behavior for the mock client
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Start spots the scene reports
    pub start_spots: Vec<Transform>,
    /// Telemetry frames served in order by `read_data`
    pub frames: VecDeque<MockFrame>,
    /// Number of initial `connect` calls that fail with a transport error
    pub fail_connects: u32,
    /// Absolute read indices (0-based, counted over the mock's lifetime)
    /// that fail with a transport error instead of producing a frame
    pub fail_reads: Vec<usize>,
    /// When the frame queue is empty, synthesize a steady forward drive
    /// instead of failing (serverless `run` mode)
    pub synthesize_when_empty: bool,
}

impl Default for MockScript {
    fn default() -> Self {
        Self {
            start_spots: vec![Transform::default()],
            frames: VecDeque::new(),
            fail_connects: 0,
            fail_reads: Vec::new(),
            synthesize_when_empty: false,
        }
    }
}

/// One scripted telemetry frame
#[derive(Debug, Clone)]
pub struct MockFrame {
    pub x: f64,
    pub y: f64,
    pub forward_speed: f64,
    pub autopilot: VehicleControl,
}

impl MockFrame {
    /// Frame at (x, y) moving at cruising speed
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            forward_speed: 8.0,
            autopilot: VehicleControl {
                throttle: 0.5,
                ..Default::default()
            },
        }
    }

    /// Frame at (x, y) with zero forward speed
    pub fn stopped(x: f64, y: f64) -> Self {
        Self {
            forward_speed: 0.0,
            ..Self::at(x, y)
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.forward_speed = speed;
        self
    }

    fn to_measurements(&self) -> Measurements {
        Measurements {
            player: PlayerMeasurements {
                transform: Transform::at(self.x, self.y, 0.5),
                forward_speed: self.forward_speed,
                autopilot_control: self.autopilot,
                ..Default::default()
            },
            non_player_agent_count: 0,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    connected: bool,
    connects_attempted: u32,
    settings: Option<EpisodeSettings>,
    episode_started: bool,
    started_episodes: Vec<usize>,
    reads: usize,
    controls_sent: Vec<VehicleControl>,
    /// Position of the synthesized drive along the x axis
    synth_x: f64,
}

/// Mock simulator client
///
/// Clones share state, so tests can keep a handle for assertions while the
/// run driver owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSimulatorClient {
    script: Arc<Mutex<MockScript>>,
    state: Arc<Mutex<MockState>>,
}

impl MockSimulatorClient {
    /// Create default mock client (connects, no frames scripted)
    pub fn new() -> Self {
        Self::with_script(MockScript::default())
    }

    /// Create mock client with a script
    pub fn with_script(script: MockScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Mock client that synthesizes an endless steady drive, for running
    /// the collector without a simulator server
    pub fn synthetic() -> Self {
        Self::with_script(MockScript {
            synthesize_when_empty: true,
            ..Default::default()
        })
    }

    /// Append a frame to the script
    pub fn push_frame(&self, frame: MockFrame) {
        self.script.lock().unwrap().frames.push_back(frame);
    }

    /// Append the same frame several times
    pub fn push_frames(&self, frame: MockFrame, count: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..count {
            script.frames.push_back(frame.clone());
        }
    }

    /// Start-spot indices of every episode started so far
    pub fn started_episodes(&self) -> Vec<usize> {
        self.state.lock().unwrap().started_episodes.clone()
    }

    /// Every control command the client received
    pub fn controls_sent(&self) -> Vec<VehicleControl> {
        self.state.lock().unwrap().controls_sent.clone()
    }

    /// Total `read_data` calls served (including failed ones)
    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    /// Total `connect` attempts
    pub fn connects_attempted(&self) -> u32 {
        self.state.lock().unwrap().connects_attempted
    }

    /// Synthesize sensor readings for the currently loaded settings
    fn synthesize_sensors(settings: &EpisodeSettings) -> SensorFrame {
        let mut frame = SensorFrame::new();

        for camera in &settings.cameras {
            // Tiny 2x2 image, enough to exercise persistence. Depth and
            // semantic-seg dumps carry 4 bytes per pixel, RGB carries 3.
            let (format, bytes_per_pixel) = match camera.post_processing {
                PostProcessing::SceneFinal => (ImageFormat::Rgb8, 3),
                PostProcessing::Depth => (ImageFormat::Depth, 4),
                PostProcessing::SemanticSegmentation => (ImageFormat::SemanticSeg, 4),
            };
            frame.insert(
                camera.name.clone(),
                SensorPayload::Image(ImageData {
                    width: 2,
                    height: 2,
                    format,
                    data: Bytes::from(vec![0u8; 2 * 2 * bytes_per_pixel]),
                }),
            );
        }

        for lidar in &settings.lidars {
            let mut raw = Vec::new();
            for v in [1.0f32, 0.0, 0.5, -1.0, 0.0, 0.5] {
                raw.extend_from_slice(&v.to_le_bytes());
            }
            frame.insert(
                lidar.name.clone(),
                SensorPayload::PointCloud(PointCloudData {
                    num_points: 2,
                    point_stride: 12,
                    data: Bytes::from(raw),
                }),
            );
        }

        frame
    }

    fn ensure_connected(state: &MockState) -> Result<()> {
        if state.connected {
            Ok(())
        } else {
            Err(ClientError::NotConnected)
        }
    }
}

impl SimulatorClient for MockSimulatorClient {
    #[instrument(name = "mock_sim_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let _ = (host, port);
        let mut state = self.state.lock().unwrap();
        state.connects_attempted += 1;

        let mut script = self.script.lock().unwrap();
        if script.fail_connects > 0 {
            script.fail_connects -= 1;
            return Err(ClientError::transport("mock connect refused"));
        }

        state.connected = true;
        Ok(())
    }

    #[instrument(name = "mock_sim_load_settings", skip(self, settings), fields(sensors = settings.sensor_count()))]
    async fn load_settings(&mut self, settings: &EpisodeSettings) -> Result<Scene> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;

        state.settings = Some(settings.clone());
        state.episode_started = false;

        Ok(Scene {
            player_start_spots: self.script.lock().unwrap().start_spots.clone(),
        })
    }

    #[instrument(name = "mock_sim_start_episode", skip(self), fields(start_index))]
    async fn start_episode(&mut self, start_index: usize) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;

        let spots = self.script.lock().unwrap().start_spots.len();
        if start_index >= spots {
            return Err(ClientError::episode(format!(
                "start index {start_index} out of range ({spots} spots)"
            )));
        }

        state.episode_started = true;
        state.started_episodes.push(start_index);
        Ok(())
    }

    async fn read_data(&mut self) -> Result<(Measurements, SensorFrame)> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        if !state.episode_started {
            return Err(ClientError::episode("read_data before start_episode"));
        }

        let read_index = state.reads;
        state.reads += 1;

        let mut script = self.script.lock().unwrap();
        if script.fail_reads.contains(&read_index) {
            state.connected = false;
            return Err(ClientError::transport("mock connection dropped"));
        }

        let frame = match script.frames.pop_front() {
            Some(frame) => frame,
            None if script.synthesize_when_empty => {
                // Steady 10 m/s drive, one meter per tick
                state.synth_x += 1.0;
                MockFrame::at(state.synth_x, 0.0).with_speed(10.0)
            }
            None => return Err(ClientError::episode("mock script exhausted")),
        };

        let sensors = state
            .settings
            .as_ref()
            .map(Self::synthesize_sensors)
            .unwrap_or_default();

        Ok((frame.to_measurements(), sensors))
    }

    async fn send_control(&mut self, control: &VehicleControl) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_connected(&state)?;
        state.controls_sent.push(*control);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_episode_flow() {
        let mut client = MockSimulatorClient::new();
        client.push_frame(MockFrame::at(1.0, 2.0));

        client.connect("localhost", 2000).await.unwrap();
        let scene = client
            .load_settings(&EpisodeSettings::default())
            .await
            .unwrap();
        assert_eq!(scene.player_start_spots.len(), 1);

        client.start_episode(0).await.unwrap();
        let (measurements, sensors) = client.read_data().await.unwrap();
        assert_eq!(measurements.player.transform.location.x, 1.0);
        // Default rig: three cameras + one lidar
        assert_eq!(sensors.len(), 4);

        client
            .send_control(&measurements.player.autopilot_control)
            .await
            .unwrap();
        assert_eq!(client.controls_sent().len(), 1);
    }

    #[tokio::test]
    async fn test_read_before_episode_fails() {
        let mut client = MockSimulatorClient::new();
        client.connect("localhost", 2000).await.unwrap();
        client.load_settings(&EpisodeSettings::default()).await.unwrap();

        let err = client.read_data().await.unwrap_err();
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_connect_failure_injection() {
        let mut client = MockSimulatorClient::with_script(MockScript {
            fail_connects: 1,
            ..Default::default()
        });

        let err = client.connect("localhost", 2000).await.unwrap_err();
        assert!(err.is_transport());
        client.connect("localhost", 2000).await.unwrap();
        assert_eq!(client.connects_attempted(), 2);
    }

    #[tokio::test]
    async fn test_read_failure_drops_connection() {
        let mut client = MockSimulatorClient::with_script(MockScript {
            fail_reads: vec![1],
            ..Default::default()
        });
        client.push_frames(MockFrame::at(0.0, 0.0), 3);

        client.connect("localhost", 2000).await.unwrap();
        client.load_settings(&EpisodeSettings::default()).await.unwrap();
        client.start_episode(0).await.unwrap();

        client.read_data().await.unwrap();
        let err = client.read_data().await.unwrap_err();
        assert!(err.is_transport());

        // Connection is gone until the next connect
        let err = client.read_data().await.unwrap_err();
        assert!(err.is_transport());
        client.connect("localhost", 2000).await.unwrap();
    }

    #[tokio::test]
    async fn test_synthetic_drive_advances() {
        let mut client = MockSimulatorClient::synthetic();
        client.connect("localhost", 2000).await.unwrap();
        client.load_settings(&EpisodeSettings::default()).await.unwrap();
        client.start_episode(0).await.unwrap();

        let (first, _) = client.read_data().await.unwrap();
        let (second, _) = client.read_data().await.unwrap();
        assert!(second.player.transform.location.x > first.player.transform.location.x);
        assert!(second.player.forward_speed > 0.0);
    }

    #[tokio::test]
    async fn test_start_index_out_of_range() {
        let mut client = MockSimulatorClient::new();
        client.connect("localhost", 2000).await.unwrap();
        client.load_settings(&EpisodeSettings::default()).await.unwrap();

        let err = client.start_episode(5).await.unwrap_err();
        assert!(matches!(err, ClientError::Episode { .. }));
    }
}
