//! EpisodeSettings - episode/world configuration submitted to the simulator
//!
//! Describes weather, traffic density, graphics quality and the sensor rig
//! mounted on the ego vehicle. Submitting it starts a new scene; the server
//! replies with a [`Scene`] listing candidate player start spots.

use serde::{Deserialize, Serialize};

use crate::{Location, Rotation, Transform};

/// Complete episode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSettings {
    /// Lock-step the server to the client (off: server runs free)
    #[serde(default)]
    pub synchronous_mode: bool,

    /// Include non-player agents in measurements
    #[serde(default = "default_true")]
    pub send_non_player_agents_info: bool,

    /// Number of traffic vehicles to spawn
    #[serde(default = "default_vehicles")]
    pub number_of_vehicles: u32,

    /// Number of pedestrians to spawn
    #[serde(default = "default_pedestrians")]
    pub number_of_pedestrians: u32,

    /// Weather preset index
    #[serde(default = "default_weather")]
    pub weather_id: u32,

    /// Graphics quality level
    #[serde(default)]
    pub quality_level: QualityLevel,

    /// Vehicle spawn seed (None = server picks)
    #[serde(default)]
    pub seed_vehicles: Option<u64>,

    /// Pedestrian spawn seed (None = server picks)
    #[serde(default)]
    pub seed_pedestrians: Option<u64>,

    /// Cameras mounted on the ego vehicle
    #[serde(default)]
    pub cameras: Vec<CameraSettings>,

    /// Rotating range scanners mounted on the ego vehicle
    #[serde(default)]
    pub lidars: Vec<LidarSettings>,
}

fn default_true() -> bool {
    true
}

fn default_vehicles() -> u32 {
    40
}

fn default_pedestrians() -> u32 {
    100
}

fn default_weather() -> u32 {
    1
}

/// Graphics quality level
///
/// A lower level makes the simulation run considerably faster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Low,
    #[default]
    Epic,
}

impl QualityLevel {
    /// Server-side name of this level
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Low => "Low",
            QualityLevel::Epic => "Epic",
        }
    }
}

/// Camera sensor definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Unique sensor name, keys the on-disk dump directory
    pub name: String,

    /// Post-processing applied by the server
    pub post_processing: PostProcessing,

    #[serde(default = "default_image_width")]
    pub image_width: u32,

    #[serde(default = "default_image_height")]
    pub image_height: u32,

    /// Mount pose relative to the vehicle
    #[serde(default)]
    pub transform: Transform,
}

fn default_image_width() -> u32 {
    640
}

fn default_image_height() -> u32 {
    480
}

/// Camera post-processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessing {
    /// Final rendered scene (RGB)
    SceneFinal,
    /// Depth map
    Depth,
    /// Semantic segmentation labels
    SemanticSegmentation,
}

/// Rotating LiDAR definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LidarSettings {
    /// Unique sensor name, keys the on-disk dump directory
    pub name: String,

    /// Mount pose relative to the vehicle
    #[serde(default)]
    pub transform: Transform,

    #[serde(default = "default_channels")]
    pub channels: u32,

    /// Maximum range in meters
    #[serde(default = "default_range")]
    pub range: f64,

    #[serde(default = "default_points_per_second")]
    pub points_per_second: u32,

    /// Rotation frequency in Hz
    #[serde(default = "default_rotation_frequency")]
    pub rotation_frequency: f64,

    /// Upper field-of-view limit in degrees
    #[serde(default = "default_upper_fov")]
    pub upper_fov: f64,

    /// Lower field-of-view limit in degrees
    #[serde(default = "default_lower_fov")]
    pub lower_fov: f64,
}

fn default_channels() -> u32 {
    64
}

fn default_range() -> f64 {
    100.0
}

fn default_points_per_second() -> u32 {
    2_560_000
}

fn default_rotation_frequency() -> f64 {
    10.0
}

fn default_upper_fov() -> f64 {
    2.0
}

fn default_lower_fov() -> f64 {
    -24.8
}

/// Scene description returned by the server after loading settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Candidate start poses for the player vehicle
    pub player_start_spots: Vec<Transform>,
}

impl EpisodeSettings {
    /// Names of every configured sensor, cameras first
    pub fn sensor_names(&self) -> impl Iterator<Item = &str> {
        self.cameras
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.lidars.iter().map(|l| l.name.as_str()))
    }

    pub fn sensor_count(&self) -> usize {
        self.cameras.len() + self.lidars.len()
    }
}

impl Default for EpisodeSettings {
    /// The standard collection rig: three 640x480 cameras (RGB, depth,
    /// semantic segmentation) on the hood and a 64-channel roof LiDAR.
    fn default() -> Self {
        let camera_mount = Transform {
            location: Location::new(2.0, 0.0, 1.4),
            rotation: Rotation::default(),
        };

        Self {
            synchronous_mode: false,
            send_non_player_agents_info: true,
            number_of_vehicles: default_vehicles(),
            number_of_pedestrians: default_pedestrians(),
            weather_id: default_weather(),
            quality_level: QualityLevel::default(),
            seed_vehicles: None,
            seed_pedestrians: None,
            cameras: vec![
                CameraSettings {
                    name: "CameraRGB".into(),
                    post_processing: PostProcessing::SceneFinal,
                    image_width: default_image_width(),
                    image_height: default_image_height(),
                    transform: camera_mount,
                },
                CameraSettings {
                    name: "CameraDepth".into(),
                    post_processing: PostProcessing::Depth,
                    image_width: default_image_width(),
                    image_height: default_image_height(),
                    transform: camera_mount,
                },
                CameraSettings {
                    name: "CameraSemSeg".into(),
                    post_processing: PostProcessing::SemanticSegmentation,
                    image_width: default_image_width(),
                    image_height: default_image_height(),
                    transform: camera_mount,
                },
            ],
            lidars: vec![LidarSettings {
                name: "Lidar64".into(),
                transform: Transform::at(0.0, 0.0, 1.73),
                channels: default_channels(),
                range: default_range(),
                points_per_second: default_points_per_second(),
                rotation_frequency: default_rotation_frequency(),
                upper_fov: default_upper_fov(),
                lower_fov: default_lower_fov(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig() {
        let settings = EpisodeSettings::default();
        assert_eq!(settings.number_of_vehicles, 40);
        assert_eq!(settings.number_of_pedestrians, 100);
        assert_eq!(settings.cameras.len(), 3);
        assert_eq!(settings.lidars.len(), 1);
        assert_eq!(settings.lidars[0].channels, 64);
        let names: Vec<_> = settings.sensor_names().collect();
        assert_eq!(names, ["CameraRGB", "CameraDepth", "CameraSemSeg", "Lidar64"]);
    }

    #[test]
    fn toml_round_trip_with_defaults() {
        let toml_src = r#"
            quality_level = "low"

            [[cameras]]
            name = "FrontCam"
            post_processing = "scene_final"

            [[lidars]]
            name = "Roof"
        "#;
        let settings: EpisodeSettings = toml::from_str(toml_src).unwrap();
        assert_eq!(settings.quality_level, QualityLevel::Low);
        assert_eq!(settings.cameras[0].image_width, 640);
        assert_eq!(settings.lidars[0].points_per_second, 2_560_000);
        assert!((settings.lidars[0].lower_fov - -24.8).abs() < f64::EPSILON);
    }
}
