//! Real CARLA client implementation
//!
//! Adapts the carla-rust crate to the episode contract. Only compiled when
//! the `real-carla` feature is enabled.

use std::collections::HashMap;
use std::sync::mpsc;

use bytes::Bytes;
use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::Transform as CarlaTransform;
use carla::sensor::data::{Image, LidarMeasurement};
use carla::sensor::SensorData;
use contracts::{
    CameraSettings, EpisodeSettings, ImageData, ImageFormat, LidarSettings, Location,
    Measurements, PlayerMeasurements, PointCloudData, PostProcessing, Rotation, Scene,
    SensorFrame, SensorPayload, Transform, VehicleControl,
};
use tracing::{debug, info, instrument, warn};

use crate::client::SimulatorClient;
use crate::error::{ClientError, Result};

const EGO_BLUEPRINT: &str = "vehicle.tesla.model3";

/// Real CARLA client
///
/// Wraps carla-rust's Client and implements the episode contract: the ego
/// vehicle is respawned per episode and sensor callbacks are drained into
/// per-sensor channels so `read_data` stays a plain blocking round trip.
pub struct RealCarlaClient {
    client: Option<Client>,
    world: Option<World>,
    settings: Option<EpisodeSettings>,
    spawn_spots: Vec<CarlaTransform>,
    vehicle: Option<Vehicle>,
    sensors: Vec<Sensor>,
    sensor_channels: HashMap<String, mpsc::Receiver<SensorPayload>>,
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self {
            client: None,
            world: None,
            settings: None,
            spawn_spots: Vec::new(),
            vehicle: None,
            sensors: Vec::new(),
            sensor_channels: HashMap::new(),
        }
    }

    fn world_mut(&mut self) -> Result<&mut World> {
        self.world.as_mut().ok_or(ClientError::NotConnected)
    }

    /// Destroy the ego vehicle and its sensors from the previous episode
    fn teardown_actors(&mut self) {
        for sensor in self.sensors.drain(..) {
            if sensor.is_listening() {
                sensor.stop();
            }
            if !sensor.destroy() {
                warn!("destroy sensor returned false");
            }
        }
        self.sensor_channels.clear();

        if let Some(vehicle) = self.vehicle.take() {
            if !vehicle.destroy() {
                warn!("destroy vehicle returned false");
            }
        }
    }

    fn spawn_ego(&mut self, spot: CarlaTransform) -> Result<Vehicle> {
        let world = self.world_mut()?;
        let blueprint = world
            .blueprint_library()
            .find(EGO_BLUEPRINT)
            .ok_or_else(|| ClientError::episode(format!("blueprint '{EGO_BLUEPRINT}' not found")))?;

        let actor = world
            .spawn_actor(&blueprint, &spot)
            .map_err(|e| ClientError::episode(e.to_string()))?;

        let vehicle = Vehicle::try_from(actor)
            .map_err(|_| ClientError::episode("spawned actor is not a vehicle"))?;
        vehicle.set_autopilot(true);
        debug!(actor_id = vehicle.id(), "ego vehicle spawned");
        Ok(vehicle)
    }

    fn spawn_camera(&mut self, camera: &CameraSettings, parent: &Vehicle) -> Result<Sensor> {
        let blueprint_name = match camera.post_processing {
            PostProcessing::SceneFinal => "sensor.camera.rgb",
            PostProcessing::Depth => "sensor.camera.depth",
            PostProcessing::SemanticSegmentation => "sensor.camera.semantic_segmentation",
        };
        let attributes = HashMap::from([
            ("image_size_x".to_string(), camera.image_width.to_string()),
            ("image_size_y".to_string(), camera.image_height.to_string()),
        ]);
        self.spawn_sensor(&camera.name, blueprint_name, camera.transform, &attributes, parent)
    }

    fn spawn_lidar(&mut self, lidar: &LidarSettings, parent: &Vehicle) -> Result<Sensor> {
        let attributes = HashMap::from([
            ("channels".to_string(), lidar.channels.to_string()),
            ("range".to_string(), lidar.range.to_string()),
            (
                "points_per_second".to_string(),
                lidar.points_per_second.to_string(),
            ),
            (
                "rotation_frequency".to_string(),
                lidar.rotation_frequency.to_string(),
            ),
            ("upper_fov".to_string(), lidar.upper_fov.to_string()),
            ("lower_fov".to_string(), lidar.lower_fov.to_string()),
        ]);
        self.spawn_sensor(&lidar.name, "sensor.lidar.ray_cast", lidar.transform, &attributes, parent)
    }

    fn spawn_sensor(
        &mut self,
        name: &str,
        blueprint_name: &str,
        transform: Transform,
        attributes: &HashMap<String, String>,
        parent: &Vehicle,
    ) -> Result<Sensor> {
        let world = self.world_mut()?;
        let mut blueprint = world
            .blueprint_library()
            .find(blueprint_name)
            .ok_or_else(|| {
                ClientError::sensor(name, format!("blueprint '{blueprint_name}' not found"))
            })?;

        for (key, value) in attributes {
            if !blueprint.set_attribute(key, value) {
                warn!(key, value, sensor = name, "failed to set sensor attribute");
            }
        }

        let actor = world
            .spawn_actor_attached(&blueprint, &to_carla_transform(transform), parent, None)
            .map_err(|e| ClientError::sensor(name, e.to_string()))?;

        let sensor =
            Sensor::try_from(actor).map_err(|_| ClientError::sensor(name, "not a sensor"))?;

        // Keep only the newest reading per sensor; the loop drains one frame
        // per tick and older readings are stale anyway.
        let (tx, rx) = mpsc::channel::<SensorPayload>();
        let sensor_name = name.to_string();
        sensor.listen(move |data| {
            if let Some(payload) = convert_sensor_data(&data) {
                let _ = tx.send(payload);
            } else {
                debug!(sensor = %sensor_name, "unconvertible sensor data, dropped");
            }
        });
        self.sensor_channels.insert(name.to_string(), rx);

        Ok(sensor)
    }

    fn collect_sensor_frame(&mut self) -> SensorFrame {
        let mut frame = SensorFrame::new();
        for (name, rx) in &self.sensor_channels {
            // Take the newest payload, discarding any backlog
            if let Some(payload) = rx.try_iter().last() {
                frame.insert(name.clone(), payload);
            }
        }
        frame
    }

    fn player_measurements(vehicle: &Vehicle) -> PlayerMeasurements {
        let transform = vehicle.transform();
        let velocity = vehicle.velocity();
        let control = vehicle.control();

        PlayerMeasurements {
            transform: from_carla_transform(&transform),
            forward_speed: (velocity.x * velocity.x
                + velocity.y * velocity.y
                + velocity.z * velocity.z)
                .sqrt() as f64,
            // Collision and lane-intersection accumulators need dedicated
            // sensors on the 0.9 API; reported as zero here.
            collision_vehicles: 0.0,
            collision_pedestrians: 0.0,
            collision_other: 0.0,
            intersection_otherlane: 0.0,
            intersection_offroad: 0.0,
            autopilot_control: VehicleControl {
                steer: control.steer as f64,
                throttle: control.throttle as f64,
                brake: control.brake as f64,
                hand_brake: control.hand_brake,
                reverse: control.reverse,
            },
        }
    }
}

impl Default for RealCarlaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorClient for RealCarlaClient {
    #[instrument(name = "carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let client = Client::connect(host, port, None);
        let world = client.world();

        info!(map = %world.map().name(), "connected to CARLA server");

        self.client = Some(client);
        self.world = Some(world);
        Ok(())
    }

    #[instrument(name = "carla_load_settings", skip(self, settings), fields(sensors = settings.sensor_count()))]
    async fn load_settings(&mut self, settings: &EpisodeSettings) -> Result<Scene> {
        self.teardown_actors();
        self.settings = Some(settings.clone());

        let world = self.world_mut()?;
        let spawn_points = world.map().recommended_spawn_points();
        let mut spots = Vec::with_capacity(spawn_points.len());
        for i in 0..spawn_points.len() {
            if let Some(spot) = spawn_points.get(i) {
                spots.push(spot);
            }
        }

        let scene = Scene {
            player_start_spots: spots.iter().map(from_carla_transform).collect(),
        };
        self.spawn_spots = spots;
        Ok(scene)
    }

    #[instrument(name = "carla_start_episode", skip(self), fields(start_index))]
    async fn start_episode(&mut self, start_index: usize) -> Result<()> {
        self.teardown_actors();

        let spot = self
            .spawn_spots
            .get(start_index)
            .copied()
            .ok_or_else(|| ClientError::episode(format!("start index {start_index} out of range")))?;

        let settings = self
            .settings
            .clone()
            .ok_or_else(|| ClientError::episode("start_episode before load_settings"))?;

        let vehicle = self.spawn_ego(spot)?;
        for camera in &settings.cameras {
            let sensor = self.spawn_camera(camera, &vehicle)?;
            self.sensors.push(sensor);
        }
        for lidar in &settings.lidars {
            let sensor = self.spawn_lidar(lidar, &vehicle)?;
            self.sensors.push(sensor);
        }

        info!(
            sensors = self.sensors.len(),
            start_index, "episode started"
        );
        self.vehicle = Some(vehicle);
        Ok(())
    }

    async fn read_data(&mut self) -> Result<(Measurements, SensorFrame)> {
        self.world_mut()?.wait_for_tick();

        let vehicle = self.vehicle.as_ref().ok_or(ClientError::NotConnected)?;
        let player = Self::player_measurements(vehicle);
        let measurements = Measurements {
            player,
            non_player_agent_count: 0,
        };

        let sensors = self.collect_sensor_frame();
        Ok((measurements, sensors))
    }

    async fn send_control(&mut self, control: &VehicleControl) -> Result<()> {
        let vehicle = self.vehicle.as_ref().ok_or(ClientError::NotConnected)?;
        vehicle.apply_control(&carla::rpc::VehicleControl {
            steer: control.steer as f32,
            throttle: control.throttle as f32,
            brake: control.brake as f32,
            hand_brake: control.hand_brake,
            reverse: control.reverse,
            ..Default::default()
        });
        Ok(())
    }
}

fn to_carla_transform(transform: Transform) -> CarlaTransform {
    CarlaTransform {
        location: carla::geom::Location {
            x: transform.location.x as f32,
            y: transform.location.y as f32,
            z: transform.location.z as f32,
        },
        rotation: carla::geom::Rotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        },
    }
}

fn from_carla_transform(transform: &CarlaTransform) -> Transform {
    Transform {
        location: Location {
            x: transform.location.x as f64,
            y: transform.location.y as f64,
            z: transform.location.z as f64,
        },
        rotation: Rotation {
            pitch: transform.rotation.pitch as f64,
            yaw: transform.rotation.yaw as f64,
            roll: transform.rotation.roll as f64,
        },
    }
}

/// Convert native sensor data into a contract payload
fn convert_sensor_data(data: &SensorData) -> Option<SensorPayload> {
    if let Ok(image) = Image::try_from(data.clone()) {
        return Some(SensorPayload::Image(ImageData {
            width: image.width() as u32,
            height: image.height() as u32,
            format: ImageFormat::Rgb8,
            data: Bytes::copy_from_slice(image.as_raw_bytes()),
        }));
    }

    if let Ok(lidar) = LidarMeasurement::try_from(data.clone()) {
        let points = lidar.as_slice();
        let ptr = points.as_ptr() as *const u8;
        let len = std::mem::size_of_val(points);
        let raw = unsafe { std::slice::from_raw_parts(ptr, len) };
        return Some(SensorPayload::PointCloud(PointCloudData {
            num_points: points.len() as u32,
            point_stride: 16, // x, y, z, intensity: f32 each
            data: Bytes::copy_from_slice(raw),
        }));
    }

    None
}
