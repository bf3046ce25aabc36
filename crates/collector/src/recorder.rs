//! On-disk persistence for accepted frames and per-episode logs
//!
//! Fixed layout under the output root:
//! - `episode_NNNN/<sensor>/FFFFFF.png|.ply` - raw sensor dumps
//! - `episode_NNNN/pose.txt` - appended pose+speed lines
//! - `episode_NNNN/log.txt` - appended `frame_count stall_streak` lines

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{ImageData, ImageFormat, PlayerMeasurements, PointCloudData, SensorFrame, SensorPayload};
use tracing::{debug, instrument};

/// Writes sensor dumps and appends the per-episode text logs
pub struct Recorder {
    root: PathBuf,
    created_dirs: HashSet<PathBuf>,
}

impl Recorder {
    /// Create a recorder rooted at `root`; the directory itself is created
    /// lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created_dirs: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn episode_dir(&self, episode: u32) -> PathBuf {
        self.root.join(format!("episode_{episode:04}"))
    }

    fn ensure_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        if !self.created_dirs.contains(dir) {
            fs::create_dir_all(dir)?;
            self.created_dirs.insert(dir.to_path_buf());
        }
        Ok(())
    }

    fn append_line(&mut self, episode: u32, file_name: &str, line: &str) -> std::io::Result<()> {
        let dir = self.episode_dir(episode);
        self.ensure_dir(&dir)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(file_name))?;
        writeln!(file, "{line}")
    }

    /// Append a `frame_count stall_streak` line to the episode debug log
    pub fn append_debug_log(
        &mut self,
        episode: u32,
        frame_count: u64,
        stall_streak: u32,
    ) -> std::io::Result<()> {
        self.append_line(episode, "log.txt", &format!("{frame_count} {stall_streak}"))
    }

    /// Append a pose line to the episode pose log
    pub fn append_pose(
        &mut self,
        episode: u32,
        player: &PlayerMeasurements,
    ) -> std::io::Result<()> {
        self.append_line(episode, "pose.txt", &format_pose_line(player))
    }

    /// Persist every named sensor reading of one accepted frame
    #[instrument(name = "record_sensors", skip(self, sensors), fields(sensors = sensors.len()))]
    pub fn record_sensors(
        &mut self,
        episode: u32,
        frame_count: u64,
        sensors: &SensorFrame,
    ) -> std::io::Result<()> {
        for (name, payload) in sensors {
            let dir = self.episode_dir(episode).join(name);
            self.ensure_dir(&dir)?;

            match payload {
                SensorPayload::Image(image) => {
                    save_image(dir.join(format!("{frame_count:06}.png")), image)?
                }
                SensorPayload::PointCloud(cloud) => {
                    save_point_cloud(dir.join(format!("{frame_count:06}.ply")), cloud)?
                }
            }
        }
        debug!("frame persisted");
        Ok(())
    }
}

/// Render one pose log line: `x y z pitch yaw roll speed_kmh`
///
/// Pose fields carry 2 decimals; speed is converted to km/h and rounded to
/// an integer.
pub fn format_pose_line(player: &PlayerMeasurements) -> String {
    let location = player.transform.location;
    let rotation = player.transform.rotation;
    format!(
        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {:.0}",
        location.x,
        location.y,
        location.z,
        rotation.pitch,
        rotation.yaw,
        rotation.roll,
        player.speed_kmh()
    )
}

fn save_image(path: PathBuf, image: &ImageData) -> std::io::Result<()> {
    match image.format {
        ImageFormat::Rgb8 => image::save_buffer(
            path,
            &image.data,
            image.width,
            image.height,
            image::ColorType::Rgb8,
        )
        .map_err(std::io::Error::other),

        ImageFormat::Depth | ImageFormat::SemanticSeg => {
            // Save as is (4 bytes per pixel as delivered by the server)
            image::save_buffer(
                path,
                &image.data,
                image.width,
                image.height,
                image::ColorType::Rgba8,
            )
            .map_err(std::io::Error::other)
        }
    }
}

fn save_point_cloud(path: PathBuf, cloud: &PointCloudData) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    // Write PLY header
    writeln!(file, "ply")?;
    writeln!(file, "format binary_little_endian 1.0")?;
    writeln!(file, "element vertex {}", cloud.num_points)?;
    writeln!(file, "property float x")?;
    writeln!(file, "property float y")?;
    writeln!(file, "property float z")?;
    // Stride 16 (4 floats) carries intensity as the 4th component.
    if cloud.point_stride >= 16 {
        writeln!(file, "property float intensity")?;
    }
    writeln!(file, "end_header")?;

    file.write_all(&cloud.data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::Transform;
    use tempfile::tempdir;

    fn player_at(x: f64, y: f64, z: f64, yaw: f64, speed: f64) -> PlayerMeasurements {
        let mut transform = Transform::at(x, y, z);
        transform.rotation.yaw = yaw;
        PlayerMeasurements {
            transform,
            forward_speed: speed,
            ..Default::default()
        }
    }

    #[test]
    fn pose_line_format() {
        let player = player_at(12.345, -3.21, 0.5, 90.0, 10.0);
        assert_eq!(
            format_pose_line(&player),
            "12.35 -3.21 0.50 0.00 90.00 0.00 36"
        );
    }

    #[test]
    fn debug_and_pose_logs_append() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::new(dir.path());

        recorder.append_debug_log(0, 0, 0).unwrap();
        recorder.append_debug_log(0, 1, 3).unwrap();
        recorder.append_pose(0, &player_at(1.0, 2.0, 0.0, 0.0, 5.0)).unwrap();

        let episode = dir.path().join("episode_0000");
        let log = fs::read_to_string(episode.join("log.txt")).unwrap();
        assert_eq!(log, "0 0\n1 3\n");
        let pose = fs::read_to_string(episode.join("pose.txt")).unwrap();
        assert_eq!(pose, "1.00 2.00 0.00 0.00 0.00 0.00 18\n");
    }

    #[test]
    fn sensor_dumps_land_under_episode_and_name() {
        let dir = tempdir().unwrap();
        let mut recorder = Recorder::new(dir.path());

        let mut sensors = SensorFrame::new();
        sensors.insert(
            "CameraRGB".to_string(),
            SensorPayload::Image(ImageData {
                width: 2,
                height: 2,
                format: ImageFormat::Rgb8,
                data: Bytes::from(vec![0u8; 12]),
            }),
        );
        let mut raw = Vec::new();
        for v in [1.0f32, 2.0, 3.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        sensors.insert(
            "Lidar64".to_string(),
            SensorPayload::PointCloud(PointCloudData {
                num_points: 1,
                point_stride: 12,
                data: Bytes::from(raw),
            }),
        );

        recorder.record_sensors(3, 42, &sensors).unwrap();

        let episode = dir.path().join("episode_0003");
        assert!(episode.join("CameraRGB/000042.png").exists());
        let ply = fs::read(episode.join("Lidar64/000042.ply")).unwrap();
        let header = String::from_utf8_lossy(&ply);
        assert!(header.starts_with("ply\n"));
        assert!(header.contains("element vertex 1"));
        // Stride 12 has no intensity property
        assert!(!header.contains("intensity"));
    }
}
