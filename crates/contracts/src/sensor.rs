//! Sensor payloads delivered alongside measurements each tick.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Named sensor readings for one tick
///
/// BTreeMap keeps iteration (and therefore persistence order) deterministic.
pub type SensorFrame = BTreeMap<String, SensorPayload>;

/// One sensor reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensorPayload {
    /// Image data (RGB/Depth/SemanticSeg)
    Image(ImageData),

    /// LiDAR point cloud
    PointCloud(PointCloudData),
}

/// Image data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,

    pub height: u32,

    pub format: ImageFormat,

    /// Raw pixel data, zero-copy
    pub data: Bytes,
}

/// Pixel interpretation of an image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Rgb8,
    Depth,
    SemanticSeg,
}

/// LiDAR point cloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloudData {
    pub num_points: u32,

    /// Bytes per point (12: x,y,z as f32)
    pub point_stride: u32,

    pub data: Bytes,
}

impl PointCloudData {
    /// Iterate points as (x, y, z) triples
    ///
    /// Trailing partial points are ignored. A stride too small to hold
    /// three floats yields no points.
    pub fn points(&self) -> impl Iterator<Item = (f32, f32, f32)> + '_ {
        let stride = self.point_stride as usize;
        let data = if stride >= 12 { &self.data[..] } else { &[][..] };
        data.chunks_exact(stride.max(12)).map(|p| {
            let x = f32::from_le_bytes([p[0], p[1], p[2], p[3]]);
            let y = f32::from_le_bytes([p[4], p[5], p[6], p[7]]);
            let z = f32::from_le_bytes([p[8], p[9], p[10], p[11]]);
            (x, y, z)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_cloud_iteration() {
        let mut raw = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let cloud = PointCloudData {
            num_points: 2,
            point_stride: 12,
            data: Bytes::from(raw),
        };
        let points: Vec<_> = cloud.points().collect();
        assert_eq!(points, vec![(1.0, 2.0, 3.0), (4.0, 5.0, 6.0)]);
    }

    #[test]
    fn undersized_stride_yields_no_points() {
        for stride in [0, 4, 8] {
            let cloud = PointCloudData {
                num_points: 1,
                point_stride: stride,
                data: Bytes::from(vec![0u8; 16]),
            };
            assert_eq!(cloud.points().count(), 0);
        }
    }
}
