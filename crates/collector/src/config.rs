//! Run configuration, immutable for the whole collection run.

use std::path::PathBuf;
use std::time::Duration;

use contracts::QualityLevel;
use serde::{Deserialize, Serialize};

/// Scope of the accepted-position list used by the novelty filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoveltyScope {
    /// Positions accumulate across episode restarts within one run
    /// (the historically observed behavior)
    #[default]
    Run,
    /// Positions reset whenever a new episode starts
    Episode,
}

/// Configuration for one collection run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Simulator host
    pub host: String,

    /// Simulator port
    pub port: u16,

    /// Graphics quality requested for built settings
    pub quality: QualityLevel,

    /// Optional episode-settings file; None builds the default rig
    pub settings_path: Option<PathBuf>,

    /// Root directory for all output files
    pub output_dir: PathBuf,

    /// Global accepted-frame target across all episodes
    pub max_frames: u64,

    /// Minimum distance between accepted positions (meters)
    pub min_distance: f64,

    /// Whether accepted positions survive episode restarts
    pub novelty_scope: NoveltyScope,

    /// Forward speed below this counts toward a stall (m/s)
    pub stall_epsilon: f64,

    /// Consecutive low-speed ticks tolerated before aborting the episode
    pub stall_limit: u32,

    /// Frames consumed at episode start before collection begins
    pub warmup_frames: u32,

    /// Bound of the uniform steer noise applied during warm-up
    pub steer_noise: f64,

    /// Pause before reconnecting after a transport failure
    pub retry_delay: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2000,
            quality: QualityLevel::Epic,
            settings_path: None,
            output_dir: PathBuf::from("./data_collection"),
            max_frames: 300,
            min_distance: 5.0,
            novelty_scope: NoveltyScope::default(),
            stall_epsilon: 1e-4,
            stall_limit: 500,
            warmup_frames: 20,
            steer_noise: 0.1,
            retry_delay: Duration::from_secs(1),
        }
    }
}
