//! # Collector
//!
//! Episodic data-collection core.
//!
//! Responsibilities:
//! - Spatial-novelty filtering of incoming frames
//! - Low-speed stall detection and episode abort
//! - On-disk persistence of sensor dumps, pose logs and debug logs
//! - Episode settings construction/loading
//! - The run driver: an explicit Connecting -> Configuring -> Collecting ->
//!   Restarting/Done state machine over any [`sim_client::SimulatorClient`]

pub mod config;
pub mod error;
pub mod novelty;
pub mod recorder;
pub mod run;
pub mod settings;
pub mod stall;
pub mod stats;

pub use config::{CollectorConfig, NoveltyScope};
pub use error::{CollectorError, Result};
pub use novelty::NoveltyFilter;
pub use recorder::Recorder;
pub use run::{Collector, RunState};
pub use stall::StallDetector;
pub use stats::RunStats;
