//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use collector::NoveltyScope;
use contracts::QualityLevel;
use std::path::PathBuf;

/// CARLA Collector - episodic sensor-data collection for CARLA simulator
#[derive(Parser, Debug)]
#[command(
    name = "carla-collector",
    author,
    version,
    about = "CARLA episodic sensor-data collector",
    long_about = "Collects spatially-novel sensor frames (camera images, point clouds)\n\
                  and vehicle pose logs from a CARLA simulator.\n\n\
                  Connects to the server, starts autopilot episodes, keeps frames whose\n\
                  position is far enough from everything already collected, and restarts\n\
                  the episode when the vehicle stalls."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_COLLECTOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_COLLECTOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the collection loop
    Run(RunArgs),

    /// Validate an episode-settings file without running
    Validate(ValidateArgs),

    /// Display the effective episode settings
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// CARLA server host
    #[arg(long, default_value = "localhost", env = "CARLA_HOST")]
    pub host: String,

    /// CARLA server port
    #[arg(short, long, default_value = "2000", env = "CARLA_PORT")]
    pub port: u16,

    /// Graphics quality level; a lower level runs considerably faster
    #[arg(long, value_enum, default_value = "epic", env = "CARLA_QUALITY")]
    pub quality: QualityArg,

    /// Path to an episode-settings file (TOML); omit to use the built-in rig
    #[arg(short = 'c', long, env = "CARLA_COLLECTOR_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Output directory for sensor dumps and logs
    #[arg(long, default_value = "./data_collection", env = "CARLA_COLLECTOR_OUTPUT")]
    pub output: PathBuf,

    /// Total accepted frames to collect across all episodes
    #[arg(long, default_value = "300", env = "CARLA_COLLECTOR_MAX_FRAMES")]
    pub max_frames: u64,

    /// Minimum distance between accepted positions in meters
    #[arg(long, default_value = "5.0", env = "CARLA_COLLECTOR_MIN_DISTANCE")]
    pub min_distance: f64,

    /// Whether accepted positions survive episode restarts
    #[arg(long, value_enum, default_value = "run", env = "CARLA_COLLECTOR_NOVELTY_SCOPE")]
    pub novelty_scope: NoveltyScopeArg,

    /// Validate settings and print the plan without connecting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the episode-settings file to validate
    #[arg(short = 'c', long, default_value = "settings.toml")]
    pub settings: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to an episode-settings file; omit to show the built-in rig
    #[arg(short = 'c', long)]
    pub settings: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Graphics quality level
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum QualityArg {
    Low,
    #[default]
    Epic,
}

impl From<QualityArg> for QualityLevel {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => QualityLevel::Low,
            QualityArg::Epic => QualityLevel::Epic,
        }
    }
}

/// Accepted-position list scope
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum NoveltyScopeArg {
    /// Positions accumulate across episode restarts
    #[default]
    Run,
    /// Positions reset on every new episode
    Episode,
}

impl From<NoveltyScopeArg> for NoveltyScope {
    fn from(arg: NoveltyScopeArg) -> Self {
        match arg {
            NoveltyScopeArg::Run => NoveltyScope::Run,
            NoveltyScopeArg::Episode => NoveltyScope::Episode,
        }
    }
}
