//! Collector error types

use contracts::ContractError;
use sim_client::ClientError;
use thiserror::Error;

/// Collector specific error
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Simulator client failure
    ///
    /// Transport-level failures are handled by the run driver itself
    /// (pause + full restart); everything else propagates through here.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Settings load/validation failure
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Persistence failure (pose/debug logs, sensor dumps)
    #[error("failed to persist frame data: {0}")]
    Io(#[from] std::io::Error),

    /// Episode could not be configured
    #[error("episode setup failed: {message}")]
    EpisodeSetup { message: String },
}

impl CollectorError {
    /// Create episode setup error
    pub fn episode_setup(message: impl Into<String>) -> Self {
        Self::EpisodeSetup {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, CollectorError>;
