//! Sim client error types

use thiserror::Error;

/// Simulator client specific error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level connectivity failure
    ///
    /// The only recoverable kind: the run driver restarts the whole
    /// collection procedure when it sees this.
    #[error("simulator transport error: {message}")]
    Transport { message: String },

    /// Operation attempted before `connect`
    #[error("not connected to simulator")]
    NotConnected,

    /// Episode could not be configured or started
    #[error("episode error: {message}")]
    Episode { message: String },

    /// Sensor setup or data conversion failure
    #[error("sensor '{sensor}' error: {message}")]
    Sensor { sensor: String, message: String },
}

impl ClientError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create episode error
    pub fn episode(message: impl Into<String>) -> Self {
        Self::Episode {
            message: message.into(),
        }
    }

    /// Create sensor error
    pub fn sensor(sensor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sensor {
            sensor: sensor.into(),
            message: message.into(),
        }
    }

    /// Whether this error should trigger a full reconnect-and-restart
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::NotConnected)
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ClientError>;
