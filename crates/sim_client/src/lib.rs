//! # Sim Client
//!
//! Simulator client abstraction.
//!
//! Responsibilities:
//! - Define the synchronous request/response episode contract
//! - Provide a scriptable mock client for tests and serverless runs
//! - Wrap the real CARLA client behind a feature flag
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod mock_client;

#[cfg(feature = "real-carla")]
pub mod carla_client;

pub use client::SimulatorClient;
pub use error::{ClientError, Result};
pub use mock_client::{MockFrame, MockScript, MockSimulatorClient};

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
