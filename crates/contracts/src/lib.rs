//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Units
//! - Distances and positions are in meters
//! - Rotations are in degrees (pitch, yaw, roll)
//! - `forward_speed` is in m/s; pose logs render it in km/h

mod control;
mod error;
mod measurements;
mod sensor;
mod settings;
mod transform;

pub use control::VehicleControl;
pub use error::*;
pub use measurements::*;
pub use sensor::*;
pub use settings::*;
pub use transform::*;
