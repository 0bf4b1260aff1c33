//! # Equipment interface crate.
//!
//! Defines the boundary between the navigation software and the rover's equipment: the data
//! that crosses it and the traits an equipment driver (real or simulated) must implement.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Barometric pressure sensor
pub mod baro;

/// Camera based vision provider
pub mod cam;

/// Inertial measurement unit and the heading type
pub mod imu;

/// Drive motors
pub mod mech;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use util::time::{Clock, SystemClock};
