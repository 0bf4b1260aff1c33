//! # Inertial Measurement Unit Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use util::maths::{norm_deg, signed_delta_deg};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An absolute heading in degrees, clockwise from the sensor zero.
///
/// A `Heading` is always normalised into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64")]
pub struct Heading(f64);

/// Calibration status of the IMU, each level in 0..=3 where 3 is fully calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibLevels {
    pub sys: u8,
    pub gyro: u8,
    pub accel: u8,
    pub mag: u8,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Fusion mode of the IMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImuMode {
    /// Raw sensor output, no fusion.
    Config,

    /// Nine degrees of freedom absolute orientation fusion.
    Ndof,
}

#[derive(Debug, Error)]
pub enum ImuError {
    #[error("The IMU did not respond during initialisation")]
    NotResponding,

    #[error("The IMU rejected the requested mode {0:?}")]
    ModeRejected(ImuMode),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An inertial measurement unit providing absolute heading, linear acceleration and rates.
///
/// Read functions return `None` when the sensor has no valid data at the time of the call,
/// which is a transient condition.
pub trait Imu {
    /// Initialise the sensor.
    fn begin(&mut self) -> Result<(), ImuError>;

    /// Set the fusion mode of the sensor.
    fn set_mode(&mut self, mode: ImuMode) -> Result<(), ImuError>;

    /// Absolute heading in degrees.
    fn read_heading(&mut self) -> Option<f64>;

    /// Linear acceleration (gravity removed) in m/s^2, as (x, y, z).
    fn read_linear_accel(&mut self) -> Option<[f64; 3]>;

    /// Angular rates in deg/s, as (x, y, z).
    fn read_gyro(&mut self) -> Option<[f64; 3]>;

    fn read_calibration(&mut self) -> CalibLevels;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Heading {
    /// Create a new heading, normalising the angle.
    pub fn new(deg: f64) -> Self {
        Self(norm_deg(deg))
    }

    pub fn deg(&self) -> f64 {
        self.0
    }

    /// The heading reached by rotating `offset_deg` clockwise from this one.
    pub fn offset(&self, offset_deg: f64) -> Self {
        Self::new(self.0 + offset_deg)
    }

    /// Shortest signed rotation from this heading onto `target`, in (-180, 180].
    pub fn delta_to(&self, target: Heading) -> f64 {
        signed_delta_deg(target.0, self.0)
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self(0.0)
    }
}

impl From<f64> for Heading {
    fn from(deg: f64) -> Self {
        Heading::new(deg)
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} deg", self.0)
    }
}

impl CalibLevels {
    /// True if both the gyroscope and magnetometer are fully calibrated, which is what the
    /// heading output depends on.
    pub fn heading_ready(&self) -> bool {
        self.gyro >= 3 && self.mag >= 3
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_heading_normalised() {
        assert_eq!(Heading::new(-20.0).deg(), 340.0);
        assert_eq!(Heading::new(360.0).deg(), 0.0);
        assert_eq!(Heading::new(350.0).offset(20.0).deg(), 10.0);
    }

    #[test]
    fn test_heading_normalised_when_loaded() {
        #[derive(Deserialize)]
        struct Waypoint {
            heading: Heading,
        }

        let w: Waypoint = util::params::from_str("heading = 400.0").unwrap();
        assert_eq!(w.heading.deg(), 40.0);

        let w: Waypoint = util::params::from_str("heading = -90.0").unwrap();
        assert_eq!(w.heading.deg(), 270.0);
    }

    #[test]
    fn test_heading_delta() {
        assert_eq!(Heading::new(350.0).delta_to(Heading::new(10.0)), 20.0);
        assert_eq!(Heading::new(10.0).delta_to(Heading::new(350.0)), -20.0);
        assert_eq!(Heading::new(0.0).delta_to(Heading::new(180.0)), 180.0);
    }

    #[test]
    fn test_calib_ready() {
        let mut c = CalibLevels::default();
        assert!(!c.heading_ready());
        c.gyro = 3;
        c.mag = 3;
        assert!(c.heading_ready());
    }
}
