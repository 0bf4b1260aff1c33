//! Release and landing detector parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sampling and termination of a consecutive-sample detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectorTiming {
    pub sample_period_s: f64,
    pub consecutive_checks: u32,
    pub timeout_s: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseParams {
    pub sample_period_s: f64,
    pub consecutive_checks: u32,
    pub timeout_s: f64,

    /// Pressure change from the baseline which indicates the descent has started.
    pub pressure_change_threshold_hpa: f64,

    /// Absolute vertical linear acceleration which indicates the rover is falling.
    pub acc_z_threshold_ms2: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LandingParams {
    pub sample_period_s: f64,
    pub consecutive_checks: u32,
    pub timeout_s: f64,

    /// Maximum pressure change between two samples for the rover to be at rest.
    pub pressure_change_threshold_hpa: f64,

    /// Maximum absolute linear acceleration on any axis.
    pub acc_threshold_abs_ms2: f64,

    /// Maximum absolute rate on any axis.
    pub gyro_threshold_abs_dps: f64,

    /// Wait for the IMU's gyroscope and magnetometer calibration before detecting.
    pub wait_for_calibration: bool,

    pub calibration_poll_s: f64,

    pub calibration_timeout_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ReleaseParams {
    fn default() -> Self {
        Self {
            sample_period_s: 0.2,
            consecutive_checks: 3,
            timeout_s: 60.0,
            pressure_change_threshold_hpa: 0.3,
            acc_z_threshold_ms2: 4.0,
        }
    }
}

impl ReleaseParams {
    pub fn timing(&self) -> DetectorTiming {
        DetectorTiming {
            sample_period_s: self.sample_period_s,
            consecutive_checks: self.consecutive_checks,
            timeout_s: self.timeout_s,
        }
    }
}

impl Default for LandingParams {
    fn default() -> Self {
        Self {
            sample_period_s: 0.2,
            consecutive_checks: 3,
            timeout_s: 120.0,
            pressure_change_threshold_hpa: 0.1,
            acc_threshold_abs_ms2: 0.5,
            gyro_threshold_abs_dps: 0.5,
            wait_for_calibration: true,
            calibration_poll_s: 0.5,
            calibration_timeout_s: 60.0,
        }
    }
}

impl LandingParams {
    pub fn timing(&self) -> DetectorTiming {
        DetectorTiming {
            sample_period_s: self.sample_period_s,
            consecutive_checks: self.consecutive_checks,
            timeout_s: self.timeout_s,
        }
    }
}
