//! Landing detection: stable pressure with the rover at rest.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, trace, warn};

use super::{run_detector, DetectOutcome, LandingParams, Signal, TimeoutPolicy};
use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct LandingSignal {
    pressure_change_threshold_hpa: f64,
    acc_threshold_abs_ms2: f64,
    gyro_threshold_abs_dps: f64,

    /// Pressure at the previous sample.
    prev_hpa: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LandingSignal {
    pub fn new(params: &LandingParams) -> Self {
        Self {
            pressure_change_threshold_hpa: params.pressure_change_threshold_hpa,
            acc_threshold_abs_ms2: params.acc_threshold_abs_ms2,
            gyro_threshold_abs_dps: params.gyro_threshold_abs_dps,
            prev_hpa: None,
        }
    }

    /// Wait for the landing. A timeout counts as landed.
    pub fn detect(params: &LandingParams, eqpt: &mut Eqpt) -> DetectOutcome {
        if params.wait_for_calibration
            && !wait_for_calibration(params, eqpt)
            && !eqpt.is_running()
        {
            return DetectOutcome::Interrupted;
        }

        let mut signal = Self::new(params);
        run_detector(eqpt, &mut signal, &params.timing(), TimeoutPolicy::Succeed)
    }
}

impl Signal for LandingSignal {
    fn sample(&mut self, eqpt: &mut Eqpt) -> bool {
        let pressure = eqpt.baro.read_pressure_hpa();
        let accel = eqpt.imu.read_linear_accel();
        let gyro = eqpt.imu.read_gyro();

        let prev = self.prev_hpa;
        if pressure.is_some() {
            self.prev_hpa = pressure;
        }

        let (pressure, prev, accel, gyro) = match (pressure, prev, accel, gyro) {
            (Some(p), Some(q), Some(a), Some(g)) => (p, q, a, g),
            _ => return false,
        };

        let dp = (pressure - prev).abs();
        trace!(
            "Landing sample: dp = {:.2} hPa, acc = {:?}, gyro = {:?}",
            dp,
            accel,
            gyro
        );

        dp <= self.pressure_change_threshold_hpa
            && accel.iter().all(|a| a.abs() < self.acc_threshold_abs_ms2)
            && gyro.iter().all(|g| g.abs() < self.gyro_threshold_abs_dps)
    }

    fn name(&self) -> &'static str {
        "landing"
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Wait until the IMU reports its gyroscope and magnetometer as calibrated. Returns false if the
/// wait timed out or was interrupted.
pub fn wait_for_calibration(params: &LandingParams, eqpt: &mut Eqpt) -> bool {
    let start_s = eqpt.elapsed_s();

    loop {
        let levels = eqpt.imu.read_calibration();
        trace!("IMU calibration {:?}", levels);

        if levels.heading_ready() {
            info!(
                "IMU calibrated after {:.1} s",
                eqpt.elapsed_s() - start_s
            );
            return true;
        }

        if !eqpt.is_running() {
            return false;
        }

        if eqpt.elapsed_s() - start_s >= params.calibration_timeout_s {
            warn!(
                "IMU not calibrated after {:.0} s, continuing ({:?})",
                params.calibration_timeout_s, levels
            );
            return false;
        }

        eqpt.sleep_s(params.calibration_poll_s);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams};

    #[test]
    fn test_landing_detected_after_touchdown() {
        let (_world, mut eqpt) = test_eqpt(SimParams::default());
        // Start in the middle of the descent
        eqpt.sleep_s(2.0);

        let out = LandingSignal::detect(&LandingParams::default(), &mut eqpt);

        assert_eq!(out, DetectOutcome::Success);
        let t = eqpt.elapsed_s();
        assert!(t >= 5.4 && t < 6.0, "landed at {}", t);
    }

    #[test]
    fn test_landing_timeout_succeeds() {
        let (world, mut eqpt) = test_eqpt(SimParams {
            release_at_s: Some(0.0),
            landing_at_s: None,
            ..Default::default()
        });
        let params = LandingParams {
            timeout_s: 3.0,
            ..Default::default()
        };

        let out = LandingSignal::detect(&params, &mut eqpt);

        assert_eq!(out, DetectOutcome::Success);
        assert!(eqpt.elapsed_s() >= 3.0);
        assert!(world.borrow().time_s < 3.5);
    }

    #[test]
    fn test_calibration_wait() {
        let (_world, mut eqpt) = test_eqpt(SimParams {
            calib_ready_at_s: 2.2,
            ..Default::default()
        });
        let params = LandingParams::default();

        assert!(wait_for_calibration(&params, &mut eqpt));
        assert!((eqpt.elapsed_s() - 2.5).abs() < 1e-6);

        let (_world, mut eqpt) = test_eqpt(SimParams {
            calib_ready_at_s: 1000.0,
            ..Default::default()
        });
        let params = LandingParams {
            calibration_timeout_s: 2.0,
            ..Default::default()
        };
        assert!(!wait_for_calibration(&params, &mut eqpt));
    }
}
