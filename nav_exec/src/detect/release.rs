//! Release detection: pressure rising from its baseline while the rover is accelerating.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};

use super::{run_detector, DetectOutcome, ReleaseParams, Signal, TimeoutPolicy};
use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ReleaseSignal {
    pressure_change_threshold_hpa: f64,
    acc_z_threshold_ms2: f64,

    /// Pressure at the first sample.
    baseline_hpa: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ReleaseSignal {
    pub fn new(params: &ReleaseParams) -> Self {
        Self {
            pressure_change_threshold_hpa: params.pressure_change_threshold_hpa,
            acc_z_threshold_ms2: params.acc_z_threshold_ms2,
            baseline_hpa: None,
        }
    }

    /// Wait for the release, failing on timeout.
    pub fn detect(params: &ReleaseParams, eqpt: &mut Eqpt) -> DetectOutcome {
        let mut signal = Self::new(params);
        run_detector(eqpt, &mut signal, &params.timing(), TimeoutPolicy::Fail)
    }
}

impl Signal for ReleaseSignal {
    fn sample(&mut self, eqpt: &mut Eqpt) -> bool {
        let pressure = match eqpt.baro.read_pressure_hpa() {
            Some(p) => p,
            None => return false,
        };

        let baseline = match self.baseline_hpa {
            Some(b) => b,
            None => {
                debug!("Release baseline pressure {:.2} hPa", pressure);
                self.baseline_hpa = Some(pressure);
                return false;
            }
        };

        let acc_z = match eqpt.imu.read_linear_accel() {
            Some(a) => a[2],
            None => return false,
        };

        let dp = (pressure - baseline).abs();
        trace!("Release sample: dp = {:.2} hPa, acc_z = {:.2} m/s2", dp, acc_z);

        dp >= self.pressure_change_threshold_hpa && acc_z.abs() > self.acc_z_threshold_ms2
    }

    fn name(&self) -> &'static str {
        "release"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams};

    #[test]
    fn test_release_detected_during_descent() {
        let (_world, mut eqpt) = test_eqpt(SimParams::default());

        let out = ReleaseSignal::detect(&ReleaseParams::default(), &mut eqpt);

        assert_eq!(out, DetectOutcome::Success);
        let t = eqpt.elapsed_s();
        assert!(t > 1.15 && t < 2.0, "released at {}", t);
    }

    #[test]
    fn test_never_released_fails() {
        let (_world, mut eqpt) = test_eqpt(SimParams {
            release_at_s: None,
            ..Default::default()
        });
        let params = ReleaseParams {
            timeout_s: 3.0,
            ..Default::default()
        };

        assert_eq!(ReleaseSignal::detect(&params, &mut eqpt), DetectOutcome::Failure);
    }

    #[test]
    fn test_missing_readings_are_unmet() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        let mut signal = ReleaseSignal::new(&ReleaseParams::default());
        {
            let mut w = world.borrow_mut();
            w.pressure_script.push_back(Some(1000.0));
            w.pressure_script.push_back(None);
            w.pressure_script.push_back(Some(1001.0));
            w.accel_script.push_back(None);
            w.pressure_script.push_back(Some(1001.0));
            w.accel_script.push_back(Some([0.0, 0.0, -9.0]));
        }

        assert!(!signal.sample(&mut eqpt));
        assert!(!signal.sample(&mut eqpt));
        assert!(!signal.sample(&mut eqpt));
        assert!(signal.sample(&mut eqpt));
    }
}
