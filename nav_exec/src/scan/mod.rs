//! # Scan controller
//!
//! Sweeps the rover through an arc in fixed steps and takes one vision sample at each stop. The
//! controller only samples: deciding what the samples mean is left to the [`policy`] functions
//! called by each mission stage.
//!
//! Stop `k` of a sweep is turned to as the absolute heading `start + k * step` so turn errors
//! do not accumulate along the arc.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod policy;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::mech::ActuatorError;
use log::{debug, warn};

pub use params::{ScanParams, SweepGeometry};
use policy::DetectionSample;

use crate::{
    eqpt::Eqpt,
    heading::HeadingReading,
    turn_ctrl::{TurnCtrl, TurnOutcome},
    vision::{VisionProbe, VisionSample},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ScanCtrl {
    params: ScanParams,
}

/// Samples collected by one sweep.
#[derive(Debug, Clone, Default)]
pub struct Sweep {
    /// Samples in the order they were taken.
    pub samples: Vec<DetectionSample>,

    /// Number of stops the rover turned to.
    pub stops: u32,

    /// True if the stop condition ended the sweep before the end of the arc.
    pub stopped_early: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ScanCtrl {
    pub fn new(params: ScanParams) -> Self {
        Self { params }
    }

    /// Run a sweep, calling `stop_when` on every sample as soon as it is taken. The sweep ends
    /// at the first sample for which it returns true.
    pub fn sweep<F>(
        &self,
        eqpt: &mut Eqpt,
        turn: &mut TurnCtrl,
        probe: &mut VisionProbe,
        geometry: SweepGeometry,
        mut stop_when: F,
    ) -> Result<Sweep, ActuatorError>
    where
        F: FnMut(&DetectionSample) -> bool,
    {
        let start = match turn.heading.read(eqpt) {
            HeadingReading::Valid(h) => h,
            HeadingReading::Degraded(h) => {
                warn!("Sweep started without a valid heading, stops are relative to {}", h);
                h
            }
        };
        let profile = turn.params().scan;
        let num_stops = geometry.num_stops();

        debug!(
            "Sweep of {:.0} deg in {} stops of {:.0} deg from {}",
            geometry.arc_deg, num_stops, geometry.step_deg, start
        );

        let mut sweep = Sweep::default();

        for k in 1..=num_stops {
            let target = start.offset(k as f64 * geometry.step_deg);
            sweep.stops += 1;

            if let TurnOutcome::AttemptsExhausted { .. } = turn.turn_to(eqpt, target, &profile)? {
                warn!("Scan stop {} not reached, sampling where the rover is", k);
            }

            eqpt.sleep_s(self.params.settle_s);

            let heading = match turn.heading.read(eqpt) {
                HeadingReading::Valid(h) => h,
                HeadingReading::Degraded(_) => {
                    warn!("Skipping scan stop {}: no heading", k);
                    continue;
                }
            };

            let percentage = match probe.percentage(eqpt) {
                VisionSample::Percentage(p) => p,
                VisionSample::Error => {
                    warn!("Skipping scan stop {}: vision error", k);
                    continue;
                }
            };

            let sample = DetectionSample {
                heading,
                percentage,
                time_s: eqpt.elapsed_s(),
            };
            debug!("Scan stop {}: {} -> {:.3}", k, heading, percentage);
            sweep.samples.push(sample);

            if stop_when(&sample) {
                debug!("Sweep stopped at stop {}", k);
                sweep.stopped_early = true;
                break;
            }
        }

        Ok(sweep)
    }

    /// Run a full sweep without a stop condition.
    pub fn full_sweep(
        &self,
        eqpt: &mut Eqpt,
        turn: &mut TurnCtrl,
        probe: &mut VisionProbe,
        geometry: SweepGeometry,
    ) -> Result<Sweep, ActuatorError> {
        self.sweep(eqpt, turn, probe, geometry, |_| false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::heading::{HeadingSource, HeadingSourceParams};
    use crate::sim::{test_eqpt, SimParams};
    use crate::turn_ctrl::TurnCtrlParams;
    use eqpt_if::imu::Heading;

    fn controllers() -> (ScanCtrl, TurnCtrl, VisionProbe) {
        (
            ScanCtrl::new(ScanParams::default()),
            TurnCtrl::new(
                TurnCtrlParams::default(),
                HeadingSource::new(HeadingSourceParams::default()),
            ),
            VisionProbe::new(),
        )
    }

    #[test]
    fn test_full_sweep_samples_every_stop() {
        let (world, mut eqpt) = test_eqpt(SimParams {
            initial_heading_deg: 100.0,
            ..Default::default()
        });
        let (scan, mut turn, mut probe) = controllers();

        let sweep = scan
            .full_sweep(&mut eqpt, &mut turn, &mut probe, SweepGeometry::new(20.0, 360.0))
            .unwrap();

        assert_eq!(sweep.stops, 18);
        assert_eq!(sweep.samples.len(), 18);
        assert!(!sweep.stopped_early);
        assert_eq!(world.borrow().percentage_requests, 18);

        // Headings advance clockwise by roughly one step each stop
        let start = Heading::new(100.0);
        let mut travelled = 0.0;
        let mut prev = start;
        for s in sweep.samples.iter() {
            let d = prev.delta_to(s.heading);
            assert!(d > 0.0 && d < 40.0, "step of {} deg", d);
            travelled += d;
            prev = s.heading;
        }
        assert!((travelled - 360.0).abs() <= 15.0);
        assert_eq!(world.borrow().last_cmd(), Some(eqpt_if::mech::MotorCmd::Brake));
    }

    #[test]
    fn test_samples_carry_capture_time() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        let (scan, mut turn, mut probe) = controllers();
        let start_s = world.borrow().time_s;

        let sweep = scan
            .full_sweep(&mut eqpt, &mut turn, &mut probe, SweepGeometry::new(20.0, 120.0))
            .unwrap();

        assert_eq!(sweep.samples.len(), 6);
        assert!(sweep.samples[0].time_s > start_s);
        for pair in sweep.samples.windows(2) {
            // At least the settle delay separates two stops
            assert!(pair[1].time_s - pair[0].time_s >= scan.params.settle_s);
        }
        assert!(sweep.samples[5].time_s <= world.borrow().time_s);
    }

    #[test]
    fn test_sweep_stops_on_high_confidence() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        {
            let mut w = world.borrow_mut();
            for p in [0.0, 0.1, 0.45, 0.0, 0.0].iter() {
                w.percentage_script.push_back(Some(*p));
            }
        }
        let (scan, mut turn, mut probe) = controllers();

        let sweep = scan
            .sweep(
                &mut eqpt,
                &mut turn,
                &mut probe,
                SweepGeometry::new(20.0, 360.0),
                |s| s.percentage >= 0.40,
            )
            .unwrap();

        assert!(sweep.stopped_early);
        assert_eq!(sweep.stops, 3);
        assert_eq!(sweep.samples.len(), 3);
        assert_eq!(world.borrow().percentage_requests, 3);
    }

    #[test]
    fn test_vision_error_skips_stop() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        {
            let mut w = world.borrow_mut();
            w.percentage_script.push_back(Some(0.2));
            w.percentage_script.push_back(None);
            w.percentage_script.push_back(Some(0.3));
        }
        let (scan, mut turn, mut probe) = controllers();

        let sweep = scan
            .full_sweep(&mut eqpt, &mut turn, &mut probe, SweepGeometry::new(20.0, 60.0))
            .unwrap();

        assert_eq!(sweep.stops, 3);
        assert_eq!(sweep.samples.len(), 2);
        assert_eq!(sweep.samples[0].percentage, 0.2);
        assert_eq!(sweep.samples[1].percentage, 0.3);
        assert_eq!(probe.error_count(), 1);
    }
}
