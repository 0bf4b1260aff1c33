//! # Release and landing detection
//!
//! Both detectors sample a condition derived from the barometer and IMU at a fixed period and
//! succeed once the condition has held for a number of consecutive samples. Any sample which
//! does not meet the condition resets the count to zero.
//!
//! The detectors differ in what a timeout means: a rover which was never seen leaving the
//! carrier has failed its release, while a rover which never settled is assumed to have landed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod landing;
mod params;
mod release;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};

pub use landing::{wait_for_calibration, LandingSignal};
pub use params::{DetectorTiming, LandingParams, ReleaseParams};
pub use release::ReleaseSignal;

use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Sensors are never sampled faster than this.
pub const MIN_SAMPLE_PERIOD_S: f64 = 0.2;

/// Sleep between two polls of the sampling timer.
const IDLE_S: f64 = 0.01;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A condition evaluated on one sample of the sensors.
pub trait Signal {
    /// Take one sample, returning true if the condition is met.
    fn sample(&mut self, eqpt: &mut Eqpt) -> bool;

    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Counter of consecutive samples meeting a condition.
#[derive(Debug, Clone)]
pub struct ConsecutiveCheck {
    required: u32,
    count: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectOutcome {
    Success,
    Failure,

    /// The running flag was cleared while waiting.
    Interrupted,
}

/// Outcome reported when a detector times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    Fail,
    Succeed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ConsecutiveCheck {
    /// At least one met sample is always required.
    pub fn new(required: u32) -> Self {
        if required == 0 {
            warn!("Consecutive check requires at least one sample, using 1");
        }

        Self {
            required: required.max(1),
            count: 0,
        }
    }

    /// Record a sample, returning true once `required` consecutive samples have been met.
    pub fn update(&mut self, met: bool) -> bool {
        if met {
            self.count += 1;
        } else {
            if self.count > 0 {
                debug!("Consecutive check reset after {} samples", self.count);
            }
            self.count = 0;
        }

        self.count >= self.required
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl TimeoutPolicy {
    fn outcome(&self) -> DetectOutcome {
        match self {
            TimeoutPolicy::Fail => DetectOutcome::Failure,
            TimeoutPolicy::Succeed => DetectOutcome::Success,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Sample `signal` until it has been met for `timing.consecutive_checks` samples in a row or
/// the timeout expires.
pub fn run_detector(
    eqpt: &mut Eqpt,
    signal: &mut dyn Signal,
    timing: &DetectorTiming,
    policy: TimeoutPolicy,
) -> DetectOutcome {
    let period_s = timing.sample_period_s.max(MIN_SAMPLE_PERIOD_S);
    let mut check = ConsecutiveCheck::new(timing.consecutive_checks);
    let start_s = eqpt.elapsed_s();
    let mut last_sample_s: Option<f64> = None;

    info!(
        "Waiting for {} ({} consecutive samples, timeout {:.0} s)",
        signal.name(),
        timing.consecutive_checks,
        timing.timeout_s
    );

    loop {
        if !eqpt.is_running() {
            warn!("{} detection interrupted", signal.name());
            return DetectOutcome::Interrupted;
        }

        let now_s = eqpt.elapsed_s();

        if now_s - start_s >= timing.timeout_s {
            let outcome = policy.outcome();
            warn!(
                "{} detection timed out after {:.1} s, outcome {:?}",
                signal.name(),
                now_s - start_s,
                outcome
            );
            return outcome;
        }

        let due = match last_sample_s {
            Some(t) => now_s - t >= period_s - 1e-9,
            None => true,
        };

        if due {
            last_sample_s = Some(now_s);

            if check.update(signal.sample(eqpt)) {
                info!("{} detected at {:.2} s", signal.name(), now_s);
                return DetectOutcome::Success;
            }
        }

        eqpt.sleep_s(IDLE_S);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams};
    use std::collections::VecDeque;
    use std::sync::{atomic::AtomicBool, Arc};

    struct ScriptedSignal {
        script: VecDeque<bool>,
        samples: u32,
        sample_times: Vec<f64>,
    }

    impl ScriptedSignal {
        fn new(script: &[bool]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                samples: 0,
                sample_times: Vec::new(),
            }
        }
    }

    impl Signal for ScriptedSignal {
        fn sample(&mut self, eqpt: &mut Eqpt) -> bool {
            self.samples += 1;
            self.sample_times.push(eqpt.elapsed_s());
            self.script.pop_front().unwrap_or(false)
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn timing(timeout_s: f64) -> DetectorTiming {
        DetectorTiming {
            sample_period_s: 0.2,
            consecutive_checks: 3,
            timeout_s,
        }
    }

    #[test]
    fn test_consecutive_check_has_no_partial_credit() {
        let mut c = ConsecutiveCheck::new(3);
        assert!(!c.update(true));
        assert!(!c.update(true));
        assert!(!c.update(false));
        assert_eq!(c.count(), 0);
        assert!(!c.update(true));
        assert!(!c.update(true));
        assert!(c.update(true));
    }

    #[test]
    fn test_zero_required_still_needs_a_met_sample() {
        let mut c = ConsecutiveCheck::new(0);
        assert!(!c.update(false));
        assert!(c.update(true));

        let (_world, mut eqpt) = test_eqpt(SimParams::default());
        let mut signal = ScriptedSignal::new(&[false, false, false]);
        let timing = DetectorTiming {
            consecutive_checks: 0,
            ..timing(1.0)
        };

        let out = run_detector(&mut eqpt, &mut signal, &timing, TimeoutPolicy::Fail);

        assert_eq!(out, DetectOutcome::Failure);
    }

    #[test]
    fn test_success_only_after_full_run() {
        let (_world, mut eqpt) = test_eqpt(SimParams::default());
        let mut signal = ScriptedSignal::new(&[true, true, false, true, true, true]);

        let out = run_detector(&mut eqpt, &mut signal, &timing(60.0), TimeoutPolicy::Fail);

        assert_eq!(out, DetectOutcome::Success);
        assert_eq!(signal.samples, 6);

        // Samples are spaced by the sampling period
        for pair in signal.sample_times.windows(2) {
            assert!(pair[1] - pair[0] >= 0.2 - 1e-6);
            assert!(pair[1] - pair[0] < 0.25);
        }
    }

    #[test]
    fn test_timeout_policies() {
        let (_world, mut eqpt) = test_eqpt(SimParams::default());

        let mut signal = ScriptedSignal::new(&[]);
        let out = run_detector(&mut eqpt, &mut signal, &timing(2.0), TimeoutPolicy::Fail);
        assert_eq!(out, DetectOutcome::Failure);

        let mut signal = ScriptedSignal::new(&[]);
        let out = run_detector(&mut eqpt, &mut signal, &timing(2.0), TimeoutPolicy::Succeed);
        assert_eq!(out, DetectOutcome::Success);
        assert!(signal.samples >= 9 && signal.samples <= 11);
    }

    #[test]
    fn test_sample_period_floor() {
        let (_world, mut eqpt) = test_eqpt(SimParams::default());
        let mut signal = ScriptedSignal::new(&[]);
        let fast = DetectorTiming {
            sample_period_s: 0.01,
            consecutive_checks: 3,
            timeout_s: 1.0,
        };

        run_detector(&mut eqpt, &mut signal, &fast, TimeoutPolicy::Fail);

        assert!(signal.samples <= 6);
    }

    #[test]
    fn test_interrupted() {
        let (_world, eqpt) = test_eqpt(SimParams::default());
        let running = Arc::new(AtomicBool::new(false));
        let mut eqpt = eqpt.with_running_flag(running);
        let mut signal = ScriptedSignal::new(&[true, true, true]);

        let out = run_detector(&mut eqpt, &mut signal, &timing(60.0), TimeoutPolicy::Succeed);

        assert_eq!(out, DetectOutcome::Interrupted);
        assert_eq!(signal.samples, 0);
    }
}
