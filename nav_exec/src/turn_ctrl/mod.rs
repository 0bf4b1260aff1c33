//! # Turn controller
//!
//! Closed loop heading controller. The rover is pivoted towards the target heading with timed
//! pulses whose duration scales with the remaining error, braking and settling between pulses,
//! until the error is within tolerance or the attempt budget runs out. This is a bang-bang law
//! with duration scaling rather than a PID, matching the granularity of the motor driver.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::{
    imu::Heading,
    mech::{ActuatorError, MotorCmd},
};
use log::{debug, trace, warn};
use util::maths;

pub use params::{TurnCtrlParams, TurnProfile};

use crate::{
    eqpt::Eqpt,
    heading::{HeadingReading, HeadingSource},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct TurnCtrl {
    params: TurnCtrlParams,

    /// The heading source used by the controller, shared with its callers.
    pub heading: HeadingSource,

    exhausted_count: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of a turn. The motors are braked in both cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnOutcome {
    Success {
        final_delta_deg: f64,
    },

    /// The tolerance was not reached. `final_delta_deg` is the last measured error, `None` if
    /// no valid heading was ever read.
    AttemptsExhausted {
        final_delta_deg: Option<f64>,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TurnCtrl {
    pub fn new(params: TurnCtrlParams, heading: HeadingSource) -> Self {
        Self {
            params,
            heading,
            exhausted_count: 0,
        }
    }

    pub fn params(&self) -> &TurnCtrlParams {
        &self.params
    }

    /// Number of turns which ran out of attempts.
    pub fn exhausted_count(&self) -> u64 {
        self.exhausted_count
    }

    /// Turn by `offset_deg` (positive clockwise) from the current heading.
    ///
    /// If no valid reference heading can be read the rover is not moved and the turn reports
    /// `AttemptsExhausted`.
    pub fn turn_relative(
        &mut self,
        eqpt: &mut Eqpt,
        offset_deg: f64,
        profile: &TurnProfile,
    ) -> Result<TurnOutcome, ActuatorError> {
        let reference = match self.heading.read(eqpt) {
            HeadingReading::Valid(h) => h,
            HeadingReading::Degraded(_) => {
                eqpt.stop_and_settle(self.params.degraded_settle_s)?;
                self.exhausted_count += 1;
                warn!(
                    "Cannot turn {:.1} deg, no reference heading available",
                    offset_deg
                );
                return Ok(TurnOutcome::AttemptsExhausted {
                    final_delta_deg: None,
                });
            }
        };

        self.turn_to(eqpt, reference.offset(offset_deg), profile)
    }

    /// Turn onto the given absolute heading.
    pub fn turn_to(
        &mut self,
        eqpt: &mut Eqpt,
        target: Heading,
        profile: &TurnProfile,
    ) -> Result<TurnOutcome, ActuatorError> {
        debug!(
            "Turning to {} (tolerance {:.1} deg, duty {})",
            target, profile.tolerance_deg, profile.duty
        );

        let mut last_delta_deg = None;

        for attempt in 0..profile.max_attempts {
            let current = match self.heading.read(eqpt) {
                HeadingReading::Valid(h) => h,
                HeadingReading::Degraded(_) => {
                    // Never act on the default heading
                    eqpt.stop_and_settle(self.params.degraded_settle_s)?;
                    continue;
                }
            };

            let delta_deg = current.delta_to(target);
            last_delta_deg = Some(delta_deg);

            trace!(
                "Turn attempt {}: heading {}, error {:.2} deg",
                attempt,
                current,
                delta_deg
            );

            if delta_deg.abs() <= profile.tolerance_deg {
                eqpt.stop()?;
                debug!(
                    "Turn complete after {} attempts, error {:.2} deg",
                    attempt, delta_deg
                );
                return Ok(TurnOutcome::Success {
                    final_delta_deg: delta_deg,
                });
            }

            eqpt.pulse(
                MotorCmd::pivot_towards(delta_deg, profile.duty),
                self.pulse_duration_s(delta_deg),
                self.params.settle_s,
            )?;
        }

        eqpt.stop()?;
        self.exhausted_count += 1;

        match last_delta_deg {
            Some(d) => warn!(
                "Turn to {} not completed after {} attempts, final error {:.2} deg",
                target, profile.max_attempts, d
            ),
            None => warn!(
                "Turn to {} not completed after {} attempts, heading never available",
                target, profile.max_attempts
            ),
        }

        Ok(TurnOutcome::AttemptsExhausted {
            final_delta_deg: last_delta_deg,
        })
    }

    /// Duration of the pivot pulse for a given heading error.
    pub fn pulse_duration_s(&self, delta_deg: f64) -> f64 {
        let base_s = self.params.base_pulse_s;
        let err_deg = maths::clamp(&delta_deg.abs(), &0.0, &180.0);

        maths::lin_map(
            (0.0, 180.0),
            (base_s, base_s + self.params.max_extra_pulse_s),
            err_deg,
        )
    }
}

impl TurnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Success { .. })
    }
}
