//! # Approach controller
//!
//! Drives the rover onto a target already in view, using the overall percentage and the lateral
//! bucket of the target as feedback. Off-centre targets are corrected with small pivots, centred
//! ones are approached with forward pulses which shorten as the target grows in the frame.
//!
//! The search for a target which has left the frame is bounded: once `max_search_attempts`
//! consecutive search pivots have been made the approach ends with
//! [`ApproachOutcome::TargetLost`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod avoid;
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::{cam::LateralBucket, mech::ActuatorError, mech::MotorCmd};
use log::{debug, info, warn};

pub use avoid::{AvoidOutcome, ParachuteAvoidance};
pub use params::{ApproachBand, ApproachParams, AvoidanceParams, PivotPulse};

use crate::{
    eqpt::Eqpt,
    scan::policy::{locate, ScanResult},
    vision::{VisionProbe, VisionSample},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ApproachCtrl {
    params: ApproachParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproachOutcome {
    /// The target is centred and above the completion threshold.
    Reached { iterations: u32 },

    /// The target could not be found again, or the iteration bound was hit.
    TargetLost { iterations: u32 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ApproachCtrl {
    pub fn new(params: ApproachParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ApproachParams {
        &self.params
    }

    /// Run the approach loop until the target is reached or lost. The motors are braked on
    /// return.
    pub fn approach(
        &self,
        eqpt: &mut Eqpt,
        probe: &mut VisionProbe,
    ) -> Result<ApproachOutcome, ActuatorError> {
        let p = &self.params;
        let mut search_count = 0u32;

        info!(
            "Approaching target, completion at {:.2}",
            p.completion_threshold
        );

        for iteration in 1..=p.max_iterations {
            let percentage = match probe.percentage(eqpt) {
                VisionSample::Percentage(pct) => pct,
                VisionSample::Error => {
                    eqpt.stop_and_settle(p.settle_s)?;
                    continue;
                }
            };
            let bucket = probe.lateral_bucket(eqpt);

            match locate(Some(percentage), bucket, p.acquire_threshold) {
                ScanResult::DirectionalBucket(LateralBucket::Centre) => {
                    search_count = 0;

                    if percentage >= p.completion_threshold {
                        eqpt.stop()?;
                        info!(
                            "Target reached at {:.2} after {} iterations",
                            percentage, iteration
                        );
                        return Ok(ApproachOutcome::Reached {
                            iterations: iteration,
                        });
                    }

                    let pulse = p.forward_pulse_for(percentage);
                    debug!("Target centred at {:.2}, advancing", percentage);
                    eqpt.forward(&pulse, p.settle_s)?;
                }
                ScanResult::DirectionalBucket(b) => {
                    search_count = 0;

                    let pivot = if b.offset().abs() >= 2 {
                        p.large_pivot
                    } else {
                        p.small_pivot
                    };
                    debug!(
                        "Target in bucket {} at {:.2}, correcting",
                        b.index(),
                        percentage
                    );
                    eqpt.pulse(
                        MotorCmd::pivot_towards(b.offset() as f64, pivot.duty),
                        pivot.duration_s,
                        p.settle_s,
                    )?;
                }
                _ => {
                    search_count += 1;

                    if search_count > p.max_search_attempts {
                        eqpt.stop()?;
                        warn!(
                            "Target lost after {} search pivots",
                            p.max_search_attempts
                        );
                        return Ok(ApproachOutcome::TargetLost {
                            iterations: iteration,
                        });
                    }

                    debug!("Target not in view ({:.2}), searching", percentage);
                    eqpt.pulse(
                        MotorCmd::PivotRight {
                            ramp_in: 0,
                            ramp_out: p.search_pivot.duty,
                        },
                        p.search_pivot.duration_s,
                        p.settle_s,
                    )?;
                }
            }
        }

        eqpt.stop()?;
        warn!(
            "Target not reached within {} iterations",
            p.max_iterations
        );

        Ok(ApproachOutcome::TargetLost {
            iterations: p.max_iterations,
        })
    }
}

impl ApproachOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, ApproachOutcome::Reached { .. })
    }
}
