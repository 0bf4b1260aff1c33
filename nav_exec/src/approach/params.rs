//! Approach and avoidance parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::eqpt::ForwardPulse;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApproachParams {
    /// Overall percentage below which the target is considered out of view.
    pub acquire_threshold: f64,

    /// Overall percentage, with the target centred, at which the target is reached.
    pub completion_threshold: f64,

    /// Forward pulses used with the target centred, checked in order. The first band whose
    /// threshold is below the percentage is used.
    pub bands: Vec<ApproachBand>,

    /// Forward pulse used when the centred target is below every band.
    pub far_pulse: ForwardPulse,

    /// Correction for a target in one of the edge buckets.
    pub large_pivot: PivotPulse,

    /// Correction for a target in one of the buckets next to the centre.
    pub small_pivot: PivotPulse,

    /// Clockwise pivot used while the target is out of view.
    pub search_pivot: PivotPulse,

    /// Wait after each pulse before the next capture.
    pub settle_s: f64,

    /// Consecutive search pivots after which the target is considered lost.
    pub max_search_attempts: u32,

    /// Bound on the total number of iterations of the approach loop.
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApproachBand {
    pub above_percentage: f64,
    pub pulse: ForwardPulse,
}

/// A timed pivot at a fixed duty cycle.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PivotPulse {
    pub duty: u8,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvoidanceParams {
    pub enabled: bool,

    /// Number of react-and-confirm rounds before giving up.
    pub max_attempts: u32,

    /// Turn away from a canopy seen on one side of the frame.
    pub side_turn_deg: f64,

    /// Turn away from a canopy covering the bottom centre of the frame.
    pub centre_turn_deg: f64,

    /// Turn back after the first leg of a centre avoidance.
    pub centre_return_deg: f64,

    /// Wait when the canopy fills the frame, it may still be settling.
    pub high_overall_wait_s: f64,

    /// Wait after a failed capture.
    pub error_wait_s: f64,

    /// Headings either side of the front checked when confirming the path is clear.
    pub confirm_offset_deg: f64,

    pub advance: ForwardPulse,

    pub settle_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ApproachParams {
    fn default() -> Self {
        Self {
            acquire_threshold: 0.05,
            completion_threshold: 0.60,
            bands: vec![
                ApproachBand {
                    above_percentage: 0.40,
                    pulse: ForwardPulse::new(2, 1.0),
                },
                ApproachBand {
                    above_percentage: 0.20,
                    pulse: ForwardPulse::new(4, 1.0),
                },
                ApproachBand {
                    above_percentage: 0.10,
                    pulse: ForwardPulse::new(6, 1.0),
                },
            ],
            far_pulse: ForwardPulse::new(7, 2.0),
            large_pivot: PivotPulse::new(60, 0.05),
            small_pivot: PivotPulse::new(45, 0.05),
            search_pivot: PivotPulse::new(60, 0.1),
            settle_s: 0.2,
            max_search_attempts: 40,
            max_iterations: 300,
        }
    }
}

impl ApproachParams {
    /// The forward pulse for a centred target at the given percentage.
    pub fn forward_pulse_for(&self, percentage: f64) -> ForwardPulse {
        self.bands
            .iter()
            .find(|b| percentage > b.above_percentage)
            .map(|b| b.pulse)
            .unwrap_or(self.far_pulse)
    }
}

impl PivotPulse {
    pub fn new(duty: u8, duration_s: f64) -> Self {
        Self { duty, duration_s }
    }
}

impl Default for AvoidanceParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            side_turn_deg: 90.0,
            centre_turn_deg: 120.0,
            centre_return_deg: 30.0,
            high_overall_wait_s: 10.0,
            error_wait_s: 2.0,
            confirm_offset_deg: 30.0,
            advance: ForwardPulse::new(8, 2.0),
            settle_s: 0.2,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_forward_bands() {
        let p = ApproachParams::default();
        assert_eq!(p.forward_pulse_for(0.5).level, 2);
        assert_eq!(p.forward_pulse_for(0.4).level, 4);
        assert_eq!(p.forward_pulse_for(0.25).level, 4);
        assert_eq!(p.forward_pulse_for(0.15).level, 6);
        assert_eq!(p.forward_pulse_for(0.06).level, 7);
        assert_eq!(p.forward_pulse_for(0.06).duration_s, 2.0);
    }
}
