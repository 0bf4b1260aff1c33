//! # Vision probe
//!
//! Single-shot requests to the vision provider. Capture failures are turned into explicit
//! outcomes here and never propagate as errors.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::cam::{GridVerdict, LateralBucket};
use log::{debug, warn};

use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VisionProbe {
    /// Number of failed captures so far.
    error_count: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of a percentage capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisionSample {
    /// Fraction of the frame covered by the target colour, in [0, 1].
    Percentage(f64),

    /// The capture failed, the sample must be skipped.
    Error,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VisionProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the overall target percentage.
    pub fn percentage(&mut self, eqpt: &mut Eqpt) -> VisionSample {
        match eqpt.vision.capture_overall_percentage() {
            Some(p) if p.is_finite() => VisionSample::Percentage(p.max(0.0).min(1.0)),
            Some(p) => {
                warn!("Vision provider returned a non-finite percentage ({})", p);
                self.error_count += 1;
                VisionSample::Error
            }
            None => {
                warn!("Vision capture failed");
                self.error_count += 1;
                VisionSample::Error
            }
        }
    }

    /// Capture the lateral bucket of the target, `None` if no target is visible.
    pub fn lateral_bucket(&mut self, eqpt: &mut Eqpt) -> Option<LateralBucket> {
        let bucket = eqpt.vision.capture_lateral_bucket();
        debug!("Lateral bucket: {:?}", bucket.map(|b| b.index()));
        bucket
    }

    /// Capture a grid verdict.
    pub fn grid_verdict(&mut self, eqpt: &mut Eqpt) -> GridVerdict {
        let verdict = eqpt.vision.capture_grid_verdict();
        if verdict == GridVerdict::Error {
            warn!("Vision grid analysis failed");
            self.error_count += 1;
        }
        verdict
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }
}

impl VisionSample {
    pub fn percentage(&self) -> Option<f64> {
        match self {
            VisionSample::Percentage(p) => Some(*p),
            VisionSample::Error => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams};

    #[test]
    fn test_errors_are_counted() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        {
            let mut w = world.borrow_mut();
            w.percentage_script.push_back(None);
            w.percentage_script.push_back(Some(1.5));
            w.percentage_script.push_back(Some(std::f64::NAN));
            w.grid_script.push_back(GridVerdict::Error);
        }
        let mut probe = VisionProbe::new();

        assert_eq!(probe.percentage(&mut eqpt), VisionSample::Error);
        assert_eq!(probe.percentage(&mut eqpt), VisionSample::Percentage(1.0));
        assert_eq!(probe.percentage(&mut eqpt), VisionSample::Error);
        assert_eq!(probe.grid_verdict(&mut eqpt), GridVerdict::Error);
        assert_eq!(probe.error_count(), 3);

        // No targets in the world
        assert_eq!(probe.percentage(&mut eqpt), VisionSample::Percentage(0.0));
        assert_eq!(probe.lateral_bucket(&mut eqpt), None);
    }
}
