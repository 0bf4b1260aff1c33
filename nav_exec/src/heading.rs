//! # Heading source
//!
//! Polls the IMU for the absolute heading. A missing reading is retried every
//! `retry_period_s` until the caller's budget runs out, after which a [`HeadingReading::Degraded`]
//! is returned. The degraded variant carries the 0 deg default so legacy best-effort callers can
//! still use it, but it can never be mistaken for a real reading.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::imu::Heading;
use log::{trace, warn};
use serde::Deserialize;

use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadingSourceParams {
    /// Wait between two attempts to read the IMU.
    pub retry_period_s: f64,

    /// Retry budget for control loops.
    pub retry_budget_s: f64,

    /// Retry budget for callers which can tolerate a degraded reading.
    pub tolerant_budget_s: f64,
}

pub struct HeadingSource {
    params: HeadingSourceParams,

    /// Number of degraded readings returned so far.
    degraded_count: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a heading read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingReading {
    /// A heading from the sensor.
    Valid(Heading),

    /// The sensor stayed unavailable for the whole budget. Holds the default heading.
    Degraded(Heading),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for HeadingSourceParams {
    fn default() -> Self {
        Self {
            retry_period_s: 0.01,
            retry_budget_s: 0.5,
            tolerant_budget_s: 0.1,
        }
    }
}

impl HeadingSource {
    pub fn new(params: HeadingSourceParams) -> Self {
        Self {
            params,
            degraded_count: 0,
        }
    }

    /// Read the heading with the control loop budget.
    pub fn read(&mut self, eqpt: &mut Eqpt) -> HeadingReading {
        let budget_s = self.params.retry_budget_s;
        self.read_with_budget(eqpt, budget_s)
    }

    /// Read the heading with the shorter tolerant budget.
    pub fn read_tolerant(&mut self, eqpt: &mut Eqpt) -> HeadingReading {
        let budget_s = self.params.tolerant_budget_s;
        self.read_with_budget(eqpt, budget_s)
    }

    pub fn read_with_budget(&mut self, eqpt: &mut Eqpt, budget_s: f64) -> HeadingReading {
        let start_s = eqpt.elapsed_s();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            if let Some(deg) = eqpt.imu.read_heading() {
                if attempts > 1 {
                    trace!("Heading available after {} attempts", attempts);
                }
                return HeadingReading::Valid(Heading::new(deg));
            }

            if eqpt.elapsed_s() - start_s >= budget_s {
                break;
            }

            eqpt.sleep_s(self.params.retry_period_s);
        }

        self.degraded_count += 1;
        warn!(
            "Heading unavailable for {:.2} s ({} attempts), using the default heading",
            budget_s, attempts
        );

        HeadingReading::Degraded(Heading::default())
    }

    pub fn degraded_count(&self) -> u64 {
        self.degraded_count
    }
}

impl HeadingReading {
    /// The heading if it came from the sensor.
    pub fn valid(&self) -> Option<Heading> {
        match self {
            HeadingReading::Valid(h) => Some(*h),
            HeadingReading::Degraded(_) => None,
        }
    }

    /// The heading, whether real or the default.
    pub fn best_effort(&self) -> Heading {
        match self {
            HeadingReading::Valid(h) | HeadingReading::Degraded(h) => *h,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, HeadingReading::Degraded(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams};

    #[test]
    fn test_valid_reading() {
        let (_world, mut eqpt) = test_eqpt(SimParams {
            initial_heading_deg: 123.0,
            ..Default::default()
        });
        let mut src = HeadingSource::new(HeadingSourceParams::default());

        let r = src.read(&mut eqpt);
        assert_eq!(r.valid(), Some(Heading::new(123.0)));
        assert_eq!(src.degraded_count(), 0);
    }

    #[test]
    fn test_transient_outage_is_retried() {
        let (world, mut eqpt) = test_eqpt(SimParams {
            initial_heading_deg: 45.0,
            ..Default::default()
        });
        world.borrow_mut().heading_fail_reads = 5;
        let mut src = HeadingSource::new(HeadingSourceParams::default());

        let t0 = eqpt.elapsed_s();
        let r = src.read(&mut eqpt);

        assert_eq!(r, HeadingReading::Valid(Heading::new(45.0)));
        assert_eq!(world.borrow().heading_reads, 6);
        assert!((eqpt.elapsed_s() - t0 - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_degraded_after_budget() {
        let (world, mut eqpt) = test_eqpt(SimParams {
            initial_heading_deg: 45.0,
            ..Default::default()
        });
        world.borrow_mut().heading_fail_reads = 1000;
        let mut src = HeadingSource::new(HeadingSourceParams::default());

        let t0 = eqpt.elapsed_s();
        let r = src.read(&mut eqpt);
        let waited_s = eqpt.elapsed_s() - t0;

        assert!(r.is_degraded());
        assert_eq!(r.valid(), None);
        assert_eq!(r.best_effort().deg(), 0.0);
        assert!(waited_s >= 0.5 - 1e-9 && waited_s < 0.52);
        assert_eq!(src.degraded_count(), 1);

        // The tolerant budget gives up sooner
        let t0 = eqpt.elapsed_s();
        assert!(src.read_tolerant(&mut eqpt).is_degraded());
        let waited_s = eqpt.elapsed_s() - t0;
        assert!(waited_s >= 0.1 - 1e-9 && waited_s < 0.12);
        assert_eq!(src.degraded_count(), 2);
    }
}
