//! Scan controller parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Wait at each stop between the end of the turn and the vision capture.
    pub settle_s: f64,
}

/// Geometry of one sweep.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SweepGeometry {
    pub step_deg: f64,
    pub arc_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ScanParams {
    fn default() -> Self {
        Self { settle_s: 0.5 }
    }
}

impl SweepGeometry {
    pub fn new(step_deg: f64, arc_deg: f64) -> Self {
        Self { step_deg, arc_deg }
    }

    /// Number of stops in the sweep, a partial last step is not taken.
    pub fn num_stops(&self) -> u32 {
        if self.step_deg <= 0.0 || self.arc_deg <= 0.0 {
            return 0;
        }
        (self.arc_deg / self.step_deg + 1e-9).floor() as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_num_stops() {
        assert_eq!(SweepGeometry::new(20.0, 360.0).num_stops(), 18);
        assert_eq!(SweepGeometry::new(20.0, 270.0).num_stops(), 13);
        assert_eq!(SweepGeometry::new(0.0, 270.0).num_stops(), 0);
    }
}
