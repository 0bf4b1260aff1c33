//! Turn controller parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the turn controller
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TurnCtrlParams {
    /// Pulse duration applied whatever the heading error.
    pub base_pulse_s: f64,

    /// Pulse duration added for a 180 degree error, scaled linearly below that.
    pub max_extra_pulse_s: f64,

    /// Wait after braking before the heading is sampled again.
    pub settle_s: f64,

    /// Wait after a degraded heading reading.
    pub degraded_settle_s: f64,

    /// Profile for alignment turns.
    pub precise: TurnProfile,

    /// Profile for the steps of a scan.
    pub scan: TurnProfile,
}

/// Speed, tolerance and retry budget of a turn.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TurnProfile {
    /// Pivot duty cycle, 0..=100
    pub duty: u8,

    pub tolerance_deg: f64,

    pub max_attempts: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TurnCtrlParams {
    fn default() -> Self {
        Self {
            base_pulse_s: 0.02,
            max_extra_pulse_s: 0.2,
            settle_s: 0.05,
            degraded_settle_s: 0.1,
            precise: TurnProfile {
                duty: 80,
                tolerance_deg: 10.0,
                max_attempts: 100,
            },
            scan: TurnProfile {
                duty: 90,
                tolerance_deg: 15.0,
                max_attempts: 100,
            },
        }
    }
}
