//! # MissionMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{
    final_confirmation::FinalConfirmationParams, forward_scan::ForwardScanParams,
    initial_alignment::InitialAlignmentParams, secondary_scan::SecondaryScanParams,
};
use crate::{
    approach::{ApproachParams, AvoidanceParams},
    detect::{LandingParams, ReleaseParams},
    eqpt::ForwardPulse,
    heading::HeadingSourceParams,
    scan::ScanParams,
    turn_ctrl::TurnCtrlParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MissionParams {
    pub heading: HeadingSourceParams,

    pub turn_ctrl: TurnCtrlParams,

    pub scan: ScanParams,

    pub release: ReleaseParams,

    pub landing: LandingParams,

    pub avoidance: AvoidanceParams,

    pub initial_alignment: InitialAlignmentParams,

    pub forward_scan: ForwardScanParams,

    pub secondary_scan: SecondaryScanParams,

    pub final_confirmation: FinalConfirmationParams,

    pub approach: ApproachParams,

    /// Maximum number of search cycles, unbounded if not set.
    pub max_cycles: Option<u32>,

    pub forward_pulse: ForwardPulses,
}

/// Forward drives used between scans.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwardPulses {
    /// After centring on a group of alignment detections.
    pub align_centre: ForwardPulse,

    /// Towards a secondary candidate after an empty forward scan.
    pub fallback_advance: ForwardPulse,

    /// After centring on the secondary scan detections.
    pub secondary_centre: ForwardPulse,

    /// Away from a high confidence reading.
    pub override_retreat: ForwardPulse,

    /// Before a new cycle when the last one saw nothing.
    pub empty_cycle: ForwardPulse,

    /// Wait after each of the pulses.
    pub settle_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ForwardPulses {
    fn default() -> Self {
        Self {
            align_centre: ForwardPulse::new(9, 1.0),
            fallback_advance: ForwardPulse::new(9, 1.0),
            secondary_centre: ForwardPulse::new(8, 1.0),
            override_retreat: ForwardPulse::new(4, 2.0),
            empty_cycle: ForwardPulse::new(10, 3.0),
            settle_s: 0.2,
        }
    }
}
