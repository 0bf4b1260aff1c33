//! # [`MissionStage::ForwardScan`] implementation
//!
//! A full sweep which stops on the first sample showing any of the target, then hands over to
//! the approach controller.
//!
//! When the sweep sees nothing and the alignment was based on a single detection, that
//! detection is treated as a false positive: the rover heads for the strongest sample well away
//! from it and centres there before confirming.
//!
//! Possible transitions:
//! - `SecondaryScan` after an approach
//! - `FinalConfirmation` otherwise
//!
//! [`MissionStage::ForwardScan`]: super::MissionStage::ForwardScan

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::Deserialize;

use super::{
    initial_alignment::AlignmentSummary,
    stages::{FinalConfirmation, SecondaryScan},
    MissionError, MissionParams, MissionPersistantData, MissionStage, Transition,
};
use crate::{
    approach::ApproachOutcome,
    scan::{
        policy::{aggregate, strongest_away_from, ScanResult},
        SweepGeometry,
    },
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const STAGE_NAME: &str = "forward_scan";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct ForwardScan {
    alignment: AlignmentSummary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwardScanParams {
    pub sweep: SweepGeometry,

    /// Percentage which stops the sweep and starts the approach.
    pub hit_threshold: f64,

    /// Minimum separation between the aligned heading and the fallback candidate.
    pub fallback_min_separation_deg: f64,

    /// Sweep run at the fallback candidate.
    pub centring_sweep: SweepGeometry,

    pub centring_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ForwardScanParams {
    fn default() -> Self {
        Self {
            sweep: SweepGeometry::new(20.0, 360.0),
            hit_threshold: 0.05,
            fallback_min_separation_deg: 20.0,
            centring_sweep: SweepGeometry::new(20.0, 360.0),
            centring_threshold: 0.05,
        }
    }
}

impl ForwardScan {
    pub fn new(alignment: AlignmentSummary) -> Self {
        Self { alignment }
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        let p = &params.forward_scan;
        let hit_threshold = p.hit_threshold;

        let sweep = persistant.sweep(STAGE_NAME, p.sweep, |s| s.percentage >= hit_threshold)?;
        persistant.record_sightings(&sweep, hit_threshold);

        if sweep.stopped_early {
            info!("Target sighted, approaching");
            persistant.tm.approaches += 1;

            let outcome = persistant
                .approach
                .approach(&mut persistant.eqpt, &mut persistant.probe)?;

            if let ApproachOutcome::TargetLost { iterations } = outcome {
                persistant.tm.targets_lost += 1;
                warn!("Target lost after {} approach iterations", iterations);
            }

            return Ok(Transition::Next(MissionStage::SecondaryScan(
                SecondaryScan::new(),
            )));
        }

        if let AlignmentSummary {
            detections: 1,
            aligned: Some(aligned),
        } = self.alignment
        {
            let candidate = strongest_away_from(
                &sweep.samples,
                aligned,
                p.fallback_min_separation_deg,
            )
            .map(|s| s.heading);

            if let Some(h) = candidate {
                info!("Nothing ahead, trying the candidate at {}", h);

                persistant.align_to(h)?;
                persistant.advance(
                    &params.forward_pulse.fallback_advance,
                    &params.forward_pulse,
                )?;

                let centring = persistant.sweep(STAGE_NAME, p.centring_sweep, |_| false)?;
                persistant.record_sightings(&centring, p.centring_threshold);

                if let ScanResult::MultipleDetections { centroid, .. } =
                    aggregate(&centring.samples, p.centring_threshold, None)
                {
                    persistant.align_to(centroid)?;
                }
            }
        }

        Ok(Transition::Next(MissionStage::FinalConfirmation(
            FinalConfirmation::new(),
        )))
    }
}
