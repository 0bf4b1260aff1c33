//! # [`MissionStage::InitialAlignment`] implementation
//!
//! Starts a search cycle with a 270 degree sweep.
//!
//! Possible transitions:
//! - `FinalConfirmation` if enough detections already surround the rover
//! - `ForwardScan` otherwise, after aligning on what was seen
//! - `Terminated(CyclesExhausted)` once the cycle bound is reached
//!
//! [`MissionStage::InitialAlignment`]: super::MissionStage::InitialAlignment

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::imu::Heading;
use log::{info, warn};
use serde::Deserialize;

use super::{
    stages::{FinalConfirmation, ForwardScan},
    MissionError, MissionOutcome, MissionParams, MissionPersistantData, MissionStage, Transition,
};
use crate::scan::{
    policy::{aggregate, strongest, ScanResult},
    SweepGeometry,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const STAGE_NAME: &str = "initial_alignment";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InitialAlignment;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InitialAlignmentParams {
    pub sweep: SweepGeometry,

    pub detection_threshold: f64,

    /// Detections at or above which the forward scan is skipped.
    pub skip_forward_scan_count: usize,
}

/// What the alignment found, carried into the forward scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentSummary {
    /// Number of detections, a best-sample fallback counts as one.
    pub detections: usize,

    /// Heading the rover was aligned on, if any.
    pub aligned: Option<Heading>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for InitialAlignmentParams {
    fn default() -> Self {
        Self {
            sweep: SweepGeometry::new(20.0, 270.0),
            detection_threshold: 0.10,
            skip_forward_scan_count: 4,
        }
    }
}

impl InitialAlignment {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        let p = &params.initial_alignment;

        if let Some(max) = params.max_cycles {
            if persistant.tm.cycles >= max {
                warn!("Target not confirmed within {} cycles", max);
                return Ok(Transition::Terminate(MissionOutcome::CyclesExhausted));
            }
        }

        persistant.tm.cycles += 1;
        persistant.cycle_saw_target = false;

        info!("Search cycle {}", persistant.tm.cycles);

        let sweep = persistant.sweep(STAGE_NAME, p.sweep, |_| false)?;
        persistant.record_sightings(&sweep, p.detection_threshold);

        let result = aggregate(&sweep.samples, p.detection_threshold, None);
        info!("Initial alignment result: {:?}", result);

        let summary = match result {
            r if r.count() >= p.skip_forward_scan_count => {
                return Ok(Transition::Next(MissionStage::FinalConfirmation(
                    FinalConfirmation::new(),
                )));
            }
            ScanResult::MultipleDetections { centroid, count } => {
                persistant.align_to(centroid)?;
                persistant.advance(
                    &params.forward_pulse.align_centre,
                    &params.forward_pulse,
                )?;
                AlignmentSummary {
                    detections: count,
                    aligned: Some(centroid),
                }
            }
            ScanResult::SingleDetection(h) => {
                persistant.align_to(h)?;
                AlignmentSummary {
                    detections: 1,
                    aligned: Some(h),
                }
            }
            _ => match strongest(&sweep.samples) {
                Some(best) => {
                    let h = best.heading;
                    info!(
                        "Nothing above {:.2}, aligning on the best sample at {}",
                        p.detection_threshold, h
                    );
                    persistant.align_to(h)?;
                    AlignmentSummary {
                        detections: 1,
                        aligned: Some(h),
                    }
                }
                None => AlignmentSummary {
                    detections: 0,
                    aligned: None,
                },
            },
        };

        Ok(Transition::Next(MissionStage::ForwardScan(ForwardScan::new(
            summary,
        ))))
    }
}
