//! # [`MissionStage::SecondaryScan`] implementation
//!
//! A full sweep after an approach. If the target shows up more than once the rover centres on
//! it and moves a little closer before confirming.
//!
//! Possible transitions:
//! - `FinalConfirmation`
//!
//! [`MissionStage::SecondaryScan`]: super::MissionStage::SecondaryScan

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use serde::Deserialize;

use super::{
    stages::FinalConfirmation, MissionError, MissionParams, MissionPersistantData, MissionStage,
    Transition,
};
use crate::scan::{
    policy::{aggregate, ScanResult},
    SweepGeometry,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const STAGE_NAME: &str = "secondary_scan";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SecondaryScan;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecondaryScanParams {
    pub sweep: SweepGeometry,
    pub detection_threshold: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SecondaryScanParams {
    fn default() -> Self {
        Self {
            sweep: SweepGeometry::new(20.0, 360.0),
            detection_threshold: 0.05,
        }
    }
}

impl SecondaryScan {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        let p = &params.secondary_scan;

        let sweep = persistant.sweep(STAGE_NAME, p.sweep, |_| false)?;
        persistant.record_sightings(&sweep, p.detection_threshold);

        let result = aggregate(&sweep.samples, p.detection_threshold, None);
        info!("Secondary scan result: {:?}", result);

        if let ScanResult::MultipleDetections { centroid, .. } = result {
            persistant.align_to(centroid)?;
            persistant.advance(
                &params.forward_pulse.secondary_centre,
                &params.forward_pulse,
            )?;
        }

        Ok(Transition::Next(MissionStage::FinalConfirmation(
            FinalConfirmation::new(),
        )))
    }
}
