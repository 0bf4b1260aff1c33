//! # [`MissionStage::AwaitingRelease`] implementation
//!
//! Possible transitions:
//! - `AwaitingLanding` once the release is detected
//! - `Terminated(ReleaseFailed)` if the detector times out
//! - `Terminated(Aborted)` if interrupted
//!
//! [`MissionStage::AwaitingRelease`]: super::MissionStage::AwaitingRelease

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::error;

use super::{
    stages::AwaitingLanding, MissionError, MissionOutcome, MissionParams, MissionPersistantData,
    MissionStage, Transition,
};
use crate::detect::{DetectOutcome, ReleaseSignal};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AwaitingRelease;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AwaitingRelease {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        persistant.eqpt.stop()?;

        Ok(
            match ReleaseSignal::detect(&params.release, &mut persistant.eqpt) {
                DetectOutcome::Success => {
                    Transition::Next(MissionStage::AwaitingLanding(AwaitingLanding::new()))
                }
                DetectOutcome::Failure => {
                    error!("Release from the carrier not detected");
                    Transition::Terminate(MissionOutcome::ReleaseFailed)
                }
                DetectOutcome::Interrupted => Transition::Terminate(MissionOutcome::Aborted),
            },
        )
    }
}
