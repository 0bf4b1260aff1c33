//! # [`MissionStage::AwaitingLanding`] implementation
//!
//! Waits for the rover to come to rest, then runs the parachute avoidance before the search
//! starts.
//!
//! Possible transitions:
//! - `InitialAlignment`
//! - `Terminated(Aborted)` if interrupted
//!
//! [`MissionStage::AwaitingLanding`]: super::MissionStage::AwaitingLanding

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use super::{
    stages::InitialAlignment, MissionError, MissionOutcome, MissionParams,
    MissionPersistantData, MissionStage, Transition,
};
use crate::detect::{DetectOutcome, LandingSignal};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AwaitingLanding;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AwaitingLanding {
    pub fn new() -> Self {
        Self
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        // Only a timeout or a detection get past this point, both mean landed
        if LandingSignal::detect(&params.landing, &mut persistant.eqpt)
            == DetectOutcome::Interrupted
        {
            return Ok(Transition::Terminate(MissionOutcome::Aborted));
        }

        info!("Landed, clearing the parachute");

        let outcome = persistant.avoidance.run(
            &mut persistant.eqpt,
            &mut persistant.turn,
            &mut persistant.probe,
        )?;
        persistant.tm.avoidance = Some(format!("{:?}", outcome));

        Ok(Transition::Next(MissionStage::InitialAlignment(
            InitialAlignment::new(),
        )))
    }
}
