//! # MissionMgr module
//!
//! This module implements the [`MissionMgr`] state machine which runs the whole recovery
//! mission. The mission is broken down into the following stages:
//!
//! - `AwaitingRelease` - Waiting for the rover to leave the carrier.
//! - `AwaitingLanding` - Waiting for the rover to come to rest on the ground, then clearing the
//!   parachute.
//! - `InitialAlignment` - A 270 degree sweep to decide where to look first.
//! - `ForwardScan` - A full sweep which stops on the first sighting of the target and approaches
//!   it.
//! - `SecondaryScan` - A full sweep after an approach, centring on what is seen.
//! - `FinalConfirmation` - A full sweep deciding whether the rover is at the target.
//! - `Terminated` - The mission is over.
//!
//! Each stage runs to completion in its `step` function and returns a [`Transition`], only the
//! manager changes the active stage.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod awaiting_landing;
mod awaiting_release;
mod final_confirmation;
mod forward_scan;
mod initial_alignment;
mod params;
mod secondary_scan;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use eqpt_if::{
    imu::Heading,
    mech::ActuatorError,
};
use log::{error, info, warn};
use serde::Serialize;
use util::archive::Archiver;

pub use self::{
    params::{ForwardPulses, MissionParams},
    tm::MissionTm,
};

use self::tm::SampleRecord;
use crate::{
    approach::{ApproachCtrl, ParachuteAvoidance},
    eqpt::{Eqpt, ForwardPulse},
    heading::HeadingSource,
    scan::{policy::DetectionSample, ScanCtrl, Sweep, SweepGeometry},
    turn_ctrl::{TurnCtrl, TurnOutcome},
    vision::VisionProbe,
};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub mod stages {
    pub use super::awaiting_landing::AwaitingLanding;
    pub use super::awaiting_release::AwaitingRelease;
    pub use super::final_confirmation::{FinalConfirmation, FinalConfirmationParams};
    pub use super::forward_scan::{ForwardScan, ForwardScanParams};
    pub use super::initial_alignment::{InitialAlignment, InitialAlignmentParams};
    pub use super::secondary_scan::{SecondaryScan, SecondaryScanParams};
}

use stages::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mission Manager
///
/// Owns the equipment and every controller, and steps the active [`MissionStage`] until the
/// mission terminates.
pub struct MissionMgr {
    pub params: MissionParams,

    /// Data valid over all stages.
    pub persistant: MissionPersistantData,

    stage: MissionStage,
}

pub struct MissionPersistantData {
    pub eqpt: Eqpt,

    pub turn: TurnCtrl,

    pub scan: ScanCtrl,

    pub probe: VisionProbe,

    pub approach: ApproachCtrl,

    pub avoidance: ParachuteAvoidance,

    pub tm: MissionTm,

    /// Archive of every sample taken by a sweep.
    pub archiver: Archiver,

    /// True once any sample of the current cycle has passed its stage's detection threshold.
    pub cycle_saw_target: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which abort the mission.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Motor command failed: {0}")]
    ActuatorError(#[from] ActuatorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissionOutcome {
    /// The rover is on the target.
    Success,

    /// The release from the carrier was never detected.
    ReleaseFailed,

    /// The cycle bound was reached without confirming the target.
    CyclesExhausted,

    /// The mission was interrupted, or a motor command failed.
    Aborted,
}

#[derive(Debug)]
pub enum MissionStage {
    AwaitingRelease(AwaitingRelease),
    AwaitingLanding(AwaitingLanding),
    InitialAlignment(InitialAlignment),
    ForwardScan(ForwardScan),
    SecondaryScan(SecondaryScan),
    FinalConfirmation(FinalConfirmation),
    Terminated(MissionOutcome),
}

/// Result of a stage's step function.
#[derive(Debug)]
pub enum Transition {
    Next(MissionStage),
    Terminate(MissionOutcome),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionMgr {
    pub fn new(params: MissionParams, eqpt: Eqpt) -> Self {
        Self {
            persistant: MissionPersistantData::new(&params, eqpt),
            params,
            stage: MissionStage::AwaitingRelease(AwaitingRelease::new()),
        }
    }

    /// Archive the samples of every sweep with the given archiver.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.persistant.archiver = archiver;
        self
    }

    pub fn stage(&self) -> &MissionStage {
        &self.stage
    }

    pub fn tm(&self) -> &MissionTm {
        &self.persistant.tm
    }

    /// Step the mission until it terminates.
    pub fn run(&mut self) -> MissionOutcome {
        info!("MissionMgr starting in {}", self.stage);
        self.persistant.tm.stage_history.push(self.stage.to_string());

        loop {
            if let Some(outcome) = self.step() {
                return outcome;
            }
        }
    }

    /// Run the active stage and apply its transition. Returns the outcome once the mission has
    /// terminated.
    pub fn step(&mut self) -> Option<MissionOutcome> {
        if let MissionStage::Terminated(outcome) = self.stage {
            return Some(outcome);
        }

        let transition = if !self.persistant.eqpt.is_running() {
            warn!("Mission interrupted during {}", self.stage);
            Transition::Terminate(MissionOutcome::Aborted)
        } else {
            match self.stage.step(&self.params, &mut self.persistant) {
                Ok(t) => t,
                Err(e) => {
                    error!("{}", e);
                    Transition::Terminate(MissionOutcome::Aborted)
                }
            }
        };

        self.stage = match transition {
            Transition::Next(s) => s,
            Transition::Terminate(o) => MissionStage::Terminated(o),
        };

        info!("MissionMgr state change to: {}", self.stage);
        self.persistant.tm.stage_history.push(self.stage.to_string());

        match self.stage {
            MissionStage::Terminated(outcome) => {
                self.persistant.finish(outcome);
                Some(outcome)
            }
            _ => None,
        }
    }
}

impl MissionPersistantData {
    pub fn new(params: &MissionParams, eqpt: Eqpt) -> Self {
        Self {
            eqpt,
            turn: TurnCtrl::new(
                params.turn_ctrl.clone(),
                HeadingSource::new(params.heading.clone()),
            ),
            scan: ScanCtrl::new(params.scan.clone()),
            probe: VisionProbe::new(),
            approach: ApproachCtrl::new(params.approach.clone()),
            avoidance: ParachuteAvoidance::new(params.avoidance.clone()),
            tm: MissionTm::default(),
            archiver: Archiver::default(),
            cycle_saw_target: false,
        }
    }

    /// Run a sweep, recording and archiving its samples.
    pub fn sweep<F>(
        &mut self,
        stage: &'static str,
        geometry: SweepGeometry,
        stop_when: F,
    ) -> Result<Sweep, ActuatorError>
    where
        F: FnMut(&DetectionSample) -> bool,
    {
        let sweep = self.scan.sweep(
            &mut self.eqpt,
            &mut self.turn,
            &mut self.probe,
            geometry,
            stop_when,
        )?;

        self.tm.sweeps += 1;
        self.tm.samples += sweep.samples.len() as u32;

        for s in sweep.samples.iter() {
            let record = SampleRecord {
                time_s: s.time_s,
                cycle: self.tm.cycles,
                stage,
                heading_deg: s.heading.deg(),
                percentage: s.percentage,
            };
            if let Err(e) = self.archiver.serialise(record) {
                warn!("Could not archive a sample: {}", e);
            }
        }

        Ok(sweep)
    }

    /// Note whether any sample reached `threshold` in the current cycle.
    pub fn record_sightings(&mut self, sweep: &Sweep, threshold: f64) {
        if sweep.samples.iter().any(|s| s.percentage >= threshold) {
            self.cycle_saw_target = true;
        }
    }

    /// Precise turn onto an absolute heading.
    pub fn align_to(&mut self, target: Heading) -> Result<TurnOutcome, ActuatorError> {
        let profile = self.turn.params().precise;
        self.turn.turn_to(&mut self.eqpt, target, &profile)
    }

    /// Precise turn relative to the current heading.
    pub fn turn_by(&mut self, offset_deg: f64) -> Result<TurnOutcome, ActuatorError> {
        let profile = self.turn.params().precise;
        self.turn.turn_relative(&mut self.eqpt, offset_deg, &profile)
    }

    pub fn advance(
        &mut self,
        pulse: &ForwardPulse,
        pulses: &ForwardPulses,
    ) -> Result<(), ActuatorError> {
        self.eqpt.forward(pulse, pulses.settle_s)
    }

    /// Brake, release the motors and complete the telemetry.
    fn finish(&mut self, outcome: MissionOutcome) {
        if let Err(e) = self.eqpt.release() {
            error!("Could not release the motors: {}", e);
        }

        self.tm.degraded_headings = self.turn.heading.degraded_count();
        self.tm.vision_errors = self.probe.error_count();
        self.tm.turns_exhausted = self.turn.exhausted_count();
        self.tm.outcome = Some(outcome);

        match outcome {
            MissionOutcome::Success => info!(
                "Mission complete after {} cycles and {} sweeps",
                self.tm.cycles, self.tm.sweeps
            ),
            o => warn!("Mission ended with {:?} after {} cycles", o, self.tm.cycles),
        }
    }
}

impl MissionStage {
    fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        match self {
            MissionStage::AwaitingRelease(s) => s.step(params, persistant),
            MissionStage::AwaitingLanding(s) => s.step(params, persistant),
            MissionStage::InitialAlignment(s) => s.step(params, persistant),
            MissionStage::ForwardScan(s) => s.step(params, persistant),
            MissionStage::SecondaryScan(s) => s.step(params, persistant),
            MissionStage::FinalConfirmation(s) => s.step(params, persistant),
            MissionStage::Terminated(o) => Ok(Transition::Terminate(*o)),
        }
    }
}

impl Display for MissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionStage::AwaitingRelease(_) => write!(f, "MissionStage::AwaitingRelease"),
            MissionStage::AwaitingLanding(_) => write!(f, "MissionStage::AwaitingLanding"),
            MissionStage::InitialAlignment(_) => write!(f, "MissionStage::InitialAlignment"),
            MissionStage::ForwardScan(_) => write!(f, "MissionStage::ForwardScan"),
            MissionStage::SecondaryScan(_) => write!(f, "MissionStage::SecondaryScan"),
            MissionStage::FinalConfirmation(_) => write!(f, "MissionStage::FinalConfirmation"),
            MissionStage::Terminated(o) => write!(f, "MissionStage::Terminated({:?})", o),
        }
    }
}

impl MissionStage {
    pub fn is_terminated(&self) -> bool {
        matches!(self, MissionStage::Terminated(_))
    }
}
