//! # [`MissionStage::FinalConfirmation`] implementation
//!
//! A full sweep deciding whether the rover has arrived. Enough ordinary detections all around
//! the rover mean it is sitting on the target. A single very strong reading means the target is
//! filling the camera from too close, so the rover backs off to the other side and tries again.
//!
//! Possible transitions:
//! - `Terminated(Success)` once confirmed
//! - `FinalConfirmation` after backing off from a high confidence reading
//! - `InitialAlignment` to start a new cycle
//!
//! [`MissionStage::FinalConfirmation`]: super::MissionStage::FinalConfirmation

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::Deserialize;

use super::{
    stages::InitialAlignment, MissionError, MissionOutcome, MissionParams,
    MissionPersistantData, MissionStage, Transition,
};
use crate::scan::{
    policy::{aggregate, is_high_confidence, ScanResult},
    SweepGeometry,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const STAGE_NAME: &str = "final_confirmation";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FinalConfirmation {
    /// Number of times the rover already backed off in this cycle.
    override_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FinalConfirmationParams {
    pub sweep: SweepGeometry,

    pub detection_threshold: f64,

    pub high_confidence_threshold: f64,

    /// Detections needed to confirm the target.
    pub confirm_count: usize,

    /// Back-offs allowed before a new cycle is started.
    pub max_override_retries: u32,

    /// Turn made when backing off.
    pub override_turn_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for FinalConfirmationParams {
    fn default() -> Self {
        Self {
            sweep: SweepGeometry::new(20.0, 360.0),
            detection_threshold: 0.07,
            high_confidence_threshold: 0.40,
            confirm_count: 4,
            max_override_retries: 5,
            override_turn_deg: 180.0,
        }
    }
}

impl FinalConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(
        &mut self,
        params: &MissionParams,
        persistant: &mut MissionPersistantData,
    ) -> Result<Transition, MissionError> {
        let p = &params.final_confirmation;
        let hc = p.high_confidence_threshold;

        let sweep = persistant.sweep(STAGE_NAME, p.sweep, |s| is_high_confidence(s, hc))?;
        persistant.record_sightings(&sweep, p.detection_threshold);

        let result = aggregate(&sweep.samples, p.detection_threshold, Some(hc));
        info!("Final confirmation result: {:?}", result);

        match result {
            ScanResult::HighConfidenceOverall(h) => {
                if self.override_retries >= p.max_override_retries {
                    warn!(
                        "Still too close after {} back-offs, starting a new cycle",
                        self.override_retries
                    );
                    return Ok(Transition::Next(MissionStage::InitialAlignment(
                        InitialAlignment::new(),
                    )));
                }

                info!("High confidence reading at {}, backing off", h);
                persistant.turn_by(p.override_turn_deg)?;
                persistant.advance(
                    &params.forward_pulse.override_retreat,
                    &params.forward_pulse,
                )?;

                Ok(Transition::Next(MissionStage::FinalConfirmation(
                    FinalConfirmation {
                        override_retries: self.override_retries + 1,
                    },
                )))
            }
            ScanResult::MultipleDetections { centroid, count } if count >= p.confirm_count => {
                persistant.align_to(centroid)?;
                persistant.eqpt.stop()?;
                info!("Target confirmed by {} detections around {}", count, centroid);

                Ok(Transition::Terminate(MissionOutcome::Success))
            }
            _ => {
                if !persistant.cycle_saw_target {
                    info!("Nothing seen this cycle, moving on");
                    persistant.advance(
                        &params.forward_pulse.empty_cycle,
                        &params.forward_pulse,
                    )?;
                }

                Ok(Transition::Next(MissionStage::InitialAlignment(
                    InitialAlignment::new(),
                )))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{test_eqpt, SimParams, SharedWorld};
    use eqpt_if::mech::MotorCmd;

    fn setup(script: &[f64]) -> (SharedWorld, MissionPersistantData) {
        let (world, eqpt) = test_eqpt(SimParams::default());
        world
            .borrow_mut()
            .percentage_script
            .extend(script.iter().map(|p| Some(*p)));
        (world, MissionPersistantData::new(&MissionParams::default(), eqpt))
    }

    #[test]
    fn test_high_confidence_short_circuits_sweep() {
        let (world, mut persistant) = setup(&[0.0, 0.1, 0.45, 0.1, 0.1, 0.1, 0.1]);
        let params = MissionParams::default();

        let t = FinalConfirmation::new()
            .step(&params, &mut persistant)
            .unwrap();

        match t {
            Transition::Next(MissionStage::FinalConfirmation(f)) => {
                assert_eq!(f.override_retries, 1)
            }
            t => panic!("Unexpected transition {:?}", t),
        }
        let w = world.borrow();
        assert_eq!(w.percentage_requests, 3);
        assert!(w
            .cmd_history
            .iter()
            .any(|c| *c == MotorCmd::Forward { level: 4 }));
        assert_eq!(persistant.tm.sweeps, 1);
        assert_eq!(persistant.tm.samples, 3);
    }

    #[test]
    fn test_confirmed_by_four_detections() {
        let mut script = vec![0.0; 18];
        for i in [2, 6, 10, 14].iter() {
            script[*i] = 0.2;
        }
        let (world, mut persistant) = setup(&script);
        let params = MissionParams::default();

        let t = FinalConfirmation::new()
            .step(&params, &mut persistant)
            .unwrap();

        assert!(matches!(t, Transition::Terminate(MissionOutcome::Success)));
        assert_eq!(world.borrow().percentage_requests, 18);
        assert_eq!(world.borrow().last_cmd(), Some(MotorCmd::Brake));
    }

    #[test]
    fn test_empty_cycle_moves_on() {
        let (world, mut persistant) = setup(&[]);
        let params = MissionParams::default();

        let t = FinalConfirmation::new()
            .step(&params, &mut persistant)
            .unwrap();

        assert!(matches!(
            t,
            Transition::Next(MissionStage::InitialAlignment(_))
        ));
        assert!(world
            .borrow()
            .cmd_history
            .iter()
            .any(|c| *c == MotorCmd::Forward { level: 10 }));
    }

    #[test]
    fn test_back_off_is_bounded() {
        let (_world, mut persistant) = setup(&[0.9]);
        let params = MissionParams::default();
        let mut stage = FinalConfirmation {
            override_retries: params.final_confirmation.max_override_retries,
        };

        let t = stage.step(&params, &mut persistant).unwrap();

        assert!(matches!(
            t,
            Transition::Next(MissionStage::InitialAlignment(_))
        ));
    }
}
