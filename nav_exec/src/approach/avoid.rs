//! # Parachute avoidance
//!
//! Run once after landing. The canopy usually comes down close to the rover, so before the
//! search starts the rover looks ahead with a grid capture, drives around whatever it sees,
//! then checks the front and both sides are clear.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::{cam::GridVerdict, imu::Heading, mech::ActuatorError};
use log::{debug, info, warn};

use super::AvoidanceParams;
use crate::{eqpt::Eqpt, turn_ctrl::TurnCtrl, vision::VisionProbe};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ParachuteAvoidance {
    params: AvoidanceParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvoidOutcome {
    /// The path was confirmed clear after the given number of attempts.
    Clear { attempts: u32 },

    /// The path was never confirmed clear.
    GaveUp,

    Disabled,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ParachuteAvoidance {
    pub fn new(params: AvoidanceParams) -> Self {
        Self { params }
    }

    pub fn run(
        &self,
        eqpt: &mut Eqpt,
        turn: &mut TurnCtrl,
        probe: &mut VisionProbe,
    ) -> Result<AvoidOutcome, ActuatorError> {
        if !self.params.enabled {
            return Ok(AvoidOutcome::Disabled);
        }

        let front = turn.heading.read(eqpt).best_effort();
        info!("Parachute avoidance, front is {}", front);

        for attempt in 1..=self.params.max_attempts {
            let verdict = probe.grid_verdict(eqpt);
            debug!("Avoidance attempt {}: grid verdict {:?}", attempt, verdict);

            self.react(eqpt, turn, verdict)?;

            let profile = turn.params().precise;
            turn.turn_to(eqpt, front, &profile)?;

            if self.confirm_clear(eqpt, turn, probe, front)? {
                info!("Path clear after {} avoidance attempts", attempt);
                return Ok(AvoidOutcome::Clear { attempts: attempt });
            }
        }

        warn!(
            "Path not confirmed clear after {} attempts, continuing",
            self.params.max_attempts
        );
        Ok(AvoidOutcome::GaveUp)
    }

    fn react(
        &self,
        eqpt: &mut Eqpt,
        turn: &mut TurnCtrl,
        verdict: GridVerdict,
    ) -> Result<(), ActuatorError> {
        let p = &self.params;
        let profile = turn.params().precise;

        match verdict {
            GridVerdict::Left => {
                turn.turn_relative(eqpt, p.side_turn_deg, &profile)?;
                eqpt.forward(&p.advance, p.settle_s)?;
            }
            GridVerdict::Right => {
                turn.turn_relative(eqpt, -p.side_turn_deg, &profile)?;
                eqpt.forward(&p.advance, p.settle_s)?;
            }
            GridVerdict::CentreBottom => {
                turn.turn_relative(eqpt, p.centre_turn_deg, &profile)?;
                eqpt.forward(&p.advance, p.settle_s)?;
                turn.turn_relative(eqpt, -p.centre_return_deg, &profile)?;
                eqpt.forward(&p.advance, p.settle_s)?;
            }
            GridVerdict::HighOverall => {
                eqpt.stop_and_settle(p.high_overall_wait_s)?;
                eqpt.forward(&p.advance, p.settle_s)?;
            }
            GridVerdict::None => {
                eqpt.forward(&p.advance, p.settle_s)?;
            }
            GridVerdict::Error => {
                eqpt.stop_and_settle(p.error_wait_s)?;
            }
        }

        Ok(())
    }

    /// Check the front and either side of it, returning to the front. A failed capture counts
    /// as not clear.
    fn confirm_clear(
        &self,
        eqpt: &mut Eqpt,
        turn: &mut TurnCtrl,
        probe: &mut VisionProbe,
        front: Heading,
    ) -> Result<bool, ActuatorError> {
        let profile = turn.params().precise;
        let offset = self.params.confirm_offset_deg;

        let mut clear = probe.grid_verdict(eqpt) == GridVerdict::None;

        for side in [-offset, offset].iter() {
            turn.turn_to(eqpt, front.offset(*side), &profile)?;
            let verdict = probe.grid_verdict(eqpt);
            debug!("Confirmation at {:+.0} deg: {:?}", side, verdict);
            clear &= verdict == GridVerdict::None;
            turn.turn_to(eqpt, front, &profile)?;
        }

        Ok(clear)
    }
}
