//! # Drive Motor Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum duty cycle magnitude accepted by the motor driver.
pub const MAX_DUTY: i32 = 100;

/// Maximum forward intensity level.
pub const MAX_FORWARD_LEVEL: u8 = 10;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A primitive motor command.
///
/// Pivots ramp the duty cycle from `ramp_in` to `ramp_out` and hold `ramp_out` until the next
/// command. Every motion is ended by a `Brake` before the next decision is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorCmd {
    /// Rotate in place anticlockwise (towards decreasing heading).
    PivotLeft { ramp_in: u8, ramp_out: u8 },

    /// Rotate in place clockwise (towards increasing heading).
    PivotRight { ramp_in: u8, ramp_out: u8 },

    /// Drive straight ahead at the given intensity level (1..=10).
    Forward { level: u8 },

    /// Short both motors, stopping the rover.
    Brake,
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("The motor driver could not be initialised: {0}")]
    InitFailed(String),

    #[error("The motor driver rejected command {0:?}")]
    CommandRejected(MotorCmd),

    #[error("The motor driver has already been released")]
    Released,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The rover's drive motors.
pub trait Actuator {
    /// Apply a command. The command stays active until the next call.
    fn exec(&mut self, cmd: MotorCmd) -> Result<(), ActuatorError>;

    /// Release the driver's hardware resources. No command may be issued afterwards.
    fn release(&mut self) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorCmd {
    /// The signed (left, right) duty cycles held once the command has ramped in.
    pub fn duty_cycles(&self) -> (i32, i32) {
        match *self {
            MotorCmd::PivotLeft { ramp_out, .. } => {
                let d = clamp_duty(ramp_out as i32);
                (-d, d)
            }
            MotorCmd::PivotRight { ramp_out, .. } => {
                let d = clamp_duty(ramp_out as i32);
                (d, -d)
            }
            MotorCmd::Forward { level } => {
                let d = clamp_duty(level.min(MAX_FORWARD_LEVEL) as i32 * MAX_DUTY
                    / MAX_FORWARD_LEVEL as i32);
                (d, d)
            }
            MotorCmd::Brake => (0, 0),
        }
    }

    /// A pivot towards the sign of `delta_deg` (positive is clockwise) at the given duty.
    pub fn pivot_towards(delta_deg: f64, duty: u8) -> Self {
        if delta_deg >= 0.0 {
            MotorCmd::PivotRight {
                ramp_in: 0,
                ramp_out: duty,
            }
        } else {
            MotorCmd::PivotLeft {
                ramp_in: 0,
                ramp_out: duty,
            }
        }
    }

    pub fn is_brake(&self) -> bool {
        matches!(self, MotorCmd::Brake)
    }
}

fn clamp_duty(duty: i32) -> i32 {
    duty.max(0).min(MAX_DUTY)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duty_cycles() {
        assert_eq!(
            MotorCmd::PivotLeft {
                ramp_in: 0,
                ramp_out: 60
            }
            .duty_cycles(),
            (-60, 60)
        );
        assert_eq!(
            MotorCmd::PivotRight {
                ramp_in: 0,
                ramp_out: 200
            }
            .duty_cycles(),
            (100, -100)
        );
        assert_eq!(MotorCmd::Forward { level: 4 }.duty_cycles(), (40, 40));
        assert_eq!(MotorCmd::Forward { level: 12 }.duty_cycles(), (100, 100));
        assert_eq!(MotorCmd::Brake.duty_cycles(), (0, 0));
    }

    #[test]
    fn test_pivot_towards() {
        assert!(matches!(
            MotorCmd::pivot_towards(10.0, 80),
            MotorCmd::PivotRight { ramp_out: 80, .. }
        ));
        assert!(matches!(
            MotorCmd::pivot_towards(-0.5, 80),
            MotorCmd::PivotLeft { ramp_out: 80, .. }
        ));
    }
}
