//! # Equipment ownership
//!
//! [`Eqpt`] owns one handle to each piece of equipment used by the navigation software. It is
//! passed by mutable reference into every controller, so no controller ever reaches for the
//! hardware through global state.
//!
//! Dropping an `Eqpt` brakes the motors and then releases the motor driver, whichever way the
//! mission ended.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use eqpt_if::{
    baro::Barometer,
    cam::VisionProvider,
    imu::{Imu, ImuError, ImuMode},
    mech::{Actuator, ActuatorError, MotorCmd},
    Clock,
};
use log::{debug, error, info, trace};
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handles to all equipment of the rover.
pub struct Eqpt {
    pub clock: Box<dyn Clock>,
    pub imu: Box<dyn Imu>,
    pub baro: Box<dyn Barometer>,
    pub vision: Box<dyn VisionProvider>,

    actuator: Box<dyn Actuator>,

    /// Cleared by the interrupt handler to request the mission stops.
    running: Arc<AtomicBool>,

    released: bool,
}

/// A timed forward drive.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ForwardPulse {
    /// Intensity level, 1..=10
    pub level: u8,

    pub duration_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Failures while bringing the equipment up. All of them abort the mission before any motion.
#[derive(Debug, thiserror::Error)]
pub enum EqptError {
    #[error("IMU initialisation failed: {0}")]
    ImuInitFailed(ImuError),

    #[error("Motor driver initialisation failed: {0}")]
    ActuatorInitFailed(ActuatorError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Eqpt {
    pub fn new(
        clock: Box<dyn Clock>,
        imu: Box<dyn Imu>,
        baro: Box<dyn Barometer>,
        vision: Box<dyn VisionProvider>,
        actuator: Box<dyn Actuator>,
    ) -> Self {
        Self {
            clock,
            imu,
            baro,
            vision,
            actuator,
            running: Arc::new(AtomicBool::new(true)),
            released: false,
        }
    }

    /// Use an externally owned running flag, for example one cleared by a Ctrl-C handler.
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Initialise the IMU in absolute orientation mode and make sure the motors are braked.
    pub fn bring_up(&mut self) -> Result<(), EqptError> {
        self.imu.begin().map_err(EqptError::ImuInitFailed)?;
        self.imu
            .set_mode(ImuMode::Ndof)
            .map_err(EqptError::ImuInitFailed)?;

        self.actuator
            .exec(MotorCmd::Brake)
            .map_err(EqptError::ActuatorInitFailed)?;

        info!("Equipment brought up");

        Ok(())
    }

    /// True until an interrupt has been requested.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn elapsed_s(&self) -> f64 {
        self.clock.elapsed_s()
    }

    pub fn sleep_s(&mut self, duration_s: f64) {
        self.clock.sleep_s(duration_s)
    }

    /// Issue a single motor command. Prefer the timed helpers which always end with a brake.
    pub fn exec(&mut self, cmd: MotorCmd) -> Result<(), ActuatorError> {
        trace!("Motor command {:?}", cmd);
        self.actuator.exec(cmd)
    }

    /// Brake the motors.
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.exec(MotorCmd::Brake)
    }

    /// Brake then wait for the rover to settle.
    pub fn stop_and_settle(&mut self, settle_s: f64) -> Result<(), ActuatorError> {
        self.stop()?;
        self.sleep_s(settle_s);
        Ok(())
    }

    /// Apply `cmd` for `duration_s`, brake, then settle for `settle_s`.
    pub fn pulse(
        &mut self,
        cmd: MotorCmd,
        duration_s: f64,
        settle_s: f64,
    ) -> Result<(), ActuatorError> {
        self.exec(cmd)?;
        self.sleep_s(duration_s);
        self.stop_and_settle(settle_s)
    }

    /// Drive forward for the pulse's duration, then brake and settle.
    pub fn forward(&mut self, pulse: &ForwardPulse, settle_s: f64) -> Result<(), ActuatorError> {
        debug!(
            "Forward pulse at level {} for {:.2} s",
            pulse.level, pulse.duration_s
        );
        self.pulse(
            MotorCmd::Forward { level: pulse.level },
            pulse.duration_s,
            settle_s,
        )
    }

    /// Brake and release the motor driver. Called automatically on drop.
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        if self.released {
            return Ok(());
        }

        let brake_res = self.actuator.exec(MotorCmd::Brake);
        self.released = true;
        let release_res = self.actuator.release();

        brake_res.and(release_res)
    }
}

impl Drop for Eqpt {
    fn drop(&mut self) {
        match self.release() {
            Ok(_) => info!("Motors braked and released"),
            Err(e) => error!("Could not cleanly release the motors: {}", e),
        }
    }
}

impl ForwardPulse {
    pub fn new(level: u8, duration_s: f64) -> Self {
        Self { level, duration_s }
    }
}

#[cfg(test)]
mod test {
    use crate::sim::{test_eqpt, SimParams};
    use eqpt_if::mech::MotorCmd;

    use super::ForwardPulse;

    #[test]
    fn test_forward_pulse_ends_braked() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());

        eqpt.forward(&ForwardPulse::new(8, 1.0), 0.2).unwrap();

        let w = world.borrow();
        assert_eq!(
            &w.cmd_history[w.cmd_history.len() - 2..],
            &[MotorCmd::Forward { level: 8 }, MotorCmd::Brake]
        );
        assert!((w.time_s - 1.2).abs() < 1e-6);
        assert!(w.position_m[1] > 0.0);
    }

    #[test]
    fn test_drop_brakes_and_releases() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());
        eqpt.exec(MotorCmd::Forward { level: 5 }).unwrap();

        drop(eqpt);

        let w = world.borrow();
        assert!(w.actuator_released);
        assert_eq!(w.last_cmd(), Some(MotorCmd::Brake));
    }

    #[test]
    fn test_release_is_idempotent() {
        let (world, mut eqpt) = test_eqpt(SimParams::default());

        eqpt.release().unwrap();
        let issued = world.borrow().cmd_history.len();
        drop(eqpt);

        assert_eq!(world.borrow().cmd_history.len(), issued);
    }
}
