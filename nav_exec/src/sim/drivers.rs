//! Simulated equipment drivers, each a thin view onto the shared [`SimWorld`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::{
    baro::Barometer,
    cam::{GridVerdict, LateralBucket, VisionProvider},
    imu::{CalibLevels, Imu, ImuError, ImuMode},
    mech::{Actuator, ActuatorError, MotorCmd},
    Clock,
};

use super::SharedWorld;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Virtual clock, sleeping advances the world.
pub struct SimClock {
    world: SharedWorld,
}

pub struct SimImu {
    world: SharedWorld,
    mode: ImuMode,
}

pub struct SimBaro {
    world: SharedWorld,
}

pub struct SimVision {
    world: SharedWorld,
}

pub struct SimActuator {
    world: SharedWorld,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClock {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Clock for SimClock {
    fn elapsed_s(&self) -> f64 {
        self.world.borrow().time_s
    }

    fn sleep_s(&mut self, duration_s: f64) {
        if duration_s > 0.0 {
            self.world.borrow_mut().advance(duration_s);
        }
    }
}

impl SimImu {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            mode: ImuMode::Config,
        }
    }
}

impl Imu for SimImu {
    fn begin(&mut self) -> Result<(), ImuError> {
        if self.world.borrow().params.imu_fault {
            Err(ImuError::NotResponding)
        } else {
            Ok(())
        }
    }

    fn set_mode(&mut self, mode: ImuMode) -> Result<(), ImuError> {
        self.mode = mode;
        Ok(())
    }

    fn read_heading(&mut self) -> Option<f64> {
        // No fused orientation outside of NDOF
        if self.mode != ImuMode::Ndof {
            return None;
        }

        self.world.borrow_mut().heading()
    }

    fn read_linear_accel(&mut self) -> Option<[f64; 3]> {
        self.world.borrow_mut().linear_accel()
    }

    fn read_gyro(&mut self) -> Option<[f64; 3]> {
        self.world.borrow_mut().gyro()
    }

    fn read_calibration(&mut self) -> CalibLevels {
        self.world.borrow().calibration()
    }
}

impl SimBaro {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Barometer for SimBaro {
    fn read_pressure_hpa(&mut self) -> Option<f64> {
        self.world.borrow_mut().pressure_hpa()
    }
}

impl SimVision {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl VisionProvider for SimVision {
    fn capture_overall_percentage(&mut self) -> Option<f64> {
        self.world.borrow_mut().overall_percentage()
    }

    fn capture_grid_verdict(&mut self) -> GridVerdict {
        self.world.borrow_mut().grid_verdict()
    }

    fn capture_lateral_bucket(&mut self) -> Option<LateralBucket> {
        self.world.borrow_mut().lateral_bucket()
    }
}

impl SimActuator {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Actuator for SimActuator {
    fn exec(&mut self, cmd: MotorCmd) -> Result<(), ActuatorError> {
        let mut world = self.world.borrow_mut();

        if world.actuator_released {
            return Err(ActuatorError::Released);
        }

        world.duty = cmd.duty_cycles();
        world.cmd_history.push(cmd);

        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        let mut world = self.world.borrow_mut();

        if world.actuator_released {
            return Err(ActuatorError::Released);
        }

        world.duty = (0, 0);
        world.actuator_released = true;

        Ok(())
    }
}
