//! # Simulated equipment
//!
//! A small kinematic world shared by simulated implementations of every equipment trait. Time
//! only moves when the navigation software sleeps on the [`SimClock`], so whole missions run in
//! a few milliseconds of wall time and are fully deterministic.
//!
//! The vision model treats each target as a disc on the ground: the overall percentage is the
//! fraction of the camera's horizontal field of view covered by the discs, and the lateral
//! bucket is the position of the largest visible disc across the frame. Scripted readings can
//! be queued to override the model, which is how tests force exact detection sequences.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod drivers;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use eqpt_if::{
    cam::{GridVerdict, LateralBucket},
    imu::CalibLevels,
    mech::MotorCmd,
};
use serde::Deserialize;
use util::maths::{norm_deg, signed_delta_deg};

pub use drivers::{SimActuator, SimBaro, SimClock, SimImu, SimVision};

use crate::eqpt::Eqpt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Integration step of the world kinematics.
const SIM_STEP_S: f64 = 0.005;

/// Overall percentage above which the grid analysis reports `HighOverall`.
const GRID_HIGH_OVERALL: f64 = 0.5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing the simulated world.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub initial_heading_deg: f64,

    /// Turn rate per unit of differential duty cycle.
    pub pivot_rate_deg_s_per_duty: f64,

    /// Forward speed per unit of common duty cycle.
    pub forward_speed_m_s_per_duty: f64,

    /// Half of the camera's horizontal field of view.
    pub fov_half_deg: f64,

    pub targets: Vec<SimTarget>,

    pub baseline_pressure_hpa: f64,

    /// Time at which the rover leaves the carrier, `None` if it never does.
    pub release_at_s: Option<f64>,

    /// Time at which the rover touches the ground, `None` if it never does.
    pub landing_at_s: Option<f64>,

    /// Pressure increase during the descent.
    pub descent_pressure_rate_hpa_s: f64,

    /// Vertical linear acceleration during the descent.
    pub descent_acc_z_ms2: f64,

    /// Rates on all axes during the descent.
    pub descent_gyro_dps: f64,

    /// Time at which the IMU reports full calibration.
    pub calib_ready_at_s: f64,

    /// Makes `Imu::begin` fail.
    pub imu_fault: bool,
}

/// A red disc on the ground, position is (east, north).
#[derive(Debug, Clone, Deserialize)]
pub struct SimTarget {
    pub position_m: [f64; 2],
    pub radius_m: f64,
}

/// State of the simulated world.
#[derive(Debug)]
pub struct SimWorld {
    pub params: SimParams,

    pub time_s: f64,

    /// True heading of the rover.
    pub heading_deg: f64,

    /// Position of the rover, (east, north).
    pub position_m: [f64; 2],

    /// Currently held (left, right) duty cycles.
    pub duty: (i32, i32),

    /// Every motor command received, in order.
    pub cmd_history: Vec<MotorCmd>,

    pub actuator_released: bool,

    /// Number of upcoming heading reads which will fail.
    pub heading_fail_reads: u32,

    /// Number of heading reads performed.
    pub heading_reads: u32,

    /// Number of overall percentage captures performed.
    pub percentage_requests: u32,

    pub percentage_script: VecDeque<Option<f64>>,
    pub bucket_script: VecDeque<Option<u8>>,
    pub grid_script: VecDeque<GridVerdict>,
    pub pressure_script: VecDeque<Option<f64>>,
    pub accel_script: VecDeque<Option<[f64; 3]>>,
    pub gyro_script: VecDeque<Option<[f64; 3]>>,
}

/// The world shared between all simulated drivers.
pub type SharedWorld = Rc<RefCell<SimWorld>>;

/// A target as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VisibleTarget {
    /// Covered fraction of the field of view
    coverage: f64,

    /// Centre of the visible part, relative to the boresight, positive to the right
    centre_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_heading_deg: 0.0,
            pivot_rate_deg_s_per_duty: 3.0,
            forward_speed_m_s_per_duty: 0.005,
            fov_half_deg: 30.0,
            targets: Vec::new(),
            baseline_pressure_hpa: 1013.25,
            release_at_s: Some(1.0),
            landing_at_s: Some(5.0),
            descent_pressure_rate_hpa_s: 2.0,
            descent_acc_z_ms2: 6.0,
            descent_gyro_dps: 20.0,
            calib_ready_at_s: 0.0,
            imu_fault: false,
        }
    }
}

impl SimWorld {
    pub fn new(params: SimParams) -> Self {
        Self {
            time_s: 0.0,
            heading_deg: norm_deg(params.initial_heading_deg),
            position_m: [0.0, 0.0],
            duty: (0, 0),
            cmd_history: Vec::new(),
            actuator_released: false,
            heading_fail_reads: 0,
            heading_reads: 0,
            percentage_requests: 0,
            percentage_script: VecDeque::new(),
            bucket_script: VecDeque::new(),
            grid_script: VecDeque::new(),
            pressure_script: VecDeque::new(),
            accel_script: VecDeque::new(),
            gyro_script: VecDeque::new(),
            params,
        }
    }

    /// Create a new world wrapped for sharing between drivers.
    pub fn shared(params: SimParams) -> SharedWorld {
        Rc::new(RefCell::new(Self::new(params)))
    }

    /// Advance time, integrating the rover's motion under the held duty cycles.
    pub fn advance(&mut self, duration_s: f64) {
        let mut remaining_s = duration_s;

        while remaining_s > 0.0 {
            let dt = remaining_s.min(SIM_STEP_S);
            remaining_s -= dt;

            let (l, r) = (self.duty.0 as f64, self.duty.1 as f64);
            let turn_rate_dps = 0.5 * (l - r) * self.params.pivot_rate_deg_s_per_duty;
            let speed_ms = 0.5 * (l + r) * self.params.forward_speed_m_s_per_duty;

            let h = self.heading_deg.to_radians();
            self.position_m[0] += speed_ms * dt * h.sin();
            self.position_m[1] += speed_ms * dt * h.cos();
            self.heading_deg = norm_deg(self.heading_deg + turn_rate_dps * dt);

            self.time_s += dt;
        }
    }

    /// Returns the last motor command received.
    pub fn last_cmd(&self) -> Option<MotorCmd> {
        self.cmd_history.last().copied()
    }

    /// Distance from the rover to the given target centre.
    pub fn distance_to(&self, target: &SimTarget) -> f64 {
        let dx = target.position_m[0] - self.position_m[0];
        let dy = target.position_m[1] - self.position_m[1];
        (dx * dx + dy * dy).sqrt()
    }

    fn altitude_phase(&self) -> AltitudePhase {
        match (self.params.release_at_s, self.params.landing_at_s) {
            (Some(r), _) if self.time_s < r => AltitudePhase::Carried,
            (Some(r), Some(l)) if self.time_s >= l => AltitudePhase::Landed(l - r),
            (Some(r), _) => AltitudePhase::Descending(self.time_s - r),
            (None, _) => AltitudePhase::Carried,
        }
    }

    pub(crate) fn pressure_hpa(&mut self) -> Option<f64> {
        if let Some(p) = self.pressure_script.pop_front() {
            return p;
        }

        let p0 = self.params.baseline_pressure_hpa;
        let rate = self.params.descent_pressure_rate_hpa_s;

        Some(match self.altitude_phase() {
            AltitudePhase::Carried => p0,
            AltitudePhase::Descending(t) | AltitudePhase::Landed(t) => p0 + rate * t,
        })
    }

    pub(crate) fn linear_accel(&mut self) -> Option<[f64; 3]> {
        if let Some(a) = self.accel_script.pop_front() {
            return a;
        }

        Some(match self.altitude_phase() {
            AltitudePhase::Descending(_) => [0.0, 0.0, self.params.descent_acc_z_ms2],
            _ => [0.0; 3],
        })
    }

    pub(crate) fn gyro(&mut self) -> Option<[f64; 3]> {
        if let Some(g) = self.gyro_script.pop_front() {
            return g;
        }

        Some(match self.altitude_phase() {
            AltitudePhase::Descending(_) => [self.params.descent_gyro_dps; 3],
            _ => [0.0; 3],
        })
    }

    pub(crate) fn heading(&mut self) -> Option<f64> {
        self.heading_reads += 1;

        if self.heading_fail_reads > 0 {
            self.heading_fail_reads -= 1;
            return None;
        }

        Some(self.heading_deg)
    }

    pub(crate) fn calibration(&self) -> CalibLevels {
        if self.time_s >= self.params.calib_ready_at_s {
            CalibLevels {
                sys: 3,
                gyro: 3,
                accel: 3,
                mag: 3,
            }
        } else {
            CalibLevels {
                sys: 0,
                gyro: 3,
                accel: 1,
                mag: 0,
            }
        }
    }

    pub(crate) fn overall_percentage(&mut self) -> Option<f64> {
        self.percentage_requests += 1;

        if let Some(p) = self.percentage_script.pop_front() {
            return p;
        }

        Some(self.model_percentage())
    }

    pub(crate) fn lateral_bucket(&mut self) -> Option<LateralBucket> {
        if let Some(b) = self.bucket_script.pop_front() {
            return b.and_then(LateralBucket::from_index);
        }

        self.model_bucket()
    }

    pub(crate) fn grid_verdict(&mut self) -> GridVerdict {
        if let Some(v) = self.grid_script.pop_front() {
            return v;
        }

        let pct = self.model_percentage();
        if pct >= GRID_HIGH_OVERALL {
            return GridVerdict::HighOverall;
        }

        match self.model_bucket() {
            Some(LateralBucket::FarLeft) | Some(LateralBucket::Left) => GridVerdict::Left,
            Some(LateralBucket::Centre) => GridVerdict::CentreBottom,
            Some(LateralBucket::Right) | Some(LateralBucket::FarRight) => GridVerdict::Right,
            None => GridVerdict::None,
        }
    }

    fn visible_targets(&self) -> Vec<VisibleTarget> {
        let fov = self.params.fov_half_deg;

        self.params
            .targets
            .iter()
            .filter_map(|t| {
                let dist = self.distance_to(t);

                // Sitting on the target fills the frame
                if dist <= t.radius_m {
                    return Some(VisibleTarget {
                        coverage: 1.0,
                        centre_deg: 0.0,
                    });
                }

                let dx = t.position_m[0] - self.position_m[0];
                let dy = t.position_m[1] - self.position_m[1];
                let bearing_deg = dx.atan2(dy).to_degrees();
                let rel_deg = signed_delta_deg(bearing_deg, self.heading_deg);
                let half_deg = (t.radius_m / dist).asin().to_degrees();

                let lo = (rel_deg - half_deg).max(-fov);
                let hi = (rel_deg + half_deg).min(fov);

                if hi > lo {
                    Some(VisibleTarget {
                        coverage: (hi - lo) / (2.0 * fov),
                        centre_deg: 0.5 * (hi + lo),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    fn model_percentage(&self) -> f64 {
        self.visible_targets()
            .iter()
            .map(|v| v.coverage)
            .sum::<f64>()
            .min(1.0)
    }

    fn model_bucket(&self) -> Option<LateralBucket> {
        let fov = self.params.fov_half_deg;

        self.visible_targets()
            .into_iter()
            .fold(None, |best: Option<VisibleTarget>, v| match best {
                Some(b) if b.coverage >= v.coverage => Some(b),
                _ => Some(v),
            })
            .and_then(|v| {
                let pos = (v.centre_deg / fov).max(-1.0).min(1.0);
                let index = (((pos + 1.0) / 2.0 * 5.0).floor() as u8 + 1).min(5);
                LateralBucket::from_index(index)
            })
    }
}

enum AltitudePhase {
    Carried,
    /// Seconds since release
    Descending(f64),
    /// Total descent duration
    Landed(f64),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build an equipment set driven by the given world.
pub fn build_eqpt(world: &SharedWorld) -> Eqpt {
    Eqpt::new(
        Box::new(SimClock::new(world.clone())),
        Box::new(SimImu::new(world.clone())),
        Box::new(SimBaro::new(world.clone())),
        Box::new(SimVision::new(world.clone())),
        Box::new(SimActuator::new(world.clone())),
    )
}

/// A brought up equipment set over a fresh world, for unit tests.
#[cfg(test)]
pub(crate) fn test_eqpt(params: SimParams) -> (SharedWorld, Eqpt) {
    let world = SimWorld::shared(params);
    let mut eqpt = build_eqpt(&world);
    eqpt.bring_up().unwrap();
    (world, eqpt)
}
