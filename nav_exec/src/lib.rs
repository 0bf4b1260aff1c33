//! # Navigation library.
//!
//! This library holds everything the navigation executable runs, so that the controllers and
//! the mission state machine can be tested against the simulated equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Approach controller - drives onto a target in view, and clears the parachute after landing
pub mod approach;

/// Release and landing detection from the barometer and IMU
pub mod detect;

/// Equipment ownership - the handles to every piece of hardware
pub mod eqpt;

/// Heading source - absolute heading with bounded retries
pub mod heading;

/// Mission manager - the state machine running the whole mission
pub mod mission;

/// Parameters of the navigation executable
pub mod params;

/// Scan controller - sweeps and the aggregation of their samples
pub mod scan;

/// Simulated equipment
pub mod sim;

/// Turn controller - pivots the rover onto a heading
pub mod turn_ctrl;

/// Vision probe - single captures from the camera pipeline
pub mod vision;
