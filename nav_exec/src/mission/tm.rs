//! # Mission telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

use super::MissionOutcome;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Summary of a mission, saved at the end of the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MissionTm {
    /// Every stage entered, in order.
    pub stage_history: Vec<String>,

    pub cycles: u32,
    pub sweeps: u32,
    pub samples: u32,
    pub approaches: u32,
    pub targets_lost: u32,

    pub avoidance: Option<String>,

    pub degraded_headings: u64,
    pub vision_errors: u64,
    pub turns_exhausted: u64,

    pub outcome: Option<MissionOutcome>,
}

/// One line of the sample archive.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    pub time_s: f64,
    pub cycle: u32,
    pub stage: &'static str,
    pub heading_deg: f64,
    pub percentage: f64,
}
