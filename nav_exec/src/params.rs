//! # Navigation Executable Parameters
//!
//! This module provides parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavExecParams {
    /// Directory, relative to the software root, holding the sessions
    pub sessions_dir: String,

    /// Minimum level of the logs, one of `trace`, `debug` or `info`
    pub log_level: String,

    /// Mission parameter file, relative to the params directory
    pub mission_params: String,

    /// Simulated world parameter file, relative to the params directory
    pub sim_params: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavExecParams {
    fn default() -> Self {
        Self {
            sessions_dir: "sessions".into(),
            log_level: "debug".into(),
            mission_params: "mission.toml".into(),
            sim_params: "sim.toml".into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mission::MissionParams, sim::SimParams};
    use util::params::load_from_path;

    const PARAMS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../params");

    #[test]
    fn test_shipped_params_parse() {
        let exec: NavExecParams =
            load_from_path(format!("{}/nav_exec.toml", PARAMS_DIR)).unwrap();
        assert_eq!(exec.mission_params, "mission.toml");

        let mission: MissionParams =
            load_from_path(format!("{}/{}", PARAMS_DIR, exec.mission_params)).unwrap();
        assert_eq!(mission.final_confirmation.confirm_count, 4);
        assert_eq!(mission.turn_ctrl.scan.tolerance_deg, 15.0);
        assert_eq!(mission.approach.bands.len(), 3);
        assert!(mission.max_cycles.is_some());

        let sim: SimParams =
            load_from_path(format!("{}/{}", PARAMS_DIR, exec.sim_params)).unwrap();
        assert_eq!(sim.targets.len(), 1);
    }

    #[test]
    fn test_partial_params_use_defaults() {
        let mission: MissionParams = util::params::from_str(
            "max_cycles = 2\n\n[final_confirmation]\nconfirm_count = 5\n",
        )
        .unwrap();

        assert_eq!(mission.max_cycles, Some(2));
        assert_eq!(mission.final_confirmation.confirm_count, 5);
        assert_eq!(mission.final_confirmation.high_confidence_threshold, 0.40);
        assert_eq!(mission.release.consecutive_checks, 3);
    }
}
