//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Creates a session and initialises logging
//!     - Loads the mission and simulated world parameters
//!     - Installs the Ctrl-C handler
//!     - Brings up the equipment
//!     - Runs the mission to completion
//!     - Saves the mission telemetry
//!
//! Only the simulated equipment is available, so the whole mission runs against the world
//! described in `sim.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::info;

use nav_lib::{
    mission::{MissionMgr, MissionParams},
    params::NavExecParams,
    sim::{self, SimParams, SimWorld},
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let exec_params: NavExecParams =
        util::params::load("nav_exec.toml").wrap_err("Could not load the executable params")?;

    let session = Session::new("nav_exec", &exec_params.sessions_dir)
        .wrap_err("Failed to create the session")?;

    let log_level = LevelFilter::from_str(&exec_params.log_level)
        .map_err(|_| eyre!("Invalid log level \"{}\"", exec_params.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Recovery Rover Navigation Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mission_params: MissionParams = util::params::load(&exec_params.mission_params)
        .wrap_err("Could not load the mission params")?;
    let sim_params: SimParams =
        util::params::load(&exec_params.sim_params).wrap_err("Could not load the sim params")?;

    info!("Parameters loaded");

    // ---- INTERRUPT HANDLING ----

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .wrap_err("Failed to install the Ctrl-C handler")?;

    // ---- EQUIPMENT ----

    let world = SimWorld::shared(sim_params);
    let mut eqpt = sim::build_eqpt(&world).with_running_flag(running);
    eqpt.bring_up().wrap_err("Failed to bring the equipment up")?;

    let archiver = Archiver::from_path(&session, "mission/samples.csv")
        .wrap_err("Failed to create the sample archive")?;

    // ---- MISSION ----

    let mut mission = MissionMgr::new(mission_params, eqpt).with_archiver(archiver);
    let outcome = mission.run();

    session.save("mission/tm.json", mission.tm().clone());

    // Releases the equipment
    drop(mission);

    info!("Mission outcome: {:?}", outcome);
    info!(
        "Simulated rover ended at {:?} m, heading {:.1} deg",
        world.borrow().position_m,
        world.borrow().heading_deg
    );

    session.exit();

    Ok(())
}
