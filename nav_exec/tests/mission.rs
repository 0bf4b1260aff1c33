//! End to end mission scenarios over the simulated equipment.

use std::sync::{atomic::AtomicBool, Arc};

use eqpt_if::mech::MotorCmd;
use nav_lib::{
    eqpt::Eqpt,
    mission::{MissionMgr, MissionOutcome, MissionParams},
    sim::{build_eqpt, SharedWorld, SimParams, SimWorld},
};

fn setup(sim: SimParams) -> (SharedWorld, Eqpt) {
    let world = SimWorld::shared(sim);
    let mut eqpt = build_eqpt(&world);
    eqpt.bring_up().unwrap();
    (world, eqpt)
}

fn push_percentages(world: &SharedWorld, percentages: &[f64]) {
    world
        .borrow_mut()
        .percentage_script
        .extend(percentages.iter().map(|p| Some(*p)));
}

/// A sweep of `stops` samples with the given (stop, percentage) detections.
fn sweep_script(stops: usize, detections: &[(usize, f64)]) -> Vec<f64> {
    let mut script = vec![0.0; stops];
    for (i, p) in detections {
        script[*i] = *p;
    }
    script
}

fn stage_names(mgr: &MissionMgr) -> Vec<&str> {
    mgr.tm()
        .stage_history
        .iter()
        .map(|s| s.trim_start_matches("MissionStage::"))
        .collect()
}

#[test]
fn test_alignment_then_confirmation() {
    let (world, eqpt) = setup(SimParams::default());

    // Four alignment detections skip the forward scan
    push_percentages(
        &world,
        &sweep_script(13, &[(1, 0.2), (2, 0.3), (4, 0.25), (6, 0.15)]),
    );
    // Four detections, none above the high confidence threshold
    push_percentages(
        &world,
        &sweep_script(18, &[(1, 0.1), (2, 0.2), (3, 0.08), (5, 0.35)]),
    );

    let params = MissionParams {
        max_cycles: Some(3),
        ..Default::default()
    };
    let mut mgr = MissionMgr::new(params, eqpt);

    let outcome = mgr.run();

    assert_eq!(outcome, MissionOutcome::Success);
    assert_eq!(
        stage_names(&mgr),
        vec![
            "AwaitingRelease",
            "AwaitingLanding",
            "InitialAlignment",
            "FinalConfirmation",
            "Terminated(Success)",
        ]
    );
    assert_eq!(world.borrow().percentage_requests, 31);
    assert_eq!(mgr.tm().cycles, 1);
    assert_eq!(mgr.tm().sweeps, 2);
    assert_eq!(mgr.tm().avoidance.as_deref(), Some("Clear { attempts: 1 }"));
    assert_eq!(mgr.tm().outcome, Some(MissionOutcome::Success));

    // Search only starts once landed
    assert!(world.borrow().time_s > 5.0);

    drop(mgr);
    let w = world.borrow();
    assert!(w.actuator_released);
    assert_eq!(w.last_cmd(), Some(MotorCmd::Brake));
}

#[test]
fn test_sighting_approach_and_confirmation() {
    let (world, eqpt) = setup(SimParams::default());

    // Single alignment detection
    push_percentages(&world, &sweep_script(13, &[(4, 0.15)]));
    // Forward scan stops on its second sample
    push_percentages(&world, &[0.0, 0.08]);
    // Approach reaches the target straight away
    push_percentages(&world, &[0.7]);
    world.borrow_mut().bucket_script.push_back(Some(3));
    // Secondary scan centres on two detections
    push_percentages(&world, &sweep_script(18, &[(3, 0.1), (4, 0.1)]));
    // Final confirmation
    push_percentages(
        &world,
        &sweep_script(18, &[(1, 0.1), (2, 0.1), (3, 0.1), (4, 0.1)]),
    );

    let params = MissionParams {
        max_cycles: Some(3),
        ..Default::default()
    };
    let mut mgr = MissionMgr::new(params, eqpt);

    assert_eq!(mgr.run(), MissionOutcome::Success);
    assert_eq!(
        stage_names(&mgr),
        vec![
            "AwaitingRelease",
            "AwaitingLanding",
            "InitialAlignment",
            "ForwardScan",
            "SecondaryScan",
            "FinalConfirmation",
            "Terminated(Success)",
        ]
    );
    assert_eq!(mgr.tm().approaches, 1);
    assert_eq!(mgr.tm().targets_lost, 0);
    assert_eq!(world.borrow().percentage_requests, 13 + 2 + 1 + 18 + 18);
    assert!(world
        .borrow()
        .cmd_history
        .iter()
        .any(|c| *c == MotorCmd::Forward { level: 8 }));
}

#[test]
fn test_few_detections_centre_before_forward_scan() {
    let (world, eqpt) = setup(SimParams::default());

    // Two alignment detections, nothing afterwards
    push_percentages(&world, &sweep_script(13, &[(2, 0.2), (3, 0.2)]));

    let params = MissionParams {
        max_cycles: Some(1),
        ..Default::default()
    };
    let align_level = params.forward_pulse.align_centre.level;
    let mut mgr = MissionMgr::new(params, eqpt);

    assert_eq!(mgr.run(), MissionOutcome::CyclesExhausted);
    assert_eq!(
        stage_names(&mgr),
        vec![
            "AwaitingRelease",
            "AwaitingLanding",
            "InitialAlignment",
            "ForwardScan",
            "FinalConfirmation",
            "InitialAlignment",
            "Terminated(CyclesExhausted)",
        ]
    );
    // No centring sweep, the alignment was not a single detection
    assert_eq!(mgr.tm().sweeps, 3);

    let w = world.borrow();
    assert_eq!(align_level, 9);
    assert!(w
        .cmd_history
        .iter()
        .any(|c| *c == MotorCmd::Forward { level: 9 }));
    // The cycle saw a target, so no long drive before the next one
    assert!(!w
        .cmd_history
        .iter()
        .any(|c| *c == MotorCmd::Forward { level: 10 }));
    assert_eq!(w.percentage_requests, 13 + 18 + 18);
}

#[test]
fn test_lost_target_moves_on_to_secondary_scan() {
    let (world, eqpt) = setup(SimParams::default());

    // Single alignment detection, then a forward scan hit on the second stop
    push_percentages(&world, &sweep_script(13, &[(4, 0.15)]));
    push_percentages(&world, &[0.0, 0.08]);
    // The approach sees the target once but never gets a bucket for it
    push_percentages(&world, &[0.3]);
    world.borrow_mut().bucket_script.push_back(None);

    let params = MissionParams {
        max_cycles: Some(1),
        ..Default::default()
    };
    let max_search = params.approach.max_search_attempts;
    let mut mgr = MissionMgr::new(params, eqpt);

    assert_eq!(mgr.run(), MissionOutcome::CyclesExhausted);
    assert_eq!(
        stage_names(&mgr),
        vec![
            "AwaitingRelease",
            "AwaitingLanding",
            "InitialAlignment",
            "ForwardScan",
            "SecondaryScan",
            "FinalConfirmation",
            "InitialAlignment",
            "Terminated(CyclesExhausted)",
        ]
    );
    assert_eq!(mgr.tm().approaches, 1);
    assert_eq!(mgr.tm().targets_lost, 1);

    let approach_requests = max_search + 1;
    assert_eq!(
        world.borrow().percentage_requests,
        13 + 2 + approach_requests + 18 + 18
    );
}

#[test]
fn test_empty_field_exhausts_cycles() {
    let (world, eqpt) = setup(SimParams::default());
    let params = MissionParams {
        max_cycles: Some(1),
        ..Default::default()
    };
    let mut mgr = MissionMgr::new(params, eqpt);

    let outcome = mgr.run();

    assert_eq!(outcome, MissionOutcome::CyclesExhausted);
    assert_eq!(mgr.tm().cycles, 1);
    // Alignment, forward scan, centring on the fallback candidate, confirmation
    assert_eq!(mgr.tm().sweeps, 4);
    assert_eq!(world.borrow().percentage_requests, 13 + 18 + 18 + 18);
    assert_eq!(
        stage_names(&mgr).last().copied(),
        Some("Terminated(CyclesExhausted)")
    );

    drop(mgr);
    assert!(world.borrow().actuator_released);
}

#[test]
fn test_no_release_fails_mission() {
    let (world, eqpt) = setup(SimParams {
        release_at_s: None,
        ..Default::default()
    });
    let mut params = MissionParams::default();
    params.release.timeout_s = 2.0;
    let mut mgr = MissionMgr::new(params, eqpt);

    assert_eq!(mgr.run(), MissionOutcome::ReleaseFailed);
    assert_eq!(
        stage_names(&mgr),
        vec!["AwaitingRelease", "Terminated(ReleaseFailed)"]
    );

    // Released at termination, before the manager is dropped
    let w = world.borrow();
    assert!(w.actuator_released);
    assert!(w.cmd_history.iter().all(|c| c.is_brake()));
    assert_eq!(w.percentage_requests, 0);
}

#[test]
fn test_interrupt_aborts_before_motion() {
    let (world, eqpt) = setup(SimParams::default());
    let running = Arc::new(AtomicBool::new(false));
    let mut mgr = MissionMgr::new(MissionParams::default(), eqpt.with_running_flag(running));

    assert_eq!(mgr.run(), MissionOutcome::Aborted);
    assert_eq!(
        stage_names(&mgr),
        vec!["AwaitingRelease", "Terminated(Aborted)"]
    );

    let w = world.borrow();
    assert!(w.actuator_released);
    assert!(w.cmd_history.iter().all(|c| c.is_brake()));
}

#[test]
fn test_imu_fault_fails_bring_up() {
    let world = SimWorld::shared(SimParams {
        imu_fault: true,
        ..Default::default()
    });
    let mut eqpt = build_eqpt(&world);

    assert!(eqpt.bring_up().is_err());
    assert!(world.borrow().cmd_history.is_empty());
}
