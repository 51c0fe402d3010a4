//! Bench command port behavior.

use tcu::interfaces::TcuCommand;
use tcu::state::{Gear, LimpCause, ShiftPhase};

use super::harness::TestRig;

/// Forcing a gear bypasses the state machine: solenoids commit on the
/// next tick, with no episode.
#[test]
fn force_gear_commits_immediately() {
    let mut rig = TestRig::new();
    rig.send(TcuCommand::ForceGear(Gear::Third));
    rig.tick();

    let state = rig.state();
    assert_eq!(state.current_gear, Gear::Third);
    assert_eq!(state.target_gear, Gear::Third);
    assert_eq!(state.shift_phase, ShiftPhase::Stable);
    assert_eq!(state.total_shifts, 1);

    // Third gear solenoid pattern: S1 low, S2 high.
    let out = rig.outputs();
    assert!(!out.shift1);
    assert!(out.shift2);
}

/// A force during an open episode abandons the episode first.
#[test]
fn force_gear_aborts_an_open_episode() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.throttle_pct = 30.0;
        s.speed_kmh = 25.0; // past the 1→2 point (22)
    });
    rig.run_ms(900);
    assert_eq!(rig.state().shift_phase, ShiftPhase::Requested);

    rig.send(TcuCommand::ForceGear(Gear::Fourth));
    rig.tick();
    assert_eq!(rig.state().current_gear, Gear::Fourth);
    assert_eq!(rig.state().shift_phase, ShiftPhase::Stable);
}

/// Operator limp latch and release round-trip.
#[test]
fn limp_latch_and_release() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.throttle_pct = 30.0;
        s.speed_kmh = 20.0;
    });

    rig.send(TcuCommand::SetLimp(true));
    rig.run_ms(1500);
    assert!(rig.state().limp_mode);
    assert_eq!(rig.state().limp_cause, Some(LimpCause::Operator));
    assert_eq!(rig.state().current_gear, Gear::Third);

    rig.send(TcuCommand::SetLimp(false));
    rig.run_ms(1500);
    assert!(!rig.state().limp_mode);
    assert_eq!(rig.state().limp_cause, None);
    // 20 km/h at 30% throttle walks back down: 3→2 at 37, 2→1 at 13.
    assert_eq!(rig.state().current_gear, Gear::Second);
}

/// The diagnostic snapshot tracks commands tick by tick.
#[test]
fn diag_snapshot_reflects_forced_gear() {
    let mut rig = TestRig::new();
    rig.send(TcuCommand::ForceGear(Gear::Second));
    rig.tick();

    let snap = rig.diag.read();
    assert_eq!(snap.current_gear, Gear::Second);
    assert_eq!(snap.stats.total_shifts, 1);
    assert_eq!(snap.recent_shifts.len(), 1);
    assert_eq!(snap.recent_shifts[0].from_gear, Gear::First);
    assert_eq!(snap.recent_shifts[0].to_gear, Gear::Second);
}
