//! End-to-end drive scenarios and quantified shift properties.

use tcu::interfaces::TcuCommand;
use tcu::state::{Gear, ShiftPhase};

use super::harness::{TestRig, TICK_MS};

/// Cold start, gentle pull-away: 1→2 at the interpolated shift point,
/// with the cold-fluid pressure bias during the shift.
#[test]
fn s1_cold_start_first_to_second() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.throttle_pct = 30.0;
        s.fluid_temp_c = 30.0;
    });

    let mut in_progress_duty = None;
    let mut speed_at_request = None;

    // Speed ramps 0 → 25 km/h over 4 s.
    for step in 0..(5000 / TICK_MS) {
        let t_ms = step * TICK_MS;
        let speed = (25.0 * t_ms as f32 / 4000.0).min(25.0);
        rig.set(|s| s.speed_kmh = speed);
        rig.tick();

        if rig.state().shift_phase == ShiftPhase::Requested && speed_at_request.is_none() {
            speed_at_request = Some(speed);
        }
        if rig.state().shift_phase == ShiftPhase::InProgress {
            in_progress_duty = Some(rig.outputs().accumulator_pct);
        }
    }

    assert_eq!(rig.state().current_gear, Gear::Second);
    assert_eq!(rig.state().shift_phase, ShiftPhase::Stable);
    assert_eq!(rig.state().total_shifts, 1, "exactly one commit per episode");

    // The 1→2 threshold at 30% throttle interpolates to 22 km/h.
    let requested_at = speed_at_request.expect("no shift was requested");
    assert!(
        requested_at > 22.0 && requested_at < 23.5,
        "shift requested at {requested_at} km/h, expected just past 22"
    );

    // Accumulator during the shift: medium (50) biased −20 for cold fluid.
    assert_eq!(in_progress_duty, Some(30));
}

/// Kickdown at 70 km/h in fourth: drop to third immediately, then to
/// second once the inhibit window reopens.
#[test]
fn s2_kickdown_fourth_to_second() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.speed_kmh = 70.0;
        s.throttle_pct = 20.0;
    });
    rig.send(TcuCommand::ForceGear(Gear::Fourth));
    rig.run_ms(1000); // settle past the inhibit window

    assert_eq!(rig.state().current_gear, Gear::Fourth);

    // Pedal stamped to the floor in one tick.
    rig.set(|s| s.throttle_pct = 95.0);
    rig.run_ms(3000);

    assert_eq!(rig.state().current_gear, Gear::Second);

    let snap = rig.diag.read();
    let shifts = &snap.recent_shifts;
    // Forced 1→4, then kickdown 4→3, then table 3→2.
    assert_eq!(shifts.len(), 3);
    assert_eq!((shifts[1].from_gear, shifts[1].to_gear), (Gear::Fourth, Gear::Third));
    assert!(shifts[1].kickdown, "first drop is the kickdown");
    assert_eq!((shifts[2].from_gear, shifts[2].to_gear), (Gear::Third, Gear::Second));

    // Shift inhibit: consecutive commits at least 800 ms apart.
    assert!(
        shifts[2].at_ms - shifts[1].at_ms >= 800,
        "commits only {} ms apart",
        shifts[2].at_ms - shifts[1].at_ms
    );
}

/// Brake assist: slowing through 65 km/h in fourth with the throttle
/// closed and the brake on pulls third.
#[test]
fn s4_brake_assist_downshift() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.speed_kmh = 65.0;
        s.throttle_pct = 2.0;
    });
    rig.send(TcuCommand::ForceGear(Gear::Fourth));
    rig.run_ms(1000);
    assert_eq!(rig.state().current_gear, Gear::Fourth);
    assert_eq!(rig.state().target_gear, Gear::Fourth);

    rig.set(|s| s.brake_pressed = true);
    rig.tick();
    assert_eq!(rig.state().target_gear, Gear::Third, "assist fires within a tick");
    assert_eq!(rig.state().shift_phase, ShiftPhase::Requested);

    rig.run_ms(1000);
    assert_eq!(rig.state().current_gear, Gear::Third);
}

/// Limp latch: the box goes to third through the state machine and
/// stays there no matter what the sensors do afterwards.
#[test]
fn s6_limp_holds_third() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.speed_kmh = 20.0;
        s.throttle_pct = 30.0;
    });
    rig.run_ms(1000);
    assert_eq!(rig.state().current_gear, Gear::First);

    rig.send(TcuCommand::SetLimp(true));
    rig.run_ms(1500);
    assert_eq!(rig.state().current_gear, Gear::Third);
    assert!(rig.state().limp_mode);

    // No adaptive update for the limp-mode shift.
    assert_eq!(rig.state().shift_quality_offset, [0; 3]);
    assert_eq!(rig.state().shift_count, [0; 3]);

    // Throw everything at it; target never leaves third.
    let profiles: [(f32, f32, bool); 4] = [
        (120.0, 95.0, false),
        (5.0, 0.0, true),
        (200.0, 50.0, false),
        (0.0, 100.0, false),
    ];
    for (speed, throttle, brake) in profiles {
        rig.set(|s| {
            s.speed_kmh = speed;
            s.throttle_pct = throttle;
            s.brake_pressed = brake;
        });
        for _ in 0..25 {
            rig.tick();
            assert_eq!(rig.state().target_gear, Gear::Third);
            assert_eq!(rig.state().current_gear, Gear::Third);
        }
    }
}

/// Monotone upshift through all four gears under a steady-load ramp.
#[test]
fn monotone_upshift_normal_map() {
    assert_monotone_ramp(false, true, Gear::Fourth, 3);
}

/// The power map shifts later but walks the same sequence.
#[test]
fn monotone_upshift_power_map() {
    assert_monotone_ramp(true, true, Gear::Fourth, 3);
}

/// With overdrive inhibited the ramp stops in third.
#[test]
fn monotone_upshift_stops_at_third_without_overdrive() {
    assert_monotone_ramp(false, false, Gear::Third, 2);
}

fn assert_monotone_ramp(power_mode: bool, overdrive: bool, top: Gear, expected_shifts: u32) {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.throttle_pct = 40.0;
        s.power_mode = power_mode;
        s.overdrive_enabled = overdrive;
    });

    let mut last_gear = Gear::First;
    // 0 → 160 km/h at 2 km/h per second.
    for step in 0..(80_000 / TICK_MS) {
        let t_ms = step * TICK_MS;
        let speed = 2.0 * t_ms as f32 / 1000.0;
        rig.set(|s| s.speed_kmh = speed);
        rig.tick();

        let gear = rig.state().current_gear;
        assert!(gear >= last_gear, "gear fell back {last_gear:?} → {gear:?} at {speed} km/h");
        last_gear = gear;
    }

    assert_eq!(rig.state().current_gear, top);
    assert_eq!(rig.state().total_shifts, expected_shifts);
}

/// Overdrive switched off while cruising in fourth: the selector
/// demands third and never returns to fourth.
#[test]
fn overdrive_inhibit_demotes_and_sticks() {
    let mut rig = TestRig::new();
    rig.set(|s| {
        s.speed_kmh = 100.0;
        s.throttle_pct = 30.0;
    });
    rig.send(TcuCommand::ForceGear(Gear::Fourth));
    rig.run_ms(1000);

    rig.set(|s| s.overdrive_enabled = false);
    rig.run_ms(1500);
    assert_eq!(rig.state().current_gear, Gear::Third);

    for _ in 0..250 {
        rig.tick();
        assert!(rig.state().current_gear <= Gear::Third);
        assert!(rig.state().target_gear <= Gear::Third);
    }
}

/// Randomized input fuzz: duty and trim ranges hold on every tick, and
/// Stable always means current == target.
#[test]
fn fuzz_duty_and_state_invariants() {
    let mut rig = TestRig::new();
    let mut seed: u64 = 0x5eed_cafe_f00d_0001;
    let mut next = move || {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (seed >> 33) as u32
    };

    for _ in 0..2000 {
        let r = next();
        rig.set(|s| {
            s.throttle_pct = (r % 101) as f32;
            s.speed_kmh = ((r >> 8) % 181) as f32;
            s.fluid_temp_c = ((r >> 16) % 140) as f32 - 20.0;
            s.brake_pressed = r & 1 == 1;
            s.overdrive_enabled = r & 2 == 0;
            s.power_mode = r & 4 == 0;
        });
        rig.tick();

        let state = rig.state();
        let acc = state.accumulator_duty_pct;
        assert!((15..=85).contains(&acc), "accumulator duty {acc} out of range");
        assert!(
            matches!(state.lockup_duty_pct, 0 | 50 | 75 | 95),
            "lockup duty {} not a calibrated step",
            state.lockup_duty_pct
        );
        for offset in state.shift_quality_offset {
            assert!((-20..=20).contains(&offset), "trim {offset} out of clamp");
        }
        if state.shift_phase == ShiftPhase::Stable && !state.limp_mode {
            assert_eq!(state.current_gear, state.target_gear);
        }
    }
}
