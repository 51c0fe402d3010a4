//! Shift-point calibration tables.
//!
//! Each table holds the vehicle speed [km/h] at which a gear change
//! occurs, at load breakpoints of 10 / 25 / 50 / 75 / 100 % throttle.
//! Between breakpoints the threshold is linearly interpolated in
//! integer arithmetic, truncating toward zero.
//!
//! Upshift tables exist in normal and power (sport) variants. There is
//! a single downshift calibration used by both shift maps.

use tcu::state::Gear;

/// Throttle breakpoints [%] for all tables.
pub const LOAD_POINTS: [i32; 5] = [10, 25, 50, 75, 100];

/// Shift threshold curve over the load breakpoints [km/h].
pub type ShiftTable = [i32; 5];

pub const UP_1_2_NORMAL: ShiftTable = [15, 20, 30, 45, 60];
pub const UP_2_3_NORMAL: ShiftTable = [35, 45, 60, 80, 100];
pub const UP_3_4_NORMAL: ShiftTable = [55, 65, 85, 110, 130];

pub const UP_1_2_POWER: ShiftTable = [20, 30, 45, 60, 75];
pub const UP_2_3_POWER: ShiftTable = [45, 60, 80, 100, 120];
pub const UP_3_4_POWER: ShiftTable = [70, 85, 110, 130, 150];

pub const DOWN_2_1: ShiftTable = [10, 12, 18, 25, 35];
pub const DOWN_3_2: ShiftTable = [28, 35, 48, 65, 80];
pub const DOWN_4_3: ShiftTable = [48, 55, 72, 95, 115];

/// Interpolate a shift threshold for the given throttle position.
///
/// Below the first breakpoint the first value holds; above the last,
/// the last. Integer math, truncating toward zero.
pub fn interpolate(table: &ShiftTable, throttle_pct: i32) -> i32 {
    let t = throttle_pct.clamp(0, 100);
    if t <= LOAD_POINTS[0] {
        return table[0];
    }
    for i in 0..LOAD_POINTS.len() - 1 {
        let (lo, hi) = (LOAD_POINTS[i], LOAD_POINTS[i + 1]);
        if t <= hi {
            return table[i] + (table[i + 1] - table[i]) * (t - lo) / (hi - lo);
        }
    }
    table[LOAD_POINTS.len() - 1]
}

/// Upshift threshold out of `from`, or `None` from top gear.
pub fn upshift_threshold(from: Gear, power_mode: bool, throttle_pct: i32) -> Option<i32> {
    let table = match (from, power_mode) {
        (Gear::First, false) => &UP_1_2_NORMAL,
        (Gear::Second, false) => &UP_2_3_NORMAL,
        (Gear::Third, false) => &UP_3_4_NORMAL,
        (Gear::First, true) => &UP_1_2_POWER,
        (Gear::Second, true) => &UP_2_3_POWER,
        (Gear::Third, true) => &UP_3_4_POWER,
        (Gear::Fourth, _) => return None,
    };
    Some(interpolate(table, throttle_pct))
}

/// Downshift threshold out of `from`, or `None` from first gear.
pub fn downshift_threshold(from: Gear, throttle_pct: i32) -> Option<i32> {
    let table = match from {
        Gear::First => return None,
        Gear::Second => &DOWN_2_1,
        Gear::Third => &DOWN_3_2,
        Gear::Fourth => &DOWN_4_3,
    };
    Some(interpolate(table, throttle_pct))
}

// ─── Tests ──────────────────────────────────────────────────────────
