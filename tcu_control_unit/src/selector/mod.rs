//! Target gear selection.
//!
//! `select` composes, in order: limp override, overdrive inhibit,
//! kickdown, table-driven upshift, table-driven downshift, and
//! brake-assist downshift. The later steps overwrite the earlier ones;
//! since each step is keyed on the current gear, at most one gear-change
//! edge fires per tick.

pub mod kickdown;
pub mod maps;

use tcu::snapshot::SensorSnapshot;
use tcu::state::{Gear, LIMP_GEAR};

use self::kickdown::KickdownDetector;
use self::maps::{downshift_threshold, upshift_threshold};

/// Kickdown forces 4→3 only below this speed [km/h].
const KICKDOWN_4_3_MAX_KMH: f32 = 120.0;
/// Kickdown forces 3→2 only below this speed [km/h].
const KICKDOWN_3_2_MAX_KMH: f32 = 90.0;
/// Kickdown forces 2→1 only below this speed [km/h].
const KICKDOWN_2_1_MAX_KMH: f32 = 50.0;

/// Brake assist applies only with the throttle effectively closed [%].
const BRAKE_ASSIST_THROTTLE_MAX: f32 = 5.0;
/// Brake assist pulls 4→3 below this speed [km/h].
const BRAKE_ASSIST_4_3_KMH: f32 = 70.0;
/// Brake assist pulls 3→2 below this speed [km/h].
const BRAKE_ASSIST_3_2_KMH: f32 = 45.0;

/// Result of one selector evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Gear the transmission should be in.
    pub target: Gear,
    /// Kickdown demand observed on this evaluation.
    pub kickdown_active: bool,
}

/// Select the target gear for this tick.
pub fn select(
    current: Gear,
    snap: &SensorSnapshot,
    limp_mode: bool,
    detector: &mut KickdownDetector,
    now_ms: u64,
) -> Selection {
    if limp_mode {
        return Selection {
            target: LIMP_GEAR,
            kickdown_active: false,
        };
    }

    let throttle = snap.throttle_pct as i32;
    let speed = snap.speed_kmh;
    let mut target = current;

    // Overdrive inhibit: the OD switch caps the selection at third.
    if !snap.overdrive_enabled && target > Gear::Third {
        target = Gear::Third;
    }

    let kickdown_active = detector.update(snap.throttle_pct, now_ms);
    if kickdown_active {
        target = match current {
            Gear::Fourth if speed < KICKDOWN_4_3_MAX_KMH => Gear::Third,
            Gear::Third if speed < KICKDOWN_3_2_MAX_KMH => Gear::Second,
            Gear::Second if speed < KICKDOWN_2_1_MAX_KMH => Gear::First,
            _ => target,
        };
    } else {
        match current {
            Gear::First => {
                if let Some(t) = upshift_threshold(current, snap.power_mode, throttle) {
                    if speed > t as f32 {
                        target = Gear::Second;
                    }
                }
            }
            Gear::Second => {
                if let Some(t) = upshift_threshold(current, snap.power_mode, throttle) {
                    if speed > t as f32 {
                        target = Gear::Third;
                    }
                }
            }
            Gear::Third => {
                if snap.overdrive_enabled {
                    if let Some(t) = upshift_threshold(current, snap.power_mode, throttle) {
                        if speed > t as f32 {
                            target = Gear::Fourth;
                        }
                    }
                }
            }
            Gear::Fourth => {}
        }
    }

    // Downshift thresholds come from the single shared calibration.
    if let Some(t) = downshift_threshold(current, throttle) {
        if speed < t as f32 {
            target = match current {
                Gear::Fourth => Gear::Third,
                Gear::Third => Gear::Second,
                Gear::Second => Gear::First,
                Gear::First => Gear::First,
            };
        }
    }

    // Brake assist: pull a gear early while slowing under braking.
    if snap.brake_pressed && snap.throttle_pct < BRAKE_ASSIST_THROTTLE_MAX {
        target = match current {
            Gear::Fourth if speed < BRAKE_ASSIST_4_3_KMH => Gear::Third,
            Gear::Third if speed < BRAKE_ASSIST_3_2_KMH => Gear::Second,
            _ => target,
        };
    }

    Selection {
        target,
        kickdown_active,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
