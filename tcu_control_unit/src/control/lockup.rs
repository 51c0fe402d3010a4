//! Torque-converter lockup control.
//!
//! The lockup clutch bypasses the fluid coupling at cruise to kill slip
//! losses. Engagement needs an established gear, warm fluid, moderate
//! throttle, and a stable shift machine; release is forced the moment
//! any of the hard conditions fail. Between the release and engage
//! thresholds the clutch stays open — that band is what keeps it from
//! cycling at a steady cruise near the threshold.

use tcu::config::LockupConfig;
use tcu::state::{Gear, ShiftPhase};

/// Margin over the engage throttle gate that forces release [%].
const THROTTLE_RELEASE_MARGIN_PCT: f32 = 10.0;

/// Duty for a near-closed throttle cruise [%].
const DUTY_LIGHT: u8 = 95;
/// Duty for a light throttle cruise [%].
const DUTY_MODERATE: u8 = 75;
/// Duty for the rest of the engagement envelope [%].
const DUTY_FIRM: u8 = 50;

/// Throttle below which the light-cruise duty applies [%].
const LIGHT_THROTTLE_PCT: f32 = 20.0;
/// Throttle below which the moderate duty applies [%].
const MODERATE_THROTTLE_PCT: f32 = 40.0;

/// Commanded lockup clutch state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockupCommand {
    pub engaged: bool,
    pub duty_pct: u8,
}

impl LockupCommand {
    const RELEASED: Self = Self {
        engaged: false,
        duty_pct: 0,
    };
}

/// Evaluate the lockup envelope.
pub fn lockup_command(
    cfg: &LockupConfig,
    gear: Gear,
    phase: ShiftPhase,
    speed_kmh: f32,
    throttle_pct: f32,
    fluid_temp_c: f32,
) -> LockupCommand {
    let gear_ok = gear.number() >= cfg.enable_gear;

    let must_unlock = speed_kmh < cfg.disable_speed_kmh
        || throttle_pct > cfg.throttle_max_pct + THROTTLE_RELEASE_MARGIN_PCT
        || phase != ShiftPhase::Stable
        || !gear_ok;

    let can_lockup = gear_ok
        && speed_kmh > cfg.enable_speed_kmh
        && throttle_pct < cfg.throttle_max_pct
        && phase == ShiftPhase::Stable
        && fluid_temp_c > cfg.min_fluid_temp_c;

    if must_unlock {
        LockupCommand::RELEASED
    } else if can_lockup {
        let duty_pct = if throttle_pct < LIGHT_THROTTLE_PCT {
            DUTY_LIGHT
        } else if throttle_pct < MODERATE_THROTTLE_PCT {
            DUTY_MODERATE
        } else {
            DUTY_FIRM
        };
        LockupCommand {
            engaged: true,
            duty_pct,
        }
    } else {
        LockupCommand::RELEASED
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
