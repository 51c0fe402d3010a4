//! Limp-mode supervision.
//!
//! Two latch conditions, both requiring persistence across consecutive
//! ticks so a single bad sample cannot take the box to limp home:
//!
//! - fluid temperature at or above the shutdown threshold,
//! - output shaft reading zero while the engine turns and the vehicle
//!   is clearly moving (a dead output sensor or a mechanical failure —
//!   either way the selector must not trust road speed).
//!
//! The monitor only latches the limp flag; unlatching is an operator
//! decision.

use tcu::config::LimpConfig;
use tcu::snapshot::SensorSnapshot;
use tcu::state::LimpCause;

/// Persistent-condition limp latch monitor.
#[derive(Debug, Clone)]
pub struct LimpMonitor {
    cfg: LimpConfig,
    over_temp_ticks: u32,
    output_loss_ticks: u32,
}

impl LimpMonitor {
    pub fn new(cfg: LimpConfig) -> Self {
        Self {
            cfg,
            over_temp_ticks: 0,
            output_loss_ticks: 0,
        }
    }

    /// Evaluate one tick. Returns a cause once a condition has
    /// persisted long enough.
    pub fn evaluate(&mut self, snap: &SensorSnapshot) -> Option<LimpCause> {
        if snap.fluid_temp_c >= self.cfg.over_temp_c {
            self.over_temp_ticks += 1;
        } else {
            self.over_temp_ticks = 0;
        }

        let output_implausible = snap.output_rpm <= 0.0
            && snap.engine_rpm > self.cfg.min_engine_rpm
            && snap.speed_kmh > self.cfg.min_speed_kmh;
        if output_implausible {
            self.output_loss_ticks += 1;
        } else {
            self.output_loss_ticks = 0;
        }

        if self.over_temp_ticks >= self.cfg.over_temp_ticks {
            Some(LimpCause::OverTemperature)
        } else if self.output_loss_ticks >= self.cfg.output_loss_ticks {
            Some(LimpCause::OutputSpeedLoss)
        } else {
            None
        }
    }

    /// Clear persistence counters (after an operator unlatch).
    pub fn reset(&mut self) {
        self.over_temp_ticks = 0;
        self.output_loss_ticks = 0;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
