//! Runtime state of the control core.
//!
//! One mutable [`TransmissionState`] exists per controller, created at
//! power-on and mutated only by the cycle. Adaptive trims are volatile
//! and reset on power cycle.

use tcu::state::{Gear, LimpCause, ShiftPhase};

/// The single mutable state block of the shift control core.
#[derive(Debug, Clone)]
pub struct TransmissionState {
    /// Gear currently engaged by the valve body.
    pub current_gear: Gear,
    /// Gear the selector wants.
    pub target_gear: Gear,
    /// Phase of the active shift episode.
    pub shift_phase: ShiftPhase,
    /// Start of the current non-Stable episode [ms].
    pub shift_start_ms: u64,
    /// Timestamp of the last solenoid commit [ms].
    pub last_shift_completed_ms: u64,
    /// Measured duration of the last shift [ms].
    pub last_shift_duration_ms: u64,
    /// Kickdown demand observed this tick.
    pub kickdown_active: bool,
    /// Last commanded lockup clutch state.
    pub lockup_engaged: bool,
    /// Last commanded lockup duty [%].
    pub lockup_duty_pct: u8,
    /// Last commanded accumulator duty [%].
    pub accumulator_duty_pct: u8,
    /// Learned firmness trim per upshift (1→2, 2→3, 3→4) [duty %].
    pub shift_quality_offset: [i16; 3],
    /// Completed learning episodes per upshift.
    pub shift_count: [u32; 3],
    /// Total solenoid commits since power-on.
    pub total_shifts: u32,
    /// Limp latch — holds third gear, disables learning.
    pub limp_mode: bool,
    /// Why limp mode latched, if it did.
    pub limp_cause: Option<LimpCause>,
}

impl Default for TransmissionState {
    fn default() -> Self {
        Self {
            current_gear: Gear::First,
            target_gear: Gear::First,
            shift_phase: ShiftPhase::Stable,
            shift_start_ms: 0,
            last_shift_completed_ms: 0,
            last_shift_duration_ms: 0,
            kickdown_active: false,
            lockup_engaged: false,
            lockup_duty_pct: 0,
            accumulator_duty_pct: 50,
            shift_quality_offset: [0; 3],
            shift_count: [0; 3],
            total_shifts: 0,
            limp_mode: false,
            limp_cause: None,
        }
    }
}

impl TransmissionState {
    /// Learned trim for a shift *into* `target`, zero for first gear.
    #[inline]
    pub fn trim_for(&self, target: Gear) -> i16 {
        target
            .upshift_index()
            .map(|i| self.shift_quality_offset[i])
            .unwrap_or(0)
    }

    /// Latch limp mode with a cause. The first cause wins.
    pub fn latch_limp(&mut self, cause: LimpCause) {
        if !self.limp_mode {
            self.limp_mode = true;
            self.limp_cause = Some(cause);
        }
    }

    /// Clear the limp latch (operator command only).
    pub fn clear_limp(&mut self) {
        self.limp_mode = false;
        self.limp_cause = None;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
