//! Fault bitflags and command errors.
//!
//! Sensor faults are reporting-only: the control path already degrades
//! (stale channels read zero, out-of-range inputs are clamped), so these
//! flags exist for the diagnostic view. Flags marked CRITICAL are the
//! ones the limp monitor may escalate on.

use bitflags::bitflags;

bitflags! {
    /// Per-channel sensor fault flags.
    ///
    /// CRITICAL flags (may latch limp): OVER_TEMP, OUTPUT_STALE.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct SensorFault: u8 {
        /// Vehicle speed pulse train stale.
        const SPEED_STALE   = 0x01;
        /// Engine RPM pulse train stale.
        const ENGINE_STALE  = 0x02;
        /// Output shaft pulse train stale. **CRITICAL**.
        const OUTPUT_STALE  = 0x04;
        /// Fluid temperature above the shutdown threshold. **CRITICAL**.
        const OVER_TEMP     = 0x08;
        /// ADC reading outside the plausible range (clamped).
        const TEMP_CLAMPED  = 0x10;
    }
}

impl Default for SensorFault {
    fn default() -> Self {
        Self::empty()
    }
}

impl SensorFault {
    /// Mask of the flags the limp monitor may escalate on.
    pub const CRITICAL_MASK: Self =
        Self::from_bits_truncate(Self::OUTPUT_STALE.bits() | Self::OVER_TEMP.bits());

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }
}

/// Error type for operator command handling.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Gear number outside 1..=4.
    #[error("invalid gear number {0}, expected 1..=4")]
    InvalidGear(u8),

    /// Malformed console input.
    #[error("unrecognized command: {0}")]
    Unrecognized(String),
}

// ─── Tests ──────────────────────────────────────────────────────────
