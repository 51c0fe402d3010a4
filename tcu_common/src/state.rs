//! State enums for the transmission control core.
//!
//! All enums use `#[repr(u8)]` for compact layout and stable diagnostic
//! encoding. `from_u8` constructors reject out-of-range values; gear
//! numbers outside 1..=4 cannot be represented at all.

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

// ─── Gear ───────────────────────────────────────────────────────────

/// Forward gear of the four-speed gearbox.
///
/// The discriminant is the gear number. There is no neutral/reverse
/// variant: the hydraulic valve body handles those mechanically and the
/// electronic side only ever commands a forward gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Gear {
    /// First gear.
    First = 1,
    /// Second gear.
    Second = 2,
    /// Third gear — also the limp-home gear.
    Third = 3,
    /// Fourth gear (overdrive).
    Fourth = 4,
}

assert_eq_size!(Gear, u8);

impl Gear {
    /// Convert from a raw gear number. Returns `None` outside 1..=4.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            _ => None,
        }
    }

    /// Gear number (1..=4).
    #[inline]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Shift solenoid levels `(s1, s2)` that select this gear.
    ///
    /// | Gear | S1 | S2 |
    /// |------|----|----|
    /// | 1    | lo | lo |
    /// | 2    | hi | lo |
    /// | 3    | lo | hi |
    /// | 4    | hi | hi |
    #[inline]
    pub const fn solenoids(self) -> (bool, bool) {
        match self {
            Self::First => (false, false),
            Self::Second => (true, false),
            Self::Third => (false, true),
            Self::Fourth => (true, true),
        }
    }

    /// Returns true for the overdrive gear.
    #[inline]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Fourth)
    }

    /// Index into per-upshift arrays for the upshift *into* this gear
    /// (2 → 0, 3 → 1, 4 → 2). `None` for first gear, which is never an
    /// upshift target.
    #[inline]
    pub const fn upshift_index(self) -> Option<usize> {
        match self {
            Self::First => None,
            Self::Second => Some(0),
            Self::Third => Some(1),
            Self::Fourth => Some(2),
        }
    }
}

impl Default for Gear {
    fn default() -> Self {
        Self::First
    }
}

/// The gear held while limp mode is latched.
pub const LIMP_GEAR: Gear = Gear::Third;

// ─── Shift Phase ────────────────────────────────────────────────────

/// Phase of the shift state machine.
///
/// Stable → Requested → InProgress → Completing → Stable. A Requested
/// episode that fails debounce confirmation reverts to Stable without
/// a solenoid commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShiftPhase {
    /// No shift episode active; target equals current gear.
    Stable = 0,
    /// Target gear differs; waiting out the debounce window.
    Requested = 1,
    /// Solenoids committed; hydraulics completing the change.
    InProgress = 2,
    /// Mechanically done; settling before the episode closes.
    Completing = 3,
}

impl ShiftPhase {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stable),
            1 => Some(Self::Requested),
            2 => Some(Self::InProgress),
            3 => Some(Self::Completing),
            _ => None,
        }
    }

    /// Returns true while a shift episode is open.
    #[inline]
    pub const fn is_shifting(&self) -> bool {
        !matches!(self, Self::Stable)
    }
}

impl Default for ShiftPhase {
    fn default() -> Self {
        Self::Stable
    }
}

// ─── Limp Cause ─────────────────────────────────────────────────────

/// Why limp mode was latched. Reported in diagnostics; cleared only by
/// operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LimpCause {
    /// Latched by operator command (bench use).
    Operator = 0,
    /// Fluid temperature persistently above the shutdown threshold.
    OverTemperature = 1,
    /// Output shaft reads zero while the engine turns and the vehicle moves.
    OutputSpeedLoss = 2,
}

impl LimpCause {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Operator),
            1 => Some(Self::OverTemperature),
            2 => Some(Self::OutputSpeedLoss),
            _ => None,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
