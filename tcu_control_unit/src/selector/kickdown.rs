//! Kickdown demand detection.
//!
//! A kickdown needs both an absolute high-load threshold and a recent
//! sharp throttle rise. The pairing filters out steady high-throttle
//! cruise: holding 90% on a grade is not a kickdown, stamping the pedal
//! from 30% to 95% is.

/// Throttle rise [percentage points] between two ticks that counts as sharp.
const SHARP_RISE_PCT: f32 = 20.0;

/// How long a sharp rise arms the detector [ms].
const RISE_WINDOW_MS: u64 = 200;

/// Throttle above which an armed detector fires [%].
const ACTIVATION_PCT: f32 = 85.0;

/// Stateful kickdown detector, threaded through the tick.
#[derive(Debug, Clone, Default)]
pub struct KickdownDetector {
    last_throttle_pct: f32,
    last_sharp_rise_ms: Option<u64>,
}

impl KickdownDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one throttle sample; returns whether kickdown is active.
    pub fn update(&mut self, throttle_pct: f32, now_ms: u64) -> bool {
        if throttle_pct - self.last_throttle_pct >= SHARP_RISE_PCT {
            self.last_sharp_rise_ms = Some(now_ms);
        }
        self.last_throttle_pct = throttle_pct;

        throttle_pct > ACTIVATION_PCT
            && self
                .last_sharp_rise_ms
                .is_some_and(|rise| now_ms.saturating_sub(rise) < RISE_WINDOW_MS)
    }

    /// Forget the armed rise and the last sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
