//! Adaptive shift-quality trim learning.
//!
//! After each completed upshift under benign conditions, the measured
//! shift duration is compared against the target envelope. A slow shift
//! means too much accumulator cushioning — firm it up (negative trim);
//! a fast shift means a harsh engagement — soften it (positive trim).
//! Trims are bounded and volatile; they restart from zero on power-up.

use tcu::config::AdaptiveConfig;
use tracing::debug;

use crate::shift::CompletedShift;
use crate::state::TransmissionState;

/// Why a completed episode produced no trim update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Downshifts are not learned.
    NotUpshift,
    /// Kickdown was active at some point in the episode.
    Kickdown,
    /// Throttle too high at the moment of the update.
    HeavyThrottle,
}

/// Outcome of one learning observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnResult {
    /// The trim for upshift `index` moved by `delta` to `offset`.
    Applied {
        index: usize,
        delta: i16,
        offset: i16,
    },
    /// Nothing learned.
    Skipped(SkipReason),
}

/// The adaptive learner. Stateless apart from its calibration; the
/// trims themselves live in [`TransmissionState`].
#[derive(Debug, Clone)]
pub struct AdaptiveLearner {
    cfg: AdaptiveConfig,
}

impl AdaptiveLearner {
    pub fn new(cfg: AdaptiveConfig) -> Self {
        Self { cfg }
    }

    /// Observe one completed shift episode.
    ///
    /// Invoked exactly once per episode, at the moment the machine
    /// returns to Stable. The pre-shift gear comes from the episode
    /// record, not from the already-updated current gear.
    pub fn observe(
        &self,
        state: &mut TransmissionState,
        shift: &CompletedShift,
        throttle_pct: f32,
    ) -> LearnResult {
        if shift.to_gear <= shift.from_gear {
            return LearnResult::Skipped(SkipReason::NotUpshift);
        }
        if shift.kickdown_seen {
            return LearnResult::Skipped(SkipReason::Kickdown);
        }
        if throttle_pct > self.cfg.heavy_throttle_pct {
            return LearnResult::Skipped(SkipReason::HeavyThrottle);
        }

        // to_gear > from_gear rules First out, so the index exists.
        let Some(index) = shift.to_gear.upshift_index() else {
            return LearnResult::Skipped(SkipReason::NotUpshift);
        };

        let delta = if shift.duration_ms > self.cfg.slow_shift_ms {
            -self.cfg.trim_step
        } else if shift.duration_ms < self.cfg.fast_shift_ms {
            self.cfg.trim_step
        } else {
            0
        };

        let offset = (state.shift_quality_offset[index] + delta)
            .clamp(-self.cfg.trim_limit, self.cfg.trim_limit);
        state.shift_quality_offset[index] = offset;
        state.shift_count[index] += 1;

        debug!(
            index,
            delta,
            offset,
            duration_ms = shift.duration_ms,
            "adaptive trim update"
        );
        LearnResult::Applied {
            index,
            delta,
            offset,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
