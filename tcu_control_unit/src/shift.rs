//! Shift state machine.
//!
//! Stable → Requested → InProgress → Completing → Stable, evaluated
//! once per tick with elapsed-time gates:
//!
//! - the inhibit window keeps episodes apart so the box cannot hunt,
//! - the delay window debounces requests born from noisy inputs,
//! - the settle window separates mechanical completion from the moment
//!   the adaptive learner reads the measured duration.
//!
//! The machine itself performs no I/O. It emits a [`ShiftOutcome`] and
//! the cycle runner performs the single solenoid commit per episode.

use tcu::config::TimingConfig;
use tcu::state::{Gear, ShiftPhase, LIMP_GEAR};

use crate::selector::Selection;
use crate::state::TransmissionState;

/// Timing gates for the shift machine [ms].
#[derive(Debug, Clone, Copy)]
pub struct ShiftTiming {
    pub inhibit_ms: u64,
    pub delay_ms: u64,
    pub complete_ms: u64,
    pub settle_ms: u64,
}

impl From<&TimingConfig> for ShiftTiming {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            inhibit_ms: cfg.shift_inhibit_ms,
            delay_ms: cfg.shift_delay_ms,
            complete_ms: cfg.shift_complete_ms,
            settle_ms: cfg.shift_settle_ms,
        }
    }
}

/// Bookkeeping for one open shift episode.
#[derive(Debug, Clone, Copy)]
struct ShiftEpisode {
    from_gear: Gear,
    to_gear: Gear,
    kickdown_seen: bool,
}

/// A closed episode, handed to the adaptive learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedShift {
    /// Gear engaged when the episode began.
    pub from_gear: Gear,
    /// Gear committed by the episode.
    pub to_gear: Gear,
    /// Measured duration, episode start to mechanical completion [ms].
    pub duration_ms: u64,
    /// Whether kickdown was active at any tick of the episode.
    pub kickdown_seen: bool,
}

/// What one machine advance produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOutcome {
    /// Nothing to act on this tick.
    Idle,
    /// Commit the solenoid change `from` → `to` now.
    Commit { from: Gear, to: Gear },
    /// A requested shift failed debounce confirmation.
    Reverted,
    /// An episode closed; the learner may run.
    Completed(CompletedShift),
}

/// The shift state machine.
#[derive(Debug, Clone)]
pub struct ShiftStateMachine {
    timing: ShiftTiming,
    episode: Option<ShiftEpisode>,
}

impl ShiftStateMachine {
    pub fn new(timing: ShiftTiming) -> Self {
        Self {
            timing,
            episode: None,
        }
    }

    /// Abandon any open episode and return the state to Stable.
    ///
    /// Used by the bench gear-force path, which bypasses the machine.
    pub fn abort(&mut self, state: &mut TransmissionState) {
        self.episode = None;
        state.shift_phase = ShiftPhase::Stable;
        state.target_gear = state.current_gear;
    }

    /// Advance one tick.
    ///
    /// `selection` is this tick's selector output; the machine uses it
    /// as the shift request in Stable and as the confirmation sample in
    /// Requested.
    pub fn advance(
        &mut self,
        state: &mut TransmissionState,
        selection: &Selection,
        now_ms: u64,
    ) -> ShiftOutcome {
        state.kickdown_active = selection.kickdown_active;
        if let Some(ep) = &mut self.episode {
            ep.kickdown_seen |= selection.kickdown_active;
        }

        let elapsed = now_ms.saturating_sub(state.shift_start_ms);

        match state.shift_phase {
            ShiftPhase::Stable => {
                let since_last = now_ms.saturating_sub(state.last_shift_completed_ms);
                if selection.target != state.current_gear && since_last > self.timing.inhibit_ms {
                    state.target_gear = selection.target;
                    state.shift_start_ms = now_ms;
                    state.shift_phase = ShiftPhase::Requested;
                    self.episode = Some(ShiftEpisode {
                        from_gear: state.current_gear,
                        to_gear: selection.target,
                        kickdown_seen: selection.kickdown_active,
                    });
                } else if state.limp_mode {
                    state.target_gear = LIMP_GEAR;
                } else {
                    state.target_gear = state.current_gear;
                }
                ShiftOutcome::Idle
            }

            ShiftPhase::Requested => {
                if elapsed <= self.timing.delay_ms {
                    return ShiftOutcome::Idle;
                }
                if selection.target == state.target_gear {
                    let from = state.current_gear;
                    let to = state.target_gear;
                    state.last_shift_completed_ms = now_ms;
                    state.shift_phase = ShiftPhase::InProgress;
                    ShiftOutcome::Commit { from, to }
                } else {
                    // Request evaporated during debounce — no side effect.
                    self.episode = None;
                    state.target_gear = state.current_gear;
                    state.shift_phase = ShiftPhase::Stable;
                    ShiftOutcome::Reverted
                }
            }

            ShiftPhase::InProgress => {
                if elapsed > self.timing.complete_ms {
                    state.last_shift_duration_ms = elapsed;
                    state.shift_phase = ShiftPhase::Completing;
                }
                ShiftOutcome::Idle
            }

            ShiftPhase::Completing => {
                if elapsed > self.timing.complete_ms + self.timing.settle_ms {
                    state.shift_phase = ShiftPhase::Stable;
                    match self.episode.take() {
                        Some(ep) => ShiftOutcome::Completed(CompletedShift {
                            from_gear: ep.from_gear,
                            to_gear: ep.to_gear,
                            duration_ms: state.last_shift_duration_ms,
                            kickdown_seen: ep.kickdown_seen,
                        }),
                        None => ShiftOutcome::Idle,
                    }
                } else {
                    ShiftOutcome::Idle
                }
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
