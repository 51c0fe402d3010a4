//! Lock-free pulse-train capture.
//!
//! Each channel has exactly one writer (the capture interrupt) and one
//! reader (the conditioner). Timestamp and period are independent
//! atomics on a monotonic microsecond clock; a reader may observe a
//! timestamp/period pair from adjacent pulses, which shifts a frequency
//! estimate by one pulse interval at most. A channel whose newest pulse
//! is older than its staleness bound reads as zero frequency.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// One pulse input channel.
#[derive(Debug, Default)]
pub struct PulseChannel {
    /// Monotonic timestamp of the most recent pulse [µs]. Zero = never pulsed.
    last_pulse_us: AtomicU64,
    /// Interval between the two most recent pulses [µs]. Zero = unknown.
    period_us: AtomicU32,
}

impl PulseChannel {
    pub const fn new() -> Self {
        Self {
            last_pulse_us: AtomicU64::new(0),
            period_us: AtomicU32::new(0),
        }
    }

    /// Record a pulse edge. Interrupt-context safe; single writer.
    pub fn record_pulse(&self, now_us: u64) {
        let prev = self.last_pulse_us.load(Ordering::Relaxed);
        if prev != 0 && now_us > prev {
            let period = (now_us - prev).min(u32::MAX as u64) as u32;
            self.period_us.store(period, Ordering::Relaxed);
        }
        self.last_pulse_us.store(now_us, Ordering::Release);
    }

    /// Pulse frequency [Hz], or 0.0 when the channel is stale or has
    /// not yet seen two pulses.
    pub fn frequency_hz(&self, now_us: u64, staleness_us: u64) -> f32 {
        let last = self.last_pulse_us.load(Ordering::Acquire);
        if last == 0 || now_us.saturating_sub(last) > staleness_us {
            return 0.0;
        }
        let period = self.period_us.load(Ordering::Relaxed);
        if period == 0 {
            return 0.0;
        }
        1_000_000.0 / period as f32
    }

    /// True when the newest pulse is older than the staleness bound.
    pub fn is_stale(&self, now_us: u64, staleness_us: u64) -> bool {
        let last = self.last_pulse_us.load(Ordering::Acquire);
        last == 0 || now_us.saturating_sub(last) > staleness_us
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
