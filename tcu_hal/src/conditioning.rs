//! Signal conditioning primitives.
//!
//! Exponential moving average for throttle and speed smoothing, and the
//! ADC voltage to fluid temperature conversion. A zero smoothing factor
//! disables the filter (passthrough).

/// First-order exponential moving average.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    /// Smoothing factor in (0, 1]; 0 disables the filter.
    alpha: f32,
    /// Previous output. `None` until the first sample seeds the filter.
    state: Option<f32>,
}

impl Ema {
    pub const fn new(alpha: f32) -> Self {
        Self { alpha, state: None }
    }

    /// Apply one sample.
    ///
    /// The first sample seeds the filter directly so cold starts do not
    /// ramp up from zero.
    pub fn apply(&mut self, input: f32) -> f32 {
        if self.alpha <= 0.0 {
            return input;
        }
        let out = match self.state {
            None => input,
            Some(prev) => prev + self.alpha * (input - prev),
        };
        self.state = Some(out);
        out
    }

    /// Reset filter state.
    #[inline]
    pub fn reset(&mut self) {
        self.state = None;
    }
}

/// Convert the fluid temperature sender voltage to °C.
///
/// The sender is a linear 10 mV/°C device offset to 0.5 V at 0 °C.
#[inline]
pub fn adc_to_celsius(volts: f32) -> f32 {
    (volts - 0.5) * 100.0
}

// ─── Tests ──────────────────────────────────────────────────────────
