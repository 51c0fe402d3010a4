//! # TCU Control Unit Library
//!
//! Shift control core for a four-speed hydraulic-electronic automatic
//! transmission. A single 50 Hz run-to-completion tick reads the
//! conditioned sensor snapshot, selects the target gear from the
//! shift-point maps, advances the shift state machine with its timing
//! gates, computes accumulator and lockup solenoid duties, and learns
//! per-upshift firmness trims from measured shift durations.
//!
//! ## Tick pipeline
//!
//! 1. **Snapshot** — latest conditioned sensor values (no I/O here)
//! 2. **Selector** — shift maps + kickdown + overdrive inhibit + brake assist
//! 3. **Shift machine** — Stable → Requested → InProgress → Completing
//! 4. **Pressure** — accumulator duty (shift firmness)
//! 5. **Lockup** — torque-converter clutch envelope
//! 6. **Actuation** — solenoid writes at tick end
//!
//! All control state is owned by the cycle runner; diagnostics see a
//! snapshot published once per tick. The control path never panics and
//! never blocks; faults degrade (stale reads zero, limp holds third).

#![deny(clippy::disallowed_types)]

pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod diag;
pub mod safety;
pub mod selector;
pub mod shift;
pub mod state;
