//! Shared timing and staleness constants.

/// Nominal control tick period [ms] (50 Hz).
pub const TICK_PERIOD_MS: u64 = 20;

/// Pulse period older than this reads as zero for vehicle speed and
/// output shaft channels [µs].
pub const SPEED_STALENESS_US: u64 = 1_000_000;

/// Pulse period older than this reads as zero for the engine RPM
/// channel [µs].
pub const ENGINE_STALENESS_US: u64 = 500_000;

/// Fixed gear ratios of the planetary set, indexed by `gear - 1`.
pub const GEAR_RATIOS: [f32; 4] = [2.804, 1.531, 1.000, 0.705];
