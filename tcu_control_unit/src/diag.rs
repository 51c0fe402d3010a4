//! Diagnostic view of the control core.
//!
//! The cycle runner publishes one [`TcuSnapshot`] at the end of every
//! tick; external consumers (HTTP, console) read whole snapshots and
//! never see a half-updated tick. The shift history is a fixed-capacity
//! ring so the control loop stays allocation-free.

use std::sync::RwLock;

use serde::Serialize;

use tcu::error::SensorFault;
use tcu::snapshot::SensorSnapshot;
use tcu::state::{Gear, LimpCause, ShiftPhase};

use crate::state::TransmissionState;

/// How many recent shifts the diagnostic history keeps.
pub const SHIFT_HISTORY_LEN: usize = 16;

/// One committed gear change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftRecord {
    /// Commit timestamp [ms since power-on].
    pub at_ms: u64,
    pub from_gear: Gear,
    pub to_gear: Gear,
    /// Kickdown demand at the moment of the commit.
    pub kickdown: bool,
}

/// Fixed-capacity shift history ring.
#[derive(Debug, Clone, Default)]
pub struct ShiftHistory {
    ring: heapless::Vec<ShiftRecord, SHIFT_HISTORY_LEN>,
}

impl ShiftHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, dropping the oldest when full.
    pub fn push(&mut self, record: ShiftRecord) {
        if self.ring.is_full() {
            self.ring.remove(0);
        }
        // Cannot fail: a slot was just freed if the ring was full.
        let _ = self.ring.push(record);
    }

    /// Records, oldest first.
    pub fn records(&self) -> &[ShiftRecord] {
        &self.ring
    }
}

/// Aggregate statistics for the diagnostic surface.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TcuStats {
    /// Solenoid commits since power-on.
    pub total_shifts: u32,
    /// Seconds since power-on.
    pub uptime_s: u64,
    /// Highest fluid temperature seen [°C].
    pub max_temp_c: f32,
    /// Converter slip estimate for the engaged gear [%].
    pub slip_pct: f32,
    /// Control cycle overruns.
    pub overruns: u64,
}

/// Read-only view of the core, published once per tick.
#[derive(Debug, Clone, Serialize)]
pub struct TcuSnapshot {
    pub current_gear: Gear,
    pub target_gear: Gear,
    pub shift_phase: ShiftPhase,
    pub kickdown_active: bool,
    pub lockup_engaged: bool,
    pub lockup_duty_pct: u8,
    pub accumulator_duty_pct: u8,
    pub shift_quality_offset: [i16; 3],
    pub shift_count: [u32; 3],
    pub limp_mode: bool,
    pub limp_cause: Option<LimpCause>,
    pub sensor_faults: SensorFault,
    pub sensors: SensorSnapshot,
    pub stats: TcuStats,
    pub recent_shifts: heapless::Vec<ShiftRecord, SHIFT_HISTORY_LEN>,
}

impl TcuSnapshot {
    /// Assemble a snapshot from the core's state at tick end.
    pub fn capture(
        state: &TransmissionState,
        sensors: &SensorSnapshot,
        stats: TcuStats,
        history: &ShiftHistory,
    ) -> Self {
        Self {
            current_gear: state.current_gear,
            target_gear: state.target_gear,
            shift_phase: state.shift_phase,
            kickdown_active: state.kickdown_active,
            lockup_engaged: state.lockup_engaged,
            lockup_duty_pct: state.lockup_duty_pct,
            accumulator_duty_pct: state.accumulator_duty_pct,
            shift_quality_offset: state.shift_quality_offset,
            shift_count: state.shift_count,
            limp_mode: state.limp_mode,
            limp_cause: state.limp_cause,
            sensor_faults: sensors.faults,
            sensors: *sensors,
            stats,
            recent_shifts: history.ring.clone(),
        }
    }
}

impl Default for TcuSnapshot {
    fn default() -> Self {
        Self::capture(
            &TransmissionState::default(),
            &SensorSnapshot::default(),
            TcuStats::default(),
            &ShiftHistory::new(),
        )
    }
}

/// Publisher for the per-tick snapshot.
///
/// The writer holds the lock only for the copy; readers clone out and
/// never block the control thread for longer than that.
#[derive(Debug, Default)]
pub struct DiagPublisher {
    latest: RwLock<TcuSnapshot>,
}

impl DiagPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish this tick's snapshot.
    pub fn publish(&self, snapshot: TcuSnapshot) {
        *self.latest.write().expect("diag lock poisoned") = snapshot;
    }

    /// Latest published snapshot.
    pub fn read(&self) -> TcuSnapshot {
        self.latest.read().expect("diag lock poisoned").clone()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
