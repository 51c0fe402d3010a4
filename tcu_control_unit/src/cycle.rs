//! Deterministic control cycle: read → process → write.
//!
//! The runner owns every piece of mutable control state and executes
//! the 50 Hz tick body: sensor snapshot, operator commands, limp
//! supervision, gear selection, shift state machine, pressure and
//! lockup duties, actuation, diagnostic publish. The tick is
//! run-to-completion; nothing in it blocks or allocates.
//!
//! ## RT Setup Sequence (`rt` feature)
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` — lock all pages.
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` — pin to an isolated CPU core.
//! 4. `sched_setscheduler(SCHED_FIFO)` — RT priority.
//!
//! The RT loop paces itself with `clock_nanosleep(TIMER_ABSTIME)` on
//! `CLOCK_MONOTONIC` for drift-free cycles and treats an overrun as
//! fatal. The simulation loop sleeps the remainder of the period and
//! only logs overruns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{debug, info, warn};

use tcu::config::TcuConfig;
use tcu::interfaces::{Actuator, Clock, SensorProvider, TcuCommand};
use tcu::state::{Gear, LimpCause};

use crate::control::adaptive::AdaptiveLearner;
use crate::control::{lockup, pressure, slip};
use crate::diag::{DiagPublisher, ShiftHistory, ShiftRecord, TcuSnapshot, TcuStats};
use crate::safety::LimpMonitor;
use crate::selector;
use crate::selector::kickdown::KickdownDetector;
use crate::shift::{ShiftOutcome, ShiftStateMachine, ShiftTiming};
use crate::state::TransmissionState;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
///
/// Updated every cycle with no allocation; feeds the diagnostic view
/// and overrun detection.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        if duration_ns < self.min_cycle_ns {
            self.min_cycle_ns = duration_ns;
        }
        if duration_ns > self.max_cycle_ns {
            self.max_cycle_ns = duration_ns;
        }
        self.sum_cycle_ns += duration_ns;
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug)]
pub enum CycleError {
    /// RT system call failed.
    RtSetup(String),
    /// Cycle overrun detected under the RT scheduler.
    CycleOverrun {
        /// Actual cycle duration [ns].
        actual_ns: i64,
        /// Configured cycle budget [ns].
        budget_ns: i64,
    },
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "RT setup error: {msg}"),
            Self::CycleOverrun {
                actual_ns,
                budget_ns,
            } => write!(f, "cycle overrun: {actual_ns}ns > {budget_ns}ns budget"),
        }
    }
}

impl std::error::Error for CycleError {}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Lock all current and future memory pages.
///
/// No-op when the `rt` feature is not enabled.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{mlockall, MlockAllFlags};
    mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(()) // No-op in simulation mode
}

/// Prefault stack pages to prevent page faults during RT execution.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

/// Pin the current thread to a specific CPU core.
#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

/// Set SCHED_FIFO with the given RT priority.
#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Perform the full RT setup sequence.
///
/// In simulation mode (no `rt` feature), all RT calls are no-ops.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// The deterministic control cycle runner.
///
/// Owns all control state and the component instances; `tick()` runs
/// one control cycle, `run()` enters the paced loop.
pub struct CycleRunner<S, A, C>
where
    S: SensorProvider,
    A: Actuator,
    C: Clock,
{
    config: TcuConfig,
    provider: S,
    actuator: A,
    clock: C,
    state: TransmissionState,
    detector: KickdownDetector,
    machine: ShiftStateMachine,
    learner: AdaptiveLearner,
    limp_monitor: LimpMonitor,
    history: ShiftHistory,
    commands: Option<Receiver<TcuCommand>>,
    diag: Arc<DiagPublisher>,
    stats: CycleStats,
    power_on_ms: Option<u64>,
    max_temp_c: f32,
}

impl<S, A, C> CycleRunner<S, A, C>
where
    S: SensorProvider,
    A: Actuator,
    C: Clock,
{
    pub fn new(
        config: TcuConfig,
        provider: S,
        actuator: A,
        clock: C,
        diag: Arc<DiagPublisher>,
        commands: Option<Receiver<TcuCommand>>,
    ) -> Self {
        let machine = ShiftStateMachine::new(ShiftTiming::from(&config.timing));
        let learner = AdaptiveLearner::new(config.adaptive.clone());
        let limp_monitor = LimpMonitor::new(config.limp.clone());
        Self {
            config,
            provider,
            actuator,
            clock,
            state: TransmissionState::default(),
            detector: KickdownDetector::new(),
            machine,
            learner,
            limp_monitor,
            history: ShiftHistory::new(),
            commands,
            diag,
            stats: CycleStats::new(),
            power_on_ms: None,
            max_temp_c: f32::MIN,
        }
    }

    /// Current control state (read-only).
    pub fn state(&self) -> &TransmissionState {
        &self.state
    }

    /// Cycle timing statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Execute one control cycle.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        let power_on = *self.power_on_ms.get_or_insert(now);

        // ═══ READ PHASE ═══
        let snap = self.provider.snapshot().sanitized();
        self.drain_commands(now);

        if !self.state.limp_mode {
            if let Some(cause) = self.limp_monitor.evaluate(&snap) {
                warn!(?cause, "limp mode latched");
                self.state.latch_limp(cause);
            }
        }

        // ═══ PROCESS PHASE ═══
        let selection = selector::select(
            self.state.current_gear,
            &snap,
            self.state.limp_mode,
            &mut self.detector,
            now,
        );

        match self.machine.advance(&mut self.state, &selection, now) {
            ShiftOutcome::Commit { from, to } => self.execute_shift(from, to, now),
            ShiftOutcome::Completed(done) => {
                if self.state.limp_mode {
                    debug!("shift completed in limp mode, no adaptive update");
                } else {
                    let result = self.learner.observe(&mut self.state, &done, snap.throttle_pct);
                    debug!(?done, ?result, "shift episode closed");
                }
            }
            ShiftOutcome::Reverted => {
                debug!("shift request evaporated during debounce");
            }
            ShiftOutcome::Idle => {}
        }

        let trim = self.state.trim_for(self.state.target_gear);
        let acc_duty = pressure::accumulator_duty(
            &self.config.pressure,
            self.state.shift_phase,
            self.state.kickdown_active,
            snap.throttle_pct,
            trim,
            snap.fluid_temp_c,
        );
        self.state.accumulator_duty_pct = acc_duty;

        let lockup_cmd = lockup::lockup_command(
            &self.config.lockup,
            self.state.current_gear,
            self.state.shift_phase,
            snap.speed_kmh,
            snap.throttle_pct,
            snap.fluid_temp_c,
        );
        if lockup_cmd.engaged != self.state.lockup_engaged {
            debug!(engaged = lockup_cmd.engaged, duty = lockup_cmd.duty_pct, "lockup");
        }
        self.state.lockup_engaged = lockup_cmd.engaged;
        self.state.lockup_duty_pct = lockup_cmd.duty_pct;

        // ═══ WRITE PHASE ═══
        self.actuator.set_accumulator_duty(acc_duty);
        self.actuator.set_lockup_duty(lockup_cmd.duty_pct);

        if snap.fluid_temp_c > self.max_temp_c {
            self.max_temp_c = snap.fluid_temp_c;
        }
        let stats = TcuStats {
            total_shifts: self.state.total_shifts,
            uptime_s: now.saturating_sub(power_on) / 1000,
            max_temp_c: self.max_temp_c,
            slip_pct: slip::slip_pct(self.state.current_gear, snap.engine_rpm, snap.output_rpm),
            overruns: self.stats.overruns,
        };
        self.diag
            .publish(TcuSnapshot::capture(&self.state, &snap, stats, &self.history));
    }

    /// Commit a gear change: the single solenoid write of an episode.
    fn execute_shift(&mut self, from: Gear, to: Gear, now: u64) {
        let (s1, s2) = to.solenoids();
        self.actuator.set_gear_solenoids(s1, s2);
        self.state.current_gear = to;
        self.state.total_shifts += 1;
        self.history.push(ShiftRecord {
            at_ms: now,
            from_gear: from,
            to_gear: to,
            kickdown: self.state.kickdown_active,
        });
        info!(?from, ?to, kickdown = self.state.kickdown_active, "gear shift");
    }

    /// Drain the bench command port. At most a handful per tick in
    /// practice; each applies immediately.
    fn drain_commands(&mut self, now: u64) {
        loop {
            let cmd = match &self.commands {
                Some(rx) => match rx.try_recv() {
                    Ok(cmd) => cmd,
                    Err(_) => break,
                },
                None => break,
            };
            match cmd {
                TcuCommand::ForceGear(gear) => {
                    self.machine.abort(&mut self.state);
                    let from = self.state.current_gear;
                    self.execute_shift(from, gear, now);
                    self.state.target_gear = gear;
                    self.state.last_shift_completed_ms = now;
                    info!(?gear, "gear forced by operator");
                }
                TcuCommand::ResetAdaptive => {
                    self.state.shift_quality_offset = [0; 3];
                    self.state.shift_count = [0; 3];
                    info!("adaptive trims reset");
                }
                TcuCommand::SetLimp(true) => {
                    warn!("limp mode latched by operator");
                    self.state.latch_limp(LimpCause::Operator);
                }
                TcuCommand::SetLimp(false) => {
                    info!("limp mode cleared by operator");
                    self.state.clear_limp();
                    self.limp_monitor.reset();
                }
            }
        }
    }

    /// Enter the paced control loop until `stop` is raised.
    ///
    /// With the `rt` feature this runs the absolute-time RT loop and
    /// treats an overrun as fatal; otherwise it runs the simulation
    /// loop with `std::thread::sleep`.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(stop)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(stop)
        }
    }

    /// RT cycle loop using `clock_nanosleep(TIMER_ABSTIME)`.
    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, stop: &AtomicBool) -> Result<(), CycleError> {
        use nix::time::{clock_gettime, clock_nanosleep, ClockId, ClockNanosleepFlags};

        rt_setup(self.config.rt.cpu_core, self.config.rt.rt_priority)?;

        let budget_ns = (self.config.timing.tick_period_ms * 1_000_000) as i64;
        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while !stop.load(Ordering::Relaxed) {
            next_wake = timespec_add_ns(next_wake, budget_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

            self.tick();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns);

            if duration_ns > budget_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    /// Simulation cycle loop using `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, stop: &AtomicBool) -> Result<(), CycleError> {
        use std::time::Instant;

        let budget_ns = (self.config.timing.tick_period_ms * 1_000_000) as i64;
        let cycle_duration = std::time::Duration::from_nanos(budget_ns as u64);

        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            self.tick();

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns);

            if duration_ns > budget_ns {
                // Overrun is fatal only under the RT scheduler.
                self.stats.overruns += 1;
                warn!(duration_ns, budget_ns, "cycle overrun");
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

/// Add nanoseconds to a TimeSpec.
#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// Compute the difference (a - b) in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
