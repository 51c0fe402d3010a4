//! Shared test rig: a cycle runner wired to a manual sensor provider,
//! a capturing actuator backend, and a stepped clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use tcu::config::TcuConfig;
use tcu::interfaces::{Clock, TcuCommand};
use tcu::snapshot::SensorSnapshot;
use tcu_control_unit::cycle::CycleRunner;
use tcu_control_unit::diag::DiagPublisher;
use tcu_control_unit::state::TransmissionState;
use tcu_hal::actuator::{SimBackend, SimOutputs, SolenoidActuator};
use tcu_hal::provider::ManualProvider;

/// Control tick period used by every scenario [ms].
pub const TICK_MS: u64 = 20;

/// Stepped test clock shared between the rig and the runner.
#[derive(Clone, Default)]
pub struct TestClock(Arc<AtomicU64>);

impl TestClock {
    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Full-pipeline test rig.
pub struct TestRig {
    pub clock: TestClock,
    pub provider: ManualProvider,
    pub backend: SimBackend,
    pub diag: Arc<DiagPublisher>,
    pub commands: Sender<TcuCommand>,
    runner: CycleRunner<ManualProvider, SolenoidActuator<SimBackend>, TestClock>,
}

impl TestRig {
    /// Rig with production calibration, warm fluid, overdrive on.
    pub fn new() -> Self {
        Self::with_config(TcuConfig::default())
    }

    pub fn with_config(config: TcuConfig) -> Self {
        let clock = TestClock::default();
        let provider = ManualProvider::new(SensorSnapshot {
            fluid_temp_c: 80.0,
            ..Default::default()
        });
        let backend = SimBackend::new();
        let diag = Arc::new(DiagPublisher::new());
        let (commands, rx) = mpsc::channel();
        let runner = CycleRunner::new(
            config,
            provider.clone(),
            SolenoidActuator::new(backend.clone()),
            clock.clone(),
            Arc::clone(&diag),
            Some(rx),
        );
        Self {
            clock,
            provider,
            backend,
            diag,
            commands,
            runner,
        }
    }

    /// Advance one tick period and run the cycle body once.
    pub fn tick(&mut self) {
        self.clock.advance(TICK_MS);
        self.runner.tick();
    }

    /// Run whole tick periods covering `ms` milliseconds.
    pub fn run_ms(&mut self, ms: u64) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Current core state.
    pub fn state(&self) -> &TransmissionState {
        self.runner.state()
    }

    /// Captured actuator outputs.
    pub fn outputs(&self) -> SimOutputs {
        self.backend.outputs()
    }

    /// Mutate the served sensor snapshot.
    pub fn set(&self, f: impl FnOnce(&mut SensorSnapshot)) {
        self.provider.update(f);
    }

    /// Send a bench command; it applies on the next tick.
    pub fn send(&self, cmd: TcuCommand) {
        self.commands.send(cmd).expect("command channel closed");
    }
}
