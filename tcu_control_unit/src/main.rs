//! # TCU Control Unit
//!
//! Runs the 50 Hz shift control loop on a dedicated thread and hosts
//! the thin bench adapters around it: a stdin command console, a
//! periodic diagnostic dump, and an optional synthetic drive profile.
//!
//! The control thread owns every piece of control state; this binary
//! only feeds inputs and reads published snapshots.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::interval;
use tracing::{error, info, warn};

use tcu::config::TcuConfig;
use tcu_control_unit::command::parse_console_line;
use tcu_control_unit::config::load_config;
use tcu_control_unit::cycle::CycleRunner;
use tcu_control_unit::diag::DiagPublisher;
use tcu_hal::actuator::{SimBackend, SolenoidActuator};
use tcu_hal::clock::MonotonicClock;
use tcu_hal::provider::ManualProvider;

#[derive(Parser, Debug)]
#[command(name = "tcu", about = "Shift control unit for a four-speed automatic transmission")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Drive a synthetic accelerate-cruise-brake profile instead of
    /// waiting for bench inputs.
    #[arg(long)]
    demo: bool,

    /// Diagnostic dump interval [s] (0 disables).
    #[arg(long, default_value_t = 5)]
    diag_interval_s: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                error!("FATAL: {e}");
                process::exit(1);
            }
        },
        None => TcuConfig::default(),
    };
    info!(
        tick_ms = config.timing.tick_period_ms,
        inhibit_ms = config.timing.shift_inhibit_ms,
        "starting TCU control loop"
    );

    let provider = ManualProvider::default();
    provider.update(|s| s.fluid_temp_c = 20.0);
    let backend = SimBackend::new();
    let diag = Arc::new(DiagPublisher::new());
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));

    let control_thread = {
        let provider = provider.clone();
        let backend = backend.clone();
        let diag = Arc::clone(&diag);
        let stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("tcu-cycle".into())
            .spawn(move || {
                let mut runner = CycleRunner::new(
                    config,
                    provider,
                    SolenoidActuator::new(backend),
                    MonotonicClock::new(),
                    diag,
                    Some(cmd_rx),
                );
                if let Err(e) = runner.run(&stop) {
                    error!("control loop terminated: {e}");
                }
            })
            .expect("failed to spawn control thread")
    };

    if args.demo {
        tokio::spawn(run_demo_profile(provider.clone()));
    }

    // Bench console: `gear <n>`, `reset`, `limp on|off`.
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_console_line(&line) {
                Ok(cmd) => {
                    if cmd_tx.send(cmd).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
    });

    if args.diag_interval_s > 0 {
        let diag = Arc::clone(&diag);
        let period = Duration::from_secs(args.diag_interval_s);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let snapshot = diag.read();
                match serde_json::to_string(&snapshot) {
                    Ok(json) => info!("diag {json}"),
                    Err(e) => warn!("diag serialization failed: {e}"),
                }
            }
        });
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!("failed to listen for shutdown signal: {e}"),
    }

    stop.store(true, Ordering::Relaxed);
    if control_thread.join().is_err() {
        error!("control thread panicked");
    }
    info!("TCU stopped");
}

/// Synthetic drive profile: pull away, cruise at highway speed, then
/// brake to a stop, on repeat. Enough to watch the box walk through
/// the gears and the lockup engage.
async fn run_demo_profile(provider: ManualProvider) {
    const STEP_MS: u64 = 50;
    let mut ticker = interval(Duration::from_millis(STEP_MS));
    let mut speed: f32 = 0.0;
    let mut warmup: f32 = 20.0;
    let mut elapsed_ms: u64 = 0;

    loop {
        // Fluid warms toward operating temperature.
        warmup = (warmup + 0.02).min(85.0);

        // One minute loop: accelerate 25 s, cruise 20 s, brake 15 s.
        let phase_ms = elapsed_ms % 60_000;
        elapsed_ms += STEP_MS;
        let (throttle, brake) = if phase_ms < 25_000 {
            (45.0, false)
        } else if phase_ms < 45_000 {
            (18.0, false)
        } else {
            (0.0, true)
        };

        // Crude longitudinal model, enough for the shift maps.
        let accel_kmh_s = if brake {
            -12.0
        } else {
            (throttle / 100.0) * 9.0 - 0.02 * speed * 0.1
        };
        speed = (speed + accel_kmh_s * STEP_MS as f32 / 1000.0).clamp(0.0, 180.0);

        let engine_rpm = 900.0 + speed * 28.0;
        let output_rpm = speed * 22.0;

        provider.update(|s| {
            s.throttle_pct = throttle;
            s.brake_pressed = brake;
            s.speed_kmh = speed;
            s.engine_rpm = engine_rpm;
            s.output_rpm = output_rpm;
            s.fluid_temp_c = warmup;
        });

        ticker.tick().await;
    }
}
