//! `medulla-cli` – the `medulla` binary.
//!
//! Runs the simulated robot end to end at a fixed tick period:
//!
//! 1. Loads `~/.medulla/config.toml` (defaults when absent).
//! 2. Assembles the robot; any wiring error aborts startup.
//! 3. Runs the selected autonomous routine to completion.
//! 4. Plays a short scripted teleoperated sequence exercising the elevator
//!    setpoint bindings, manual driving, and the braking stance.
//! 5. Intercepts **Ctrl-C** to cancel every running command and exit safely.

mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use medulla_runtime::robot::{AXIS_DRIVE_X, DRIVETRAIN, ELEVATOR};
use medulla_runtime::Robot;
use medulla_types::{ControlFrame, Measurement};
use tracing::{error, info, warn};

fn main() {
    init_tracing();
    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – cancelling all commands …".yellow().bold()
        );
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; graceful shutdown unavailable");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let config = match config::load() {
        Ok(Some(config)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            config
        }
        Ok(None) => {
            println!("  No config file found; using defaults.");
            config::Config::default()
        }
        Err(e) => {
            eprintln!("{}: {e}", "Config error".red());
            std::process::exit(1);
        }
    };

    // ── Assembly ──────────────────────────────────────────────────────────
    // Wiring errors are fatal here, before the first tick ever runs.
    let mut robot = match Robot::assemble(&config.robot, config.dt()) {
        Ok(robot) => robot,
        Err(e) => {
            error!(error = %e, "robot assembly failed");
            eprintln!("{}: {e}", "Assembly error".red());
            std::process::exit(1);
        }
    };
    println!(
        "  Routines: {}",
        robot
            .selector()
            .labels()
            .collect::<Vec<_>>()
            .join(", ")
            .bold()
    );

    let period = Duration::from_millis(config.tick_period_ms);
    let sleeper = spin_sleep::SpinSleeper::default();

    // ── Autonomous ────────────────────────────────────────────────────────
    let started = match &config.autonomous {
        Some(label) => robot.start_autonomous(label),
        None => robot.start_default_autonomous(),
    };
    match started {
        Ok(activation) => {
            println!("{}", "▶ Autonomous".green().bold());
            let idle = ControlFrame::new();
            while robot.is_active(activation) && !shutdown.load(Ordering::SeqCst) {
                robot.tick(&idle);
                sleeper.sleep(period);
            }
            info!(pose_x = drivetrain_x(&robot), "autonomous complete");
            println!("  ended at x = {:.2}", drivetrain_x(&robot));
        }
        Err(e) => {
            eprintln!("{}: {e}", "Autonomous error".red());
        }
    }

    // ── Teleoperated script ───────────────────────────────────────────────
    if !shutdown.load(Ordering::SeqCst) {
        println!("{}", "▶ Teleoperated".green().bold());
        run_teleop_script(&mut robot, &shutdown, &sleeper, period);
        println!(
            "  elevator at {:.2}, drivetrain at x = {:.2}",
            elevator_position(&robot),
            drivetrain_x(&robot)
        );
    }

    // ── Shutdown ──────────────────────────────────────────────────────────
    robot.cancel_all();
    println!("{}", "  ✓ All commands cancelled.  Exiting Medulla.".green());
}

/// Scripted operator input: raise the elevator to shelf 1, drive forward,
/// lock the stance, then go idle.
fn run_teleop_script(
    robot: &mut Robot,
    shutdown: &AtomicBool,
    sleeper: &spin_sleep::SpinSleeper,
    period: Duration,
) {
    let phases: Vec<(&str, ControlFrame, u32)> = vec![
        ("settle", ControlFrame::new(), 25),
        ("elevator to shelf 1", ControlFrame::new().with_button("a", true), 1),
        ("elevator settling", ControlFrame::new(), 150),
        (
            "drive forward",
            ControlFrame::new().with_axis(AXIS_DRIVE_X, 1.0),
            100,
        ),
        ("stance lock", ControlFrame::new().with_button("lock", true), 25),
        ("idle", ControlFrame::new(), 25),
    ];

    for (label, frame, ticks) in phases {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        info!(phase = label, ticks, "teleop phase");
        for _ in 0..ticks {
            if shutdown.load(Ordering::SeqCst) {
                return;
            }
            robot.tick(&frame);
            sleeper.sleep(period);
        }
    }
}

fn drivetrain_x(robot: &Robot) -> f32 {
    match robot.io().sense(&DRIVETRAIN.into()) {
        Some(Measurement::Planar { pose, .. }) => pose.x,
        _ => 0.0,
    }
}

fn elevator_position(robot: &Robot) -> f32 {
    match robot.io().sense(&ELEVATOR.into()) {
        Some(Measurement::Linear { position, .. }) => position,
        _ => 0.0,
    }
}

/// Initialise tracing-subscriber using RUST_LOG (defaults to "info").
/// Set MEDULLA_LOG_FORMAT=json to emit newline-delimited JSON logs suitable
/// for log aggregators.  User-facing output still uses println! for UX
/// consistency.
fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("MEDULLA_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }
}

fn print_banner() {
    println!("{}", "────────────────────────────────────────".dimmed());
    println!(
        "  {}  tick-driven control arbitration",
        "MEDULLA".bold()
    );
    println!("{}", "────────────────────────────────────────".dimmed());
}
