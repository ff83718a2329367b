// src/main.rs

mod calibration;
mod classifier;
mod color_space;
mod config;
mod distance;
mod engine;
mod hardware;
mod maneuver;
mod motion;
mod replay;
mod sim;
mod trace;
mod types;
mod voter;

use anyhow::{Context, Result};
use calibration::{CalibrationState, Calibrator};
use engine::NavigationEngine;
use hardware::{BatteryMonitor, Illumination};
use sim::{
    RecordingDrive, ScriptedSensor, SimBattery, SimButtons, SimClock, SimIllumination,
    TracingDisplay,
};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Below this the pack cannot deliver peak motor current reliably.
const MIN_BATTERY_VOLTS: f32 = 3.75;

fn main() -> Result<()> {
    let config = types::Config::load("config.yaml").context("loading config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("maze_nav={}", config.logging.level))),
        )
        .init();

    info!("🤖 Maze navigation core starting");
    if config.course.is_empty() {
        anyhow::bail!("config.yaml defines no course segments to simulate");
    }
    info!(
        "Drive timing: left90={} right90={} unit={} ticks",
        config.drive.left_turn_time_90, config.drive.right_turn_time_90, config.drive.unit_time_ticks
    );

    // Simulated hardware bound to the scripted course.
    let mut sensor = ScriptedSensor::from_course(&config.course);
    let mut clock = SimClock::new(1);
    let mut buttons = SimButtons::new(4);
    let mut display = TracingDisplay;
    let mut illumination = SimIllumination::new();
    let mut battery = SimBattery { volts: 4.1 };

    let volts = battery.battery_volts();
    if volts < MIN_BATTERY_VOLTS {
        warn!("⚠️  LOW BATT: {:.2} V, navigation may stall mid-maze", volts);
    } else {
        info!("Battery: {:.2} V", volts);
    }

    // One calibration pass before navigation; the state is frozen from here.
    let calibrator = Calibrator::new(
        &mut sensor,
        &mut clock,
        &mut buttons,
        &mut display,
        &mut illumination,
    );
    let calibration = calibrator
        .run(CalibrationState::default())
        .context("calibration phase failed")?;
    info!("✓ Calibration complete");

    illumination.set_main_beam(true);

    let mut engine = NavigationEngine::new(
        sensor,
        clock,
        RecordingDrive::new(),
        display,
        calibration,
        config.sensor.clone(),
        config.drive.clone(),
    );

    let trace = engine.navigate_forward().context("forward phase failed")?;
    info!("✓ Forward phase complete: {} recorded move(s)", trace.len());

    save_trace(&trace, &config.output.trace_path)?;

    engine.navigate_return(trace);
    info!("✓ Returned to start");

    let report = engine.motion();
    info!("\n📊 Final Report:");
    info!("  Drive commands issued: {}", report.drive().commands().len());
    info!("  Total ticks consumed: {}", report.timer().total_ticks());

    Ok(())
}

fn save_trace(trace: &trace::NavigationTrace, path: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating trace file {path}"))?;
    for mv in trace.moves() {
        let json_line = serde_json::to_string(mv)?;
        writeln!(file, "{}", json_line)?;
    }
    file.flush()?;
    info!("💾 Trace saved to {}", path);
    Ok(())
}
