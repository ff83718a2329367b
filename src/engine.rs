// src/engine.rs
//
// The forward-phase control loop: sense → convert → classify → vote →
// act → record, once per sensing cycle, until the white goal card stops the
// run. Every piece of run state lives here, owned by one engine value and
// threaded explicitly; there are no module-level globals.

use crate::calibration::CalibrationState;
use crate::classifier::classify;
use crate::color_space::rgb_to_hsv;
use crate::hardware::{ColorSensor, DriveActuator, SensorError, StatusDisplay, TimerService};
use crate::maneuver::{marker_maneuver, tier_power, Maneuver};
use crate::motion::MotionController;
use crate::replay::PathReplayer;
use crate::trace::{NavigationTrace, PathRecorder};
use crate::types::{ColorClass, DriveConfig, RawSample, SensorConfig};
use crate::voter::TemporalVoter;
use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub struct NavigationEngine<S, T, D, X> {
    sensor: S,
    display: X,
    motion: MotionController<T, D>,
    calibration: CalibrationState,
    sensor_config: SensorConfig,
    voter: TemporalVoter,
}

impl<S, T, D, X> NavigationEngine<S, T, D, X>
where
    S: ColorSensor,
    T: TimerService,
    D: DriveActuator,
    X: StatusDisplay,
{
    pub fn new(
        sensor: S,
        timer: T,
        drive: D,
        display: X,
        calibration: CalibrationState,
        sensor_config: SensorConfig,
        drive_config: DriveConfig,
    ) -> Self {
        Self {
            sensor,
            display,
            motion: MotionController::new(timer, drive, drive_config),
            calibration,
            sensor_config,
            voter: TemporalVoter::new(),
        }
    }

    /// Drive the maze marker by marker until the white goal card. Returns
    /// the recorded trace for the return journey.
    pub fn navigate_forward(&mut self) -> Result<NavigationTrace> {
        let mut recorder = PathRecorder::new();
        let mut previous: Option<ColorClass> = None;
        self.motion.reset_ticks();
        info!("forward phase started");

        loop {
            let stable = self.sense()?;
            let transition = previous != Some(stable);
            if transition {
                // Seal the departing tier segment with its full elapsed
                // time before the counter resets for the next one.
                if previous.is_some_and(|p| p.is_tier()) {
                    recorder.update_duration(self.motion.elapsed_ticks());
                }
                self.motion.reset_ticks();
                if stable != ColorClass::White {
                    recorder.begin_segment(stable);
                }
                if let Some(prev) = previous {
                    debug!(from = prev.label(), to = stable.label(), "stable class changed");
                }
            }

            match stable {
                ColorClass::White => {
                    self.motion.halt();
                    self.voter.reset();
                    info!(moves = recorder.len(), "goal marker reached");
                    break;
                }
                tier if tier.is_tier() => {
                    if let Some(power) = tier_power(tier) {
                        self.motion.forward(power);
                    }
                    recorder.update_duration(self.motion.elapsed_ticks());
                }
                marker => {
                    self.motion.halt();
                    self.voter.reset();
                    if let Some(maneuver) = marker_maneuver(marker) {
                        info!(marker = marker.label(), "marker maneuver");
                        self.execute_maneuver(maneuver);
                    }
                }
            }

            previous = Some(stable);
        }

        Ok(recorder.finish())
    }

    /// Walk the recorded trace backwards to the start. No sensing: the
    /// trace alone drives the maneuvers.
    pub fn navigate_return(&mut self, trace: NavigationTrace) {
        info!(moves = trace.len(), "return phase started");
        PathReplayer::new(&mut self.motion, &mut self.display).replay(trace);
        info!("returned to start");
    }

    /// One sensing cycle: bounded-retry read, conversion, classification,
    /// vote. Returns the debounced class.
    fn sense(&mut self) -> Result<ColorClass> {
        let sample = self.read_sample()?;
        let point = rgb_to_hsv(sample);
        let class = classify(point, &self.calibration);
        let stable = self.voter.observe(class);

        self.display.display(
            &format!("HSV {:03} {:03} {:03}", point.hue, point.sat, point.val),
            0,
            0,
        );
        self.display.display(stable.label(), 1, 0);
        Ok(stable)
    }

    /// The bus read may come back busy; retry a bounded number of times and
    /// then halt rather than act on a sample that never arrived.
    fn read_sample(&mut self) -> Result<RawSample> {
        let mut busy_reads = 0;
        loop {
            match self.sensor.read_color_sample(self.sensor_config.gain) {
                Ok(sample) => return Ok(sample),
                Err(SensorError::BusBusy) => {
                    busy_reads += 1;
                    if busy_reads > self.sensor_config.max_busy_retries {
                        self.motion.halt();
                        self.display.display("I2C Busy...     ", 0, 0);
                        return Err(SensorError::BusBusy)
                            .context("colour sensor unavailable, halting");
                    }
                    warn!(attempt = busy_reads, "sensor bus busy, retrying");
                }
            }
        }
    }

    /// Back off the marker card, settle, then turn on the spot.
    fn execute_maneuver(&mut self, maneuver: Maneuver) {
        if maneuver.pre_reverse_units > 0.0 {
            self.motion.reverse_units(maneuver.pre_reverse_units);
            self.motion.settle();
        }
        self.motion.turn(maneuver.turn);
    }

    pub fn motion(&self) -> &MotionController<T, D> {
        &self.motion
    }
}
