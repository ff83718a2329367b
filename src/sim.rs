// src/sim.rs
//
// Simulated collaborators. The binary drives a whole forward-and-return
// cycle against these, and the unit tests use them as deterministic fakes:
// the clock advances a fixed step per poll, the sensor plays back a
// scripted course, and the drive records every command it is given.

use crate::hardware::{
    BatteryMonitor, Button, ButtonInput, ChannelCommand, ColorSensor, DriveActuator, Illumination,
    SensorError, StatusDisplay, TimerService,
};
use crate::types::{CourseSegment, RawSample};
use std::cell::Cell;
use tracing::debug;

/// Deterministic tick source: every poll advances the counter by a fixed
/// step, standing in for the interrupt that drives the real counter.
pub struct SimClock {
    ticks: Cell<u32>,
    total: Cell<u32>,
    step: u32,
}

impl SimClock {
    pub fn new(step: u32) -> Self {
        Self {
            ticks: Cell::new(0),
            total: Cell::new(0),
            step,
        }
    }

    /// Cumulative ticks across resets: how long the run took overall.
    pub fn total_ticks(&self) -> u32 {
        self.total.get()
    }
}

impl TimerService for SimClock {
    fn elapsed_ticks(&self) -> u32 {
        let next = self.ticks.get() + self.step;
        self.ticks.set(next);
        self.total.set(self.total.get() + self.step);
        next
    }

    fn reset_ticks(&mut self) {
        self.ticks.set(0);
    }
}

/// Plays back a scripted course segment by segment; the final segment
/// repeats forever so the goal card stays under the sensor.
pub struct ScriptedSensor {
    script: Vec<(RawSample, u32)>,
    index: usize,
    remaining: u32,
}

impl ScriptedSensor {
    pub fn new(script: Vec<(RawSample, u32)>) -> Self {
        let remaining = script.first().map(|(_, cycles)| *cycles).unwrap_or(0);
        Self {
            script,
            index: 0,
            remaining,
        }
    }

    pub fn from_course(course: &[CourseSegment]) -> Self {
        Self::new(
            course
                .iter()
                .map(|seg| {
                    (
                        RawSample {
                            r: seg.r,
                            g: seg.g,
                            b: seg.b,
                            clear: seg.clear,
                        },
                        seg.cycles,
                    )
                })
                .collect(),
        )
    }
}

impl ColorSensor for ScriptedSensor {
    fn read_color_sample(&mut self, _gain: u8) -> Result<RawSample, SensorError> {
        let Some(&(sample, _)) = self.script.get(self.index) else {
            // Empty script: a dark, empty floor.
            return Ok(RawSample {
                r: 0,
                g: 0,
                b: 0,
                clear: 0,
            });
        };
        if self.remaining > 1 {
            self.remaining -= 1;
        } else if self.index + 1 < self.script.len() {
            self.index += 1;
            self.remaining = self.script[self.index].1;
        }
        Ok(sample)
    }
}

/// Records every differential command, logging transitions as they happen.
pub struct RecordingDrive {
    commands: Vec<(ChannelCommand, ChannelCommand)>,
}

impl RecordingDrive {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[(ChannelCommand, ChannelCommand)] {
        &self.commands
    }

    pub fn last(&self) -> Option<(ChannelCommand, ChannelCommand)> {
        self.commands.last().copied()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DriveActuator for RecordingDrive {
    fn drive_differential(&mut self, left: ChannelCommand, right: ChannelCommand) {
        if self.commands.last() != Some(&(left, right)) {
            debug!(?left, ?right, "drive command");
        }
        self.commands.push((left, right));
    }
}

/// Reports a go-button edge every `interval` polls and never a function edge,
/// enough to walk the calibration stages without an operator.
pub struct SimButtons {
    interval: u32,
    countdown: u32,
}

impl SimButtons {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            countdown: interval,
        }
    }
}

impl ButtonInput for SimButtons {
    fn read_button_edge(&mut self, button: Button) -> bool {
        match button {
            Button::Go => {
                if self.countdown == 0 {
                    self.countdown = self.interval;
                    true
                } else {
                    self.countdown -= 1;
                    false
                }
            }
            Button::Function => false,
        }
    }
}

/// Routes display rows to the log.
pub struct TracingDisplay;

impl StatusDisplay for TracingDisplay {
    fn display(&mut self, text: &str, row: u8, col: u8) {
        debug!(row, col, "{}", text.trim_end());
    }
}

/// Remembers the most recent illumination state.
pub struct SimIllumination {
    pub levels: (u8, u8, u8),
    pub main_beam: bool,
}

impl SimIllumination {
    pub fn new() -> Self {
        Self {
            levels: (160, 100, 255),
            main_beam: false,
        }
    }
}

impl Illumination for SimIllumination {
    fn set_levels(&mut self, r: u8, g: u8, b: u8) {
        self.levels = (r, g, b);
    }

    fn set_main_beam(&mut self, on: bool) {
        self.main_beam = on;
        debug!(on, "main beam");
    }
}

pub struct SimBattery {
    pub volts: f32,
}

impl BatteryMonitor for SimBattery {
    fn battery_volts(&mut self) -> f32 {
        self.volts
    }
}
