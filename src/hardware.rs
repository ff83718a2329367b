// src/hardware.rs
//
// Contracts for the hardware collaborators. The core never touches a
// register or a memory address: channels are named, timing is injected, and
// every wait is a busy-poll against the timer trait. Real firmware binds
// these to the bus/PWM/ADC drivers; tests and the simulator bind fakes.

use crate::types::RawSample;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor bus stayed busy for the collaborator's whole retry budget
    /// (~500 polls). The sample is unusable; callers must retry or surface
    /// this, never read through it.
    #[error("colour sensor bus busy")]
    BusBusy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorDirection {
    Forward,
    Reverse,
}

/// Decay behaviour while the PWM signal is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrakeMode {
    SlowDecay,
    FastDecay,
}

/// Continuous actuation state for one drive channel. Power is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCommand {
    pub power: u8,
    pub direction: MotorDirection,
    pub brake: BrakeMode,
}

impl ChannelCommand {
    pub fn forward(power: u8) -> Self {
        Self {
            power: power.min(100),
            direction: MotorDirection::Forward,
            brake: BrakeMode::SlowDecay,
        }
    }

    pub fn reverse(power: u8) -> Self {
        Self {
            power: power.min(100),
            direction: MotorDirection::Reverse,
            brake: BrakeMode::SlowDecay,
        }
    }

    pub fn stop() -> Self {
        Self {
            power: 0,
            direction: MotorDirection::Forward,
            brake: BrakeMode::SlowDecay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Starts phases and latches calibration readings.
    Go,
    /// Selects the optional calibration branches.
    Function,
}

/// Blocking, bounded-time read of the 4-channel photo sensor.
pub trait ColorSensor {
    fn read_color_sample(&mut self, gain: u8) -> Result<RawSample, SensorError>;
}

/// Monotonic tick counter, advanced asynchronously, reset by the consumer.
/// Single writer (the interrupt), single reader (the control loop).
pub trait TimerService {
    fn elapsed_ticks(&self) -> u32;
    fn reset_ticks(&mut self);
}

/// Named-channel differential drive. Binding channels to hardware is the
/// implementor's concern.
pub trait DriveActuator {
    fn drive_differential(&mut self, left: ChannelCommand, right: ChannelCommand);
}

/// Polled digital inputs.
pub trait ButtonInput {
    fn read_button_edge(&mut self, button: Button) -> bool;
}

/// Best-effort status output; nothing in the core depends on it working.
pub trait StatusDisplay {
    fn display(&mut self, text: &str, row: u8, col: u8);
}

/// Sensor illumination LEDs (dimmed by an external interrupt) and the
/// main beam.
pub trait Illumination {
    fn set_levels(&mut self, r: u8, g: u8, b: u8);
    fn set_main_beam(&mut self, on: bool);
}

pub trait BatteryMonitor {
    fn battery_volts(&mut self) -> f32;
}
