// src/motion.rs
//
// Timed drive primitives shared by the forward engine and the replayer.
// Continuous drives set actuation state and return immediately; pulses and
// turns busy-poll the injected timer for their whole duration and end in a
// halt. Nothing here reads the sensor or makes decisions.

use crate::hardware::{ChannelCommand, DriveActuator, TimerService};
use crate::maneuver::{Turn, TurnDirection, TURN_POWER};
use crate::types::DriveConfig;
use tracing::debug;

pub struct MotionController<T, D> {
    timer: T,
    drive: D,
    config: DriveConfig,
}

impl<T: TimerService, D: DriveActuator> MotionController<T, D> {
    pub fn new(timer: T, drive: D, config: DriveConfig) -> Self {
        Self {
            timer,
            drive,
            config,
        }
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.timer.elapsed_ticks()
    }

    pub fn reset_ticks(&mut self) {
        self.timer.reset_ticks();
    }

    /// Continuous straight drive. The left gearbox is slower, so its power
    /// carries the configured trim.
    pub fn forward(&mut self, power: u8) {
        let left = self.trimmed(power);
        self.drive
            .drive_differential(ChannelCommand::forward(left), ChannelCommand::forward(power));
    }

    pub fn reverse(&mut self, power: u8) {
        let left = self.trimmed(power);
        self.drive
            .drive_differential(ChannelCommand::reverse(left), ChannelCommand::reverse(power));
    }

    pub fn halt(&mut self) {
        self.drive
            .drive_differential(ChannelCommand::stop(), ChannelCommand::stop());
    }

    /// Spot turn: counter-rotate the channels for the calibrated time.
    /// Turn times are per-direction; the chassis does not turn evenly.
    pub fn turn(&mut self, turn: Turn) {
        let per_90 = match turn.direction {
            TurnDirection::Left => self.config.left_turn_time_90,
            TurnDirection::Right => self.config.right_turn_time_90,
        };
        let duration = per_90 * turn.degrees as u32 / 90;
        debug!(?turn, duration, "spot turn");

        let (left, right) = match turn.direction {
            TurnDirection::Left => (
                ChannelCommand::reverse(TURN_POWER),
                ChannelCommand::forward(TURN_POWER),
            ),
            TurnDirection::Right => (
                ChannelCommand::forward(TURN_POWER),
                ChannelCommand::reverse(TURN_POWER),
            ),
        };
        self.drive.drive_differential(left, right);
        self.wait_ticks(duration);
        self.halt();
    }

    /// Timed straight pulse measured in maze squares.
    pub fn forward_units(&mut self, units: f32) {
        let duration = (units * self.config.unit_time_ticks as f32) as u32;
        self.forward(TURN_POWER);
        self.wait_ticks(duration);
        self.halt();
    }

    pub fn reverse_units(&mut self, units: f32) {
        let duration = (units * self.config.unit_time_ticks as f32) as u32;
        self.reverse(TURN_POWER);
        self.wait_ticks(duration);
        self.halt();
    }

    pub fn settle(&mut self) {
        self.wait_ticks(self.config.settle_ticks);
    }

    /// Busy-poll the tick counter. The counter advances asynchronously;
    /// this loop is the only waiting mechanism the core uses.
    pub fn wait_ticks(&mut self, ticks: u32) {
        self.timer.reset_ticks();
        while self.timer.elapsed_ticks() < ticks {}
    }

    fn trimmed(&self, power: u8) -> u8 {
        ((power as f32 * self.config.left_trim) as u8).min(100)
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn drive_mut(&mut self) -> &mut D {
        &mut self.drive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MotorDirection;
    use crate::sim::{RecordingDrive, SimClock};

    fn controller() -> MotionController<SimClock, RecordingDrive> {
        MotionController::new(SimClock::new(1), RecordingDrive::new(), DriveConfig::default())
    }

    #[test]
    fn test_forward_applies_the_left_trim() {
        let mut motion = controller();
        motion.forward(24);
        let (left, right) = motion.drive.last().unwrap();
        assert_eq!(left.power, 26); // 24 × 1.1
        assert_eq!(right.power, 24);
        assert_eq!(left.direction, MotorDirection::Forward);
    }

    #[test]
    fn test_turn_counter_rotates_and_halts() {
        let mut motion = controller();
        motion.turn(Turn::left(90));
        let commands = motion.drive.commands();
        let (left, right) = commands[0];
        assert_eq!(left.direction, MotorDirection::Reverse);
        assert_eq!(right.direction, MotorDirection::Forward);
        assert_eq!(left.power, TURN_POWER);
        let (left, right) = *commands.last().unwrap();
        assert_eq!((left.power, right.power), (0, 0));
    }

    #[test]
    fn test_turn_duration_scales_with_the_angle() {
        let mut motion = controller();
        motion.turn(Turn::right(180));
        // 802 ticks per 90° → 1604, and the auto-advancing fake clock steps
        // one tick per poll, so the busy-wait accounts for every tick.
        assert_eq!(motion.timer.total_ticks(), 1604);
    }

    #[test]
    fn test_reverse_pulse_ends_halted() {
        let mut motion = controller();
        motion.reverse_units(0.5);
        let (left, right) = motion.drive.last().unwrap();
        assert_eq!((left.power, right.power), (0, 0));
        let (left, _) = motion.drive.commands()[0];
        assert_eq!(left.direction, MotorDirection::Reverse);
    }
}
