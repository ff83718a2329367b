// src/replay.rs
//
// The return journey. No sensing happens here: the recorded trace alone
// drives the maneuvers, walked from the last move back to the first. Tier
// segments replay as timed reverse drives; marker maneuvers replay
// mirrored.

use crate::hardware::{DriveActuator, StatusDisplay, TimerService};
use crate::maneuver::{marker_maneuver, return_forward_units, tier_power};
use crate::motion::MotionController;
use crate::trace::NavigationTrace;
use crate::types::ColorClass;
use tracing::{debug, warn};

pub struct PathReplayer<'a, T, D, X> {
    motion: &'a mut MotionController<T, D>,
    display: &'a mut X,
}

impl<'a, T, D, X> PathReplayer<'a, T, D, X>
where
    T: TimerService,
    D: DriveActuator,
    X: StatusDisplay,
{
    pub fn new(motion: &'a mut MotionController<T, D>, display: &'a mut X) -> Self {
        Self { motion, display }
    }

    /// Consume the trace, newest move first, inverting each one.
    pub fn replay(mut self, trace: NavigationTrace) {
        for (index, mv) in trace.moves().iter().enumerate().rev() {
            self.display.display(&format!("Action #: {}", index), 0, 0);

            match mv.class {
                tier if tier.is_tier() => {
                    if let Some(power) = tier_power(tier) {
                        debug!(
                            class = tier.label(),
                            duration = mv.duration,
                            "retracing segment in reverse"
                        );
                        self.display.display(&format!("Time: {:05}", mv.duration), 1, 0);
                        self.motion.reverse(power);
                        self.motion.wait_ticks(mv.duration);
                        self.motion.halt();
                    }
                }
                ColorClass::White => {
                    // The goal card is never recorded mid-trace; ignore it
                    // if a stale slot carries one.
                    warn!(index, "white move in trace, skipping");
                }
                marker => {
                    if let Some(maneuver) = marker_maneuver(marker) {
                        let mirrored = maneuver.mirrored();
                        debug!(marker = marker.label(), turn = ?mirrored.turn, "mirrored maneuver");
                        self.motion.turn(mirrored.turn);

                        // Pink and Yellow backed up a square and a half
                        // before their forward-phase turn; make the distance
                        // up again now that the turn is undone.
                        let compensation = return_forward_units(marker);
                        if compensation > 0.0 {
                            self.motion.settle();
                            self.motion.forward_units(compensation);
                        }
                    }
                }
            }
        }
        self.motion.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MotorDirection;
    use crate::maneuver::{MED_POWER, TURN_POWER};
    use crate::sim::{RecordingDrive, SimClock, TracingDisplay};
    use crate::trace::PathRecorder;
    use crate::types::DriveConfig;

    fn run_replay(
        build: impl FnOnce(&mut PathRecorder),
    ) -> Vec<(crate::hardware::ChannelCommand, crate::hardware::ChannelCommand)> {
        let mut recorder = PathRecorder::new();
        build(&mut recorder);
        let mut motion = MotionController::new(
            SimClock::new(1),
            RecordingDrive::new(),
            DriveConfig::default(),
        );
        let mut display = TracingDisplay;
        PathReplayer::new(&mut motion, &mut display).replay(recorder.finish());
        motion.drive().commands().to_vec()
    }

    #[test]
    fn test_yellow_replays_as_left_turn_then_forward_unit() {
        let commands = run_replay(|rec| rec.begin_segment(ColorClass::Yellow));

        // Mirrored right-90 → left turn: left channel reverse, right forward.
        let (left, right) = commands[0];
        assert_eq!(left.direction, MotorDirection::Reverse);
        assert_eq!(right.direction, MotorDirection::Forward);
        assert_eq!(right.power, TURN_POWER);

        // Then one forward-unit pulse.
        let forward = commands
            .iter()
            .skip(1)
            .find(|(l, r)| l.power > 0 && r.power > 0)
            .expect("compensation pulse missing");
        assert_eq!(forward.0.direction, MotorDirection::Forward);
        assert_eq!(forward.1.direction, MotorDirection::Forward);
    }

    #[test]
    fn test_red_replays_as_plain_left_turn() {
        let commands = run_replay(|rec| rec.begin_segment(ColorClass::Red));

        let (left, right) = commands[0];
        assert_eq!(left.direction, MotorDirection::Reverse);
        assert_eq!(right.direction, MotorDirection::Forward);
        // No compensation pulse: turn, halt, final halt; nothing drives
        // both channels forward.
        assert!(!commands
            .iter()
            .any(|(l, r)| l.direction == MotorDirection::Forward
                && r.direction == MotorDirection::Forward
                && l.power > 0
                && r.power > 0));
    }

    #[test]
    fn test_moves_replay_newest_first() {
        // Forward run: drive (Low tier), then a blue marker. Coming home the
        // blue mirror runs before the reverse drive.
        let commands = run_replay(|rec| {
            rec.begin_segment(ColorClass::Low);
            rec.update_duration(50);
            rec.begin_segment(ColorClass::Blue);
        });

        // First command is the mirrored 180 (left turn pattern is
        // right-mirrored → left): Blue forward-turns right, so the replay
        // turns left.
        let (left, right) = commands[0];
        assert_eq!(left.direction, MotorDirection::Reverse);
        assert_eq!(right.direction, MotorDirection::Forward);

        // Later, the tier segment reverses at its recorded power.
        let reverse = commands
            .iter()
            .find(|(l, r)| {
                l.direction == MotorDirection::Reverse && r.direction == MotorDirection::Reverse
            })
            .expect("reverse retrace missing");
        assert_eq!(reverse.1.power, MED_POWER);
    }

    #[test]
    fn test_white_mid_trace_is_ignored() {
        let commands = run_replay(|rec| rec.begin_segment(ColorClass::White));
        // Only the final defensive halt.
        assert!(commands.iter().all(|(l, r)| l.power == 0 && r.power == 0));
    }
}
