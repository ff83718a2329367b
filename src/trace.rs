// src/trace.rs
//
// The compact record of the forward run: one Move per stable-class
// transition. Tier moves carry how long the buggy drove; marker moves are
// instantaneous events. Capacity is fixed; a run that out-grows it keeps
// overwriting the final slot instead of failing mid-maze.

use crate::types::ColorClass;
use serde::Serialize;

/// Fixed capacity of the recorded trace.
pub const TRACE_CAPACITY: usize = 80;

/// One recorded segment: a proximity tier driven for `duration` ticks, or a
/// marker maneuver (duration 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub class: ColorClass,
    pub duration: u32,
}

/// Builds the trace during the forward phase. Appends are edge-triggered:
/// the engine opens a segment on every stable-class transition and keeps the
/// open segment's duration current while driving.
pub struct PathRecorder {
    moves: Vec<Move>,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(TRACE_CAPACITY),
        }
    }

    /// Open a new segment. Past capacity the final slot is overwritten:
    /// silent truncation, never growth or an error.
    pub fn begin_segment(&mut self, class: ColorClass) {
        let mv = Move { class, duration: 0 };
        if self.moves.len() < TRACE_CAPACITY {
            self.moves.push(mv);
        } else if let Some(last) = self.moves.last_mut() {
            *last = mv;
        }
    }

    /// Refresh the open segment's elapsed duration.
    pub fn update_duration(&mut self, ticks: u32) {
        if let Some(last) = self.moves.last_mut() {
            last.duration = ticks;
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Seal the recording. The recorder is gone after this; the trace is
    /// consumed exactly once by the replayer.
    pub fn finish(self) -> NavigationTrace {
        NavigationTrace { moves: self.moves }
    }
}

/// The sealed forward-run record, walked in reverse by the replayer.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationTrace {
    moves: Vec<Move>,
}

impl NavigationTrace {
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_append_in_order() {
        let mut recorder = PathRecorder::new();
        recorder.begin_segment(ColorClass::None);
        recorder.update_duration(120);
        recorder.begin_segment(ColorClass::Red);
        recorder.begin_segment(ColorClass::Low);
        recorder.update_duration(40);

        let trace = recorder.finish();
        assert_eq!(
            trace.moves(),
            &[
                Move {
                    class: ColorClass::None,
                    duration: 120
                },
                Move {
                    class: ColorClass::Red,
                    duration: 0
                },
                Move {
                    class: ColorClass::Low,
                    duration: 40
                },
            ]
        );
    }

    #[test]
    fn test_update_before_any_segment_is_a_no_op() {
        let mut recorder = PathRecorder::new();
        recorder.update_duration(999);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_capacity_saturates_on_the_final_slot() {
        let mut recorder = PathRecorder::new();
        // 81 distinct transitions into an 80-slot trace.
        for i in 0..81u32 {
            let class = if i % 2 == 0 {
                ColorClass::None
            } else {
                ColorClass::Low
            };
            recorder.begin_segment(class);
            recorder.update_duration(i);
        }
        assert_eq!(recorder.len(), TRACE_CAPACITY);
        // The 80th slot holds the newest transition (index 80 → None).
        assert_eq!(
            recorder.moves().last(),
            Some(&Move {
                class: ColorClass::None,
                duration: 80
            })
        );
    }

    #[test]
    fn test_duration_updates_only_touch_the_open_segment() {
        let mut recorder = PathRecorder::new();
        recorder.begin_segment(ColorClass::High);
        recorder.update_duration(10);
        recorder.begin_segment(ColorClass::Green);
        recorder.update_duration(0);
        assert_eq!(recorder.moves()[0].duration, 10);
        assert_eq!(recorder.moves()[1].duration, 0);
    }
}
