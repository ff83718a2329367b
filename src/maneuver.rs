// src/maneuver.rs
//
// The fixed vocabulary of things the buggy can do: three forward power
// tiers keyed on floor proximity, and one compound maneuver per marker
// colour (short reverse pulse, then a spot turn). The replayer uses the
// same table mirrored.

use crate::types::ColorClass;

const BASE_SPEED: u8 = 6;
/// Closest proximity tier → slowest approach.
pub const LOW_POWER: u8 = 3 * BASE_SPEED;
pub const MED_POWER: u8 = 7 * BASE_SPEED / 2;
pub const HIGH_POWER: u8 = 4 * BASE_SPEED;
/// Power used for spot turns and unit pulses.
pub const TURN_POWER: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    pub fn mirrored(self) -> TurnDirection {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub direction: TurnDirection,
    pub degrees: u16,
}

impl Turn {
    pub const fn left(degrees: u16) -> Turn {
        Turn {
            direction: TurnDirection::Left,
            degrees,
        }
    }

    pub const fn right(degrees: u16) -> Turn {
        Turn {
            direction: TurnDirection::Right,
            degrees,
        }
    }
}

/// What a marker makes the buggy do during the forward phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maneuver {
    /// Travel units to back up before turning (clears the marker card).
    pub pre_reverse_units: f32,
    pub turn: Turn,
}

impl Maneuver {
    /// The return-phase counterpart: same angle, opposite direction.
    pub fn mirrored(self) -> Maneuver {
        Maneuver {
            pre_reverse_units: self.pre_reverse_units,
            turn: Turn {
                direction: self.turn.direction.mirrored(),
                degrees: self.turn.degrees,
            },
        }
    }
}

/// Forward power for a proximity tier; markers have no tier power.
pub fn tier_power(class: ColorClass) -> Option<u8> {
    match class {
        ColorClass::None => Some(HIGH_POWER),
        ColorClass::Low => Some(MED_POWER),
        ColorClass::High => Some(LOW_POWER),
        _ => None,
    }
}

/// The maneuver a marker colour commands. White terminates the run instead
/// of maneuvering, so it has no entry.
pub fn marker_maneuver(class: ColorClass) -> Option<Maneuver> {
    let maneuver = match class {
        ColorClass::Red => Maneuver {
            pre_reverse_units: 0.5,
            turn: Turn::right(90),
        },
        ColorClass::Green => Maneuver {
            pre_reverse_units: 0.5,
            turn: Turn::left(90),
        },
        ColorClass::Blue => Maneuver {
            pre_reverse_units: 0.5,
            turn: Turn::right(180),
        },
        ColorClass::Yellow => Maneuver {
            pre_reverse_units: 1.5,
            turn: Turn::right(90),
        },
        ColorClass::Pink => Maneuver {
            pre_reverse_units: 1.5,
            turn: Turn::left(90),
        },
        ColorClass::Orange => Maneuver {
            pre_reverse_units: 0.5,
            turn: Turn::right(135),
        },
        ColorClass::LightBlue => Maneuver {
            pre_reverse_units: 0.5,
            turn: Turn::left(135),
        },
        _ => return None,
    };
    Some(maneuver)
}

/// Extra forward pulse after the mirrored turn on the way home. The compound
/// reverse-then-turn recorded for Pink and Yellow leaves the buggy a square
/// and a half short; the other markers retrace cleanly.
pub fn return_forward_units(class: ColorClass) -> f32 {
    match class {
        ColorClass::Pink | ColorClass::Yellow => 1.5,
        _ => 0.0,
    }
}
