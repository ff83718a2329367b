// src/classifier.rs
//
// Maps one HSV sample plus the frozen calibration to a discrete class.
// Three mechanisms stack, in priority order:
//   1. a brightness-proximity fallback (floor tiers, no marker),
//   2. a nearest-reference scan gated on the calibrated minima,
//   3. an unconditional Blue override; blue card stock reads too dark to
//      pass the saturation/value gate, so it gets its own tight radius.

use crate::calibration::CalibrationState;
use crate::distance::point_distance;
use crate::types::{ColorClass, ColorPoint};

/// A non-blue reference must be nearer than this to claim the sample.
const MARKER_ACCEPT_RADIUS: u16 = 300;
/// Much tighter radius for the Blue override.
const BLUE_ACCEPT_RADIUS: u16 = 100;
/// Margins above the calibrated floor reading that split the three tiers.
const LOW_TIER_MARGIN: u32 = 100;
const HIGH_TIER_MARGIN: u32 = 500;
/// Low-saturation samples brighter than this are the white goal card.
const WHITE_VALUE_FLOOR: u8 = 105;

/// Squared saturation/value magnitude, halved precision per channel.
fn brightness_proximity(sat: u8, val: u8) -> u32 {
    ((sat as u32 * sat as u32) >> 2) + ((val as u32 * val as u32) >> 2)
}

/// Classify a single converted sample. Pure: calibration is read-only and
/// no smoothing happens here, that is the voter's job.
pub fn classify(point: ColorPoint, calibration: &CalibrationState) -> ColorClass {
    let floor = brightness_proximity(calibration.min_saturation, calibration.min_value);
    let proximity = brightness_proximity(point.sat, point.val);

    // Fallback tier when no marker claims the sample.
    let mut class = if proximity < floor + LOW_TIER_MARGIN {
        ColorClass::None
    } else if proximity < floor + HIGH_TIER_MARGIN {
        ColorClass::Low
    } else {
        ColorClass::High
    };

    if point.val > calibration.min_value {
        if point.sat > calibration.min_saturation {
            // Running-minimum scan over the seven non-blue references: the
            // globally nearest one wins whenever it is inside the acceptance
            // radius. Keep the strict running minimum: later references
            // may only displace an earlier winner by being nearer.
            let mut min_dist = u16::MAX;
            for (candidate, reference) in calibration.references() {
                if candidate == ColorClass::Blue {
                    continue;
                }
                let dist = point_distance(reference, point);
                if dist < min_dist {
                    min_dist = dist;
                    if min_dist < MARKER_ACCEPT_RADIUS {
                        class = candidate;
                    }
                }
            }
        } else if point.val > WHITE_VALUE_FLOOR {
            // Bright but grey: the white goal card.
            class = ColorClass::White;
        }
    }

    // Blue wins over every other outcome, including samples the
    // saturation/value gate rejected.
    if point_distance(calibration.blue_reference(), point) < BLUE_ACCEPT_RADIUS {
        class = ColorClass::Blue;
    }

    class
}
