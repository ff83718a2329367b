// src/distance.rs
//
// Perceptual distance between two HSV points. Hue dominates: saturation is
// halved and value divided by 16 before the comparison, and each squared
// channel delta is right-shifted 2 bits so the accumulated sum stays inside
// 16 bits. Deliberately lossy: this is a ranking metric, not Euclidean
// geometry.

use crate::types::ColorPoint;

/// Sum of per-channel squared deltas, each pre-shifted to cap its
/// contribution. Worst case 3 × (255² >> 2) = 48768, inside u16.
fn axis_distance(x1: u8, y1: u8, z1: u8, x2: u8, y2: u8, z2: u8) -> u16 {
    let x_sq = ((x2 as i32 - x1 as i32).pow(2) as u32) >> 2;
    let y_sq = ((y2 as i32 - y1 as i32).pow(2) as u32) >> 2;
    let z_sq = ((z2 as i32 - z1 as i32).pow(2) as u32) >> 2;
    (x_sq + y_sq + z_sq) as u16
}

/// Distance in HSV space, taking the hue wrap at the top of the circle into
/// account: measured both directly and with the smaller hue bridged across
/// the boundary, keeping whichever is shorter.
pub fn point_distance(p1: ColorPoint, p2: ColorPoint) -> u16 {
    let s1 = p1.sat >> 1;
    let s2 = p2.sat >> 1;
    let v1 = p1.val >> 4;
    let v2 = p2.val >> 4;

    let direct = axis_distance(p1.hue, s1, v1, p2.hue, s2, v2);
    let wrapped = if p1.hue < p2.hue {
        axis_distance(0, s1, v1, p1.hue + (255 - p2.hue), s2, v2)
    } else {
        axis_distance(0, s1, v1, p2.hue + (255 - p1.hue), s2, v2)
    };
    direct.min(wrapped)
}
