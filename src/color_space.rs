// src/color_space.rs
//
// RGBC → HSV conversion tuned for the 4-channel photo sensor:
//   - value comes straight from the clear channel, NOT from max(R,G,B),
//     so a dark-but-saturated patch keeps a truthful brightness reading;
//   - everything stays in 8-bit space with wide intermediates.

use crate::types::{ColorPoint, RawSample};

/// Convert one raw sensor reading into the HSV space the classifier works in.
///
/// Degenerate inputs collapse deterministically: a clear channel of 0 is pure
/// black (hue = sat = 0), equal R/G/B is greyscale (hue = 0).
pub fn rgb_to_hsv(sample: RawSample) -> ColorPoint {
    let rgb_min = sample.r.min(sample.g).min(sample.b);
    let rgb_max = sample.r.max(sample.g).max(sample.b);

    let val = sample.clear;
    if val == 0 {
        return ColorPoint::new(0, 0, 0);
    }

    // Saturation is the channel spread as a fraction of how far the value
    // sits from either end of the brightness range. The numerator reaches
    // 255×255, so compute in i32 and clamp on the way back down. The
    // denominator degenerates to 0 at full brightness; clamp there too.
    let spread = (rgb_max - rgb_min) as i32;
    let denom = 255 - (2 * val as i32 - 255).abs();
    let sat = if denom <= 0 {
        if spread > 0 {
            255
        } else {
            0
        }
    } else {
        ((255 * spread + denom / 2) / denom).min(255) as u8
    };
    if sat == 0 {
        return ColorPoint::new(0, sat, val);
    }

    // Hue: whichever channel dominates anchors a third of the circle
    // (0 / 85 / 171), offset by the signed spread of the other two. The
    // u8 cast wraps negative red-side hues across the circle, which is how
    // blue-tinted reds land near 250.
    let r = sample.r as i32;
    let g = sample.g as i32;
    let b = sample.b as i32;
    let hue = if rgb_max == sample.r {
        43 * (g - b) / spread
    } else if rgb_max == sample.g {
        85 + 43 * (b - r) / spread
    } else {
        171 + 43 * (r - g) / spread
    };

    ColorPoint::new(hue as u8, sat, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(r: u8, g: u8, b: u8, clear: u8) -> RawSample {
        RawSample { r, g, b, clear }
    }

    #[test]
    fn test_black_collapses_to_origin() {
        let point = rgb_to_hsv(sample(80, 120, 40, 0));
        assert_eq!(point, ColorPoint::new(0, 0, 0));
    }

    #[test]
    fn test_greyscale_has_no_hue_or_saturation() {
        for level in [1u8, 60, 128, 200, 255] {
            let point = rgb_to_hsv(sample(level, level, level, 140));
            assert_eq!(point.sat, 0);
            assert_eq!(point.hue, 0);
            assert_eq!(point.val, 140);
        }
    }

    #[test]
    fn test_value_is_the_clear_channel() {
        let point = rgb_to_hsv(sample(200, 10, 10, 77));
        assert_eq!(point.val, 77);
    }

    #[test]
    fn test_green_dominant_lands_in_the_middle_third() {
        // G max, B > R pushes the hue past the 85 anchor.
        let point = rgb_to_hsv(sample(42, 120, 69, 100));
        assert_eq!(point.hue, 99); // 85 + 43*(69-42)/78
    }

    #[test]
    fn test_red_with_blue_tint_wraps_below_zero() {
        // R max with G < B gives a negative offset that wraps near 255.
        let point = rgb_to_hsv(sample(150, 56, 69, 80));
        assert_eq!(point.hue, 251); // 43*(56-69)/94 = -5 → wraps
        assert_eq!(point.sat, 150); // round(255*94/160)
    }

    #[test]
    fn test_full_brightness_clamps_instead_of_dividing_by_zero() {
        let point = rgb_to_hsv(sample(200, 50, 50, 255));
        assert_eq!(point.val, 255);
        assert_eq!(point.sat, 255);
    }
}
