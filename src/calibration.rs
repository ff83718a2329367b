// src/calibration.rs
//
// Calibration happens exactly once, before navigation, and the result is
// frozen: the engine owns a CalibrationState for its whole life and never
// rewrites it. The interactive routines below mirror the on-robot flow:
// the operator holds colour cards under the sensor and latches each reading
// with the go button.

use crate::color_space::rgb_to_hsv;
use crate::hardware::{Button, ButtonInput, ColorSensor, Illumination, StatusDisplay, TimerService};
use crate::types::{ColorClass, ColorPoint, MARKER_COUNT};
use anyhow::{bail, Result};
use tracing::{debug, info, warn};

/// Offset added above the blank-floor reading so the bare maze never
/// registers as a colour.
const CLEAR_HEADROOM: u8 = 10;
/// Ceiling for the calibrated minima.
const CLEAR_CEILING: u8 = 250;
/// Dead-band on the channel balance before the illumination trim reacts.
const BALANCE_DEADBAND: i16 = 3;

/// Gain, segmentation minima and one reference point per marker class.
/// Immutable during navigation.
#[derive(Debug, Clone)]
pub struct CalibrationState {
    pub gain: u8,
    pub min_saturation: u8,
    pub min_value: u8,
    references: [ColorPoint; MARKER_COUNT],
}

impl CalibrationState {
    /// Validates that the reference table covers every marker class exactly
    /// once before anything downstream can trust indexed access.
    pub fn new(
        gain: u8,
        min_saturation: u8,
        min_value: u8,
        references: &[(ColorClass, ColorPoint)],
    ) -> Result<Self> {
        let mut table = [Option::<ColorPoint>::None; MARKER_COUNT];
        for (class, point) in references {
            let Some(slot) = class.marker_slot() else {
                bail!("{:?} is not a marker class", class);
            };
            if table[slot].is_some() {
                bail!("duplicate reference for {:?}", class);
            }
            table[slot] = Some(*point);
        }
        let mut filled = [ColorPoint::new(0, 0, 0); MARKER_COUNT];
        for (slot, entry) in table.iter().enumerate() {
            match entry {
                Some(point) => filled[slot] = *point,
                // Slot order matches ColorClass::MARKERS.
                None => bail!("missing reference for {:?}", ColorClass::MARKERS[slot]),
            }
        }
        Ok(Self {
            gain,
            min_saturation,
            min_value,
            references: filled,
        })
    }

    /// Factory-default centres measured on the reference course.
    pub fn default_references() -> [(ColorClass, ColorPoint); MARKER_COUNT] {
        [
            (ColorClass::White, ColorPoint::new(120, 60, 60)),
            (ColorClass::Red, ColorPoint::new(250, 150, 80)),
            (ColorClass::Pink, ColorPoint::new(245, 40, 100)),
            (ColorClass::Orange, ColorPoint::new(0, 100, 100)),
            (ColorClass::Green, ColorPoint::new(70, 100, 100)),
            (ColorClass::Yellow, ColorPoint::new(20, 80, 110)),
            (ColorClass::LightBlue, ColorPoint::new(130, 40, 100)),
            (ColorClass::Blue, ColorPoint::new(155, 110, 60)),
        ]
    }

    /// All references paired with their class, in scan order.
    pub fn references(&self) -> impl Iterator<Item = (ColorClass, ColorPoint)> + '_ {
        ColorClass::MARKERS
            .iter()
            .zip(self.references.iter())
            .map(|(class, point)| (*class, *point))
    }

    pub fn reference(&self, class: ColorClass) -> Option<ColorPoint> {
        class.marker_slot().map(|slot| self.references[slot])
    }

    pub fn blue_reference(&self) -> ColorPoint {
        self.references[MARKER_COUNT - 1]
    }

    fn set_reference(&mut self, class: ColorClass, point: ColorPoint) {
        if let Some(slot) = class.marker_slot() {
            self.references[slot] = point;
        }
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        // The default table covers every marker class exactly once.
        Self::new(5, 10, 10, &Self::default_references()).unwrap_or(Self {
            gain: 5,
            min_saturation: 10,
            min_value: 10,
            references: [ColorPoint::new(0, 0, 0); MARKER_COUNT],
        })
    }
}

/// Runs the full interactive calibration sequence and returns the frozen
/// state. Each stage loops until the operator releases it with the go
/// button; the function branch additionally re-captures every reference.
pub struct Calibrator<'a, S, T, B, X, L> {
    sensor: &'a mut S,
    timer: &'a mut T,
    buttons: &'a mut B,
    display: &'a mut X,
    illumination: &'a mut L,
    /// Illumination levels trimmed during the white stage.
    levels: (u8, u8, u8),
}

impl<'a, S, T, B, X, L> Calibrator<'a, S, T, B, X, L>
where
    S: ColorSensor,
    T: TimerService,
    B: ButtonInput,
    X: StatusDisplay,
    L: Illumination,
{
    pub fn new(
        sensor: &'a mut S,
        timer: &'a mut T,
        buttons: &'a mut B,
        display: &'a mut X,
        illumination: &'a mut L,
    ) -> Self {
        Self {
            sensor,
            timer,
            buttons,
            display,
            illumination,
            levels: (160, 100, 255),
        }
    }

    pub fn run(mut self, mut state: CalibrationState) -> Result<CalibrationState> {
        self.calibrate_gain_and_illumination(&mut state)?;
        self.calibrate_clear(&mut state)?;

        self.display.display("<- Skip         ", 0, 0);
        self.display.display("<- Calib. Colors", 1, 0);
        if self.wait_for_choice() == Button::Function {
            self.capture_references(&mut state)?;
        }

        info!(
            gain = state.gain,
            min_sat = state.min_saturation,
            min_val = state.min_value,
            "calibration frozen"
        );
        Ok(state)
    }

    /// Stage 1: raise the gain until no channel saturates, trim the red and
    /// green illumination toward the blue reading, and capture the White
    /// centre continuously while the operator holds the white card.
    fn calibrate_gain_and_illumination(&mut self, state: &mut CalibrationState) -> Result<()> {
        let (mut red, mut green, blue) = self.levels;
        while !self.buttons.read_button_edge(Button::Go) {
            let sample = self.sensor.read_color_sample(state.gain)?;
            let brightest = sample.r.max(sample.g).max(sample.b).max(sample.clear);
            if brightest >= 255 && state.gain < u8::MAX {
                state.gain += 1;
                debug!(gain = state.gain, "channel saturated, stepping gain");
            }

            let balance_r = sample.b as i16 - sample.r as i16;
            if balance_r > BALANCE_DEADBAND && red < 255 {
                red += 1;
            } else if balance_r < -BALANCE_DEADBAND && red > 0 {
                red -= 1;
            }
            let balance_g = sample.b as i16 - sample.g as i16;
            if balance_g > BALANCE_DEADBAND && green < 255 {
                green += 1;
            } else if balance_g < -BALANCE_DEADBAND && green > 0 {
                green -= 1;
            }
            self.illumination.set_levels(red, green, blue);

            state.set_reference(ColorClass::White, rgb_to_hsv(sample));
            self.display
                .display(&format!("WHITE   Gain: {}", state.gain), 0, 0);
            self.display
                .display(&format!("RGB: {:03} {:03} {:03}", red, green, blue), 1, 0);
        }
        self.levels = (red, green, blue);
        Ok(())
    }

    /// Stage 2: read the blank floor and set the segmentation minima a
    /// little above it.
    fn calibrate_clear(&mut self, state: &mut CalibrationState) -> Result<()> {
        while !self.buttons.read_button_edge(Button::Go) {
            let point = rgb_to_hsv(self.sensor.read_color_sample(state.gain)?);
            state.min_value = headroom(point.val);
            state.min_saturation = headroom(point.sat);

            self.display.display("CLEAR Calibrat.", 0, 0);
            self.display.display(
                &format!("Min S: {:02} V: {:02}", state.min_saturation, state.min_value),
                1,
                0,
            );
        }
        Ok(())
    }

    /// Stage 3: latch one centre per remaining marker class.
    fn capture_references(&mut self, state: &mut CalibrationState) -> Result<()> {
        for class in ColorClass::MARKERS.iter().skip(1) {
            let mut latest = None;
            while !self.buttons.read_button_edge(Button::Go) {
                let point = rgb_to_hsv(self.sensor.read_color_sample(state.gain)?);
                latest = Some(point);
                self.display
                    .display(&format!("Centre {}", class.label()), 0, 0);
                self.display.display(
                    &format!("HSV: {:03} {:03} {:03}", point.hue, point.sat, point.val),
                    1,
                    0,
                );
            }
            match latest {
                Some(point) => state.set_reference(*class, point),
                None => warn!(class = class.label(), "no reading latched, keeping default"),
            }
        }
        Ok(())
    }

    fn wait_for_choice(&mut self) -> Button {
        loop {
            if self.buttons.read_button_edge(Button::Go) {
                return Button::Go;
            }
            if self.buttons.read_button_edge(Button::Function) {
                return Button::Function;
            }
            // Poll-rate limiter; real buttons bounce for a few ticks.
            let _ = self.timer.elapsed_ticks();
        }
    }
}

fn headroom(reading: u8) -> u8 {
    if reading < CLEAR_CEILING - CLEAR_HEADROOM {
        reading + CLEAR_HEADROOM
    } else {
        CLEAR_CEILING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_covers_every_marker() {
        let state = CalibrationState::default();
        for class in ColorClass::MARKERS {
            assert!(state.reference(class).is_some());
        }
        assert_eq!(state.blue_reference(), ColorPoint::new(155, 110, 60));
    }

    #[test]
    fn test_construction_rejects_a_duplicate_reference() {
        let mut refs = CalibrationState::default_references().to_vec();
        refs[2].0 = ColorClass::Red;
        assert!(CalibrationState::new(5, 10, 10, &refs).is_err());
    }

    #[test]
    fn test_construction_rejects_a_missing_reference() {
        let all = CalibrationState::default_references();
        assert!(CalibrationState::new(5, 10, 10, &all[..7]).is_err());
    }

    #[test]
    fn test_construction_rejects_a_tier_class() {
        let mut refs = CalibrationState::default_references().to_vec();
        refs[0].0 = ColorClass::Low;
        assert!(CalibrationState::new(5, 10, 10, &refs).is_err());
    }

    #[test]
    fn test_headroom_clamps_near_the_ceiling() {
        assert_eq!(headroom(30), 40);
        assert_eq!(headroom(239), 249);
        assert_eq!(headroom(240), 250);
        assert_eq!(headroom(255), 250);
    }
}
