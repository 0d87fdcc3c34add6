//! Pressure bars
//!
//! Bars run along the row and/or column of every pressed key. By default
//! they grow from the grid edges toward the key as it is pressed deeper;
//! inverted, they grow outward from the key. Released keys fade.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    analog::PressureField,
    color::{Rgb, lerp_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::KeyMap,
    param::{BoolParam, ChoiceParam, ColorParam, ParameterSet, RangeParam},
};

const BAR_COLOR: Rgb = Rgb {
    r: 0x28,
    g: 0xFF,
    b: 0x00,
};
const BACKGROUND_COLOR: Rgb = Rgb {
    r: 0x03,
    g: 0x14,
    b: 0x00,
};

const DIRECTIONS: &[&str] = &["Vertical", "Horizontal", "Both"];

/// Highest stored pressure after sensitivity is applied
const MAX_PRESSURE: f64 = 2.0;

/// Axes along which bars are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarDirection {
    Vertical,
    Horizontal,
    Both,
}

impl BarDirection {
    const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Vertical,
            1 => Self::Horizontal,
            _ => Self::Both,
        }
    }
}

#[derive(Debug)]
pub struct PressureBarsEffect {
    keymap: Arc<KeyMap>,
    params: Arc<ParameterSet>,
    bar_color: ColorParam,
    background_color: ColorParam,
    direction: ChoiceParam,
    inverted: BoolParam,
    fade_speed: RangeParam,
    sensitivity: RangeParam,
    pressures: PressureField,
    size: GridSize,
    frame: ColorGrid,
}

impl PressureBarsEffect {
    pub fn new(keymap: Arc<KeyMap>) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let bar_color = builder.color("barColor", "Bar Color", BAR_COLOR);
        let background_color =
            builder.color("backgroundColor", "Background Color", BACKGROUND_COLOR);
        let direction = builder.choice("direction", "Direction", DIRECTIONS, "Both");
        let inverted = builder.flag("inverted", "Inverted", false);
        let fade_speed = builder.range("fadeSpeed", "Fade Speed", 1.0, 100.0, 30.0);
        let sensitivity = builder.range("sensitivity", "Sensitivity", 1.0, 200.0, 100.0);
        Ok(Self {
            keymap,
            params: builder.build()?,
            bar_color,
            background_color,
            direction,
            inverted,
            fade_speed,
            sensitivity,
            pressures: PressureField::new(),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    pub fn bar_direction(&self) -> BarDirection {
        BarDirection::from_index(self.params.choice(self.direction))
    }

    /// Stored pressure per key position
    pub fn pressures(&self) -> &PressureField {
        &self.pressures
    }

    fn cell_intensity(
        &self,
        row: usize,
        col: usize,
        direction: BarDirection,
        inverted: bool,
    ) -> f64 {
        let axis = if inverted {
            outward_intensity
        } else {
            inward_intensity
        };
        let GridSize { rows, cols } = self.size;

        self.pressures
            .iter()
            .map(|(key, pressure)| {
                let vertical = || {
                    if col == key.col() {
                        axis(row, key.row(), rows, pressure)
                    } else {
                        0.0
                    }
                };
                let horizontal = || {
                    if row == key.row() {
                        axis(col, key.col(), cols, pressure)
                    } else {
                        0.0
                    }
                };
                match direction {
                    BarDirection::Vertical => vertical(),
                    BarDirection::Horizontal => horizontal(),
                    BarDirection::Both => vertical().max(horizontal()),
                }
            })
            .fold(0.0, f64::max)
    }
}

/// Intensity of cell `index` on a line of `len` cells for a bar growing from
/// both edges toward the key at `key`.
///
/// On each side the bar reaches `pressure` times the distance from the edge
/// to the key, inclusive. The edge cell is brightest and intensity falls off
/// linearly toward the key.
#[allow(clippy::cast_precision_loss)]
fn inward_intensity(index: usize, key: usize, len: usize, pressure: f64) -> f64 {
    if len == 0 {
        return pressure;
    }
    // Cells counted from the nearer edge, the edge cell being 1
    let (distance, span) = if index <= key {
        (index + 1, key + 1)
    } else {
        (len - index, len - key)
    };
    let reach = pressure * span as f64;
    if reach <= 0.0 || distance as f64 > reach {
        return 0.0;
    }
    (1.0 - (distance - 1) as f64 / reach).clamp(0.0, 1.0)
}

/// Intensity of cell `index` for a bar growing outward from the key.
#[allow(clippy::cast_precision_loss)]
fn outward_intensity(index: usize, key: usize, len: usize, pressure: f64) -> f64 {
    let max_distance = key.max(len.saturating_sub(key));
    if max_distance == 0 {
        return pressure;
    }
    let normalized = index.abs_diff(key) as f64 / max_distance as f64;
    if pressure <= 0.0 || normalized > pressure {
        return 0.0;
    }
    (1.0 - normalized / pressure).clamp(0.0, 1.0)
}

impl Effect for PressureBarsEffect {
    fn name(&self) -> &str {
        EffectId::PressureBars.as_str()
    }

    fn description(&self) -> &str {
        EffectId::PressureBars.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.pressures.clear();
        Ok(())
    }

    fn update(&mut self, input: &KeyboardState, _now: Instant) -> Result<()> {
        let gain = self.params.range(self.sensitivity) / 100.0;
        let fade = self.params.range(self.fade_speed) / 100.0 * 0.05;
        let bar = self.params.color(self.bar_color);
        let background = self.params.color(self.background_color);
        let direction = self.bar_direction();
        let inverted = self.params.flag(self.inverted);

        self.pressures
            .track_pressed(input, &self.keymap, self.size, gain, MAX_PRESSURE);
        self.pressures.fade_released(input, &self.keymap, fade);

        let mut frame = core::mem::take(&mut self.frame);
        frame.paint(|row, col| {
            let intensity = self.cell_intensity(row, col, direction, inverted).min(1.0);
            if intensity > 0.0 {
                lerp_color(background, bar, intensity)
            } else {
                background
            }
        });
        self.frame = frame;
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.pressures.clear();
    }
}

