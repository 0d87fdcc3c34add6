//! Typing heatmap
//!
//! Every increase in key pressure adds heat around the key with a linear
//! falloff. Heat cools at a constant rate and is rendered through a
//! background, cool, hot gradient.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    analog::PressureField,
    color::{Rgb, three_stop},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::{KeyMap, KeyPosition},
    param::{ColorParam, ParameterSet, RangeParam},
};

const BACKGROUND_COLOR: Rgb = Rgb {
    r: 0x00,
    g: 0x0A,
    b: 0x72,
};
const COOL_COLOR: Rgb = Rgb {
    r: 0x7D,
    g: 0xFF,
    b: 0x00,
};
const HOT_COLOR: Rgb = Rgb {
    r: 0xFF,
    g: 0x00,
    b: 0x00,
};

#[derive(Debug)]
pub struct HeatmapEffect {
    keymap: Arc<KeyMap>,
    params: Arc<ParameterSet>,
    radius: RangeParam,
    decay_speed: RangeParam,
    sensitivity: RangeParam,
    background_color: ColorParam,
    cool_color: ColorParam,
    hot_color: ColorParam,
    /// Pressure seen on the previous tick, per held key
    last_pressures: PressureField,
    heat: Vec<f64>,
    size: GridSize,
    frame: ColorGrid,
}

impl HeatmapEffect {
    pub fn new(keymap: Arc<KeyMap>) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let radius = builder.range("radius", "Radius", 0.0, 5.0, 4.0);
        let decay_speed = builder.range("decaySpeed", "Decay Speed", 1.0, 200.0, 100.0);
        let sensitivity = builder.range("sensitivity", "Sensitivity", 1.0, 40.0, 20.0);
        let background_color =
            builder.color("backgroundColor", "Background Color", BACKGROUND_COLOR);
        let cool_color = builder.color("coolColor", "Cool Color", COOL_COLOR);
        let hot_color = builder.color("hotColor", "Hot Color", HOT_COLOR);
        Ok(Self {
            keymap,
            params: builder.build()?,
            radius,
            decay_speed,
            sensitivity,
            background_color,
            cool_color,
            hot_color,
            last_pressures: PressureField::new(),
            heat: Vec::new(),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Heat at a cell in `[0, 1]`, zero outside the grid
    pub fn heat(&self, row: usize, col: usize) -> f64 {
        if !self.size.contains(row, col) {
            return 0.0;
        }
        self.heat[row * self.size.cols + col]
    }

    /// Add `amount` at `center`, falling off linearly to zero at `radius`.
    ///
    /// A zero radius heats the center cell only. Heat saturates at 1.
    #[allow(clippy::cast_precision_loss)]
    fn apply_heat(&mut self, center: KeyPosition, amount: f64, radius: usize) {
        let GridSize { rows, cols } = self.size;
        let (center_row, center_col) = (center.row(), center.col());

        let row_span = center_row.saturating_sub(radius)..=(center_row + radius).min(rows - 1);
        for row in row_span {
            let col_span = center_col.saturating_sub(radius)..=(center_col + radius).min(cols - 1);
            for col in col_span {
                let falloff = if radius == 0 {
                    1.0
                } else {
                    let distance = libm::hypot(
                        row.abs_diff(center_row) as f64,
                        col.abs_diff(center_col) as f64,
                    );
                    if distance > radius as f64 {
                        continue;
                    }
                    1.0 - distance / radius as f64
                };
                let cell = &mut self.heat[row * cols + col];
                *cell = (*cell + amount * falloff).min(1.0);
            }
        }
    }
}

impl Effect for HeatmapEffect {
    fn name(&self) -> &str {
        EffectId::Heatmap.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Heatmap.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.heat = vec![0.0; size.cells()];
        self.last_pressures.clear();
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update(&mut self, input: &KeyboardState, _now: Instant) -> Result<()> {
        let radius = libm::round(self.params.range(self.radius)).max(0.0) as usize;
        let decay = self.params.range(self.decay_speed) / 100.0 * 0.01;
        let sensitivity = self.params.range(self.sensitivity) / 100.0;

        let pressed: Vec<(KeyPosition, f64)> = input
            .positions(&self.keymap, self.size)
            .map(|(position, pressure)| (position, f64::from(pressure)))
            .collect();
        for (position, pressure) in pressed {
            let last = self.last_pressures.get(position);
            if pressure > last {
                self.apply_heat(position, (pressure - last) * sensitivity, radius);
            }
            self.last_pressures.set(position, pressure);
        }
        self.last_pressures.forget_released(input, &self.keymap);

        for cell in &mut self.heat {
            *cell = (*cell - decay).max(0.0);
        }

        let background = self.params.color(self.background_color);
        let cool = self.params.color(self.cool_color);
        let hot = self.params.color(self.hot_color);
        let cols = self.size.cols;
        let heat = &self.heat;
        self.frame
            .paint(|row, col| three_stop(background, cool, hot, heat[row * cols + col]));
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.last_pressures.clear();
        self.heat.fill(0.0);
    }
}
