//! Flowing Perlin noise stirred by key presses
//!
//! A slice of 3D gradient noise drifts through time and is colored between
//! two colors. Pressed keys raise the field around them toward a third
//! color; the raise fades after release.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    analog::PressureField,
    color::{Rgb, sample_stops},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::KeyMap,
    noise::PerlinNoise,
    param::{ColorParam, ParameterSet, RangeParam},
};

const BLUE_VIOLET: Rgb = Rgb {
    r: 0x8A,
    g: 0x2B,
    b: 0xE2,
};
const GOLD: Rgb = Rgb {
    r: 0xFF,
    g: 0xC8,
    b: 0x00,
};
const GREEN: Rgb = Rgb {
    r: 0x00,
    g: 0xFF,
    b: 0x5C,
};

/// Share of the height range covered by the noise alone
const NOISE_SHARE: f64 = 0.66;
const DEPTH_FADE: f64 = 0.05;

#[derive(Debug)]
pub struct PerlinNoiseEffect {
    keymap: Arc<KeyMap>,
    params: Arc<ParameterSet>,
    color1: ColorParam,
    color2: ColorParam,
    press_color: ColorParam,
    speed: RangeParam,
    scale: RangeParam,
    press_depth: RangeParam,
    press_radius: RangeParam,
    noise: PerlinNoise,
    depths: PressureField,
    time: f64,
    size: GridSize,
    frame: ColorGrid,
}

impl PerlinNoiseEffect {
    pub fn new(keymap: Arc<KeyMap>, seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let color1 = builder.color("color1", "Noise Color 1", BLUE_VIOLET);
        let color2 = builder.color("color2", "Noise Color 2", GOLD);
        let press_color = builder.color("pressColor", "Press Color", GREEN);
        let speed = builder.range("speed", "Flow Speed", 1.0, 50.0, 25.0);
        let scale = builder.range("scale", "Noise Scale", 5.0, 100.0, 50.0);
        let press_depth = builder.range("pressDepth", "Press Depth", 10.0, 200.0, 200.0);
        let press_radius = builder.range("pressRadius", "Press Radius", 10.0, 150.0, 64.0);
        Ok(Self {
            keymap,
            params: builder.build()?,
            color1,
            color2,
            press_color,
            speed,
            scale,
            press_depth,
            press_radius,
            noise: PerlinNoise::new(seed),
            depths: PressureField::new(),
            time: 0.0,
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Strongest press influence reaching a cell
    #[allow(clippy::cast_precision_loss)]
    fn press_height(&self, row: usize, col: usize, radius: f64, depth: f64) -> f64 {
        self.depths
            .iter()
            .filter_map(|(key, pressure)| {
                let distance = libm::hypot(
                    row as f64 - key.row() as f64,
                    col as f64 - key.col() as f64,
                );
                (distance < radius).then(|| (1.0 - distance / radius) * pressure * depth)
            })
            .fold(0.0, f64::max)
    }
}

impl Effect for PerlinNoiseEffect {
    fn name(&self) -> &str {
        EffectId::PerlinNoise.as_str()
    }

    fn description(&self) -> &str {
        EffectId::PerlinNoise.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.depths.clear();
        self.time = 0.0;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, input: &KeyboardState, _now: Instant) -> Result<()> {
        self.time += self.params.range(self.speed) * 0.001;
        let scale = self.params.range(self.scale) / 100.0;
        let depth = self.params.range(self.press_depth) / 100.0;
        let radius = self.params.range(self.press_radius) / 100.0 * 5.0;
        let stops = [
            (0.0, self.params.color(self.color1)),
            (NOISE_SHARE, self.params.color(self.color2)),
            (1.0, self.params.color(self.press_color)),
        ];

        self.depths.fade_all(DEPTH_FADE);
        self.depths
            .track_pressed(input, &self.keymap, self.size, 1.0, 1.0);

        let mut frame = core::mem::take(&mut self.frame);
        frame.paint(|row, col| {
            let sample = self
                .noise
                .noise01(col as f64 * scale, row as f64 * scale, self.time);
            let base = libm::pow(sample, 0.7) * NOISE_SHARE;
            let press = self.press_height(row, col, radius, depth);
            let height = (base + press * (1.0 - NOISE_SHARE)).clamp(0.0, 1.0);
            sample_stops(&stops, height)
        });
        self.frame = frame;
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.depths.clear();
    }
}
