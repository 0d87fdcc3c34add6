//! Flickering fire
//!
//! The bottom row is fed by two out-of-phase sine waves per column; heat
//! propagates upward losing a fixed amount per row, so a taller flame
//! setting lets it climb further.

use std::sync::Arc;

use embassy_time::Instant;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::{Effect, EffectId};
use crate::{
    color::{BLACK, Rgb, sample_stops},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{ColorParam, ParameterSet, RangeParam},
};

const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
const YELLOW: Rgb = Rgb {
    r: 255,
    g: 255,
    b: 0,
};

/// Heat below which a cell stops feeding the one above and cools instead
const EMBER: f64 = 0.25;
const COOLING: f64 = 0.85;

#[derive(Debug)]
pub struct FireEffect {
    params: Arc<ParameterSet>,
    cold_color: ColorParam,
    hot_color: ColorParam,
    height: RangeParam,
    speed: RangeParam,
    seed: u64,
    /// Phase offset of each column's flicker
    offsets: Vec<f64>,
    heat: Vec<f64>,
    time: f64,
    size: GridSize,
    frame: ColorGrid,
}

impl FireEffect {
    pub fn new(seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let cold_color = builder.color("coldColor", "Cold Color", RED);
        let hot_color = builder.color("hotColor", "Hot Color", YELLOW);
        let height = builder.range("height", "Flame Height", 10.0, 50.0, 25.0);
        let speed = builder.range("speed", "Animation Speed", 1.0, 20.0, 10.0);
        Ok(Self {
            params: builder.build()?,
            cold_color,
            hot_color,
            height,
            speed,
            seed,
            offsets: Vec::new(),
            heat: Vec::new(),
            time: 0.0,
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
}

impl Effect for FireEffect {
    fn name(&self) -> &str {
        EffectId::Fire.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Fire.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.heat = vec![0.0; size.cells()];
        let mut rng = SmallRng::seed_from_u64(self.seed);
        self.offsets = (0..size.cols)
            .map(|_| rng.r#gen::<f64>() * 100.0)
            .collect();
        self.time = 0.0;
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        let GridSize { rows, cols } = self.size;
        if rows == 0 || cols == 0 {
            return Ok(());
        }
        self.time += self.params.range(self.speed) * 0.01;
        let loss = (50.0 - self.params.range(self.height)) * 0.01;

        let bottom = (rows - 1) * cols;
        for (col, offset) in self.offsets.iter().enumerate() {
            let fast = libm::sin(self.time + offset) * 0.5 + 0.5;
            let slow = libm::sin(self.time * 1.7 + offset * 0.7) * 0.5 + 0.5;
            self.heat[bottom + col] = 0.5 + (fast * 0.6 + slow * 0.4) * 0.5;
        }

        for row in (0..rows - 1).rev() {
            for col in 0..cols {
                let below = self.heat[(row + 1) * cols + col];
                let cell = &mut self.heat[row * cols + col];
                *cell = if below > EMBER {
                    below - loss
                } else {
                    *cell * COOLING
                }
                .clamp(0.0, 1.0);
            }
        }

        let stops = [
            (0.0, BLACK),
            (EMBER, self.params.color(self.cold_color)),
            (1.0, self.params.color(self.hot_color)),
        ];
        let heat = &self.heat;
        self.frame
            .paint(|row, col| sample_stops(&stops, heat[row * cols + col]));
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.heat.fill(0.0);
    }
}
