//! Raindrops falling down the keyboard

use std::sync::Arc;

use embassy_time::Instant;
use heapless::Deque;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::{Effect, EffectId};
use crate::{
    color::{Rgb, dim},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{ColorParam, ParameterSet, RangeParam},
};

const MAX_DROPS: usize = 128;

const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

#[derive(Debug, Clone, Copy, PartialEq)]
struct Raindrop {
    col: usize,
    /// Fractional row of the raindrop head
    row: f64,
    /// Rows per tick
    speed: f64,
    color: Rgb,
}

#[derive(Debug)]
pub struct RainEffect {
    params: Arc<ParameterSet>,
    color: ColorParam,
    speed: RangeParam,
    density: RangeParam,
    seed: u64,
    rng: SmallRng,
    drops: Deque<Raindrop, MAX_DROPS>,
    size: GridSize,
    frame: ColorGrid,
}

impl RainEffect {
    pub fn new(seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let color = builder.color("color", "Rain Color", BLUE);
        let speed = builder.range("speed", "Fall Speed", 1.0, 100.0, 50.0);
        let density = builder.range("density", "Rain Density", 1.0, 100.0, 30.0);
        Ok(Self {
            params: builder.build()?,
            color,
            speed,
            density,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            drops: Deque::new(),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Number of drops currently falling
    pub fn live(&self) -> usize {
        self.drops.len()
    }

    fn maybe_spawn(&mut self) {
        if self.size.is_empty() {
            return;
        }
        let density = self.params.range(self.density);
        if f64::from(self.rng.gen_range(0..100_u32)) >= density {
            return;
        }
        let raindrop = Raindrop {
            col: self.rng.gen_range(0..self.size.cols),
            row: 0.0,
            speed: self.params.range(self.speed) / 20.0,
            color: self.params.color(self.color),
        };
        if self.drops.is_full() {
            self.drops.pop_front();
        }
        let _ = self.drops.push_back(raindrop);
    }
}

impl Effect for RainEffect {
    fn name(&self) -> &str {
        EffectId::Rain.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Rain.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.drops.clear();
        self.rng = SmallRng::seed_from_u64(self.seed);
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.maybe_spawn();

        let rows = self.size.rows as f64;
        self.frame.clear();
        for _ in 0..self.drops.len() {
            let Some(mut raindrop) = self.drops.pop_front() else {
                break;
            };
            raindrop.row += raindrop.speed;
            if raindrop.row >= rows {
                continue;
            }
            let row = libm::floor(raindrop.row);
            let intensity = 1.0 - (raindrop.row - row);
            self.frame
                .set(row as usize, raindrop.col, dim(raindrop.color, intensity));
            let _ = self.drops.push_back(raindrop);
        }
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.drops.clear();
    }
}
