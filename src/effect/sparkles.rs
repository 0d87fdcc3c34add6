//! Random sparkling lights

use std::sync::Arc;

use embassy_time::Instant;
use heapless::Deque;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::{Effect, EffectId};
use crate::{
    color::{Rgb, WHITE, dim},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{ColorParam, ParameterSet, RangeParam},
};

const MAX_SPARKLES: usize = 128;

/// Lifetime advance per tick at speed 50, roughly one 60 Hz frame
const BASE_STEP: f64 = 0.016;

const CYAN: Rgb = Rgb {
    r: 0,
    g: 255,
    b: 255,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sparkle {
    row: usize,
    col: usize,
    color: Rgb,
    lifetime: f64,
    max_lifetime: f64,
}

#[derive(Debug)]
pub struct SparklesEffect {
    params: Arc<ParameterSet>,
    color1: ColorParam,
    color2: ColorParam,
    density: RangeParam,
    speed: RangeParam,
    seed: u64,
    rng: SmallRng,
    sparkles: Deque<Sparkle, MAX_SPARKLES>,
    size: GridSize,
    frame: ColorGrid,
}

impl SparklesEffect {
    pub fn new(seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let color1 = builder.color("color1", "Sparkle Color 1", WHITE);
        let color2 = builder.color("color2", "Sparkle Color 2", CYAN);
        let density = builder.range("density", "Sparkle Density", 1.0, 100.0, 20.0);
        let speed = builder.range("speed", "Fade Speed", 1.0, 100.0, 50.0);
        Ok(Self {
            params: builder.build()?,
            color1,
            color2,
            density,
            speed,
            seed,
            rng: SmallRng::seed_from_u64(seed),
            sparkles: Deque::new(),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Number of sparkles currently alive
    pub fn live(&self) -> usize {
        self.sparkles.len()
    }

    fn maybe_spawn(&mut self) {
        if self.size.is_empty() {
            return;
        }
        let density = self.params.range(self.density);
        if f64::from(self.rng.gen_range(0..100_u32)) >= density {
            return;
        }
        let sparkle = Sparkle {
            row: self.rng.gen_range(0..self.size.rows),
            col: self.rng.gen_range(0..self.size.cols),
            color: if self.rng.gen_bool(0.5) {
                self.params.color(self.color1)
            } else {
                self.params.color(self.color2)
            },
            lifetime: 0.0,
            max_lifetime: 0.5 + self.rng.r#gen::<f64>() * 0.5,
        };
        if self.sparkles.is_full() {
            self.sparkles.pop_front();
        }
        let _ = self.sparkles.push_back(sparkle);
    }
}

impl Effect for SparklesEffect {
    fn name(&self) -> &str {
        EffectId::Sparkles.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Sparkles.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.sparkles.clear();
        self.rng = SmallRng::seed_from_u64(self.seed);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.maybe_spawn();

        let step = BASE_STEP * self.params.range(self.speed) / 50.0;
        self.frame.clear();
        for _ in 0..self.sparkles.len() {
            let Some(mut sparkle) = self.sparkles.pop_front() else {
                break;
            };
            sparkle.lifetime += step;
            if sparkle.lifetime >= sparkle.max_lifetime {
                continue;
            }
            let progress = sparkle.lifetime / sparkle.max_lifetime;
            let brightness = libm::sin(progress * core::f64::consts::PI);
            self.frame
                .set(sparkle.row, sparkle.col, dim(sparkle.color, brightness));
            let _ = self.sparkles.push_back(sparkle);
        }
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.sparkles.clear();
    }
}
