//! Drifting cellular noise with glowing borders

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    color::{BLACK, Rgb, lerp_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    noise::VoronoiNoise,
    param::{ColorParam, ParameterSet, RangeParam},
};

const CYAN: Rgb = Rgb {
    r: 0,
    g: 255,
    b: 255,
};

#[derive(Debug)]
pub struct VoronoiEffect {
    params: Arc<ParameterSet>,
    cell_color: ColorParam,
    border_color: ColorParam,
    speed: RangeParam,
    cell_size: RangeParam,
    border_width: RangeParam,
    noise: VoronoiNoise,
    time: f64,
    frame: ColorGrid,
}

impl VoronoiEffect {
    pub fn new(seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let cell_color = builder.color("color1", "Cell Color", BLACK);
        let border_color = builder.color("color2", "Border Color", CYAN);
        let speed = builder.range("speed", "Animation Speed", 1.0, 100.0, 3.0);
        let cell_size = builder.range("cellSize", "Cell Size", 10.0, 100.0, 59.0);
        let border_width = builder.range("borderWidth", "Border Width", 1.0, 50.0, 50.0);
        Ok(Self {
            params: builder.build()?,
            cell_color,
            border_color,
            speed,
            cell_size,
            border_width,
            noise: VoronoiNoise::new(seed),
            time: 0.0,
            frame: ColorGrid::default(),
        })
    }
}

impl Effect for VoronoiEffect {
    fn name(&self) -> &str {
        EffectId::Voronoi.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Voronoi.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.frame.resize(size);
        self.time = 0.0;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.time += self.params.range(self.speed) * 0.001;
        // Larger cells mean a smaller sampling step
        let scale = (120.0 - self.params.range(self.cell_size)) / 100.0;
        let threshold = self.params.range(self.border_width) / 100.0;
        let cell = self.params.color(self.cell_color);
        let border = self.params.color(self.border_color);

        let noise = &self.noise;
        let time = self.time;
        self.frame.paint(|row, col| {
            let sample = noise.sample(col as f64 * scale + time, row as f64 * scale);
            let edge = (sample.edge * 2.0).clamp(0.0, 1.0);
            if edge < threshold {
                lerp_color(border, cell, edge / threshold)
            } else {
                cell
            }
        });
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}
