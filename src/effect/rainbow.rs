//! Rainbow cycling effect
//!
//! Hue advances diagonally across the grid (15 degrees per column, 5 per
//! row) and drifts over time.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId, elapsed_secs};
use crate::{
    color::hsv_to_rgb,
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{ParameterSet, RangeParam},
};

const HUE_PER_COL: f64 = 15.0;
const HUE_PER_ROW: f64 = 5.0;
/// Degrees per second at speed 10
const HUE_DRIFT: f64 = 30.0;

#[derive(Debug)]
pub struct RainbowEffect {
    params: Arc<ParameterSet>,
    speed: RangeParam,
    intensity: RangeParam,
    started: Instant,
    frame: ColorGrid,
}

impl RainbowEffect {
    pub fn new() -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let speed = builder.range("speed", "Speed", 1.0, 100.0, 50.0);
        let intensity = builder.range("intensity", "Intensity", 0.0, 100.0, 100.0);
        Ok(Self {
            params: builder.build()?,
            speed,
            intensity,
            started: Instant::from_ticks(0),
            frame: ColorGrid::default(),
        })
    }
}

impl Effect for RainbowEffect {
    fn name(&self) -> &str {
        EffectId::Rainbow.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Rainbow.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, now: Instant) -> Result<()> {
        self.frame.resize(size);
        self.started = now;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn update(&mut self, _input: &KeyboardState, now: Instant) -> Result<()> {
        let speed = self.params.range(self.speed);
        let value = self.params.range(self.intensity) / 100.0;
        let shift = elapsed_secs(self.started, now) * speed / 10.0 * HUE_DRIFT;

        self.frame.paint(|row, col| {
            let hue = col as f64 * HUE_PER_COL + row as f64 * HUE_PER_ROW + shift;
            hsv_to_rgb(hue, 1.0, value)
        });
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}
