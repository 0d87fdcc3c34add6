//! Two-color breathing effect

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId, elapsed_secs};
use crate::{
    color::{Rgb, lerp_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{ColorParam, ParameterSet, RangeParam},
};

const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

/// Whole keyboard oscillates between two colors on a sine wave
#[derive(Debug)]
pub struct BreathingEffect {
    params: Arc<ParameterSet>,
    color1: ColorParam,
    color2: ColorParam,
    speed: RangeParam,
    started: Instant,
    frame: ColorGrid,
}

impl BreathingEffect {
    pub fn new() -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let color1 = builder.color("color1", "First Color", RED);
        let color2 = builder.color("color2", "Second Color", BLUE);
        let speed = builder.range("speed", "Speed", 1.0, 100.0, 50.0);
        Ok(Self {
            params: builder.build()?,
            color1,
            color2,
            speed,
            started: Instant::from_ticks(0),
            frame: ColorGrid::default(),
        })
    }

    /// Blend position between the two colors, in `[0, 1]`
    pub fn phase(&self, now: Instant) -> f64 {
        let speed = self.params.range(self.speed);
        libm::sin(elapsed_secs(self.started, now) * speed / 10.0) * 0.5 + 0.5
    }
}

impl Effect for BreathingEffect {
    fn name(&self) -> &str {
        EffectId::Breathing.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Breathing.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, now: Instant) -> Result<()> {
        self.frame.resize(size);
        self.started = now;
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, now: Instant) -> Result<()> {
        let color = lerp_color(
            self.params.color(self.color1),
            self.params.color(self.color2),
            self.phase(now),
        );
        self.frame.fill(color);
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}
