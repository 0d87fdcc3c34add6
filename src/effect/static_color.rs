//! Static color fill effect
//!
//! Fills every key with one color scaled by a brightness percentage.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    color::{Rgb, scale_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    math8::percent8,
    param::{ColorParam, ParameterSet, RangeParam},
};

const DEFAULT_COLOR: Rgb = Rgb {
    r: 0,
    g: 255,
    b: 255,
};

/// Static color effect - fills all keys with one color
#[derive(Debug)]
pub struct StaticColorEffect {
    params: Arc<ParameterSet>,
    color: ColorParam,
    brightness: RangeParam,
    frame: ColorGrid,
}

impl StaticColorEffect {
    pub fn new() -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let color = builder.color("color", "Color", DEFAULT_COLOR);
        let brightness = builder.range("brightness", "Brightness", 0.0, 100.0, 100.0);
        Ok(Self {
            params: builder.build()?,
            color,
            brightness,
            frame: ColorGrid::default(),
        })
    }

    /// The color every key shows at the current settings
    pub fn current_color(&self) -> Rgb {
        let brightness = percent8(self.params.range(self.brightness));
        scale_color(self.params.color(self.color), brightness)
    }
}

impl Effect for StaticColorEffect {
    fn name(&self) -> &str {
        EffectId::Static.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Static.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.frame.resize(size);
        Ok(())
    }

    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        self.frame.fill(self.current_color());
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }
}
