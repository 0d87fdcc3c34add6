//! Per-key reactive lighting
//!
//! A pressed key glows from the release color toward the press color as it
//! travels deeper, and fades out after release.

use std::sync::Arc;

use embassy_time::Instant;

use super::{Effect, EffectId};
use crate::{
    analog::PressureField,
    color::{Rgb, dim, lerp_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::KeyMap,
    param::{ColorParam, ParameterSet, RangeParam},
};

const MAGENTA: Rgb = Rgb {
    r: 255,
    g: 0,
    b: 255,
};
const PURPLE: Rgb = Rgb {
    r: 128,
    g: 0,
    b: 128,
};

#[derive(Debug)]
pub struct ReactiveEffect {
    keymap: Arc<KeyMap>,
    params: Arc<ParameterSet>,
    press_color: ColorParam,
    release_color: ColorParam,
    fade_speed: RangeParam,
    sensitivity: RangeParam,
    intensity: PressureField,
    size: GridSize,
    frame: ColorGrid,
}

impl ReactiveEffect {
    pub fn new(keymap: Arc<KeyMap>) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let press_color = builder.color("pressColor", "Press Color", MAGENTA);
        let release_color = builder.color("releaseColor", "Release Color", PURPLE);
        let fade_speed = builder.range("fadeSpeed", "Fade Speed", 1.0, 100.0, 50.0);
        let sensitivity = builder.range("sensitivity", "Sensitivity", 1.0, 100.0, 50.0);
        Ok(Self {
            keymap,
            params: builder.build()?,
            press_color,
            release_color,
            fade_speed,
            sensitivity,
            intensity: PressureField::new(),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Live per-key intensities
    pub fn intensity(&self) -> &PressureField {
        &self.intensity
    }
}

impl Effect for ReactiveEffect {
    fn name(&self) -> &str {
        EffectId::Reactive.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Reactive.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.intensity.clear();
        Ok(())
    }

    fn update(&mut self, input: &KeyboardState, _now: Instant) -> Result<()> {
        let gain = self.params.range(self.sensitivity) / 50.0;
        let fade = self.params.range(self.fade_speed) / 1000.0;
        let press = self.params.color(self.press_color);
        let release = self.params.color(self.release_color);

        self.intensity.fade_released(input, &self.keymap, fade);
        self.intensity
            .track_pressed(input, &self.keymap, self.size, gain, 1.0);

        self.frame.clear();
        for (position, level) in self.intensity.iter() {
            let color = dim(lerp_color(release, press, level), level);
            self.frame.set(position.row(), position.col(), color);
        }
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.intensity.clear();
    }
}
