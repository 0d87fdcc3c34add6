//! Release-triggered ripples
//!
//! Releasing a key emits a ring that expands from it. The deepest pressure
//! reached before release decides how far, how fast and how bright the
//! ring travels.

use std::sync::Arc;

use embassy_time::Instant;
use heapless::Deque;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::{Effect, EffectId};
use crate::{
    analog::PeakTracker,
    color::{BLACK, Rgb, dim, hsv_to_rgb},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::KeyMap,
    param::{BoolParam, ColorParam, ParameterSet, RangeParam},
};

/// Ripples alive at once; the oldest is dropped beyond this
pub const MAX_RIPPLES: usize = 64;

const RING_THICKNESS: f64 = 1.5;

const CYAN: Rgb = Rgb {
    r: 0,
    g: 255,
    b: 255,
};

/// An expanding ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub row: usize,
    pub col: usize,
    pub radius: f64,
    pub max_radius: f64,
    /// Radius growth per tick
    pub speed: f64,
    pub intensity: f64,
    pub color: Rgb,
}

impl Ripple {
    /// A ring sized by the peak pressure of the released key.
    ///
    /// `spread` is the spread speed setting in percent.
    pub fn from_peak(row: usize, col: usize, peak: f64, spread: f64, color: Rgb) -> Self {
        Self {
            row,
            col,
            radius: 0.0,
            max_radius: 5.0 + peak * 15.0,
            speed: spread / 100.0 * 0.5 * (0.5 + peak * 0.5),
            intensity: peak,
            color,
        }
    }

    /// Grow by one tick. Returns `false` once the ring is spent.
    pub fn advance(&mut self, fade: f64) -> bool {
        self.radius += self.speed;
        self.intensity -= fade;
        self.intensity > 0.0 && self.radius <= self.max_radius
    }

    /// Ring brightness at a cell, zero away from the ring
    #[allow(clippy::cast_precision_loss)]
    pub fn intensity_at(&self, row: usize, col: usize) -> f64 {
        let distance = libm::hypot(
            row as f64 - self.row as f64,
            col as f64 - self.col as f64,
        );
        let off_ring = libm::fabs(distance - self.radius);
        if off_ring >= RING_THICKNESS {
            return 0.0;
        }
        (1.0 - off_ring / RING_THICKNESS) * self.intensity
    }
}

#[derive(Debug)]
pub struct RippleEffect {
    keymap: Arc<KeyMap>,
    params: Arc<ParameterSet>,
    ripple_color: ColorParam,
    spread_speed: RangeParam,
    fade_speed: RangeParam,
    base_brightness: RangeParam,
    random_colors: BoolParam,
    inverted: BoolParam,
    peaks: PeakTracker,
    ripples: Deque<Ripple, MAX_RIPPLES>,
    seed: u64,
    rng: SmallRng,
    size: GridSize,
    frame: ColorGrid,
}

impl RippleEffect {
    pub fn new(keymap: Arc<KeyMap>, seed: u64) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let ripple_color = builder.color("rippleColor", "Ripple Color", CYAN);
        let spread_speed = builder.range("spreadSpeed", "Spread Speed", 1.0, 100.0, 20.0);
        let fade_speed = builder.range("fadeSpeed", "Fade Speed", 1.0, 100.0, 45.0);
        let base_brightness =
            builder.range("baseBrightness", "Base Brightness", 0.0, 100.0, 12.0);
        let random_colors = builder.flag("randomColors", "Random Colors", false);
        let inverted = builder.flag("inverted", "Inverted", false);
        Ok(Self {
            keymap,
            params: builder.build()?,
            ripple_color,
            spread_speed,
            fade_speed,
            base_brightness,
            random_colors,
            inverted,
            peaks: PeakTracker::new(),
            ripples: Deque::new(),
            seed,
            rng: SmallRng::seed_from_u64(seed),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Rings currently expanding, oldest first
    pub fn ripples(&self) -> impl Iterator<Item = &Ripple> {
        self.ripples.iter()
    }

    /// Peak pressures of keys still held
    pub fn peaks(&self) -> &PeakTracker {
        &self.peaks
    }

    fn spawn(&mut self, ripple: Ripple) {
        if self.ripples.is_full() {
            self.ripples.pop_front();
        }
        let _ = self.ripples.push_back(ripple);
    }

    fn next_ripple_color(&mut self) -> Rgb {
        if self.params.flag(self.random_colors) {
            let hue = self.rng.r#gen::<f64>() * 360.0;
            hsv_to_rgb(hue, 1.0, 1.0)
        } else {
            self.params.color(self.ripple_color)
        }
    }

    fn advance_ripples(&mut self, fade: f64) {
        for _ in 0..self.ripples.len() {
            let Some(mut ripple) = self.ripples.pop_front() else {
                break;
            };
            if ripple.advance(fade) {
                let _ = self.ripples.push_back(ripple);
            }
        }
    }
}

impl Effect for RippleEffect {
    fn name(&self) -> &str {
        EffectId::Ripple.as_str()
    }

    fn description(&self) -> &str {
        EffectId::Ripple.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.peaks.clear();
        self.ripples.clear();
        self.rng = SmallRng::seed_from_u64(self.seed);
        Ok(())
    }

    fn update(&mut self, input: &KeyboardState, _now: Instant) -> Result<()> {
        let spread = self.params.range(self.spread_speed);
        let fade = self.params.range(self.fade_speed) / 100.0 * 0.02;
        let base = self.params.range(self.base_brightness) / 100.0;
        let inverted = self.params.flag(self.inverted);

        let mut released = Vec::new();
        self.peaks.update(input, |code, peak| released.push((code, peak)));
        for (code, peak) in released {
            let Some(position) = self.keymap.lookup(code).filter(|p| p.fits(self.size)) else {
                continue;
            };
            let color = self.next_ripple_color();
            self.spawn(Ripple::from_peak(
                position.row(),
                position.col(),
                f64::from(peak),
                spread,
                color,
            ));
        }

        self.advance_ripples(fade);

        let glow = self.params.color(self.ripple_color);
        let ripples = &self.ripples;
        self.frame.paint(|row, col| {
            let mut total = base;
            let mut color = glow;
            for ripple in ripples.iter() {
                let intensity = ripple.intensity_at(row, col);
                if intensity > total {
                    total = intensity;
                    color = ripple.color;
                }
            }
            if inverted && total > base {
                total = base + (1.0 - total);
            }
            if total <= 0.0 {
                BLACK
            } else {
                dim(color, total)
            }
        });
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        self.peaks.clear();
        self.ripples.clear();
    }
}
