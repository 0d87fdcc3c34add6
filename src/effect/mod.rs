//! Effect system with compile-time known effect variants
//!
//! Built-in effects are stored in an enum so the scheduler dispatches
//! without a vtable; third party effects ride along in
//! [`EffectSlot::Custom`]. Each effect implements the [`Effect`] trait.

mod audio_visualizer;
mod breathing;
mod fire;
mod heatmap;
mod library;
mod perlin;
mod pressure_bars;
mod rain;
mod rainbow;
mod reactive;
mod ripple;
mod sparkles;
mod static_color;
mod voronoi;

use std::sync::Arc;

pub use audio_visualizer::AudioVisualizerEffect;
pub use breathing::BreathingEffect;
use embassy_time::Instant;
pub use fire::FireEffect;
pub use heatmap::HeatmapEffect;
pub use library::EffectLibrary;
pub use perlin::PerlinNoiseEffect;
pub use pressure_bars::{BarDirection, PressureBarsEffect};
pub use rain::RainEffect;
pub use rainbow::RainbowEffect;
pub use reactive::ReactiveEffect;
pub use ripple::{Ripple, RippleEffect};
pub use sparkles::SparklesEffect;
pub use static_color::StaticColorEffect;
pub use voronoi::VoronoiEffect;

use crate::{
    HardwareSink,
    audio::AudioConfig,
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    keymap::KeyMap,
    param::ParameterSet,
};

const EFFECT_NAME_STATIC: &str = "static";
const EFFECT_NAME_RAINBOW: &str = "rainbow";
const EFFECT_NAME_BREATHING: &str = "breathing";
const EFFECT_NAME_REACTIVE: &str = "reactive";
const EFFECT_NAME_PRESSURE_BARS: &str = "pressure_bars";
const EFFECT_NAME_HEATMAP: &str = "heatmap";
const EFFECT_NAME_RIPPLE: &str = "ripple";
const EFFECT_NAME_PERLIN_NOISE: &str = "perlin_noise";
const EFFECT_NAME_VORONOI: &str = "voronoi";
const EFFECT_NAME_AUDIO_VISUALIZER: &str = "audio_visualizer";
const EFFECT_NAME_FIRE: &str = "fire";
const EFFECT_NAME_SPARKLES: &str = "sparkles";
const EFFECT_NAME_RAIN: &str = "rain";

const EFFECT_ID_STATIC: u8 = 0;
const EFFECT_ID_RAINBOW: u8 = 1;
const EFFECT_ID_BREATHING: u8 = 2;
const EFFECT_ID_REACTIVE: u8 = 3;
const EFFECT_ID_PRESSURE_BARS: u8 = 4;
const EFFECT_ID_HEATMAP: u8 = 5;
const EFFECT_ID_RIPPLE: u8 = 6;
const EFFECT_ID_PERLIN_NOISE: u8 = 7;
const EFFECT_ID_VORONOI: u8 = 8;
const EFFECT_ID_AUDIO_VISUALIZER: u8 = 9;
const EFFECT_ID_FIRE: u8 = 10;
const EFFECT_ID_SPARKLES: u8 = 11;
const EFFECT_ID_RAIN: u8 = 12;

/// A stateful procedure computing one frame of per-key color.
///
/// The scheduler calls [`Effect::initialize`] on activation, then
/// [`Effect::update`] once per tick, and [`Effect::cleanup`] before another
/// effect takes over. `update` is the only place the frame changes.
pub trait Effect: Send {
    /// Stable identifier used by the configuration surface
    fn name(&self) -> &str;

    /// Human readable summary
    fn description(&self) -> &str;

    /// Tunables shared with the configuration surface
    fn parameters(&self) -> &Arc<ParameterSet>;

    /// Reset animation state and reallocate the frame for `size`
    fn initialize(&mut self, size: GridSize, now: Instant) -> Result<()>;

    /// Advance one tick
    fn update(&mut self, input: &KeyboardState, now: Instant) -> Result<()>;

    /// The frame produced by the last update
    fn frame(&self) -> &ColorGrid;

    /// Release external resources
    fn cleanup(&mut self) {}
}

/// Shared construction inputs for the built-in effects.
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub keymap: Arc<KeyMap>,
    /// Seed for every random source, so frames are reproducible
    pub seed: u64,
    pub audio: AudioConfig,
}

impl Default for EffectContext {
    fn default() -> Self {
        Self {
            keymap: KeyMap::standard(),
            seed: crate::config::DEFAULT_SEED,
            audio: AudioConfig::default(),
        }
    }
}

impl EffectContext {
    /// Derive a per-effect seed so effects sharing a context do not
    /// produce correlated randomness
    pub(crate) fn seed_for(&self, id: EffectId) -> u64 {
        self.seed ^ (u64::from(id as u8) << 32)
    }
}

/// Effect slot - enum containing all possible effects
#[allow(clippy::large_enum_variant)]
pub enum EffectSlot {
    Static(StaticColorEffect),
    Rainbow(RainbowEffect),
    Breathing(BreathingEffect),
    Reactive(ReactiveEffect),
    PressureBars(PressureBarsEffect),
    Heatmap(HeatmapEffect),
    Ripple(RippleEffect),
    PerlinNoise(PerlinNoiseEffect),
    Voronoi(VoronoiEffect),
    AudioVisualizer(AudioVisualizerEffect),
    Fire(FireEffect),
    Sparkles(SparklesEffect),
    Rain(RainEffect),
    /// Effect registered at runtime
    Custom(Box<dyn Effect>),
}

macro_rules! dispatch {
    ($slot:expr, $effect:ident => $body:expr) => {
        match $slot {
            EffectSlot::Static($effect) => $body,
            EffectSlot::Rainbow($effect) => $body,
            EffectSlot::Breathing($effect) => $body,
            EffectSlot::Reactive($effect) => $body,
            EffectSlot::PressureBars($effect) => $body,
            EffectSlot::Heatmap($effect) => $body,
            EffectSlot::Ripple($effect) => $body,
            EffectSlot::PerlinNoise($effect) => $body,
            EffectSlot::Voronoi($effect) => $body,
            EffectSlot::AudioVisualizer($effect) => $body,
            EffectSlot::Fire($effect) => $body,
            EffectSlot::Sparkles($effect) => $body,
            EffectSlot::Rain($effect) => $body,
            EffectSlot::Custom($effect) => $body,
        }
    };
}

/// Known effect ids that can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EffectId {
    Static = EFFECT_ID_STATIC,
    Rainbow = EFFECT_ID_RAINBOW,
    Breathing = EFFECT_ID_BREATHING,
    Reactive = EFFECT_ID_REACTIVE,
    PressureBars = EFFECT_ID_PRESSURE_BARS,
    Heatmap = EFFECT_ID_HEATMAP,
    Ripple = EFFECT_ID_RIPPLE,
    PerlinNoise = EFFECT_ID_PERLIN_NOISE,
    Voronoi = EFFECT_ID_VORONOI,
    AudioVisualizer = EFFECT_ID_AUDIO_VISUALIZER,
    Fire = EFFECT_ID_FIRE,
    Sparkles = EFFECT_ID_SPARKLES,
    Rain = EFFECT_ID_RAIN,
}

impl EffectId {
    /// Every built-in, in registration order
    pub const ALL: [Self; 13] = [
        Self::Static,
        Self::Rainbow,
        Self::Breathing,
        Self::Reactive,
        Self::PressureBars,
        Self::Heatmap,
        Self::Ripple,
        Self::PerlinNoise,
        Self::Voronoi,
        Self::AudioVisualizer,
        Self::Fire,
        Self::Sparkles,
        Self::Rain,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            EFFECT_ID_STATIC => Self::Static,
            EFFECT_ID_RAINBOW => Self::Rainbow,
            EFFECT_ID_BREATHING => Self::Breathing,
            EFFECT_ID_REACTIVE => Self::Reactive,
            EFFECT_ID_PRESSURE_BARS => Self::PressureBars,
            EFFECT_ID_HEATMAP => Self::Heatmap,
            EFFECT_ID_RIPPLE => Self::Ripple,
            EFFECT_ID_PERLIN_NOISE => Self::PerlinNoise,
            EFFECT_ID_VORONOI => Self::Voronoi,
            EFFECT_ID_AUDIO_VISUALIZER => Self::AudioVisualizer,
            EFFECT_ID_FIRE => Self::Fire,
            EFFECT_ID_SPARKLES => Self::Sparkles,
            EFFECT_ID_RAIN => Self::Rain,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => EFFECT_NAME_STATIC,
            Self::Rainbow => EFFECT_NAME_RAINBOW,
            Self::Breathing => EFFECT_NAME_BREATHING,
            Self::Reactive => EFFECT_NAME_REACTIVE,
            Self::PressureBars => EFFECT_NAME_PRESSURE_BARS,
            Self::Heatmap => EFFECT_NAME_HEATMAP,
            Self::Ripple => EFFECT_NAME_RIPPLE,
            Self::PerlinNoise => EFFECT_NAME_PERLIN_NOISE,
            Self::Voronoi => EFFECT_NAME_VORONOI,
            Self::AudioVisualizer => EFFECT_NAME_AUDIO_VISUALIZER,
            Self::Fire => EFFECT_NAME_FIRE,
            Self::Sparkles => EFFECT_NAME_SPARKLES,
            Self::Rain => EFFECT_NAME_RAIN,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EFFECT_NAME_STATIC => Some(Self::Static),
            EFFECT_NAME_RAINBOW => Some(Self::Rainbow),
            EFFECT_NAME_BREATHING => Some(Self::Breathing),
            EFFECT_NAME_REACTIVE => Some(Self::Reactive),
            EFFECT_NAME_PRESSURE_BARS => Some(Self::PressureBars),
            EFFECT_NAME_HEATMAP => Some(Self::Heatmap),
            EFFECT_NAME_RIPPLE => Some(Self::Ripple),
            EFFECT_NAME_PERLIN_NOISE => Some(Self::PerlinNoise),
            EFFECT_NAME_VORONOI => Some(Self::Voronoi),
            EFFECT_NAME_AUDIO_VISUALIZER => Some(Self::AudioVisualizer),
            EFFECT_NAME_FIRE => Some(Self::Fire),
            EFFECT_NAME_SPARKLES => Some(Self::Sparkles),
            EFFECT_NAME_RAIN => Some(Self::Rain),
            _ => None,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Static => "Solid color across every key",
            Self::Rainbow => "Diagonal rainbow drifting across the keyboard",
            Self::Breathing => "Smooth pulse between two colors",
            Self::Reactive => "Keys light up by how deep they are pressed",
            Self::PressureBars => "Bars grow toward pressed keys with pressure",
            Self::Heatmap => "Typing heat accumulates and cools down",
            Self::Ripple => "Rings spread from released keys",
            Self::PerlinNoise => "Flowing gradient noise stirred by key presses",
            Self::Voronoi => "Drifting cellular pattern with glowing borders",
            Self::AudioVisualizer => "Spectrum bars driven by system audio",
            Self::Fire => "Flickering fire rising from the bottom row",
            Self::Sparkles => "Random sparkling lights",
            Self::Rain => "Raindrops falling down the keyboard",
        }
    }

    /// Build the effect with its declared parameters
    pub fn to_slot(self, ctx: &EffectContext) -> Result<EffectSlot> {
        Ok(match self {
            Self::Static => EffectSlot::Static(StaticColorEffect::new()?),
            Self::Rainbow => EffectSlot::Rainbow(RainbowEffect::new()?),
            Self::Breathing => EffectSlot::Breathing(BreathingEffect::new()?),
            Self::Reactive => EffectSlot::Reactive(ReactiveEffect::new(Arc::clone(&ctx.keymap))?),
            Self::PressureBars => {
                EffectSlot::PressureBars(PressureBarsEffect::new(Arc::clone(&ctx.keymap))?)
            }
            Self::Heatmap => EffectSlot::Heatmap(HeatmapEffect::new(Arc::clone(&ctx.keymap))?),
            Self::Ripple => EffectSlot::Ripple(RippleEffect::new(
                Arc::clone(&ctx.keymap),
                ctx.seed_for(self),
            )?),
            Self::PerlinNoise => EffectSlot::PerlinNoise(PerlinNoiseEffect::new(
                Arc::clone(&ctx.keymap),
                ctx.seed_for(self),
            )?),
            Self::Voronoi => EffectSlot::Voronoi(VoronoiEffect::new(ctx.seed_for(self))?),
            Self::AudioVisualizer => EffectSlot::AudioVisualizer(AudioVisualizerEffect::new(
                crate::audio::default_audio_source(),
                ctx.audio,
            )?),
            Self::Fire => EffectSlot::Fire(FireEffect::new(ctx.seed_for(self))?),
            Self::Sparkles => EffectSlot::Sparkles(SparklesEffect::new(ctx.seed_for(self))?),
            Self::Rain => EffectSlot::Rain(RainEffect::new(ctx.seed_for(self))?),
        })
    }
}

impl EffectSlot {
    /// Get the effect ID for external observation, `None` for custom effects
    pub fn id(&self) -> Option<EffectId> {
        Some(match self {
            Self::Static(_) => EffectId::Static,
            Self::Rainbow(_) => EffectId::Rainbow,
            Self::Breathing(_) => EffectId::Breathing,
            Self::Reactive(_) => EffectId::Reactive,
            Self::PressureBars(_) => EffectId::PressureBars,
            Self::Heatmap(_) => EffectId::Heatmap,
            Self::Ripple(_) => EffectId::Ripple,
            Self::PerlinNoise(_) => EffectId::PerlinNoise,
            Self::Voronoi(_) => EffectId::Voronoi,
            Self::AudioVisualizer(_) => EffectId::AudioVisualizer,
            Self::Fire(_) => EffectId::Fire,
            Self::Sparkles(_) => EffectId::Sparkles,
            Self::Rain(_) => EffectId::Rain,
            Self::Custom(_) => return None,
        })
    }

    /// Update the effect and push its frame to the sink.
    ///
    /// Nothing reaches the sink when the update fails.
    pub fn render_to<S>(&mut self, input: &KeyboardState, now: Instant, sink: &mut S) -> Result<()>
    where
        S: HardwareSink + ?Sized,
    {
        self.update(input, now)?;
        sink.set_full_grid(self.frame());
        sink.present();
        Ok(())
    }
}

impl Effect for EffectSlot {
    fn name(&self) -> &str {
        dispatch!(self, effect => effect.name())
    }

    fn description(&self) -> &str {
        dispatch!(self, effect => effect.description())
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        dispatch!(self, effect => effect.parameters())
    }

    fn initialize(&mut self, size: GridSize, now: Instant) -> Result<()> {
        dispatch!(self, effect => effect.initialize(size, now))
    }

    fn update(&mut self, input: &KeyboardState, now: Instant) -> Result<()> {
        dispatch!(self, effect => effect.update(input, now))
    }

    fn frame(&self) -> &ColorGrid {
        dispatch!(self, effect => effect.frame())
    }

    fn cleanup(&mut self) {
        dispatch!(self, effect => effect.cleanup());
    }
}

impl core::fmt::Debug for EffectSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("EffectSlot").field(&self.name()).finish()
    }
}

impl From<Box<dyn Effect>> for EffectSlot {
    fn from(effect: Box<dyn Effect>) -> Self {
        Self::Custom(effect)
    }
}

/// Seconds between `start` and `now`, zero if `now` is earlier
#[allow(clippy::cast_precision_loss)]
pub(crate) fn elapsed_secs(start: Instant, now: Instant) -> f64 {
    now.checked_duration_since(start)
        .map_or(0.0, |elapsed| elapsed.as_micros() as f64 / 1_000_000.0)
}
