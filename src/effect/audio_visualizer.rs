//! Audio spectrum visualizer
//!
//! Each column is a frequency band drawn as a bar rising from the bottom
//! row, colored along a low to high frequency gradient. The leading edge of
//! every bar is partially lit by the fractional bar height.
//!
//! Capture is started on activation. When no capture backend is available
//! the effect renders the background only.

use std::{cmp::Ordering, sync::Arc};

use embassy_time::Instant;
use tracing::{debug, warn};

use super::{Effect, EffectId};
use crate::{
    audio::{AudioConfig, AudioFeed, AudioSource, SpectrumAnalyzer, SpectrumSettings},
    color::{Rgb, column_gradient, lerp_color},
    error::Result,
    grid::{ColorGrid, GridSize},
    input::KeyboardState,
    param::{BoolParam, ColorParam, ParameterSet, RangeParam},
};

const LOW_COLOR: Rgb = Rgb {
    r: 0x00,
    g: 0x80,
    b: 0xFF,
};
const HIGH_COLOR: Rgb = Rgb {
    r: 0xFF,
    g: 0x00,
    b: 0x80,
};
const BACKGROUND_COLOR: Rgb = Rgb {
    r: 0x14,
    g: 0x14,
    b: 0x14,
};

pub struct AudioVisualizerEffect {
    params: Arc<ParameterSet>,
    low_color: ColorParam,
    high_color: ColorParam,
    background_color: ColorParam,
    sensitivity: RangeParam,
    decay: RangeParam,
    frequency_range: RangeParam,
    log_scale: BoolParam,
    source: Box<dyn AudioSource>,
    config: AudioConfig,
    feed: AudioFeed,
    /// Sample rate of the running capture, `None` when quiescent
    capture_rate: Option<u32>,
    analyzer: SpectrumAnalyzer,
    snapshot: Vec<f32>,
    size: GridSize,
    frame: ColorGrid,
}

impl AudioVisualizerEffect {
    pub fn new(source: Box<dyn AudioSource>, config: AudioConfig) -> Result<Self> {
        let mut builder = ParameterSet::builder();
        let low_color = builder.color("lowColor", "Low Frequency Color", LOW_COLOR);
        let high_color = builder.color("highColor", "High Frequency Color", HIGH_COLOR);
        let background_color =
            builder.color("backgroundColor", "Background Color", BACKGROUND_COLOR);
        let sensitivity = builder.range("sensitivity", "Sensitivity", 25.0, 200.0, 100.0);
        let decay = builder.range("decay", "Decay Speed", 10.0, 100.0, 50.0);
        let frequency_range = builder.range(
            "frequencyRange",
            "Frequency Range (Hz)",
            1_000.0,
            20_000.0,
            6_000.0,
        );
        let log_scale = builder.flag("logarithmicScale", "Logarithmic Scale", true);
        Ok(Self {
            params: builder.build()?,
            low_color,
            high_color,
            background_color,
            sensitivity,
            decay,
            frequency_range,
            log_scale,
            source,
            config,
            feed: AudioFeed::new(config.buffer_len),
            capture_rate: None,
            analyzer: SpectrumAnalyzer::new(),
            snapshot: Vec::with_capacity(config.buffer_len),
            size: GridSize::default(),
            frame: ColorGrid::default(),
        })
    }

    /// Swap the capture backend, stopping the current one
    pub fn set_audio_source(&mut self, source: Box<dyn AudioSource>) {
        self.source.stop();
        self.capture_rate = None;
        self.source = source;
    }

    /// Whether capture is running
    pub fn is_capturing(&self) -> bool {
        self.capture_rate.is_some()
    }

    /// Current bar heights in rows
    pub fn levels(&self) -> &[f64] {
        self.analyzer.levels()
    }

    fn settings(&self) -> SpectrumSettings {
        SpectrumSettings {
            frequency_range: self.params.range(self.frequency_range),
            sensitivity: self.params.range(self.sensitivity),
            decay: self.params.range(self.decay),
            log_scale: self.params.flag(self.log_scale),
        }
    }
}

impl Effect for AudioVisualizerEffect {
    fn name(&self) -> &str {
        EffectId::AudioVisualizer.as_str()
    }

    fn description(&self) -> &str {
        EffectId::AudioVisualizer.description()
    }

    fn parameters(&self) -> &Arc<ParameterSet> {
        &self.params
    }

    fn initialize(&mut self, size: GridSize, _now: Instant) -> Result<()> {
        self.size = size;
        self.frame.resize(size);
        self.analyzer.reset();
        self.feed.clear();

        self.source.stop();
        self.capture_rate = match self.source.start(self.feed.clone()) {
            Ok(0) => Some(self.config.sample_rate),
            Ok(rate) => Some(rate),
            Err(error) => {
                warn!(%error, "audio capture unavailable, rendering background only");
                None
            }
        };
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn update(&mut self, _input: &KeyboardState, _now: Instant) -> Result<()> {
        let background = self.params.color(self.background_color);
        let Some(sample_rate) = self.capture_rate else {
            self.frame.fill(background);
            return Ok(());
        };

        let settings = self.settings();
        self.feed.copy_into(&mut self.snapshot);
        let levels = self
            .analyzer
            .analyze(&self.snapshot, sample_rate, self.size, &settings)?;

        let low = self.params.color(self.low_color);
        let high = self.params.color(self.high_color);
        let GridSize { rows, cols } = self.size;
        self.frame.paint(|row, col| {
            let height = levels.get(col).copied().unwrap_or(0.0).max(0.0);
            let full = libm::floor(height) as usize;
            // Row index counted from the bottom
            let level = rows - 1 - row;
            let color = column_gradient(low, high, col, cols);
            match level.cmp(&full) {
                Ordering::Less => color,
                Ordering::Equal => lerp_color(background, color, height - full as f64),
                Ordering::Greater => background,
            }
        });
        Ok(())
    }

    fn frame(&self) -> &ColorGrid {
        &self.frame
    }

    fn cleanup(&mut self) {
        if self.capture_rate.take().is_some() {
            debug!("stopping audio capture");
        }
        self.source.stop();
        self.analyzer.reset();
        self.feed.clear();
    }
}

impl core::fmt::Debug for AudioVisualizerEffect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioVisualizerEffect")
            .field("capture_rate", &self.capture_rate)
            .field("analyzer", &self.analyzer)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
