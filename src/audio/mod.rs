//! Audio capture plumbing for the spectrum visualizer.
//!
//! Capture runs on a callback thread owned by the backend. Samples land in
//! an [`AudioRing`] behind its own mutex; the scheduler thread copies a
//! snapshot out under the lock and runs the FFT after releasing it.

#[cfg(feature = "cpal")]
mod cpal_source;
mod spectrum;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

#[cfg(feature = "cpal")]
pub use cpal_source::CpalLoopbackSource;
pub use spectrum::{
    FULL_SCALE_POWER, SpectrumAnalyzer, SpectrumSettings, apply_log_scale, bins_for_range,
    bucket_columns, scale_to_rows,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of samples kept for analysis.
pub const DEFAULT_BUFFER_LEN: usize = 4800;

/// Sample rate assumed until a backend reports its own.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Capture buffer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Samples kept for each analysis pass
    pub buffer_len: usize,
    /// Assumed until the capture backend reports its own
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Fixed-length rolling PCM buffer. Pushing past capacity drops the oldest
/// samples.
#[derive(Debug, Clone)]
pub struct AudioRing {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl AudioRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.capacity);
        for &sample in &samples[skip..] {
            if self.samples.len() == self.capacity {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
        }
    }

    /// Copy the buffered samples, oldest first
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Shared handle to an [`AudioRing`] given to capture callbacks.
#[derive(Debug, Clone)]
pub struct AudioFeed {
    ring: Arc<Mutex<AudioRing>>,
}

impl AudioFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(Mutex::new(AudioRing::new(capacity))),
        }
    }

    /// Append mono samples in `[-1, 1]`
    pub fn push_samples(&self, samples: &[f32]) {
        self.lock().push(samples);
    }

    /// Append the first channel of interleaved float frames
    pub fn push_interleaved_f32(&self, data: &[f32], channels: usize) {
        let mono: Vec<f32> = data.iter().step_by(channels.max(1)).copied().collect();
        self.push_samples(&mono);
    }

    /// Append the first channel of interleaved 16-bit frames
    pub fn push_interleaved_i16(&self, data: &[i16], channels: usize) {
        let mono: Vec<f32> = data
            .iter()
            .step_by(channels.max(1))
            .map(|&sample| f32::from(sample) / 32_768.0)
            .collect();
        self.push_samples(&mono);
    }

    /// Copy a snapshot of the buffered samples
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        self.lock().copy_into(out);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, AudioRing> {
        self.ring
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// System audio capture backend.
pub trait AudioSource: Send {
    /// Start delivering samples into `feed`, returning the sample rate
    fn start(&mut self, feed: AudioFeed) -> Result<u32>;

    /// Stop delivering samples. Safe to call when not started.
    fn stop(&mut self);
}

/// Backend used when no capture support is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAudioSource;

impl AudioSource for UnavailableAudioSource {
    fn start(&mut self, _feed: AudioFeed) -> Result<u32> {
        Err(Error::Audio("no capture backend available".to_owned()))
    }

    fn stop(&mut self) {}
}

/// The platform default capture backend
pub fn default_audio_source() -> Box<dyn AudioSource> {
    #[cfg(feature = "cpal")]
    {
        Box::new(CpalLoopbackSource::new())
    }
    #[cfg(not(feature = "cpal"))]
    {
        Box::new(UnavailableAudioSource)
    }
}
