use std::{fmt, sync::Arc};

use realfft::{RealFftPlanner, RealToComplex, num_complex::Complex32};

use crate::{error::Result, grid::GridSize};

/// Spectral magnitude that fills a column at 100% sensitivity.
///
/// Magnitudes are normalized so a full-scale sine reads about 1.0.
pub const FULL_SCALE_POWER: f64 = 0.25;

/// Tunables applied on every analysis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSettings {
    /// Highest frequency shown, in Hz
    pub frequency_range: f64,
    /// Percentage; higher values make quieter audio fill more rows
    pub sensitivity: f64,
    /// Fall speed; column heights drop by `decay / 10` rows per tick
    pub decay: f64,
    /// Boost higher columns to compensate for bass dominance
    pub log_scale: bool,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            frequency_range: 6_000.0,
            sensitivity: 100.0,
            decay: 50.0,
            log_scale: true,
        }
    }
}

impl SpectrumSettings {
    fn max_power(&self) -> f64 {
        FULL_SCALE_POWER * (100.0 / self.sensitivity.max(f64::EPSILON))
    }
}

/// Turns a PCM snapshot into per-column bar heights.
pub struct SpectrumAnalyzer {
    planner: RealFftPlanner<f32>,
    fft: Option<FftResources>,
    magnitudes: Vec<f32>,
    levels: Vec<f64>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            fft: None,
            magnitudes: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// Forget the decayed column heights
    pub fn reset(&mut self) {
        self.levels.clear();
    }

    /// Column heights from the last analysis, in rows
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Magnitude spectrum of `samples`, zero-padded to a power of two.
    ///
    /// Bin `k` covers `k * sample_rate / fft_len(samples.len())` Hz.
    #[allow(clippy::cast_precision_loss)]
    pub fn magnitudes(&mut self, samples: &[f32]) -> Result<&[f32]> {
        self.magnitudes.clear();
        if samples.is_empty() {
            return Ok(&self.magnitudes);
        }

        let size = fft_len(samples.len());
        let fft = prepare_fft(&mut self.planner, &mut self.fft, size);
        fft.input[..samples.len()].copy_from_slice(samples);
        fft.input[samples.len()..].fill(0.0);
        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let norm = 2.0 / samples.len() as f32;
        self.magnitudes
            .extend(fft.spectrum.iter().map(|bin| bin.norm() * norm));
        Ok(&self.magnitudes)
    }

    /// Run one analysis pass and update the decayed column heights.
    ///
    /// Heights rise instantly and fall linearly, never below zero.
    pub fn analyze(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        size: GridSize,
        settings: &SpectrumSettings,
    ) -> Result<&[f64]> {
        if self.levels.len() != size.cols {
            self.levels = vec![0.0; size.cols];
        }

        self.magnitudes(samples)?;
        let bins = bins_for_range(
            settings.frequency_range,
            sample_rate,
            fft_len(samples.len()),
            self.magnitudes.len(),
        );
        let mut values = bucket_columns(&self.magnitudes, bins, size.cols);
        if settings.log_scale {
            apply_log_scale(&mut values);
        }
        scale_to_rows(&mut values, settings.max_power(), size.rows);

        let decay_rate = settings.decay / 10.0;
        for (level, value) in self.levels.iter_mut().zip(values) {
            if value >= *level {
                *level = value;
            } else {
                *level = (*level - decay_rate).max(0.0);
            }
        }
        Ok(&self.levels)
    }
}

impl fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("fft", &self.fft)
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

/// Number of leading bins that cover `frequency_range` Hz.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn bins_for_range(
    frequency_range: f64,
    sample_rate: u32,
    fft_len: usize,
    available: usize,
) -> usize {
    if sample_rate == 0 || fft_len == 0 {
        return available;
    }
    let bin_hz = f64::from(sample_rate) / fft_len as f64;
    let bins = libm::floor(frequency_range.max(0.0) / bin_hz) as usize;
    bins.min(available)
}

/// Split the first `bins` magnitudes into `columns` equal buckets.
///
/// Each bucket value is `0.75 * peak + 0.25 * mean`. Buckets past the
/// available bins read zero.
#[allow(clippy::cast_precision_loss)]
pub fn bucket_columns(magnitudes: &[f32], bins: usize, columns: usize) -> Vec<f64> {
    let bins = bins.min(magnitudes.len());
    let width = (bins / columns.max(1)).max(1);

    (0..columns)
        .map(|column| {
            let start = width * column;
            let end = (start + width).min(bins);
            if start >= end {
                return 0.0;
            }
            let bucket = &magnitudes[start..end];
            let peak = bucket.iter().copied().fold(0.0_f32, f32::max);
            let mean = bucket.iter().sum::<f32>() / bucket.len() as f32;
            (3.0 * f64::from(peak) + f64::from(mean)) / 4.0
        })
        .collect()
}

/// Multiply column `i` by `2 * log10(3i + 1) + 1`
#[allow(clippy::cast_precision_loss)]
pub fn apply_log_scale(values: &mut [f64]) {
    for (i, value) in values.iter_mut().enumerate() {
        *value *= 2.0 * libm::log10(3.0 * i as f64 + 1.0) + 1.0;
    }
}

/// Map magnitudes onto `[0, rows]` where `max_power` fills every row
#[allow(clippy::cast_precision_loss)]
pub fn scale_to_rows(values: &mut [f64], max_power: f64, rows: usize) {
    let rows = rows as f64;
    let factor = rows / max_power.max(f64::EPSILON);
    for value in values {
        *value = (*value * factor).clamp(0.0, rows);
    }
}

fn fft_len(samples: usize) -> usize {
    samples.next_power_of_two().max(2)
}

fn prepare_fft<'a>(
    planner: &mut RealFftPlanner<f32>,
    slot: &'a mut Option<FftResources>,
    size: usize,
) -> &'a mut FftResources {
    if slot.as_ref().is_some_and(|fft| fft.size != size) {
        *slot = None;
    }
    slot.get_or_insert_with(|| {
        let plan = planner.plan_fft_forward(size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        FftResources {
            size,
            plan,
            scratch,
            spectrum,
            input,
        }
    })
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}
