use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::bands::SpectrumSource;
use crate::config::AnalysisConfig;

// Magnitudes below MIN_DB read as byte 0, above MAX_DB saturate at 255.
// Same window the browser analyser facility uses by default, so the
// documented beat threshold of 220 keeps its meaning.
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Windowed FFT over the most recent `fft_size` samples, with the magnitudes
/// smoothed over time and mapped onto 0-255 bytes.
///
/// This is the "read current magnitudes into my buffer" half of the system:
/// the engine pushes raw samples in once per frame, and the band analyzer
/// pulls bytes out through [`SpectrumSource`]. All scratch space is
/// pre-allocated; `fill_bins` does no allocation.
pub struct FftTap {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    smoothing: f32,
    window: Vec<f32>,
    samples: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl FftTap {
    pub fn new(config: &AnalysisConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft,
            fft_size,
            smoothing: config.smoothing,
            window: hann_window(fft_size),
            samples: Vec::with_capacity(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    /// Append mono samples, keeping only the latest `fft_size` as the
    /// analysis window. Fewer than `fft_size` pushed so far is fine; the
    /// transform zero-pads.
    pub fn push(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
        let excess = self.samples.len().saturating_sub(self.fft_size);
        if excess > 0 {
            self.samples.drain(..excess);
        }
    }
}

impl SpectrumSource for FftTap {
    fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    fn fill_bins(&mut self, out: &mut [u8]) {
        for i in 0..self.fft_size {
            let sample = self.samples.get(i).copied().unwrap_or(0.0);
            self.scratch[i] = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        for k in 0..self.bin_count() {
            let magnitude = self.scratch[k].norm() * norm;
            self.smoothed[k] =
                self.smoothing * self.smoothed[k] + (1.0 - self.smoothing) * magnitude;

            let db = 20.0 * self.smoothed[k].max(f32::MIN_POSITIVE).log10();
            let scaled = 255.0 * (db - MIN_DB) / (MAX_DB - MIN_DB);
            if let Some(slot) = out.get_mut(k) {
                *slot = scaled.clamp(0.0, 255.0) as u8;
            }
        }
        for slot in out.iter_mut().skip(self.bin_count()) {
            *slot = 0;
        }
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}
