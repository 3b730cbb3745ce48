use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ResonaError;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// A half-open range of frequency-bin indices, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BinRange {
    pub start: usize,
    pub end: usize,
}

impl BinRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self, bin_count: usize) -> bool {
        self.start < self.end && self.end <= bin_count
    }

    fn apply(&mut self, overlay: &RangeOverlay) {
        if let Some(start) = overlay.start {
            self.start = start;
        }
        if let Some(end) = overlay.end {
            self.end = end;
        }
    }
}

/// Analyzer configuration. Immutable once validated; build one by merging
/// overlays over `AnalysisConfig::default()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Spectral transform size; power of two. Bin count is `fft_size / 2`.
    pub fft_size: usize,
    /// Bass average above this value raises the beat flag.
    pub beat_threshold: f32,
    /// Temporal smoothing constant for the magnitude tap, in [0.0, 1.0).
    pub smoothing: f32,
    pub bass_range: BinRange,
    pub mid_range: BinRange,
    pub treble_range: BinRange,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            beat_threshold: default_beat_threshold(),
            smoothing: default_smoothing(),
            bass_range: default_bass_range(),
            mid_range: default_mid_range(),
            treble_range: default_treble_range(),
        }
    }
}

impl AnalysisConfig {
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Deep merge: every supplied overlay field replaces the current value,
    /// and partially supplied ranges merge field-by-field. A range overlay
    /// carrying only `start` keeps the configured `end`.
    pub fn merged(mut self, overlay: &AnalysisOverlay) -> Self {
        if let Some(fft_size) = overlay.fft_size {
            self.fft_size = fft_size;
        }
        if let Some(beat_threshold) = overlay.beat_threshold {
            self.beat_threshold = beat_threshold;
        }
        if let Some(smoothing) = overlay.smoothing {
            self.smoothing = smoothing;
        }
        if let Some(ref range) = overlay.bass_range {
            self.bass_range.apply(range);
        }
        if let Some(ref range) = overlay.mid_range {
            self.mid_range.apply(range);
        }
        if let Some(ref range) = overlay.treble_range {
            self.treble_range.apply(range);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ResonaError> {
        if !self.fft_size.is_power_of_two()
            || self.fft_size < MIN_FFT_SIZE
            || self.fft_size > MAX_FFT_SIZE
        {
            return Err(ResonaError::InvalidFftSize {
                got: self.fft_size,
                min: MIN_FFT_SIZE,
                max: MAX_FFT_SIZE,
            });
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(ResonaError::InvalidSmoothing(self.smoothing));
        }
        let bin_count = self.bin_count();
        for (band, range) in [
            ("bass", &self.bass_range),
            ("mid", &self.mid_range),
            ("treble", &self.treble_range),
        ] {
            if !range.is_valid(bin_count) {
                return Err(ResonaError::InvalidBandRange {
                    band,
                    start: range.start,
                    end: range.end,
                    bin_count,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub fps: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl OutputConfig {
    pub fn merged(mut self, overlay: &OutputOverlay) -> Self {
        if let Some(fps) = overlay.fps {
            self.fps = fps;
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub audio: AnalysisConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn merged(self, overlay: &ConfigOverlay) -> Self {
        Self {
            audio: self.audio.merged(&overlay.audio),
            output: self.output.merged(&overlay.output),
        }
    }
}

/// Partial configuration as found in a TOML file or assembled from CLI flags.
/// Every field is optional; unset fields fall through to the defaults (or to
/// an earlier overlay in the merge chain).
#[derive(Debug, Default, Deserialize)]
pub struct ConfigOverlay {
    #[serde(default)]
    pub audio: AnalysisOverlay,
    #[serde(default)]
    pub output: OutputOverlay,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisOverlay {
    pub fft_size: Option<usize>,
    pub beat_threshold: Option<f32>,
    pub smoothing: Option<f32>,
    pub bass_range: Option<RangeOverlay>,
    pub mid_range: Option<RangeOverlay>,
    pub treble_range: Option<RangeOverlay>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeOverlay {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputOverlay {
    pub fps: Option<u32>,
}

fn default_fft_size() -> usize { 512 }
fn default_beat_threshold() -> f32 { 220.0 }
fn default_smoothing() -> f32 { 0.8 }
fn default_bass_range() -> BinRange { BinRange::new(0, 10) }
fn default_mid_range() -> BinRange { BinRange::new(20, 60) }
fn default_treble_range() -> BinRange { BinRange::new(100, 180) }
fn default_fps() -> u32 { 60 }

pub fn load_overlay(path: &PathBuf) -> anyhow::Result<ConfigOverlay> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}
