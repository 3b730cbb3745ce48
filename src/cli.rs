use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{AnalysisOverlay, ConfigOverlay, OutputOverlay};

#[derive(Parser, Debug)]
#[command(name = "resona", about = "Audio-reactive terminal visualizer")]
pub struct Cli {
    /// Config file (TOML); defaults to ./resona.toml or the platform config dir
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// View driven by the band signals
    #[arg(short, long, value_enum, default_value = "meters")]
    pub renderer: RendererKind,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Spectral transform size (power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Bass average above which the beat flag raises
    #[arg(long)]
    pub beat_threshold: Option<f32>,

    /// Temporal smoothing constant (0.0 inclusive to 1.0 exclusive)
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Capture device name (see --list-devices)
    #[arg(long)]
    pub device: Option<String>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f32>,

    /// List capture devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RendererKind {
    Meters,
    Spectrum,
}

impl Cli {
    /// CLI flags as a config overlay, merged after the file overlay so
    /// explicit flags win.
    pub fn overlay(&self) -> ConfigOverlay {
        ConfigOverlay {
            audio: AnalysisOverlay {
                fft_size: self.fft_size,
                beat_threshold: self.beat_threshold,
                smoothing: self.smoothing,
                ..Default::default()
            },
            output: OutputOverlay { fps: self.fps },
        }
    }
}
