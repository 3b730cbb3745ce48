mod audio;
mod cli;
mod config;
mod engine;
mod error;
mod render;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use audio::bands::BandAnalyzer;
use audio::capture::AudioCapture;
use audio::tap::FftTap;
use cli::{Cli, RendererKind};
use render::meters::BandMeters;
use render::spectrum::SpectrumColumns;
use render::Renderer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        for name in AudioCapture::list_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    // Config discovery: explicit --config, then resona.toml beside the
    // invocation, then the platform config dir.
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("resona.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("resona").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = config::Config::default();
    if let Some(ref path) = config_path {
        match config::load_overlay(path) {
            Ok(overlay) => {
                log::info!("Loaded config from {}", path.display());
                cfg = cfg.merged(&overlay);
            }
            Err(err) => log::warn!("Ignoring config: {:#}", err),
        }
    }
    let cfg = cfg.merged(&cli.overlay());
    cfg.audio.validate()?;

    log::info!(
        "fft_size={} ({} bins), beat_threshold={}, smoothing={:.2}, {}fps",
        cfg.audio.fft_size,
        cfg.audio.bin_count(),
        cfg.audio.beat_threshold,
        cfg.audio.smoothing,
        cfg.output.fps
    );

    let mut capture = AudioCapture::start(cli.device.as_deref())?;
    let mut tap = FftTap::new(&cfg.audio);
    let mut analyzer = BandAnalyzer::new(cfg.audio.clone())?;

    let mut renderer: Box<dyn Renderer> = match cli.renderer {
        RendererKind::Meters => Box::new(BandMeters::new()),
        RendererKind::Spectrum => Box::new(SpectrumColumns::new()),
    };

    let max_duration = cli.duration.map(Duration::from_secs_f32);
    engine::run(
        &mut capture,
        &mut tap,
        &mut analyzer,
        renderer.as_mut(),
        cfg.output.fps,
        max_duration,
    )?;

    Ok(())
}
