use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::{Arc, Mutex};

use crate::engine::SampleFeed;

// Roughly one second at 48 kHz; when the frame loop stalls, the oldest
// samples drop first.
const MAX_QUEUED_SAMPLES: usize = 48_000;

/// Live audio input: a cpal stream downmixing to mono into a shared queue
/// that the frame loop drains once per frame. The stream callback is the one
/// writer; the engine is the one reader.
pub struct AudioCapture {
    shared: Arc<Mutex<Vec<f32>>>,
    _stream: cpal::Stream,
}

impl AudioCapture {
    /// Open the named input device, or the host default.
    pub fn start(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .input_devices()
                .context("failed to enumerate input devices")?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .with_context(|| format!("input device '{}' not found", name))?,
            None => host
                .default_input_device()
                .context("no default audio input device")?,
        };

        let config = device
            .default_input_config()
            .context("no default input config for device")?;

        log::info!(
            "Capturing from {} @ {}Hz ({} ch, {:?})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        let shared = Arc::new(Mutex::new(Vec::new()));
        let channels = config.channels() as usize;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config.into(), Arc::clone(&shared), channels)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config.into(), Arc::clone(&shared), channels)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config.into(), Arc::clone(&shared), channels)?
            }
            other => anyhow::bail!("unsupported input sample format: {:?}", other),
        };

        stream.play().context("failed to start audio input stream")?;

        Ok(Self {
            shared,
            _stream: stream,
        })
    }

    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let names = host
            .input_devices()
            .context("failed to enumerate input devices")?
            .filter_map(|d| d.name().ok())
            .collect();
        Ok(names)
    }
}

impl SampleFeed for AudioCapture {
    fn drain(&mut self) -> Vec<f32> {
        match self.shared.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    writer: Arc<Mutex<Vec<f32>>>,
    channels: usize,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut queue = match writer.lock() {
                    Ok(queue) => queue,
                    Err(_) => return,
                };
                for frame in data.chunks(channels.max(1)) {
                    queue.push(mono_mix(frame));
                }
                let excess = queue.len().saturating_sub(MAX_QUEUED_SAMPLES);
                if excess > 0 {
                    queue.drain(..excess);
                }
            },
            |err| log::warn!("audio input stream error: {}", err),
            None,
        )
        .context("failed to build audio input stream")?;
    Ok(stream)
}

fn mono_mix<T>(frame: &[T]) -> f32
where
    T: Sample,
    f32: FromSample<T>,
{
    let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
    sum / frame.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_mix_averages_float_frames() {
        assert_eq!(mono_mix(&[0.5f32, -0.5]), 0.0);
        assert_eq!(mono_mix(&[0.25f32]), 0.25);
    }

    #[test]
    fn mono_mix_converts_integer_samples() {
        // i16 full scale maps to ~1.0
        let loud = mono_mix(&[i16::MAX, i16::MAX]);
        assert!((loud - 1.0).abs() < 1e-3);

        // u16 midpoint is silence
        let silent = mono_mix(&[32768u16, 32768]);
        assert!(silent.abs() < 1e-3);
    }
}
