use anyhow::Result;
use std::time::{Duration, Instant};

use crate::audio::bands::BandAnalyzer;
use crate::audio::tap::FftTap;
use crate::render::{Control, FrameSignals, Renderer};

/// Source of raw mono samples, drained once per frame. Implemented by
/// [`crate::audio::capture::AudioCapture`]; tests substitute synthetic feeds.
pub trait SampleFeed {
    fn drain(&mut self) -> Vec<f32>;
}

/// Fixed-cadence frame loop: drain the feed, refresh the tap and analyzer,
/// hand the frame's signals to the renderer. Everything inside one frame is
/// synchronous; the only cross-thread handoff is the capture queue.
///
/// Runs until the renderer returns [`Control::Stop`] or `max_duration`
/// elapses. Returns the number of frames completed before the stop; the
/// frame on which the renderer requests the stop is not counted.
pub fn run(
    feed: &mut dyn SampleFeed,
    tap: &mut FftTap,
    analyzer: &mut BandAnalyzer,
    renderer: &mut dyn Renderer,
    fps: u32,
    max_duration: Option<Duration>,
) -> Result<u64> {
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    renderer.setup()?;

    let started = Instant::now();
    let mut next_frame = Instant::now();
    let mut frames: u64 = 0;

    loop {
        let elapsed = started.elapsed();
        if let Some(limit) = max_duration {
            if elapsed >= limit {
                break;
            }
        }

        let samples = feed.drain();
        tap.push(&samples);
        analyzer.refresh(tap);

        let signals = FrameSignals {
            time: elapsed.as_secs_f32(),
            bass: analyzer.bass(),
            mid: analyzer.mid(),
            treble: analyzer.treble(),
            beat: analyzer.is_beat(),
            bins: analyzer.bins().unwrap_or(&[]),
        };

        if let Control::Stop = renderer.draw(&signals)? {
            break;
        }
        frames += 1;

        next_frame += frame_interval;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else {
            // Fell behind; don't try to catch up with a burst of frames.
            next_frame = now;
        }
    }

    log::info!(
        "Rendered {} frames in {:.1}s",
        frames,
        started.elapsed().as_secs_f32()
    );
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    struct SilentFeed;

    impl SampleFeed for SilentFeed {
        fn drain(&mut self) -> Vec<f32> {
            vec![0.0; 512]
        }
    }

    struct CountingRenderer {
        draws: u64,
        stop_after: Option<u64>,
        saw_bins: bool,
    }

    impl Renderer for CountingRenderer {
        fn draw(&mut self, signals: &FrameSignals) -> Result<Control> {
            self.draws += 1;
            self.saw_bins = self.saw_bins || !signals.bins.is_empty();
            assert!(signals.bass >= 0.0 && signals.bass <= 255.0);
            match self.stop_after {
                Some(n) if self.draws >= n => Ok(Control::Stop),
                _ => Ok(Control::Continue),
            }
        }
    }

    fn analyzer() -> BandAnalyzer {
        BandAnalyzer::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn renderer_stop_ends_the_loop() {
        let mut feed = SilentFeed;
        let cfg = AnalysisConfig::default();
        let mut tap = FftTap::new(&cfg);
        let mut analyzer = analyzer();
        let mut renderer = CountingRenderer {
            draws: 0,
            stop_after: Some(5),
            saw_bins: false,
        };

        let frames = run(&mut feed, &mut tap, &mut analyzer, &mut renderer, 1000, None).unwrap();
        // The stopping frame is not counted as drawn.
        assert_eq!(frames, 4);
        assert_eq!(renderer.draws, 5);
        // The analyzer was refreshed before the first draw.
        assert!(renderer.saw_bins);
    }

    #[test]
    fn duration_limit_ends_the_loop() {
        let mut feed = SilentFeed;
        let cfg = AnalysisConfig::default();
        let mut tap = FftTap::new(&cfg);
        let mut analyzer = analyzer();
        let mut renderer = CountingRenderer {
            draws: 0,
            stop_after: None,
            saw_bins: false,
        };

        let frames = run(
            &mut feed,
            &mut tap,
            &mut analyzer,
            &mut renderer,
            200,
            Some(Duration::from_millis(50)),
        )
        .unwrap();
        assert!(frames >= 1);
        assert_eq!(frames, renderer.draws);
    }
}
