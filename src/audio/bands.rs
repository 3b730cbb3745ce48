use crate::config::{AnalysisConfig, BinRange};
use crate::error::ResonaError;

/// The analyzer's only dependency on the spectral machinery: something that
/// can copy its current frequency-domain magnitudes into a caller-owned
/// buffer. Implemented by [`crate::audio::tap::FftTap`]; tests substitute
/// fixed buffers.
pub trait SpectrumSource {
    fn bin_count(&self) -> usize;

    /// Write current magnitudes (0-255) into `out`, zero-filling any tail
    /// the source cannot cover.
    fn fill_bins(&mut self, out: &mut [u8]);
}

/// Turns a snapshot of frequency bins into band-level scalar signals.
///
/// The analyzer owns the bin buffer; [`BandAnalyzer::refresh`] is the single
/// write per frame, and all the read operations are pure `&self` views over
/// it. Before the first refresh every average reads as `0.0`, which is the
/// normal pre-playback state rather than an error.
pub struct BandAnalyzer {
    config: AnalysisConfig,
    bins: Option<Vec<u8>>,
}

impl BandAnalyzer {
    /// Validates the configuration once; the ranges are trusted from then on.
    pub fn new(config: AnalysisConfig) -> Result<Self, ResonaError> {
        config.validate()?;
        Ok(Self { config, bins: None })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Current bin snapshot, if at least one refresh has happened.
    pub fn bins(&self) -> Option<&[u8]> {
        self.bins.as_deref()
    }

    /// Copy the source's current magnitudes into the analyzer-owned buffer,
    /// allocating it (at the configured bin count) on first use.
    pub fn refresh(&mut self, source: &mut dyn SpectrumSource) {
        let bin_count = self.config.bin_count();
        if source.bin_count() != bin_count {
            log::warn!(
                "spectrum source has {} bins, analyzer expects {}",
                source.bin_count(),
                bin_count
            );
        }
        let bins = self.bins.get_or_insert_with(|| vec![0; bin_count]);
        source.fill_bins(bins);
    }

    /// Arithmetic mean of `bins[start..end)`.
    ///
    /// Returns `Ok(0.0)` when no buffer has been refreshed yet, whatever the
    /// requested range. On a live buffer a malformed range (`start >= end` or
    /// `end` past the bin count) is rejected rather than silently averaged.
    pub fn average_of(&self, range: BinRange) -> Result<f32, ResonaError> {
        let bins = match self.bins.as_deref() {
            Some(bins) => bins,
            None => return Ok(0.0),
        };
        if !range.is_valid(bins.len()) {
            return Err(ResonaError::InvalidRange {
                start: range.start,
                end: range.end,
                bin_count: bins.len(),
            });
        }
        Ok(mean(&bins[range.start..range.end]))
    }

    pub fn bass(&self) -> f32 {
        self.band(self.config.bass_range)
    }

    pub fn mid(&self) -> f32 {
        self.band(self.config.mid_range)
    }

    pub fn treble(&self) -> f32 {
        self.band(self.config.treble_range)
    }

    /// Instantaneous threshold comparison, not onset detection: true exactly
    /// when the bass average strictly exceeds the configured threshold. There
    /// is no temporal smoothing, decay, or hysteresis here, so the flag can
    /// flicker frame to frame on sustained bass.
    pub fn is_beat(&self) -> bool {
        self.bass() > self.config.beat_threshold
    }

    // Configured ranges were validated at construction, so these stay
    // infallible; a buffer shorter than expected degrades to 0.0.
    fn band(&self, range: BinRange) -> f32 {
        match self.bins.as_deref() {
            Some(bins) if range.is_valid(bins.len()) => mean(&bins[range.start..range.end]),
            _ => 0.0,
        }
    }
}

fn mean(slice: &[u8]) -> f32 {
    let sum: u32 = slice.iter().map(|&b| u32::from(b)).sum();
    sum as f32 / slice.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source returning a fixed prefix of magnitudes, zero elsewhere.
    struct FixedSource {
        bins: Vec<u8>,
    }

    impl FixedSource {
        fn new(bins: &[u8]) -> Self {
            Self {
                bins: bins.to_vec(),
            }
        }
    }

    impl SpectrumSource for FixedSource {
        fn bin_count(&self) -> usize {
            256
        }

        fn fill_bins(&mut self, out: &mut [u8]) {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = self.bins.get(i).copied().unwrap_or(0);
            }
        }
    }

    fn analyzer() -> BandAnalyzer {
        BandAnalyzer::new(AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn average_is_exact_mean_of_slice() {
        let mut a = analyzer();
        a.refresh(&mut FixedSource::new(&[0, 10, 20, 30]));
        let avg = a.average_of(BinRange::new(1, 3)).unwrap();
        assert_eq!(avg, 15.0);
    }

    #[test]
    fn average_is_zero_before_any_refresh() {
        let a = analyzer();
        assert_eq!(a.average_of(BinRange::new(0, 10)).unwrap(), 0.0);
        // Pre-buffer state wins even for ranges that would be malformed.
        assert_eq!(a.average_of(BinRange::new(9000, 9001)).unwrap(), 0.0);
        assert_eq!(a.bass(), 0.0);
        assert_eq!(a.mid(), 0.0);
        assert_eq!(a.treble(), 0.0);
        assert!(!a.is_beat());
    }

    #[test]
    fn malformed_range_is_rejected_on_live_buffer() {
        let mut a = analyzer();
        a.refresh(&mut FixedSource::new(&[1, 2, 3]));
        assert!(matches!(
            a.average_of(BinRange::new(3, 3)),
            Err(ResonaError::InvalidRange { start: 3, end: 3, .. })
        ));
        assert!(matches!(
            a.average_of(BinRange::new(5, 2)),
            Err(ResonaError::InvalidRange { .. })
        ));
        assert!(matches!(
            a.average_of(BinRange::new(0, 257)),
            Err(ResonaError::InvalidRange { bin_count: 256, .. })
        ));
    }

    #[test]
    fn saturated_bins_read_full_scale_and_beat() {
        let mut a = analyzer();
        a.refresh(&mut FixedSource::new(&[255; 256]));
        assert_eq!(a.bass(), 255.0);
        assert_eq!(a.mid(), 255.0);
        assert_eq!(a.treble(), 255.0);
        // 255 > default threshold 220
        assert!(a.is_beat());
    }

    #[test]
    fn silent_bins_read_zero_and_no_beat() {
        let mut a = analyzer();
        a.refresh(&mut FixedSource::new(&[0; 256]));
        assert_eq!(a.bass(), 0.0);
        assert_eq!(a.mid(), 0.0);
        assert_eq!(a.treble(), 0.0);
        assert!(!a.is_beat());
    }

    #[test]
    fn beat_requires_strictly_above_threshold() {
        let mut cfg = AnalysisConfig::default();
        cfg.beat_threshold = 220.0;
        let mut a = BandAnalyzer::new(cfg).unwrap();

        a.refresh(&mut FixedSource::new(&[220; 256]));
        assert_eq!(a.bass(), 220.0);
        assert!(!a.is_beat());

        a.refresh(&mut FixedSource::new(&[221; 256]));
        assert!(a.is_beat());
    }

    #[test]
    fn refresh_overwrites_previous_snapshot() {
        let mut a = analyzer();
        a.refresh(&mut FixedSource::new(&[200; 256]));
        assert_eq!(a.bass(), 200.0);
        a.refresh(&mut FixedSource::new(&[50; 256]));
        assert_eq!(a.bass(), 50.0);
    }

    #[test]
    fn rejects_invalid_config_at_construction() {
        let cfg = AnalysisConfig {
            fft_size: 300,
            ..Default::default()
        };
        assert!(BandAnalyzer::new(cfg).is_err());
    }
}
