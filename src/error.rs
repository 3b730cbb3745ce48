use thiserror::Error;

/// Typed errors for the analyzer core and its configuration.
///
/// Application-level plumbing (device setup, terminal I/O) uses `anyhow`
/// and wraps these where context helps.
#[derive(Error, Debug)]
pub enum ResonaError {
    /// A band range that is empty or reaches past the end of the bin buffer.
    #[error("invalid bin range {start}..{end} (bin count {bin_count})")]
    InvalidRange {
        start: usize,
        end: usize,
        bin_count: usize,
    },

    #[error("fft_size must be a power of two in {min}..={max}, got {got}")]
    InvalidFftSize { got: usize, min: usize, max: usize },

    #[error("smoothing must be in [0.0, 1.0), got {0}")]
    InvalidSmoothing(f32),

    #[error("{band} range {start}..{end} is not a valid range over {bin_count} bins")]
    InvalidBandRange {
        band: &'static str,
        start: usize,
        end: usize,
        bin_count: usize,
    },
}
