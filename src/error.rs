//! # Configuration Errors
//!
//! Everything that can go wrong with the chorus goes wrong *before* audio
//! starts. `prepare()` validates the host's configuration and returns one of
//! these errors instead of entering the real-time path with a buffer that
//! could be indexed out of range. Once prepared, `process_block()` cannot
//! fail: bad parameter values are clamped, never reported.

use thiserror::Error;

/// Reasons `ModulatedDelay::prepare()` refuses a host configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Sample rate was zero, negative, NaN, or infinite.
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    /// The host announced a maximum block size of zero samples.
    #[error("maximum block size must be at least one sample")]
    EmptyBlock,

    /// The host announced zero input channels.
    #[error("at least one input channel is required")]
    NoChannels,

    /// Input and output channel counts differ. Every output channel is its
    /// own input channel plus chorus, so they must match.
    #[error("{input} input channel(s) cannot feed {output} output channel(s)")]
    ChannelMismatch {
        /// Channels on the main input.
        input: usize,
        /// Channels on the main output.
        output: usize,
    },

    /// The history window cannot hold the longest modulated delay.
    #[error("history of {history} samples cannot hold a delay of {required} samples")]
    HistoryTooShort {
        /// Samples per history row.
        history: usize,
        /// Samples needed for the maximum delay plus modulation excursion.
        required: usize,
    },

    /// A single block would not fit inside the history window, so the
    /// shift-down by one block length would be undefined.
    #[error("block of {block} samples exceeds the {history}-sample history")]
    BlockExceedsHistory {
        /// Maximum block size announced by the host.
        block: usize,
        /// Samples per history row.
        history: usize,
    },
}
