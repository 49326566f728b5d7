//! # Modulated Delay Engine
//!
//! The chorus engine ties the pieces together. Once per audio block, for
//! each channel, it:
//!
//! 1. **Snapshots** the channel's history into the echo scratch buffer.
//! 2. **Shifts** the history left by one block length.
//! 3. **Writes the echo tail**: `alpha` times the history from one delay
//!    ago, taken from the snapshot, into the freed space at the end.
//! 4. **Accumulates** the live input on top of that tail.
//! 5. **Reads back** a modulated delay from the history and adds it onto
//!    each output sample (dry signal at unity gain, plus the wet echo).
//!
//! After all channels, the modulation clock advances by the block length and
//! wraps at the LFO period.
//!
//! ```text
//!              ┌──────────── history (2 s) ─────────────┬─ block ─┐
//!  snapshot →  │ old samples, shifted left by L         │ α·echo  │ + input
//!              └───────────────────────┬────────────────┴─────────┘
//!                                      │ read at len − mdelay + j
//!                                      ▼
//!  output[j] = input[j] + history[len − round(mdelay·sr) + j]
//! ```
//!
//! ## Real-Time Rules
//!
//! `process_block()` runs on the audio thread. It only does arithmetic and
//! reads/writes inside buffers allocated by `prepare()`: no allocation, no
//! locks, no I/O, no error path. Anything that could fail is rejected by
//! `prepare()` before audio starts.

use std::num::NonZeroUsize;
use std::ops::Range;

use super::delay_history::DelayHistory;
use super::modulation::{
    ModulationClock, ModulationParams, DEPTH_SCALE, MAX_DELAY_SECONDS, MAX_DEPTH,
};
use crate::error::ConfigError;

/// Default history window: twice the longest base delay.
///
/// The longest read is `MAX_DELAY_SECONDS` plus the modulation excursion
/// (`MAX_DEPTH * DEPTH_SCALE`), about 1.01 s, so 2 s leaves room for large
/// host blocks as well.
pub const HISTORY_SECONDS: f32 = 2.0 * MAX_DELAY_SECONDS;

/// Samples needed to hold the longest modulated delay at `sample_rate`.
fn max_delay_samples(sample_rate: f32) -> usize {
    let seconds = f64::from(MAX_DELAY_SECONDS) + f64::from(MAX_DEPTH) * f64::from(DEPTH_SCALE);
    (seconds * f64::from(sample_rate)).ceil() as usize
}

/// The chorus engine: per-channel delay histories plus the shared
/// modulation clock.
///
/// Lifecycle:
///
/// - [`prepare()`](Self::prepare) allocates and zeroes everything. Call it
///   whenever the sample rate, maximum block size, or channel count changes.
/// - [`process_block()`](Self::process_block) runs once per audio block.
/// - [`reset()`](Self::reset) silences the histories without reallocating.
/// - [`release()`](Self::release) frees the buffers. Until the next
///   `prepare()`, processing passes audio through untouched.
pub struct ModulatedDelay {
    /// Length of the history window in seconds.
    history_seconds: f32,

    /// Sample rate from the last successful `prepare()`.
    sample_rate: f32,

    /// Largest block the host promised to send. Longer blocks are processed
    /// in chunks of this size.
    max_block: usize,

    /// `max_block / sample_rate`. Kept for hosts that want to report it.
    seconds_per_block: f32,

    /// One history per input channel.
    histories: Vec<DelayHistory>,

    /// Snapshot of one channel's history taken before it is rewritten.
    /// Each channel only reads its own past, so a single row is refilled
    /// per channel.
    echo: Vec<f32>,

    /// LFO sample counter, shared by all channels.
    clock: ModulationClock,
}

impl Default for ModulatedDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulatedDelay {
    /// An unprepared engine with the default [`HISTORY_SECONDS`] window.
    pub fn new() -> Self {
        Self::with_history_seconds(HISTORY_SECONDS)
    }

    /// An unprepared engine with a custom history window.
    ///
    /// `prepare()` rejects windows too short for the longest modulated delay.
    pub fn with_history_seconds(history_seconds: f32) -> Self {
        Self {
            history_seconds,
            sample_rate: 0.0,
            max_block: 0,
            seconds_per_block: 0.0,
            histories: Vec::new(),
            echo: Vec::new(),
            clock: ModulationClock::new(),
        }
    }

    /// Allocate silent histories for `channels` channels at `sample_rate`.
    ///
    /// On error the engine is left unprepared, so a bad configuration can
    /// never reach the audio path.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        max_block: usize,
        channels: usize,
    ) -> Result<(), ConfigError> {
        self.release();

        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if max_block == 0 {
            return Err(ConfigError::EmptyBlock);
        }
        if channels == 0 {
            return Err(ConfigError::NoChannels);
        }

        let history_len =
            (f64::from(self.history_seconds) * f64::from(sample_rate)).round() as usize;
        let required = max_delay_samples(sample_rate);
        if history_len < required {
            return Err(ConfigError::HistoryTooShort {
                history: history_len,
                required,
            });
        }
        if max_block > history_len {
            return Err(ConfigError::BlockExceedsHistory {
                block: max_block,
                history: history_len,
            });
        }
        let len = NonZeroUsize::new(history_len).ok_or(ConfigError::HistoryTooShort {
            history: history_len,
            required,
        })?;

        self.sample_rate = sample_rate;
        self.max_block = max_block;
        self.seconds_per_block = max_block as f32 / sample_rate;
        self.histories = (0..channels).map(|_| DelayHistory::new(len)).collect();
        self.echo = vec![0.0; history_len];
        self.clock.reset();

        Ok(())
    }

    /// Whether `prepare()` has succeeded since the last `release()`.
    pub fn is_prepared(&self) -> bool {
        !self.histories.is_empty()
    }

    /// Sample rate of the current preparation.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Duration of the largest host block, in seconds.
    pub fn seconds_per_block(&self) -> f32 {
        self.seconds_per_block
    }

    /// Number of prepared channels.
    pub fn channels(&self) -> usize {
        self.histories.len()
    }

    /// Current LFO sample counter.
    pub fn time(&self) -> usize {
        self.clock.time()
    }

    /// One channel's history, oldest sample first.
    pub fn history(&self, channel: usize) -> Option<&[f32]> {
        self.histories.get(channel).map(DelayHistory::as_slice)
    }

    /// Process one block in place: every channel slice arrives holding the
    /// live input and leaves holding input plus chorus.
    ///
    /// `params` is the snapshot for the whole block. Out-of-range values are
    /// clamped. The channel count must match `prepare()`; channels beyond
    /// the prepared count are left untouched.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], params: ModulationParams) {
        if !self.is_prepared() {
            return;
        }
        let Some(block_len) = channels.first().map(|c| c.len()) else {
            return;
        };
        let params = params.sanitized();

        // Hosts occasionally send more than the announced maximum. The
        // history only guarantees room for `max_block` per shift.
        let mut start = 0;
        while start < block_len {
            let end = (start + self.max_block).min(block_len);
            self.process_chunk(channels, start..end, &params);
            start = end;
        }
    }

    fn process_chunk(
        &mut self,
        channels: &mut [&mut [f32]],
        range: Range<usize>,
        params: &ModulationParams,
    ) {
        let sample_rate = self.sample_rate;
        let chunk_len = range.len();
        let delay_samples = params.delay_samples(sample_rate);

        for (channel, history) in channels.iter_mut().zip(self.histories.iter_mut()) {
            let Some(samples) = channel.get_mut(range.clone()) else {
                continue;
            };

            // Steps 1-4: rebuild the history for this block.
            history.snapshot_into(&mut self.echo);
            history.shift(chunk_len);
            history.write_echo_tail(&self.echo, delay_samples, chunk_len, params.alpha);
            history.accumulate_input(samples);

            // Step 5: add the modulated read-back onto the dry signal.
            for (j, sample) in samples.iter_mut().enumerate() {
                let mdelay = params.modulated_delay_seconds(self.clock.at(j), sample_rate)
                    * f64::from(sample_rate);

                // Reads within the current block would land on samples that
                // are still being assembled, so short delays are skipped.
                if mdelay > chunk_len as f64 {
                    let back = mdelay.round() as usize;
                    debug_assert!(
                        back <= history.len() && back > j,
                        "modulated read {back} samples back at offset {j} leaves the {}-sample history",
                        history.len()
                    );
                    *sample += history.read_back(back, j);
                }
            }
        }

        // Step 6: one clock step per sample position, shared by all channels.
        self.clock.advance(chunk_len, params.period_samples(sample_rate));
    }

    /// Silence the histories and rewind the LFO, keeping the allocations.
    pub fn reset(&mut self) {
        for history in &mut self.histories {
            history.clear();
        }
        self.echo.fill(0.0);
        self.clock.reset();
    }

    /// Free the histories and scratch buffer.
    pub fn release(&mut self) {
        self.histories = Vec::new();
        self.echo = Vec::new();
    }

    /// How many samples the echoes stay audible after the input stops.
    ///
    /// One read can reach back as far as the base delay plus the LFO
    /// excursion, so that span is the length of one repeat. Each trip
    /// around the feedback loop scales the echo by `alpha`, so it takes
    /// `n = log(0.001) / log(alpha)` repeats to fall below -60 dB. Returns
    /// `None` when `alpha` is 1 and the echoes never decay.
    pub fn tail_samples(&self, params: ModulationParams) -> Option<u32> {
        let params = params.sanitized();
        let excursion = (f64::from(params.depth)
            * f64::from(DEPTH_SCALE)
            * f64::from(self.sample_rate))
        .ceil() as usize;
        let read_span = (params.delay_samples(self.sample_rate) + excursion) as f32;

        if params.alpha >= 1.0 {
            None
        } else if params.alpha > 0.001 {
            let repeats = -3.0 / params.alpha.log10(); // log10(0.001) = -3
            Some((repeats * read_span).max(read_span) as u32)
        } else {
            Some(read_span as u32)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
