//! # Delay History (Shift Buffer)
//!
//! A delay history stores the most recent `len` samples of one channel, in
//! time order: index 0 is the oldest sample, index `len - 1` the newest.
//! Unlike a ring buffer, there is no moving write head. Every block, the
//! whole history slides left by the block length and the new block is
//! written into the freed space at the end:
//!
//! ```text
//! before:  [ a b c d e f g h ]        block length L = 3
//! shift:   [ d e f g h . . . ]        oldest L samples fall off the front
//! write:   [ d e f g h x y z ]        newest block lands at the end
//! ```
//!
//! Shifting costs O(len) per block, but it keeps the indexing trivially
//! simple: "N samples ago, counted from the end of the current block" is
//! always `len - N + j` for sample `j` of the block. For a 2-second window
//! the copy is a single `memmove` per channel per block.
//!
//! ## The Echo Tail
//!
//! Before the new input lands, the freed region is filled with a decayed
//! copy of older history (the "echo tail"). Because that copy reads from the
//! history being overwritten, it reads from a snapshot taken before the shift
//! (see [`DelayHistory::snapshot_into`]). The input is then *added* on top,
//! so each block of history holds `input + alpha * (history delay ago)`:
//! a feedback delay whose repeats decay by `alpha` each time around.

use std::num::NonZeroUsize;

/// One channel's sample history for the chorus.
///
/// Allocated once in `prepare()`. None of the block operations allocate.
pub struct DelayHistory {
    /// Samples in time order, oldest first. Starts as silence.
    buffer: Vec<f32>,
}

impl DelayHistory {
    /// Create a silent history holding `len` samples.
    ///
    /// `NonZeroUsize` rules out an empty history, where "the newest sample"
    /// would not exist.
    pub fn new(len: NonZeroUsize) -> Self {
        Self {
            buffer: vec![0.0; len.get()],
        }
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Always `false`: a history holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The stored samples, oldest first.
    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    /// Copy the current contents into `echo`, so the echo tail can read
    /// old samples while the history itself is being rewritten.
    ///
    /// `echo` must be exactly as long as the history.
    pub fn snapshot_into(&self, echo: &mut [f32]) {
        echo.copy_from_slice(&self.buffer);
    }

    /// Slide the history left by `block_len` samples.
    ///
    /// Samples `[block_len, len)` move to `[0, len - block_len)`. The last
    /// `block_len` samples keep stale values until the echo tail overwrites
    /// them.
    pub fn shift(&mut self, block_len: usize) {
        if block_len >= self.buffer.len() {
            self.buffer.fill(0.0);
            return;
        }
        self.buffer.copy_within(block_len.., 0);
    }

    /// Overwrite the last `block_len` samples with `alpha` times the
    /// snapshot, starting `delay_samples` before its end.
    ///
    /// ```text
    /// tail[i] = alpha * echo[len - delay_samples + i]
    /// ```
    ///
    /// When the delay is shorter than the block, the source runs past the
    /// end of the snapshot into samples that have not been recorded yet.
    /// Those positions get silence.
    pub fn write_echo_tail(
        &mut self,
        echo: &[f32],
        delay_samples: usize,
        block_len: usize,
        alpha: f32,
    ) {
        let len = self.buffer.len();
        let block_len = block_len.min(len);
        let tail_start = len - block_len;
        let source_start = len - delay_samples.min(len);

        for (i, sample) in self.buffer[tail_start..].iter_mut().enumerate() {
            *sample = echo
                .get(source_start + i)
                .map_or(0.0, |echoed| echoed * alpha);
        }
    }

    /// Add the live input block on top of the last `input.len()` samples.
    pub fn accumulate_input(&mut self, input: &[f32]) {
        let len = self.buffer.len();
        let tail_start = len - input.len().min(len);

        for (sample, &dry) in self.buffer[tail_start..].iter_mut().zip(input) {
            *sample += dry;
        }
    }

    /// Read the sample `delay_samples` before the end of the history,
    /// moved forward by `offset`: `history[len - delay_samples + offset]`.
    ///
    /// Out-of-range positions read as silence, so no modulation extreme can
    /// index outside the buffer.
    pub fn read_back(&self, delay_samples: usize, offset: usize) -> f32 {
        self.buffer
            .len()
            .checked_sub(delay_samples)
            .and_then(|start| self.buffer.get(start + offset))
            .copied()
            .unwrap_or(0.0)
    }

    /// Back to silence, keeping the allocation.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
