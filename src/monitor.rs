//! # Monitoring Tap
//!
//! A visualizer (an oscilloscope view in an editor, a meter, a test) wants
//! to see the finished output. The audio thread must not wait for it, so the
//! engine side only ever *offers* blocks through the [`MonitorSink`] trait
//! and never learns whether anyone took them.
//!
//! [`scope()`] builds the standard sink: a lock-free ring buffer from
//! `ringbuf`. The audio thread pushes samples into the [`ScopeTap`] end; a
//! GUI thread pulls them from the [`ScopeReader`] end at its own pace and
//! folds them into min/max columns, one column per
//! [`DEFAULT_SAMPLES_PER_COLUMN`] samples, ready to draw as a waveform.
//!
//! When the reader falls behind and the ring fills up, the newest samples
//! are dropped. The audio is never affected.

use ringbuf::{traits::*, HeapRb};

/// Samples folded into one scope column.
pub const DEFAULT_SAMPLES_PER_COLUMN: usize = 512;

/// Receives each finished output block.
///
/// Implementations run on the audio thread and must not block or allocate.
pub trait MonitorSink: Send {
    /// Offer a finished block, one slice per channel.
    fn accept_block(&mut self, channels: &[&mut [f32]]);
}

/// Create a connected tap/reader pair holding up to `capacity` samples.
pub fn scope(capacity: usize, samples_per_column: usize) -> (ScopeTap, ScopeReader) {
    let (producer, consumer) = HeapRb::<f32>::new(capacity.max(1)).split();

    (
        ScopeTap {
            producer,
            dropped: 0,
        },
        ScopeReader {
            consumer,
            samples_per_column: samples_per_column.max(1),
            pending: None,
            pending_len: 0,
        },
    )
}

/// Audio-thread end of the scope. Forwards the first channel of each block.
pub struct ScopeTap {
    producer: ringbuf::HeapProd<f32>,
    dropped: usize,
}

impl ScopeTap {
    /// Samples discarded because the ring was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl MonitorSink for ScopeTap {
    fn accept_block(&mut self, channels: &[&mut [f32]]) {
        let Some(first) = channels.first() else {
            return;
        };
        let pushed = self.producer.push_slice(first);
        self.dropped += first.len() - pushed;
    }
}

/// The lowest and highest sample within one column's worth of audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeColumn {
    pub min: f32,
    pub max: f32,
}

/// GUI-thread end of the scope.
pub struct ScopeReader {
    consumer: ringbuf::HeapCons<f32>,
    samples_per_column: usize,
    /// Column still being filled, carried over between drains.
    pending: Option<ScopeColumn>,
    pending_len: usize,
}

impl ScopeReader {
    /// Samples waiting in the ring.
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Pull every waiting sample and append each completed column to
    /// `columns`. A partial column is kept until enough samples arrive.
    pub fn drain_columns(&mut self, columns: &mut Vec<ScopeColumn>) {
        while let Some(sample) = self.consumer.try_pop() {
            let column = self.pending.get_or_insert(ScopeColumn {
                min: sample,
                max: sample,
            });
            column.min = column.min.min(sample);
            column.max = column.max.max(sample);
            self.pending_len += 1;

            if self.pending_len == self.samples_per_column {
                columns.push(*column);
                self.pending = None;
                self.pending_len = 0;
            }
        }
    }
}
