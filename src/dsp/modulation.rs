//! # Delay Modulation
//!
//! A chorus is a delay whose delay *time* keeps moving. Here the movement is
//! a slow sine wave (an LFO, "low-frequency oscillator") added on top of the
//! base delay:
//!
//! ```text
//! mdelay(t) = delay + depth * DEPTH_SCALE * sin(2π / period / sample_rate * t)
//! ```
//!
//! Where `t` is a sample counter. With `period = 2 s` at 44100 Hz, the sine
//! completes one cycle every 88200 samples, so the read head sweeps forward
//! and back around the base delay once every two seconds. Reading a buffer
//! at a moving position is what produces the slight pitch wobble that makes
//! one voice sound like several.
//!
//! `depth` is a fraction in `[0, 1]` scaled by [`DEPTH_SCALE`] (1/100), so
//! the largest excursion is ±10 ms. Larger swings stop sounding like chorus
//! and start sounding like vibrato.

use std::f64::consts::TAU;

/// Longest base delay the engine supports, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 1.0;

/// Largest depth fraction accepted from the host.
pub const MAX_DEPTH: f32 = 1.0;

/// Converts the depth fraction into seconds of delay excursion.
pub const DEPTH_SCALE: f32 = 0.01;

/// Longest modulation period, in seconds.
pub const MAX_PERIOD_SECONDS: f32 = 5.0;

/// Shortest modulation period. The period divides the LFO phase, so zero
/// must never reach the math.
pub const MIN_PERIOD_SECONDS: f32 = 0.01;

/// The parameter values the engine uses for one block.
///
/// This is a plain copy of the host's knobs, taken once at the start of a
/// block. The engine never sees a plugin-framework parameter type, so it can
/// be driven by nih-plug, a test, or any other host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParams {
    /// Base delay in seconds, `[0, MAX_DELAY_SECONDS]`.
    pub delay_seconds: f32,
    /// Decay coefficient applied to the echo tail, `[0, 1]`.
    pub alpha: f32,
    /// LFO period in seconds, `[MIN_PERIOD_SECONDS, MAX_PERIOD_SECONDS]`.
    pub period_seconds: f32,
    /// Depth fraction, `[0, MAX_DEPTH]`, scaled by [`DEPTH_SCALE`].
    pub depth: f32,
}

impl Default for ModulationParams {
    fn default() -> Self {
        Self {
            delay_seconds: 0.1,
            alpha: 0.7,
            period_seconds: 2.0,
            depth: 0.1,
        }
    }
}

impl ModulationParams {
    /// Clamp every field into its valid range.
    ///
    /// NaN collapses to the bottom of the range, except the period, which
    /// falls back to [`MIN_PERIOD_SECONDS`] like any other too-small value.
    pub fn sanitized(self) -> Self {
        Self {
            delay_seconds: clamp_or_min(self.delay_seconds, 0.0, MAX_DELAY_SECONDS),
            alpha: clamp_or_min(self.alpha, 0.0, 1.0),
            period_seconds: clamp_or_min(
                self.period_seconds,
                MIN_PERIOD_SECONDS,
                MAX_PERIOD_SECONDS,
            ),
            depth: clamp_or_min(self.depth, 0.0, MAX_DEPTH),
        }
    }

    /// Base delay rounded to whole samples.
    pub fn delay_samples(&self, sample_rate: f32) -> usize {
        (f64::from(self.delay_seconds) * f64::from(sample_rate)).round() as usize
    }

    /// LFO period rounded to whole samples. Never zero, since the sample
    /// clock wraps modulo this value.
    pub fn period_samples(&self, sample_rate: f32) -> usize {
        let period = self.period_seconds.max(MIN_PERIOD_SECONDS);
        ((f64::from(period) * f64::from(sample_rate)).round() as usize).max(1)
    }

    /// The modulated delay, in seconds, at sample counter `time`.
    ///
    /// Computed in `f64`: `time` reaches several hundred thousand, and the
    /// phase product loses audible precision in `f32` at that magnitude.
    pub fn modulated_delay_seconds(&self, time: usize, sample_rate: f32) -> f64 {
        let period = f64::from(self.period_seconds.max(MIN_PERIOD_SECONDS));
        let depth = f64::from(self.depth) * f64::from(DEPTH_SCALE);
        let phase = TAU / period / f64::from(sample_rate) * time as f64;

        f64::from(self.delay_seconds) + depth * phase.sin()
    }
}

fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// The sample counter that drives the LFO phase.
///
/// All channels read the clock in lockstep: sample `j` of a block sees
/// `time + j` on every channel, and the clock advances once per block by
/// the block length. A stereo signal therefore gets the same modulation on
/// both sides instead of a phase that drifts with the channel count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModulationClock {
    time: usize,
}

impl ModulationClock {
    /// Start at zero phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// The counter value at the start of the current block.
    pub fn time(&self) -> usize {
        self.time
    }

    /// The counter value `offset` samples into the current block.
    pub fn at(&self, offset: usize) -> usize {
        self.time + offset
    }

    /// Move past a finished block and wrap into `[0, period_samples)`.
    ///
    /// Wrapping keeps the counter bounded for arbitrarily long sessions. The
    /// sine is periodic in `period_samples`, so nothing audible changes.
    pub fn advance(&mut self, block_len: usize, period_samples: usize) {
        self.time = (self.time + block_len) % period_samples.max(1);
    }

    /// Back to zero phase.
    pub fn reset(&mut self) {
        self.time = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// With zero depth, the delay never moves.
    #[test]
    fn test_zero_depth_is_constant_delay() {
        let params = ModulationParams {
            depth: 0.0,
            ..ModulationParams::default()
        };

        for time in [0, 1, 1000, 22050, 88199, 500_000] {
            let mdelay = params.modulated_delay_seconds(time, 44100.0);
            assert!(
                (mdelay - 0.1).abs() < 1e-6,
                "Expected constant 0.1 s at time {time}, got {mdelay}"
            );
        }
    }

    /// The excursion never exceeds depth * DEPTH_SCALE, and reaches it a
    /// quarter period in.
    #[test]
    fn test_excursion_bounded_by_depth() {
        let params = ModulationParams {
            delay_seconds: 0.5,
            depth: 1.0,
            period_seconds: 1.0,
            ..ModulationParams::default()
        };

        for time in (0..48000).step_by(7) {
            let mdelay = params.modulated_delay_seconds(time, 48000.0);
            assert!((mdelay - 0.5).abs() <= 0.01 + 1e-9);
        }

        // 12000 samples = a quarter of a one-second period at 48 kHz.
        let peak = params.modulated_delay_seconds(12000, 48000.0);
        assert!((peak - 0.51).abs() < 1e-9, "Expected peak 0.51, got {peak}");
    }

    /// A zero or NaN period is clamped before it can divide anything.
    #[test]
    fn test_zero_period_is_hardened() {
        let params = ModulationParams {
            period_seconds: 0.0,
            ..ModulationParams::default()
        }
        .sanitized();
        assert_eq!(params.period_seconds, MIN_PERIOD_SECONDS);

        let nan = ModulationParams {
            period_seconds: f32::NAN,
            ..ModulationParams::default()
        }
        .sanitized();
        assert_eq!(nan.period_seconds, MIN_PERIOD_SECONDS);

        // Even an unsanitized zero period yields finite math.
        let raw = ModulationParams {
            period_seconds: 0.0,
            ..ModulationParams::default()
        };
        assert!(raw.modulated_delay_seconds(1234, 44100.0).is_finite());
        assert!(raw.period_samples(44100.0) >= 1);
    }

    #[test]
    fn test_sanitize_clamps_ranges() {
        let params = ModulationParams {
            delay_seconds: 3.0,
            alpha: -0.5,
            period_seconds: 12.0,
            depth: f32::NAN,
        }
        .sanitized();

        assert_eq!(params.delay_seconds, MAX_DELAY_SECONDS);
        assert_eq!(params.alpha, 0.0);
        assert_eq!(params.period_seconds, MAX_PERIOD_SECONDS);
        assert_eq!(params.depth, 0.0);
    }

    #[test]
    fn test_sample_conversions_round() {
        let params = ModulationParams::default();
        assert_eq!(params.delay_samples(44100.0), 4410);
        assert_eq!(params.period_samples(44100.0), 88200);
    }

    /// The clock wraps after every block and never grows unbounded.
    #[test]
    fn test_clock_wraps() {
        let mut clock = ModulationClock::new();
        let period_samples = 1000;

        for _ in 0..10_000 {
            clock.advance(512, period_samples);
            assert!(clock.time() < period_samples);
        }

        // 10_000 * 512 = 5_120_000, which is 0 mod 1000.
        assert_eq!(clock.time(), 0);

        clock.advance(300, period_samples);
        assert_eq!(clock.at(5), 305);

        clock.reset();
        assert_eq!(clock.time(), 0);
    }
}
