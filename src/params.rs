//! # Plugin Parameters
//!
//! The four knobs of the chorus, as the DAW sees them:
//!
//! | ID       | Name   | Range       | Default |
//! |----------|--------|-------------|---------|
//! | `delay`  | Delay  | 0 – 1 s     | 0.1 s   |
//! | `alpha`  | Alpha  | 0 – 100 %   | 70 %    |
//! | `period` | Period | 0.01 – 5 s  | 2 s     |
//! | `depth`  | Depth  | 0 – 100 %   | 10 %    |
//!
//! The IDs are what the host stores in sessions and presets. Once
//! published, never change them.
//!
//! ## Block-Rate Reads
//!
//! The engine takes one snapshot of these values at the start of each
//! block ([`ChorusParams::snapshot`]) and holds it for the whole block. A
//! knob move therefore lands on the next block boundary. The values are read
//! unsmoothed: the chorus rebuilds its echo tail per block, so a smoother
//! ramping inside the block would never be seen.

use nih_plug::prelude::*;

use crate::dsp::modulation::{
    ModulationParams, MAX_DELAY_SECONDS, MAX_DEPTH, MAX_PERIOD_SECONDS, MIN_PERIOD_SECONDS,
};

/// All user-facing parameters for the Loveless Chorus plugin.
#[derive(Params)]
pub struct ChorusParams {
    /// **Delay** — base distance between the dry signal and the chorus
    /// voice. Short delays (10-40 ms) give classic chorus; longer ones
    /// separate into a wobbling echo.
    #[id = "delay"]
    pub delay: FloatParam,

    /// **Alpha** — decay of the echo tail. Each trip around the delay
    /// history multiplies the echo by this factor.
    #[id = "alpha"]
    pub alpha: FloatParam,

    /// **Period** — length of one LFO cycle. The delay sweeps forward and
    /// back once per period.
    ///
    /// The range stops at 10 ms instead of zero: the LFO divides by the
    /// period, so zero is never selectable.
    #[id = "period"]
    pub period: FloatParam,

    /// **Depth** — how far the LFO moves the delay, as a fraction of the
    /// maximum ±10 ms sweep.
    #[id = "depth"]
    pub depth: FloatParam,
}

impl Default for ChorusParams {
    fn default() -> Self {
        let defaults = ModulationParams::default();

        Self {
            delay: FloatParam::new(
                "Delay",
                defaults.delay_seconds,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_DELAY_SECONDS,
                },
            )
            .with_unit(" s")
            .with_step_size(0.001),

            alpha: FloatParam::new(
                "Alpha",
                defaults.alpha,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            period: FloatParam::new(
                "Period",
                defaults.period_seconds,
                FloatRange::Skewed {
                    min: MIN_PERIOD_SECONDS,
                    max: MAX_PERIOD_SECONDS,
                    // More knob travel for the faster rates, where small
                    // changes are most audible.
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" s")
            .with_step_size(0.01),

            depth: FloatParam::new(
                "Depth",
                defaults.depth,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_DEPTH,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),
        }
    }
}

impl ChorusParams {
    /// Current base delay in seconds.
    pub fn delay_seconds(&self) -> f32 {
        self.delay.value()
    }

    /// Current echo decay coefficient.
    pub fn alpha(&self) -> f32 {
        self.alpha.value()
    }

    /// Current LFO period in seconds.
    pub fn period_seconds(&self) -> f32 {
        self.period.value()
    }

    /// Current depth fraction.
    pub fn depth(&self) -> f32 {
        self.depth.value()
    }

    /// Freeze the current values for one block.
    pub fn snapshot(&self) -> ModulationParams {
        ModulationParams {
            delay_seconds: self.delay_seconds(),
            alpha: self.alpha(),
            period_seconds: self.period_seconds(),
            depth: self.depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A freshly loaded plugin starts from the engine's defaults.
    #[test]
    fn test_defaults_match_engine() {
        let params = ChorusParams::default();
        assert_eq!(params.snapshot(), ModulationParams::default());
    }

    /// The period range excludes zero.
    #[test]
    fn test_period_range_is_never_zero() {
        let params = ChorusParams::default();
        let lowest = params.period.preview_plain(0.0);
        assert!(lowest >= MIN_PERIOD_SECONDS, "Got {lowest}");
    }
}
