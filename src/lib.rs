//! # Loveless Chorus — An AU/VST3/CLAP Chorus Plugin
//!
//! A chorus effect built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! for learning DSP. The sound comes from a delay whose delay time is swept
//! by a slow sine wave; the swept copy is added back onto the dry signal,
//! and a decayed copy of older history keeps feeding the delay.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬──────────────────────────────────────────────────────┐
//!         │                                                      │
//!         │   ┌───────────── per block ──────────────┐           │
//!         └─►(+)──► [ Delay History (2 s, shifted) ] │           │
//!             ▲               │            │         │           │
//!             │               │            ▼         │           │
//!             └── × alpha ◄───┘   read at delay ± LFO│           │
//!                                          │         │           │
//!                                          └─────────┼──────────►(+)──► Output
//!                                                    │
//!                                   sin(2π t / period) × depth
//! ```
//!
//! The plugin shell here only adapts nih-plug's callbacks to the engine in
//! [`dsp::chorus`]; all of the DSP lives there.

pub mod dsp;
pub mod error;
pub mod monitor;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::chorus::ModulatedDelay;
use error::ConfigError;
use monitor::{MonitorSink, ScopeReader, DEFAULT_SAMPLES_PER_COLUMN};
use nih_plug::prelude::*;
use params::ChorusParams;
use parking_lot::Mutex;

/// Samples the scope ring holds before it starts dropping, about 1.4 s at
/// 48 kHz. Allocated before the sample rate is known, so it is fixed.
const SCOPE_CAPACITY: usize = 1 << 16;

/// The main plugin struct.
///
/// Parameters are shared with the host through `Arc`; the engine is owned
/// by the audio thread and only touched from the plugin callbacks, which
/// the host never runs concurrently.
pub struct LovelessChorus {
    /// Shared reference to the plugin parameters.
    params: Arc<ChorusParams>,

    /// The modulated delay engine. Unprepared until `initialize()`.
    engine: ModulatedDelay,

    /// Observer that receives every finished output block. By default the
    /// audio end of the built-in scope.
    monitor: Option<Box<dyn MonitorSink>>,

    /// GUI end of the built-in scope. The audio thread never locks this.
    scope: Arc<Mutex<ScopeReader>>,
}

impl Default for LovelessChorus {
    fn default() -> Self {
        let (tap, reader) = monitor::scope(SCOPE_CAPACITY, DEFAULT_SAMPLES_PER_COLUMN);

        Self {
            params: Arc::new(ChorusParams::default()),
            engine: ModulatedDelay::new(),
            monitor: Some(Box::new(tap)),
            scope: Arc::new(Mutex::new(reader)),
        }
    }
}

impl LovelessChorus {
    /// A plugin instance that forwards its output to `monitor` instead of
    /// the built-in scope. The reader from [`scope()`](Self::scope) then
    /// receives nothing.
    pub fn with_monitor(monitor: Box<dyn MonitorSink>) -> Self {
        Self {
            monitor: Some(monitor),
            ..Self::default()
        }
    }

    /// The reader side of the built-in scope, for an editor or any other
    /// visualizer to drain at its own pace.
    pub fn scope(&self) -> Arc<Mutex<ScopeReader>> {
        self.scope.clone()
    }
}

/// Channel count for the engine. Input and output must match, since each
/// output channel is its own input channel plus chorus.
fn layout_channels(layout: &AudioIOLayout) -> Result<usize, ConfigError> {
    let input = layout.main_input_channels.map_or(0, |c| c.get() as usize);
    let output = layout.main_output_channels.map_or(0, |c| c.get() as usize);

    if input != output {
        return Err(ConfigError::ChannelMismatch { input, output });
    }
    Ok(input)
}

impl Plugin for LovelessChorus {
    const NAME: &'static str = "Loveless Chorus";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, mono fallback. Input and output channel counts always
    // match: every output channel is its input channel plus chorus.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are sampled once per block, so splitting blocks at
    // automation points would only add work.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is loaded or the audio configuration changes.
    /// Allocates the delay histories for the new sample rate, block size,
    /// and channel count.
    ///
    /// Returning `false` tells the host this configuration is unusable; the
    /// engine stays unprepared and never runs.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let max_block = buffer_config.max_buffer_size as usize;
        let prepared = layout_channels(audio_io_layout).and_then(|channels| {
            self.engine
                .prepare(buffer_config.sample_rate, max_block, channels)
                .map(|()| channels)
        });

        match prepared {
            Ok(channels) => {
                nih_log!(
                    "chorus prepared: {} Hz, {} samples per block, {} channel(s)",
                    buffer_config.sample_rate,
                    max_block,
                    channels
                );
                true
            }
            Err(err) => {
                nih_error!("chorus rejected audio configuration: {err}");
                false
            }
        }
    }

    /// Called when playback restarts. Silences old echoes and rewinds the
    /// LFO so the next take starts clean.
    fn reset(&mut self) {
        self.engine.reset();
    }

    /// Called when the plugin is deactivated. Frees the histories; the next
    /// `initialize()` allocates them again.
    fn deactivate(&mut self) {
        self.engine.release();
    }

    /// Runs the chorus on one block in place, then offers the result to
    /// the monitor.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let params = self.params.snapshot();

        self.engine.process_block(buffer.as_slice(), params);

        if let Some(monitor) = self.monitor.as_mut() {
            monitor.accept_block(buffer.as_slice_immutable());
        }

        // Keep the host calling us while echoes are still ringing out.
        match self.engine.tail_samples(params) {
            Some(tail) => ProcessStatus::Tail(tail),
            None => ProcessStatus::KeepAlive,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessChorus {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-chorus-v1";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A modulated delay chorus, built for learning DSP");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Chorus,
    ];
}

impl Vst3Plugin for LovelessChorus {
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssChorus_v001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Modulation];
}

nih_export_clap!(LovelessChorus);
nih_export_vst3!(LovelessChorus);

// AUv2 entry point for Logic Pro, wrapping the CLAP export.
clap_wrapper::export_auv2!();
