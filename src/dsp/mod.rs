//! # DSP (Digital Signal Processing) Core
//!
//! The chorus engine and the building blocks it is made of:
//!
//! - **`delay_history`**: a fixed-length, shift-structured sample history
//!   for one channel, with the block operations the chorus composes.
//!
//! - **`modulation`**: the per-block parameter snapshot and the sine LFO
//!   that moves the delay time.
//!
//! - **`chorus`**: the modulated delay engine itself, with its
//!   prepare / process / release lifecycle.
//!
//! None of these types know about nih-plug's `Plugin` or `Buffer`, so the
//! engine can be driven from tests or any other audio callback.

pub mod chorus;
pub mod delay_history;
pub mod modulation;
