//! Effects shared by the engines and the resonator voice.
//!
//! All of them are delay-line networks or filter banks that process
//! caller-owned buffers in place. Delay lengths are tuned at 48 kHz and
//! scaled to the running sample rate in `init`, so the character of each
//! effect does not change with the host rate.

pub mod chorus;
pub mod diffuser;
pub mod ensemble;
pub mod formant_filter;
pub mod reverb;

pub use chorus::Chorus;
pub use diffuser::Diffuser;
pub use ensemble::Ensemble;
pub use formant_filter::{FormantFilter, Vowel};
pub use reverb::Reverb;

use crate::config::SampleRate;

/// Scales a delay length tuned at 48 kHz to `sample_rate`, never beyond
/// `capacity - 1` samples.
#[inline]
pub(crate) fn scaled_delay(length: f32, sample_rate: &SampleRate, capacity: usize) -> usize {
    ((length / sample_rate.rate_ratio()) as usize).clamp(1, capacity - 1)
}
