//! Voices: what a host instantiates and calls once per audio callback.
//!
//! - [`voice::Voice`] selects one of the sixteen engines and gates it.
//! - [`resonator_voice::ResonatorVoice`] strikes, plucks or blows a modal
//!   bank or a set of chord strings.
//! - [`post_processor`] holds the limiter/LPG channel stage they share.

pub mod post_processor;
pub mod resonator_voice;
pub mod voice;
