pub mod chords; // Chord tables and quantized selection
pub mod config;
pub mod drums; // Analog and synthetic drum models
pub mod dsp;
pub mod engine; // The sixteen selectable synthesis engines
pub mod exciter;
pub mod fx; // Ensemble, chorus, reverb, diffuser, formant bank
pub mod noise;
pub mod oscillator; // Band-limited oscillator kernels
pub mod patch;
pub mod physical; // Modal resonators, strings and tubes
pub mod synth; // Voice dispatch and post-processing

pub use config::{ConfigError, SampleRate, VoiceConfig};
pub use patch::{Modulations, Patch, ResonatorPatch};
pub use synth::resonator_voice::ResonatorVoice;
pub use synth::voice::{Voice, VoiceOutput};

/// Largest number of samples an engine renders in one call.
pub const MAX_BLOCK_SIZE: usize = 24;
