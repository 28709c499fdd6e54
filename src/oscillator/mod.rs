//! Oscillator kernels.
//!
//! Every kernel shares the same skeleton as the base oscillator in
//! [`crate::dsp::oscillator`]: a phase accumulator, controls ramped across
//! the block, and BLEP/BLAMP residuals carried one sample forward at each
//! discontinuity. What differs is where the discontinuities are and how big.

pub mod additive_saw;
pub mod formant;
pub mod grainlet;
pub mod harmonic;
pub mod string_synth;
pub mod super_square;
pub mod variable_saw;
pub mod variable_shape;
pub mod vosim;
pub mod wavetable;
pub mod z;

pub use additive_saw::AdditiveSawOscillator;
pub use formant::FormantOscillator;
pub use grainlet::GrainletOscillator;
pub use harmonic::HarmonicOscillator;
pub use string_synth::StringSynthOscillator;
pub use super_square::SuperSquareOscillator;
pub use variable_saw::VariableSawOscillator;
pub use variable_shape::VariableShapeOscillator;
pub use vosim::VosimOscillator;
pub use wavetable::WavetableOscillator;
pub use z::ZOscillator;
