//! Low-level DSP primitives shared by the oscillators, resonators and engines.
//!
//! These components are allocation-free once constructed and realtime-safe,
//! making them safe to embed directly inside engine structs. They stay
//! focused on signal-processing math; engines layer the musical mapping on
//! top.

/// FIR decimator for 4x oversampled kernels.
pub mod downsampler;
/// Saturation, limiting and overdrive.
pub mod distortion;
/// Fixed-capacity delay line with interpolated taps.
pub mod delay;
/// Decay, low-pass-gate and grain envelopes.
pub mod envelope;
/// State-variable, one-pole and DC-blocking filters.
pub mod filter;
/// Index quantizer with hysteresis.
pub mod hysteresis;
/// Free-running low-frequency oscillator.
pub mod lfo;
/// Buffer mixing helpers.
pub mod mix;
/// Attenuverter and patched/unpatched CV policy.
pub mod modulate;
/// Base band-limited oscillator and sine/cosine oscillators.
pub mod oscillator;
/// Block-scoped linear parameter smoothing.
pub mod parameter_interpolator;
/// BLEP/BLAMP residuals.
pub mod polyblep;
/// Per-component pseudorandom source.
pub mod random;
/// Lookup tables generated on first use.
pub mod tables;
/// Pitch conversion, interpolation and saturation helpers.
pub mod units;

pub use filter::{FilterMode, FrequencyApproximation, Svf};
pub use parameter_interpolator::{ParameterInterpolator, SimpleParameterInterpolator};
