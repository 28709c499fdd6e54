//! Drum models.
//!
//! Two families: circuit-inspired models (`analog_*`, the hi-hat) where a
//! short trigger pulse rings a high-Q filter, and synthetic models
//! (`synthetic_*`) built from distorted sine oscillators and noise with
//! explicit envelopes.
//!
//! Every model shares the same control vocabulary:
//!
//! | control  | meaning                                           |
//! | -------- | ------------------------------------------------- |
//! | sustain  | no trigger patched: hold a steady tone instead    |
//! | trigger  | rising edge this block                            |
//! | accent   | hit strength, 0..1                                |
//! | f0       | normalized frequency                              |
//! | tone     | brightness                                        |
//! | decay    | 0 short, 1 long                                   |
//!
//! Time constants are specified in seconds and converted with the
//! [`SampleRate`](crate::config::SampleRate) given at construction.

pub mod analog_bass_drum;
pub mod analog_snare_drum;
pub mod hihat;
pub mod synthetic_bass_drum;
pub mod synthetic_snare_drum;

pub use analog_bass_drum::AnalogBassDrum;
pub use analog_snare_drum::AnalogSnareDrum;
pub use hihat::{HiHat, MetallicNoise, VcaType};
pub use synthetic_bass_drum::SyntheticBassDrum;
pub use synthetic_snare_drum::SyntheticSnareDrum;

/// Soft diode: passes positive values, squashes negative ones.
#[inline]
pub(crate) fn diode(x: f32) -> f32 {
    if x >= 0.0 {
        x
    } else {
        let x = x * 2.0;
        0.7 * x / (1.0 + x.abs())
    }
}

/// `phase` in [0, 1) through a triangle and a soft clipper.
#[inline]
pub(crate) fn distorted_triangle(phase: f32, offset: f32) -> f32 {
    let triangle = (if phase < 0.5 { phase } else { 1.0 - phase }) * 4.0 - offset;
    2.0 * triangle / (1.0 + triangle.abs())
}
