//! Phase-distortion oscillator with a resonant, synced formant.
//!
//! A carrier contour (from a sine to a half-wave shape) multiplies a formant
//! sine that restarts twice per carrier period. The restart is the sync
//! discontinuity; `mode` sets the formant's phase offset at restart, moving
//! from a classic "resonant" phase-distortion sound to a harsher one.

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};
use crate::dsp::tables::sine;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZOscillator {
    carrier_phase: f32,
    discontinuity_phase: f32,
    formant_phase: f32,
    next_sample: f32,

    carrier_frequency: f32,
    formant_frequency: f32,
    carrier_shape: f32,
    mode: f32,
}

impl ZOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn render(
        &mut self,
        carrier_frequency: f32,
        formant_frequency: f32,
        carrier_shape: f32,
        mode: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let carrier_frequency = carrier_frequency.clamp(0.000_001, MAX_FREQUENCY * 0.5);
        let formant_frequency = formant_frequency.clamp(0.0, MAX_FREQUENCY);

        let mut carrier_fm = ParameterInterpolator::new(&mut self.carrier_frequency, carrier_frequency, size);
        let mut formant_fm = ParameterInterpolator::new(&mut self.formant_frequency, formant_frequency, size);
        let mut shape_modulation = ParameterInterpolator::new(&mut self.carrier_shape, carrier_shape, size);
        let mut mode_modulation = ParameterInterpolator::new(&mut self.mode, mode, size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let f0 = carrier_fm.next();
            let f1 = formant_fm.next();

            self.discontinuity_phase += 2.0 * f0;
            self.carrier_phase += f0;
            if self.discontinuity_phase >= 1.0 {
                self.discontinuity_phase -= 1.0;
                let reset_time = self.discontinuity_phase / (2.0 * f0);

                let wrapped = self.carrier_phase >= 1.0;
                let carrier_phase_before = if wrapped { 1.0 } else { 0.5 };
                let carrier_phase_after = if wrapped { 0.0 } else { 0.5 };
                let before = z(
                    carrier_phase_before,
                    1.0,
                    self.formant_phase + (1.0 - reset_time) * f1,
                    shape_modulation.subsample(1.0 - reset_time),
                    mode_modulation.subsample(1.0 - reset_time),
                );
                let after = z(
                    carrier_phase_after,
                    0.0,
                    0.0,
                    shape_modulation.subsample(1.0),
                    mode_modulation.subsample(1.0),
                );
                let discontinuity = after - before;
                this_sample += discontinuity * this_blep_sample(reset_time);
                next_sample += discontinuity * next_blep_sample(reset_time);
                self.formant_phase = reset_time * f1;

                if self.carrier_phase > 1.0 {
                    self.carrier_phase = self.discontinuity_phase * 0.5;
                }
            } else {
                self.formant_phase += f1;
                if self.formant_phase >= 1.0 {
                    self.formant_phase -= 1.0;
                }
            }
            if self.carrier_phase >= 1.0 {
                self.carrier_phase -= 1.0;
            }

            next_sample += z(
                self.carrier_phase,
                self.discontinuity_phase,
                self.formant_phase,
                shape_modulation.next(),
                mode_modulation.next(),
            );
            *sample = this_sample;
        }
        self.next_sample = next_sample;
    }
}

/// Waveform value from carrier phase `c`, discontinuity phase `d` and
/// formant phase `f`.
#[inline]
fn z(c: f32, d: f32, f: f32, shape: f32, mode: f32) -> f32 {
    let mut ramp_down = 0.5 * (1.0 + sine(0.5 * d + 0.25));

    let (offset, phase_shift) = if mode < 0.333 {
        (1.0, 0.25 + mode * 1.50)
    } else if mode < 0.666 {
        let phase_shift = 0.7495 - (mode - 0.33) * 0.75;
        (-sine(phase_shift), phase_shift)
    } else {
        (0.001, 0.7495 - (mode - 0.33) * 0.75)
    };

    let discontinuity = sine(f + phase_shift);
    let contour = if shape < 0.5 {
        let shape = shape * 2.0;
        if c >= 0.5 {
            ramp_down *= shape;
        }
        1.0 + (sine(c + 0.25) - 1.0) * shape
    } else {
        sine(c + shape * 0.5)
    };
    (ramp_down * (offset + discontinuity) - offset) * contour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_bounded_for_every_mode() {
        for mode in [0.1, 0.5, 0.9] {
            let mut osc = ZOscillator::new();
            let mut out = [0.0; 12];
            for _ in 0..300 {
                osc.render(0.006, 0.03, 0.3, mode, &mut out);
                assert!(out.iter().all(|x| x.is_finite() && x.abs() < 3.0), "mode {}", mode);
            }
        }
    }
}
