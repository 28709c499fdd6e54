//! VOSIM: two formant sines reset by a carrier, under a raised-cosine window.
//!
//! The classic voice-simulation oscillator. Each carrier period restarts both
//! formants, so their frequencies set the vowel-like resonances while the
//! carrier sets the pitch. `carrier_shape` moves the formants' reset phase,
//! which changes how much of the carrier fundamental bleeds through.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::tables::sine;

const MAX_FREQUENCY: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct VosimOscillator {
    carrier_phase: f32,
    formant_1_phase: f32,
    formant_2_phase: f32,

    carrier_frequency: f32,
    formant_1_frequency: f32,
    formant_2_frequency: f32,
    carrier_shape: f32,
}

impl VosimOscillator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn render(
        &mut self,
        carrier_frequency: f32,
        formant_frequency_1: f32,
        formant_frequency_2: f32,
        carrier_shape: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let carrier_frequency = carrier_frequency.clamp(0.000_001, MAX_FREQUENCY);
        let formant_frequency_1 = formant_frequency_1.clamp(0.0, MAX_FREQUENCY);
        let formant_frequency_2 = formant_frequency_2.clamp(0.0, MAX_FREQUENCY);

        let mut f0_modulation = ParameterInterpolator::new(&mut self.carrier_frequency, carrier_frequency, size);
        let mut f1_modulation = ParameterInterpolator::new(&mut self.formant_1_frequency, formant_frequency_1, size);
        let mut f2_modulation = ParameterInterpolator::new(&mut self.formant_2_frequency, formant_frequency_2, size);
        let mut carrier_shape_modulation =
            ParameterInterpolator::new(&mut self.carrier_shape, carrier_shape, size);

        for sample in out.iter_mut() {
            let f0 = f0_modulation.next();
            let f1 = f1_modulation.next();
            let f2 = f2_modulation.next();

            self.carrier_phase += f0;
            if self.carrier_phase >= 1.0 {
                self.carrier_phase -= 1.0;
                let reset_time = self.carrier_phase / f0;
                self.formant_1_phase = reset_time * f1;
                self.formant_2_phase = reset_time * f2;
            } else {
                self.formant_1_phase += f1;
                if self.formant_1_phase >= 1.0 {
                    self.formant_1_phase -= 1.0;
                }
                self.formant_2_phase += f2;
                if self.formant_2_phase >= 1.0 {
                    self.formant_2_phase -= 1.0;
                }
            }

            let carrier = sine(self.carrier_phase * 0.5 + 0.25) + 1.0;
            let reset_phase = 0.75 - 0.25 * carrier_shape_modulation.next();
            let reset_amplitude = sine(reset_phase);
            let formant_0 = sine(self.formant_1_phase + reset_phase) - reset_amplitude;
            let formant_1 = sine(self.formant_2_phase + reset_phase) - reset_amplitude;
            *sample = carrier * (formant_0 + formant_1) * 0.25 + reset_amplitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_bounded() {
        let mut osc = VosimOscillator::new();
        let mut out = [0.0; 12];
        for _ in 0..400 {
            osc.render(0.005, 0.03, 0.07, 0.5, &mut out);
            assert!(out.iter().all(|x| x.is_finite() && x.abs() <= 2.0));
        }
    }
}
