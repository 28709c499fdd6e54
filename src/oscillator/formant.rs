//! Sine formant hard-synced to a carrier.
//!
//! The formant sine runs at its own frequency and restarts at every carrier
//! period. The restart is a step in the waveform, corrected with a BLEP whose
//! height is evaluated from the formant phase at the exact reset instant.

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};
use crate::dsp::tables::sine;

#[derive(Debug, Clone, Copy, Default)]
pub struct FormantOscillator {
    carrier_phase: f32,
    formant_phase: f32,
    next_sample: f32,

    carrier_frequency: f32,
    formant_frequency: f32,
    phase_shift: f32,
}

impl FormantOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        *self = Self {
            formant_frequency: 0.01,
            ..Self::default()
        };
    }

    pub fn render(
        &mut self,
        carrier_frequency: f32,
        formant_frequency: f32,
        phase_shift: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let carrier_frequency = carrier_frequency.clamp(0.000_001, MAX_FREQUENCY);
        let formant_frequency = formant_frequency.clamp(0.0, MAX_FREQUENCY);

        let mut carrier_fm = ParameterInterpolator::new(&mut self.carrier_frequency, carrier_frequency, size);
        let mut formant_fm = ParameterInterpolator::new(&mut self.formant_frequency, formant_frequency, size);
        let mut pm = ParameterInterpolator::new(&mut self.phase_shift, phase_shift, size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let carrier_frequency = carrier_fm.next();
            let formant_frequency = formant_fm.next();

            self.carrier_phase += carrier_frequency;
            if self.carrier_phase >= 1.0 {
                self.carrier_phase -= 1.0;
                let reset_time = self.carrier_phase / carrier_frequency;
                let formant_phase_at_reset =
                    self.formant_phase + (1.0 - reset_time) * formant_frequency;
                let before = sine(formant_phase_at_reset + pm.subsample(1.0 - reset_time));
                let after = sine(pm.subsample(1.0));
                let discontinuity = after - before;
                this_sample += discontinuity * this_blep_sample(reset_time);
                next_sample += discontinuity * next_blep_sample(reset_time);
                self.formant_phase = reset_time * formant_frequency;
            } else {
                self.formant_phase += formant_frequency;
                if self.formant_phase >= 1.0 {
                    self.formant_phase -= 1.0;
                }
            }

            next_sample += sine(self.formant_phase + pm.next());
            *sample = this_sample;
        }
        self.next_sample = next_sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synced_formant_is_bounded() {
        let mut osc = FormantOscillator::new();
        let mut out = [0.0; 12];
        for _ in 0..500 {
            osc.render(0.003, 0.041, 0.1, &mut out);
            assert!(out.iter().all(|x| x.abs() <= 1.6));
        }
    }
}
