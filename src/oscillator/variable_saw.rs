//! Saw with a notch, morphing into a triangle.
//!
//! At `waveshape` 0 the wave is a saw whose ramp is interrupted at `pw` by a
//! step up of `NOTCH_DEPTH`: moving `pw` sweeps a comb-like notch through the
//! spectrum. At 1 it is a triangle with its peak at `pw`.

use crate::dsp::oscillator::MAX_FREQUENCY;
use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{
    next_blep_sample, next_integrated_blep_sample, this_blep_sample, this_integrated_blep_sample,
};

const NOTCH_DEPTH: f32 = 0.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct VariableSawOscillator {
    phase: f32,
    next_sample: f32,
    previous_pw: f32,
    high: bool,

    frequency: f32,
    pw: f32,
    waveshape: f32,
}

impl VariableSawOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.next_sample = 0.0;
        self.previous_pw = 0.5;
        self.high = false;
        self.frequency = 0.01;
        self.pw = 0.5;
        self.waveshape = 0.0;
    }

    pub fn render(&mut self, frequency: f32, pw: f32, waveshape: f32, out: &mut [f32]) {
        let size = out.len();
        let frequency = frequency.clamp(0.000_001, MAX_FREQUENCY);
        let pw = if frequency >= 0.25 {
            0.5
        } else {
            pw.clamp(frequency * 2.0, 1.0 - 2.0 * frequency)
        };

        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut pwm = ParameterInterpolator::new(&mut self.pw, pw, size);
        let mut waveshape_modulation =
            ParameterInterpolator::new(&mut self.waveshape, waveshape.clamp(0.0, 1.0), size);

        let mut next_sample = self.next_sample;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let frequency = fm.next();
            let pw = pwm.next();
            let triangle_amount = waveshape_modulation.next();
            let notch_amount = 1.0 - triangle_amount;
            let slope_up = 1.0 / pw;
            let slope_down = 1.0 / (1.0 - pw);
            let triangle_step = (slope_up + slope_down) * frequency * triangle_amount;

            self.phase += frequency;
            if !self.high && self.phase >= pw {
                let notch = (NOTCH_DEPTH + 1.0 - pw) * notch_amount;
                let t = ((self.phase - pw) / (self.previous_pw - pw + frequency)).clamp(0.0, 1.0);
                this_sample += notch * this_blep_sample(t);
                next_sample += notch * next_blep_sample(t);
                this_sample -= triangle_step * this_integrated_blep_sample(t);
                next_sample -= triangle_step * next_integrated_blep_sample(t);
                self.high = true;
            } else if self.phase >= 1.0 {
                self.phase -= 1.0;
                let notch = (NOTCH_DEPTH + 1.0) * notch_amount;
                let t = self.phase / frequency;
                this_sample -= notch * this_blep_sample(t);
                next_sample -= notch * next_blep_sample(t);
                this_sample += triangle_step * this_integrated_blep_sample(t);
                next_sample += triangle_step * next_integrated_blep_sample(t);
                self.high = false;
            }

            let notch_saw = if self.phase < pw {
                self.phase
            } else {
                1.0 + NOTCH_DEPTH
            };
            let triangle = if self.phase < pw {
                self.phase * slope_up
            } else {
                1.0 - (self.phase - pw) * slope_down
            };
            next_sample += notch_saw * notch_amount + triangle * triangle_amount;
            self.previous_pw = pw;

            *sample = (2.0 * this_sample - 1.0) / (1.0 + NOTCH_DEPTH);
        }
        self.next_sample = next_sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_bounded_across_shapes() {
        for waveshape in [0.0, 0.5, 1.0] {
            let mut osc = VariableSawOscillator::new();
            let mut out = [0.0; 24];
            for block in 0..200 {
                let pw = 0.1 + 0.004 * block as f32;
                osc.render(0.007, pw, waveshape, &mut out);
                assert!(
                    out.iter().all(|x| x.is_finite() && x.abs() < 1.5),
                    "waveshape {} pw {}",
                    waveshape,
                    pw
                );
            }
        }
    }
}
