//! BLEP saw that adds itself into a buffer with a ramped gain.
//!
//! The swarm engine sums eight of these into one output, so unlike the base
//! oscillator it accumulates instead of overwriting.

use crate::dsp::parameter_interpolator::ParameterInterpolator;
use crate::dsp::polyblep::{next_blep_sample, this_blep_sample};

const MAX_FREQUENCY: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveSawOscillator {
    phase: f32,
    next_sample: f32,
    frequency: f32,
    gain: f32,
}

impl AdditiveSawOscillator {
    pub fn new() -> Self {
        let mut oscillator = Self::default();
        oscillator.reset();
        oscillator
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.next_sample = 0.0;
        self.frequency = 0.01;
        self.gain = 0.0;
    }

    pub fn render(&mut self, frequency: f32, level: f32, out: &mut [f32]) {
        let size = out.len();
        let frequency = frequency.clamp(0.000_001, MAX_FREQUENCY);
        let mut fm = ParameterInterpolator::new(&mut self.frequency, frequency, size);
        let mut gain = ParameterInterpolator::new(&mut self.gain, level, size);

        let mut next_sample = self.next_sample;
        let mut phase = self.phase;
        for sample in out.iter_mut() {
            let mut this_sample = next_sample;
            next_sample = 0.0;

            let frequency = fm.next();
            phase += frequency;
            if phase >= 1.0 {
                phase -= 1.0;
                let t = phase / frequency;
                this_sample -= this_blep_sample(t);
                next_sample -= next_blep_sample(t);
            }
            next_sample += phase;
            *sample += (2.0 * this_sample - 1.0) * gain.next();
        }
        self.phase = phase;
        self.next_sample = next_sample;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_into_buffer() {
        let mut a = AdditiveSawOscillator::new();
        let mut b = AdditiveSawOscillator::new();
        let mut out = [0.0; 24];
        for _ in 0..10 {
            out.fill(0.0);
            a.render(0.01, 0.5, &mut out);
            b.render(0.01, 0.5, &mut out);
        }
        // Two identical saws at half gain equal one at full gain.
        let mut single = AdditiveSawOscillator::new();
        let mut reference = [0.0; 24];
        for _ in 0..10 {
            reference.fill(0.0);
            single.render(0.01, 1.0, &mut reference);
        }
        for (x, y) in out.iter().zip(reference.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}
