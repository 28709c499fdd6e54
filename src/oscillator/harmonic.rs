//! Bank of harmonically related sines computed by Chebyshev recurrence.
//!
//! Only one cosine is looked up per sample; every further harmonic comes
//! from `cos((n + 1) x) = 2 cos(x) cos(n x) - cos((n - 1) x)`. Harmonics
//! above Nyquist get a zero amplitude, and each amplitude is tapered as it
//! approaches Nyquist.

use crate::dsp::parameter_interpolator::SimpleParameterInterpolator;
use crate::dsp::tables::sine;

#[derive(Debug, Clone, Copy)]
pub struct HarmonicOscillator<const N: usize> {
    phase: f32,
    frequency: f32,
    amplitude: [SimpleParameterInterpolator; N],
}

impl<const N: usize> Default for HarmonicOscillator<N> {
    fn default() -> Self {
        Self {
            phase: 0.0,
            frequency: 0.0,
            amplitude: [SimpleParameterInterpolator::new(); N],
        }
    }
}

impl<const N: usize> HarmonicOscillator<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Renders harmonics `first_harmonic..first_harmonic + N` with the given
    /// amplitudes. With `first_harmonic == 1` the output overwrites `out`,
    /// otherwise it is added, so banks can be chained.
    pub fn render(&mut self, frequency: f32, amplitudes: &[f32], first_harmonic: usize, out: &mut [f32]) {
        let size = out.len();
        let frequency = frequency.clamp(0.0, 0.5);
        let first_harmonic = first_harmonic.max(1);

        for (i, amplitude) in self.amplitude.iter_mut().enumerate() {
            let f = (frequency * (first_harmonic + i) as f32).min(0.5);
            let target = amplitudes.get(i).copied().unwrap_or(0.0) * (1.0 - f * 2.0);
            amplitude.init(target, size);
        }
        let increment = (frequency - self.frequency) / size.max(1) as f32;

        for sample in out.iter_mut() {
            self.frequency += increment;
            self.phase += self.frequency;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
            let two_x = 2.0 * sine(self.phase + 0.25);
            let (mut previous, mut current) = if first_harmonic == 1 {
                (1.0, two_x * 0.5)
            } else {
                let k = first_harmonic as f32;
                (
                    sine(self.phase * (k - 1.0) + 0.25),
                    sine(self.phase * k + 0.25),
                )
            };

            let mut sum = 0.0;
            for amplitude in self.amplitude.iter_mut() {
                sum += amplitude.next() * current;
                let temp = current;
                current = two_x * current - previous;
                previous = temp;
            }

            if first_harmonic == 1 {
                *sample = sum;
            } else {
                *sample += sum;
            }
        }
        self.frequency = frequency;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_harmonic_is_a_cosine() {
        let mut osc = HarmonicOscillator::<4>::new();
        let mut amplitudes = [0.0; 4];
        amplitudes[0] = 1.0;
        let mut out = [0.0; 24];
        for _ in 0..100 {
            osc.render(0.01, &amplitudes, 1, &mut out);
        }
        // One period at f = 0.01 spans 100 samples; look at more than two.
        let mut peak = 0.0f32;
        for _ in 0..10 {
            osc.render(0.01, &amplitudes, 1, &mut out);
            peak = out.iter().fold(peak, |acc, x| acc.max(x.abs()));
        }
        assert!(peak > 0.95 && peak <= 1.0, "peak {}", peak);
    }

    #[test]
    fn chained_banks_add() {
        let mut low = HarmonicOscillator::<2>::new();
        let mut high = HarmonicOscillator::<2>::new();
        let mut out = [0.0; 24];
        for _ in 0..50 {
            low.render(0.01, &[0.5, 0.0], 1, &mut out);
            high.render(0.01, &[0.5, 0.0], 3, &mut out);
        }
        assert!(out.iter().all(|x| x.abs() <= 1.0 + 1e-3));
    }

    #[test]
    fn harmonics_above_nyquist_are_silent() {
        let mut osc = HarmonicOscillator::<4>::new();
        let mut out = [0.0; 24];
        for _ in 0..100 {
            osc.render(0.3, &[0.0, 1.0, 1.0, 1.0], 1, &mut out);
        }
        let peak = out.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert!(peak < 1e-3, "aliasing harmonics leaked: {}", peak);
    }
}
