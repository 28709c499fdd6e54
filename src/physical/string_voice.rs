//! Plucked or bowed string, as used by the string engine.
//!
//! A trigger injects one period of filtered noise into the string; without
//! a trigger patched, filtered dust keeps it going. `structure` picks the
//! nonlinearity: below a quarter it curves the bridge, above it disperses,
//! with a small dead zone around 0.25 for a plain string.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::noise::dust;
use crate::physical::string::WaveguideString;

pub struct StringVoice {
    excitation_filter: Svf,
    string: WaveguideString,
    remaining_noise_samples: usize,
    random: Random,
}

impl StringVoice {
    pub fn new(sample_rate: &SampleRate, seed: u64) -> Self {
        Self {
            excitation_filter: Svf::new(),
            string: WaveguideString::new(sample_rate),
            remaining_noise_samples: 0,
            random: Random::new_with_seed(seed),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.excitation_filter.reset();
        self.string.init(sample_rate);
        self.remaining_noise_samples = 0;
    }

    pub fn reset(&mut self) {
        self.string.reset();
    }

    /// Maps `structure` onto the string's nonlinearity, with a dead zone
    /// around 0.25.
    #[inline]
    pub fn non_linearity(structure: f32) -> f32 {
        if structure < 0.24 {
            (structure - 0.24) * 4.166
        } else if structure > 0.26 {
            (structure - 0.26) * 1.351_35
        } else {
            0.0
        }
    }

    /// Adds the string into `out` and the excitation into `aux`.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        sustain: bool,
        trigger: bool,
        accent: f32,
        f0: f32,
        structure: f32,
        brightness: f32,
        damping: f32,
        temp: &mut [f32],
        temp_2: &mut [f32],
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        let size = out.len();
        let temp = &mut temp[..size];
        let temp_2 = &mut temp_2[..size];

        let density = brightness * brightness;
        let brightness = brightness + 0.25 * accent * (1.0 - brightness);
        let damping = damping + 0.25 * accent * (1.0 - damping);

        if trigger || sustain {
            let range = 72.0;
            let f = 4.0 * f0;
            let cutoff = (f * semitones_to_ratio((brightness * (2.0 - brightness) - 0.5) * range))
                .min(0.499);
            let q = if sustain { 1.0 } else { 0.5 };
            self.remaining_noise_samples = (1.0 / f0.max(1e-4)) as usize;
            self.excitation_filter
                .set_f_q(cutoff, q, FrequencyApproximation::Dirty);
        }

        if sustain {
            let dust_f = 0.00005 + 0.99995 * density * density;
            for sample in temp.iter_mut() {
                *sample = dust(dust_f, &mut self.random) * (8.0 - dust_f * 6.0) * accent;
            }
        } else if self.remaining_noise_samples > 0 {
            let noise_samples = self.remaining_noise_samples.min(size);
            self.remaining_noise_samples -= noise_samples;
            for sample in temp[..noise_samples].iter_mut() {
                *sample = self.random.get_bipolar();
            }
            temp[noise_samples..].fill(0.0);
        } else {
            temp.fill(0.0);
        }

        temp_2.copy_from_slice(temp);
        self.excitation_filter
            .process_buffer(temp_2, FilterMode::LowPass);

        for (a, &e) in aux.iter_mut().zip(temp_2.iter()) {
            *a += e;
        }

        self.string.process(
            f0,
            Self::non_linearity(structure),
            brightness,
            damping,
            temp_2,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_linearity_has_dead_zone() {
        assert_eq!(StringVoice::non_linearity(0.25), 0.0);
        assert!(StringVoice::non_linearity(0.0) < -0.99);
        assert!(StringVoice::non_linearity(1.0) > 0.99);
    }

    #[test]
    fn pluck_then_silence() {
        let sr = SampleRate::default();
        let mut voice = StringVoice::new(&sr, 1);
        let mut temp = [0.0; 24];
        let mut temp_2 = [0.0; 24];
        let mut energy = 0.0;
        for n in 0..200 {
            let mut out = [0.0; 24];
            let mut aux = [0.0; 24];
            voice.render(false, n == 0, 0.5, 0.005, 0.25, 0.5, 0.5, &mut temp, &mut temp_2, &mut out, &mut aux);
            energy += out.iter().map(|x| x * x).sum::<f32>();
            assert!(out.iter().all(|x| x.is_finite()));
        }
        assert!(energy > 0.0);
    }
}
