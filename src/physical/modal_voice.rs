//! Struck or bowed modal resonator, as used by the modal engine.
//!
//! Triggered: a single filtered click, louder and brighter with accent.
//! Sustained (no trigger patched): a stream of dust impulses whose density
//! follows brightness, like a surface being rubbed.

use crate::dsp::filter::FilterMode;
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::noise::dust;
use crate::physical::resonator::{Resonator, ResonatorSvf, MAX_NUM_MODES};

#[derive(Debug, Clone)]
pub struct ModalVoice {
    excitation_filter: ResonatorSvf<1>,
    resonator: Resonator,
    random: Random,
}

impl Default for ModalVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalVoice {
    pub fn new() -> Self {
        Self {
            excitation_filter: ResonatorSvf::new(),
            resonator: Resonator::new(0.015, MAX_NUM_MODES),
            random: Random::new_with_seed(0x40da1),
        }
    }

    pub fn reset(&mut self) {
        self.excitation_filter.reset();
        self.resonator.init(0.015, MAX_NUM_MODES);
    }

    /// Adds the resonator into `out` and the excitation into `aux`.
    /// `temp` and `temp_2` are scratch, at least as long as `out`.
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

        let range = if sustain { 36.0 } else { 60.0 };
        let f = if sustain { 4.0 * f0 } else { 2.0 * f0 };
        let cutoff = (f * semitones_to_ratio((brightness * (2.0 - brightness) - 0.5) * range))
            .clamp(1e-5, 0.499);
        let q = if sustain { 0.7 } else { 1.5 };

        if sustain {
            let dust_f = 0.00005 + 0.99995 * density * density;
            for sample in temp.iter_mut() {
                *sample = dust(dust_f, &mut self.random) * (4.0 - dust_f * 3.0) * accent;
            }
        } else {
            temp.fill(0.0);
            if trigger {
                let attenuation = 1.0 - damping * 0.5;
                let amplitude = (0.12 + 0.08 * accent) * attenuation;
                temp[0] = amplitude * semitones_to_ratio(cutoff * cutoff * 24.0) / cutoff;
            }
        }

        self.excitation_filter.process(
            &[cutoff],
            &[q],
            &[1.0],
            FilterMode::LowPass,
            false,
            temp,
            temp_2,
        );

        for (a, &e) in aux.iter_mut().zip(temp_2.iter()) {
            *a += e;
        }

        self.resonator
            .process(f0, structure, brightness, damping, temp_2, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_rings_the_resonator() {
        let mut voice = ModalVoice::new();
        let mut temp = [0.0; 24];
        let mut temp_2 = [0.0; 24];
        let mut energy = 0.0;
        for n in 0..100 {
            let mut out = [0.0; 24];
            let mut aux = [0.0; 24];
            voice.render(false, n == 0, 0.8, 0.01, 0.4, 0.5, 0.5, &mut temp, &mut temp_2, &mut out, &mut aux);
            energy += out.iter().map(|x| x * x).sum::<f32>();
            assert!(out.iter().all(|x| x.is_finite()));
        }
        assert!(energy > 0.0);
    }

    #[test]
    fn silent_without_excitation() {
        let mut voice = ModalVoice::new();
        let mut temp = [0.0; 24];
        let mut temp_2 = [0.0; 24];
        let mut out = [0.0; 24];
        let mut aux = [0.0; 24];
        for _ in 0..10 {
            voice.render(false, false, 0.8, 0.01, 0.4, 0.5, 0.5, &mut temp, &mut temp_2, &mut out, &mut aux);
        }
        assert!(out.iter().all(|&x| x == 0.0));
    }
}
