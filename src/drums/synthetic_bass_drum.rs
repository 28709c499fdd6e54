//! Bass drum from a distorted sine, a click and a burst of noise.
//!
//! The body is a sine bent towards a soft-clipped triangle by `dirtiness`,
//! with its phase jittered by filtered noise. A short FM envelope sweeps the
//! pitch down after the hit. The body goes through a transistor-style VCA
//! whose offset leaks a little DC thump into the attack.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;
use crate::dsp::tables::sine;
use crate::dsp::units::{one_pole, semitones_to_ratio, slope};
use crate::dsp::ParameterInterpolator;

use super::distorted_triangle;

/// Band-limited click: a slewed step, high-passed then low-passed.
#[derive(Debug, Clone)]
struct Click {
    lp: f32,
    hp: f32,
    filter: Svf,
}

impl Click {
    fn new(sample_rate: &SampleRate) -> Self {
        let mut filter = Svf::new();
        filter.set_f_q(
            5_000.0 * sample_rate.inv_sample_rate,
            1.0,
            FrequencyApproximation::Fast,
        );
        Self {
            lp: 0.0,
            hp: 0.0,
            filter,
        }
    }

    fn reset(&mut self) {
        self.lp = 0.0;
        self.hp = 0.0;
        self.filter.reset();
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        slope(&mut self.lp, input, 0.5, 0.1);
        one_pole(&mut self.hp, self.lp, 0.04);
        self.filter.process(self.lp - self.hp, FilterMode::LowPass)
    }
}

/// Band-passed white noise.
#[derive(Debug, Clone, Default)]
struct AttackNoise {
    lp: f32,
    hp: f32,
}

impl AttackNoise {
    #[inline]
    fn render(&mut self, random: &mut Random) -> f32 {
        let sample = random.get_float();
        one_pole(&mut self.lp, sample, 0.05);
        one_pole(&mut self.hp, self.lp, 0.005);
        self.lp - self.hp
    }
}

#[inline]
fn distorted_sine(phase: f32, phase_noise: f32, dirtiness: f32) -> f32 {
    let phase = phase + phase_noise * dirtiness;
    let phase = phase - phase.floor();
    let triangle = distorted_triangle(phase, 1.0);
    let clean = sine(phase + 0.75);
    triangle + (1.0 - dirtiness) * (clean - triangle)
}

#[inline]
fn transistor_vca(s: f32, gain: f32) -> f32 {
    let s = (s - 0.6) * gain;
    3.0 * s / (2.0 + s.abs()) + gain * 0.3
}

#[derive(Debug, Clone)]
pub struct SyntheticBassDrum {
    sample_rate: SampleRate,
    random: Random,

    f0: f32,
    phase: f32,
    phase_noise: f32,

    fm: f32,
    fm_lp: f32,
    body_env: f32,
    body_env_lp: f32,
    transient_env: f32,
    transient_env_lp: f32,
    sustain_gain: f32,
    tone_lp: f32,

    body_env_pulse_width: usize,
    fm_pulse_width: usize,

    click: Click,
    noise: AttackNoise,
}

impl SyntheticBassDrum {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            random: Random::new_with_seed(0xb0d7),
            f0: 0.0,
            phase: 0.0,
            phase_noise: 0.0,
            fm: 0.0,
            fm_lp: 0.0,
            body_env: 0.0,
            body_env_lp: 0.0,
            transient_env: 0.0,
            transient_env_lp: 0.0,
            sustain_gain: 0.0,
            tone_lp: 0.0,
            body_env_pulse_width: 0,
            fm_pulse_width: 0,
            click: Click::new(sample_rate),
            noise: AttackNoise::default(),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        *self = Self::new(sample_rate);
    }

    pub fn reset(&mut self) {
        self.f0 = 0.0;
        self.phase = 0.0;
        self.phase_noise = 0.0;
        self.fm = 0.0;
        self.fm_lp = 0.0;
        self.body_env = 0.0;
        self.body_env_lp = 0.0;
        self.transient_env = 0.0;
        self.transient_env_lp = 0.0;
        self.sustain_gain = 0.0;
        self.tone_lp = 0.0;
        self.body_env_pulse_width = 0;
        self.fm_pulse_width = 0;
        self.click.reset();
        self.noise = AttackNoise::default();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        sustain: bool,
        trigger: bool,
        accent: f32,
        f0: f32,
        tone: f32,
        decay: f32,
        dirtiness: f32,
        fm_envelope_amount: f32,
        fm_envelope_decay: f32,
        out: &mut [f32],
    ) {
        let size = out.len();
        let decay = decay * decay;
        let fm_envelope_decay = fm_envelope_decay * fm_envelope_decay;
        let dirtiness = dirtiness * (1.0 - 8.0 * f0).max(0.0);

        let sr = &self.sample_rate;
        let fm_decay = 1.0 - 1.0 / sr.samples(0.008 * (1.0 + fm_envelope_decay * 4.0));
        let body_env_decay = 1.0 - 1.0 / sr.samples(0.02) * semitones_to_ratio(-decay * 60.0);
        let transient_env_decay = 1.0 - 1.0 / sr.samples(0.005);
        let tone_f = (4.0 * f0 * semitones_to_ratio(tone * 108.0)).min(1.0);
        let transient_level = tone;

        if trigger {
            self.fm = 1.0;
            self.body_env = 0.3 + 0.7 * accent;
            self.transient_env = self.body_env;
            self.body_env_pulse_width = sr.samples(0.001) as usize;
            self.fm_pulse_width = sr.samples(0.0013) as usize;
        }

        let mut f0_mod = ParameterInterpolator::new(&mut self.f0, f0, size);
        let mut sustain_gain = ParameterInterpolator::new(&mut self.sustain_gain, accent * decay, size);

        for sample in out.iter_mut() {
            one_pole(&mut self.phase_noise, self.random.get_float() - 0.5, 0.002);

            let mut mix = 0.0;
            if sustain {
                self.phase += f0_mod.next();
                if self.phase >= 1.0 {
                    self.phase -= 1.0;
                }
                let body = distorted_sine(self.phase, self.phase_noise, dirtiness);
                mix -= transistor_vca(body, sustain_gain.next());
            } else {
                if self.fm_pulse_width > 0 {
                    self.fm_pulse_width -= 1;
                    self.phase = 0.25;
                } else {
                    self.fm *= fm_decay;
                    let fm = 1.0 + fm_envelope_amount * 3.5 * self.fm_lp;
                    self.phase += (f0_mod.next() * fm).min(0.5);
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                    }
                }

                if self.body_env_pulse_width > 0 {
                    self.body_env_pulse_width -= 1;
                } else {
                    self.body_env *= body_env_decay;
                    self.transient_env *= transient_env_decay;
                }

                const ENVELOPE_LP: f32 = 0.1;
                one_pole(&mut self.body_env_lp, self.body_env, ENVELOPE_LP);
                one_pole(&mut self.transient_env_lp, self.transient_env, ENVELOPE_LP);
                one_pole(&mut self.fm_lp, self.fm, ENVELOPE_LP);

                let body = distorted_sine(self.phase, self.phase_noise, dirtiness);
                let click_input = if self.body_env_pulse_width > 0 { 0.0 } else { 1.0 };
                let transient = self.click.process(click_input) + self.noise.render(&mut self.random);

                mix -= transistor_vca(body, self.body_env_lp);
                mix -= transient * self.transient_env_lp * transient_level;
            }

            one_pole(&mut self.tone_lp, mix, tone_f);
            *sample = self.tone_lp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(dirtiness: f32) -> Vec<f32> {
        let sr = SampleRate::default();
        let mut drum = SyntheticBassDrum::new(&sr);
        let mut response = Vec::new();
        for n in 0..400 {
            let mut out = [0.0; 24];
            drum.render(false, n == 0, 0.8, 0.001, 0.4, 0.3, dirtiness, 0.5, 0.3, &mut out);
            response.extend_from_slice(&out);
        }
        response
    }

    #[test]
    fn hit_is_bounded_and_fades() {
        let response = hit(0.3);
        assert!(response.iter().all(|x| x.is_finite() && x.abs() < 4.0));
        let head: f32 = response[..2_400].iter().map(|x| x * x).sum();
        let tail: f32 = response[7_200..].iter().map(|x| x * x).sum();
        assert!(head > tail);
    }

    #[test]
    fn distorted_sine_is_clean_without_dirt() {
        for i in 0..16 {
            let phase = i as f32 / 16.0;
            let expected = sine(phase + 0.75);
            assert!((distorted_sine(phase, 0.3, 0.0) - expected).abs() < 1e-5);
        }
    }
}
