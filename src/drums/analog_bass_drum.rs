//! Bridged-T style bass drum.
//!
//! A 1 ms trigger pulse is high-passed through a diode and rings a
//! band-pass filter with a very high Q. A longer FM pulse bends the pitch
//! up during the attack, and the filter's own low-passed output feeds back
//! into its frequency for the "punch" of a tuned-down kick.

use crate::config::SampleRate;
use crate::dsp::filter::{FrequencyApproximation, Svf};
use crate::dsp::tables::{cosine, sine};
use crate::dsp::units::{one_pole, semitones_to_ratio};
use crate::dsp::ParameterInterpolator;

use super::diode;

#[derive(Debug, Clone)]
pub struct AnalogBassDrum {
    trigger_pulse_duration: usize,
    fm_pulse_duration: usize,
    pulse_decay: f32,
    pulse_filter: f32,
    retrig_pulse_decay: f32,

    pulse_remaining_samples: usize,
    fm_pulse_remaining_samples: usize,
    pulse: f32,
    pulse_height: f32,
    pulse_lp: f32,
    fm_pulse_lp: f32,
    retrig_pulse: f32,
    lp_out: f32,
    tone_lp: f32,
    sustain_gain: f32,

    resonator: Svf,
    oscillator_phase: f32,
}

impl AnalogBassDrum {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut drum = Self {
            trigger_pulse_duration: 0,
            fm_pulse_duration: 0,
            pulse_decay: 0.0,
            pulse_filter: 0.0,
            retrig_pulse_decay: 0.0,
            pulse_remaining_samples: 0,
            fm_pulse_remaining_samples: 0,
            pulse: 0.0,
            pulse_height: 0.0,
            pulse_lp: 0.0,
            fm_pulse_lp: 0.0,
            retrig_pulse: 0.0,
            lp_out: 0.0,
            tone_lp: 0.0,
            sustain_gain: 0.0,
            resonator: Svf::new(),
            oscillator_phase: 0.0,
        };
        drum.init(sample_rate);
        drum
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.trigger_pulse_duration = sample_rate.samples(1.0e-3) as usize;
        self.fm_pulse_duration = sample_rate.samples(6.0e-3) as usize;
        self.pulse_decay = 1.0 / sample_rate.samples(0.2e-3);
        self.pulse_filter = 1.0 / sample_rate.samples(0.1e-3);
        self.retrig_pulse_decay = 1.0 / sample_rate.samples(0.05);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.pulse_remaining_samples = 0;
        self.fm_pulse_remaining_samples = 0;
        self.pulse = 0.0;
        self.pulse_height = 0.0;
        self.pulse_lp = 0.0;
        self.fm_pulse_lp = 0.0;
        self.retrig_pulse = 0.0;
        self.lp_out = 0.0;
        self.tone_lp = 0.0;
        self.sustain_gain = 0.0;
        self.resonator.reset();
        self.oscillator_phase = 0.0;
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
        attack_fm_amount: f32,
        self_fm_amount: f32,
        out: &mut [f32],
    ) {
        let f0 = f0.clamp(1e-5, 0.4);
        let scale = 0.001 / f0;
        let q = 1_500.0 * semitones_to_ratio(decay * 80.0);
        let tone_f = (4.0 * f0 * semitones_to_ratio(tone * 108.0)).min(1.0);
        let exciter_leak = 0.08 * (tone + 0.25);

        if trigger {
            self.pulse_remaining_samples = self.trigger_pulse_duration;
            self.fm_pulse_remaining_samples = self.fm_pulse_duration;
            self.pulse_height = 3.0 + 7.0 * accent;
            self.lp_out = 0.0;
        }

        let mut sustain_gain = ParameterInterpolator::new(&mut self.sustain_gain, accent * decay, out.len());

        for sample in out.iter_mut() {
            let mut pulse;
            if self.pulse_remaining_samples > 0 {
                self.pulse_remaining_samples -= 1;
                pulse = if self.pulse_remaining_samples > 0 {
                    self.pulse_height
                } else {
                    self.pulse_height - 1.0
                };
                self.pulse = pulse;
            } else {
                self.pulse *= 1.0 - self.pulse_decay;
                pulse = self.pulse;
            }
            if sustain {
                pulse = 0.0;
            }

            one_pole(&mut self.pulse_lp, pulse, self.pulse_filter);
            let pulse = diode((pulse - self.pulse_lp) + pulse * 0.044);

            let mut fm_pulse = 0.0;
            if self.fm_pulse_remaining_samples > 0 {
                self.fm_pulse_remaining_samples -= 1;
                fm_pulse = 1.0;
                self.retrig_pulse = if self.fm_pulse_remaining_samples > 0 { 0.0 } else { -0.8 };
            } else {
                self.retrig_pulse *= 1.0 - self.retrig_pulse_decay;
            }
            if sustain {
                fm_pulse = 0.0;
            }
            one_pole(&mut self.fm_pulse_lp, fm_pulse, self.pulse_filter);

            let punch = 0.7 + diode(10.0 * self.lp_out - 1.0);
            let attack_fm = self.fm_pulse_lp * 1.7 * attack_fm_amount;
            let self_fm = punch * 0.08 * self_fm_amount;
            let f = (f0 * (1.0 + attack_fm + self_fm)).clamp(0.0, 0.4);

            let resonator_out;
            if sustain {
                let amplitude = sustain_gain.next();
                self.oscillator_phase += f;
                if self.oscillator_phase >= 1.0 {
                    self.oscillator_phase -= 1.0;
                }
                resonator_out = amplitude * sine(self.oscillator_phase);
                self.lp_out = amplitude * cosine(self.oscillator_phase);
            } else {
                self.resonator
                    .set_f_q(f, 1.0 + q * f, FrequencyApproximation::Dirty);
                let outputs = self
                    .resonator
                    .next_sample((pulse - self.retrig_pulse * 0.2) * scale);
                resonator_out = outputs.bandpass;
                self.lp_out = outputs.lowpass;
            }

            one_pole(&mut self.tone_lp, pulse * exciter_leak + resonator_out, tone_f);
            *sample = self.tone_lp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kick_rings_then_decays() {
        let sr = SampleRate::default();
        let mut drum = AnalogBassDrum::new(&sr);
        let f0 = 50.0 / 48_000.0;
        let mut response = Vec::new();
        for n in 0..800 {
            let mut out = [0.0; 24];
            drum.render(false, n == 0, 0.8, f0, 0.5, 0.3, 0.5, 0.2, &mut out);
            response.extend_from_slice(&out);
        }
        assert!(response.iter().all(|x| x.is_finite() && x.abs() < 10.0));
        let head: f32 = response[..4_800].iter().map(|x| x * x).sum();
        let tail: f32 = response[14_400..].iter().map(|x| x * x).sum();
        assert!(head > 1e-4, "head energy {}", head);
        assert!(tail < head * 0.2);
    }

    #[test]
    fn sustain_holds_a_tone() {
        let sr = SampleRate::default();
        let mut drum = AnalogBassDrum::new(&sr);
        let mut out = [0.0; 24];
        for _ in 0..400 {
            drum.render(true, false, 0.8, 0.002, 0.5, 0.5, 0.0, 0.0, &mut out);
        }
        assert!(out.iter().any(|x| x.abs() > 0.01));
    }
}
