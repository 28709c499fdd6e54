//! Snare built from a handful of ringing shell modes and band-passed noise.
//!
//! Below two thirds of `tone` only the two lowest modes sound, crossfading
//! from a boomy fundamental to a knocky overtone. Above that, three more
//! modes fade in. `snappy` balances the shell against the wires.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::oscillator::SineOscillator;
use crate::dsp::random::Random;
use crate::dsp::units::{one_pole, semitones_to_ratio, soft_clip};
use crate::dsp::ParameterInterpolator;

const NUM_MODES: usize = 5;
const MODE_FREQUENCIES: [f32; NUM_MODES] = [1.00, 2.00, 3.18, 4.16, 5.62];

#[derive(Debug, Clone)]
pub struct AnalogSnareDrum {
    trigger_pulse_duration: usize,
    pulse_decay: f32,
    random: Random,

    pulse_remaining_samples: usize,
    pulse: f32,
    pulse_height: f32,
    pulse_lp: f32,
    noise_envelope: f32,
    sustain_gain: f32,

    resonator: [Svf; NUM_MODES],
    oscillator: [SineOscillator; NUM_MODES],
    noise_filter: Svf,
}

impl AnalogSnareDrum {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut drum = Self {
            trigger_pulse_duration: 0,
            pulse_decay: 0.0,
            random: Random::new_with_seed(0x5a4e),
            pulse_remaining_samples: 0,
            pulse: 0.0,
            pulse_height: 0.0,
            pulse_lp: 0.0,
            noise_envelope: 0.0,
            sustain_gain: 0.0,
            resonator: [Svf::new(); NUM_MODES],
            oscillator: [SineOscillator::new(); NUM_MODES],
            noise_filter: Svf::new(),
        };
        drum.init(sample_rate);
        drum
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.trigger_pulse_duration = sample_rate.samples(1.0e-3) as usize;
        self.pulse_decay = 1.0 / sample_rate.samples(0.1e-3);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.pulse_remaining_samples = 0;
        self.pulse = 0.0;
        self.pulse_height = 0.0;
        self.pulse_lp = 0.0;
        self.noise_envelope = 0.0;
        self.sustain_gain = 0.0;
        for (resonator, oscillator) in self.resonator.iter_mut().zip(self.oscillator.iter_mut()) {
            resonator.reset();
            oscillator.reset();
        }
        self.noise_filter.reset();
    }

    /// Mode gains for a `tone` in [0, 1].
    fn mode_gains(tone: f32) -> [f32; NUM_MODES] {
        let mut gain = [0.0; NUM_MODES];
        if tone < 2.0 / 3.0 {
            let tone = tone * 1.5;
            gain[0] = 1.5 + (1.0 - tone) * (1.0 - tone) * 4.5;
            gain[1] = 2.0 * tone + 0.15;
        } else {
            let mut tone = (tone - 2.0 / 3.0) * 3.0;
            gain[0] = 1.5 - tone * 0.5;
            gain[1] = 2.15 - tone * 0.7;
            for g in gain.iter_mut().skip(2) {
                *g = tone;
                tone *= tone;
            }
        }
        gain
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
        snappy: f32,
        out: &mut [f32],
    ) {
        let decay_xt = decay * (1.0 + decay * (decay - 1.0));
        let q = 2_000.0 * semitones_to_ratio(decay_xt * 84.0);
        let noise_envelope_decay =
            1.0 - 0.0017 * semitones_to_ratio(-decay * (50.0 + snappy * 10.0));
        let exciter_leak = snappy * (2.0 - snappy) * 0.1;
        let snappy = (snappy * 1.1 - 0.05).clamp(0.0, 1.0);

        if trigger {
            self.pulse_remaining_samples = self.trigger_pulse_duration;
            self.pulse_height = 3.0 + 7.0 * accent;
            self.noise_envelope = 2.0;
        }

        let mut f = [0.0; NUM_MODES];
        for (i, resonator) in self.resonator.iter_mut().enumerate() {
            f[i] = (f0 * MODE_FREQUENCIES[i]).min(0.499);
            let mode_q = if i == 0 { q } else { q * 0.25 };
            resonator.set_f_q(f[i], 1.0 + f[i] * mode_q, FrequencyApproximation::Fast);
        }
        let gain = Self::mode_gains(tone.clamp(0.0, 1.0));

        let f_noise = (f0 * 16.0).clamp(0.0, 0.499);
        self.noise_filter
            .set_f_q(f_noise, 1.0 + f_noise * 1.5, FrequencyApproximation::Fast);

        let mut sustain_gain = ParameterInterpolator::new(&mut self.sustain_gain, accent * decay, out.len());

        for sample in out.iter_mut() {
            let pulse;
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

            let sustain_gain_value = sustain_gain.next();
            one_pole(&mut self.pulse_lp, pulse, 0.75);

            let mut shell = 0.0;
            for i in 0..NUM_MODES {
                let excitation = if i == 0 {
                    (pulse - self.pulse_lp) + 0.006 * pulse
                } else {
                    0.026 * pulse
                };
                let mode = if sustain {
                    self.oscillator[i].next(f[i]) * sustain_gain_value * 0.25
                } else {
                    self.resonator[i].process(excitation, FilterMode::BandPass) + excitation * exciter_leak
                };
                shell += gain[i] * mode;
            }
            let shell = soft_clip(shell);

            let noise = self.random.get_bipolar().max(0.0);
            self.noise_envelope *= noise_envelope_decay;
            let level = if sustain { sustain_gain_value } else { self.noise_envelope };
            let noise = noise * level * snappy * 2.0;
            let noise = self.noise_filter.process(noise, FilterMode::BandPass);

            *sample = noise + shell * (1.0 - snappy);
        }
    }
}
