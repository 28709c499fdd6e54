//! Snare from two coupled distorted sines and filtered white noise.
//!
//! The wires hold at full level for 40 to 70 ms before decaying. At low
//! pitches the two oscillators reset each other slightly early, which adds
//! the gritty intermodulation of the circuit this is modelled on.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, OnePole, Svf};
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::dsp::ParameterInterpolator;

use super::distorted_triangle;

#[derive(Debug, Clone)]
pub struct SyntheticSnareDrum {
    sample_rate: SampleRate,
    random: Random,

    phase: [f32; 2],
    drum_amplitude: f32,
    snare_amplitude: f32,
    fm: f32,
    sustain_gain: f32,
    hold_counter: usize,

    drum_lp: OnePole,
    snare_hp: OnePole,
    snare_lp: Svf,
}

impl SyntheticSnareDrum {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            random: Random::new_with_seed(0x5e5e),
            phase: [0.0; 2],
            drum_amplitude: 0.0,
            snare_amplitude: 0.0,
            fm: 0.0,
            sustain_gain: 0.0,
            hold_counter: 0,
            drum_lp: OnePole::new(),
            snare_hp: OnePole::new(),
            snare_lp: Svf::new(),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.phase = [0.0; 2];
        self.drum_amplitude = 0.0;
        self.snare_amplitude = 0.0;
        self.fm = 0.0;
        self.sustain_gain = 0.0;
        self.hold_counter = 0;
        self.drum_lp.reset();
        self.snare_hp.reset();
        self.snare_lp.reset();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        sustain: bool,
        trigger: bool,
        accent: f32,
        f0: f32,
        fm_amount: f32,
        decay: f32,
        snappy: f32,
        out: &mut [f32],
    ) {
        let sr = self.sample_rate;
        let decay_xt = decay * (1.0 + decay * (decay - 1.0));
        let fm_amount = fm_amount * fm_amount;
        let drum_decay = 1.0
            - 1.0 / sr.samples(0.015)
                * semitones_to_ratio(-decay_xt * 72.0 - fm_amount * 12.0 + snappy * 7.0);
        let snare_decay =
            1.0 - 1.0 / sr.samples(0.01) * semitones_to_ratio(-decay * 60.0 - snappy * 7.0);
        let fm_decay = 1.0 - 1.0 / sr.samples(0.007);

        let snappy = (snappy * 1.1 - 0.05).clamp(0.0, 1.0);
        let drum_level = (1.0 - snappy).sqrt();
        let snare_level = snappy.sqrt();

        let snare_f_min = (10.0 * f0).min(0.5);
        let snare_f_max = (35.0 * f0).min(0.5);
        self.snare_hp.set_f(snare_f_min, FrequencyApproximation::Fast);
        self.snare_lp
            .set_f_q(snare_f_max, 0.5 + 2.0 * snappy, FrequencyApproximation::Fast);
        self.drum_lp.set_f(3.0 * f0, FrequencyApproximation::Fast);

        if trigger {
            self.drum_amplitude = 0.3 + 0.7 * accent;
            self.snare_amplitude = self.drum_amplitude;
            self.fm = 1.0;
            self.phase = [0.0; 2];
            self.hold_counter = sr.samples(0.04 + decay * 0.03) as usize;
        }

        let size = out.len();
        let mut sustain_gain = ParameterInterpolator::new(&mut self.sustain_gain, accent * decay, size);

        let reset_noise_amount = ((0.125 - f0) * 8.0).clamp(0.0, 1.0);
        let reset_noise_amount = reset_noise_amount * reset_noise_amount * fm_amount;

        for (i, sample) in out.iter_mut().enumerate() {
            if sustain {
                self.snare_amplitude = sustain_gain.next();
                self.drum_amplitude = self.snare_amplitude;
                self.fm = 0.0;
            } else {
                // The drum tail decays at half rate once it gets quiet.
                let remaining = size - i - 1;
                if self.drum_amplitude > 0.03 || remaining & 1 == 0 {
                    self.drum_amplitude *= drum_decay;
                }
                if self.hold_counter > 0 {
                    self.hold_counter -= 1;
                } else {
                    self.snare_amplitude *= snare_decay;
                }
                self.fm *= fm_decay;
            }

            let mut reset_noise = 0.0;
            reset_noise += if self.phase[0] > 0.5 { -1.0 } else { 1.0 };
            reset_noise += if self.phase[1] > 0.5 { -1.0 } else { 1.0 };
            reset_noise *= reset_noise_amount * 0.025;

            let f = f0 * (1.0 + fm_amount * (4.0 * self.fm));
            self.phase[0] += f;
            self.phase[1] += f * 1.47;
            if reset_noise_amount > 0.1 {
                for phase in self.phase.iter_mut() {
                    if *phase >= 1.0 + reset_noise {
                        *phase = 1.0 - *phase;
                    }
                }
            } else {
                for phase in self.phase.iter_mut() {
                    if *phase >= 1.0 {
                        *phase -= 1.0;
                    }
                }
            }

            let mut drum = -0.1;
            drum += distorted_triangle(self.phase[0], 1.3) * 0.60;
            drum += distorted_triangle(self.phase[1], 1.3) * 0.25;
            drum *= self.drum_amplitude * drum_level;
            let drum = self.drum_lp.lowpass(drum);

            let noise = self.random.get_float();
            let snare = self.snare_lp.process(noise, FilterMode::LowPass);
            let snare = self.snare_hp.highpass(snare);
            let snare = (snare + 0.1) * (self.snare_amplitude + self.fm) * snare_level;

            *sample = snare + drum;
        }
    }
}
