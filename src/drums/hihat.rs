//! Hi-hat: metallic noise, band-passed, through a VCA, then high-passed.
//!
//! Two sources of metallic noise are available. `Square` sums six detuned
//! square waves the way the classic drum machine does. `RingMod` multiplies
//! three pairs of oscillators. A variable amount of clocked white noise is
//! mixed in to push the sound from cymbal towards plain hiss.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::oscillator::{Oscillator, OscillatorShape};
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::dsp::ParameterInterpolator;
use crate::MAX_BLOCK_SIZE;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetallicNoise {
    Square,
    RingMod,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcaType {
    /// Asymmetric saturating VCA with a DC offset.
    Swing,
    Linear,
}

impl VcaType {
    #[inline]
    fn apply(self, s: f32, gain: f32) -> f32 {
        match self {
            VcaType::Swing => {
                let s = s * if s > 0.0 { 10.0 } else { 0.1 };
                let s = s / (1.0 + s.abs());
                (s + 1.0) * gain
            }
            VcaType::Linear => s * gain,
        }
    }
}

const SQUARE_RATIOS: [f32; 6] = [1.0, 1.304, 1.466, 1.787, 1.932, 2.536];

#[derive(Debug, Clone, Copy, Default)]
struct SquareNoise {
    phase: [u32; 6],
}

impl SquareNoise {
    fn render(&mut self, f0: f32, out: &mut [f32]) {
        let mut increment = [0u32; 6];
        for (inc, ratio) in increment.iter_mut().zip(SQUARE_RATIOS.iter()) {
            let f = (f0 * ratio).min(0.499);
            *inc = (f * 4_294_967_296.0) as u32;
        }
        for sample in out.iter_mut() {
            let mut noise = 0u32;
            for (phase, inc) in self.phase.iter_mut().zip(increment.iter()) {
                *phase = phase.wrapping_add(*inc);
                noise += *phase >> 31;
            }
            *sample = 0.33 * noise as f32 - 1.0;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RingModNoise {
    oscillator: [Oscillator; 6],
}

impl RingModNoise {
    fn render(&mut self, f0: f32, inv_sample_rate: f32, out: &mut [f32]) {
        const PAIRS: [(f32, f32); 3] = [(200.0, 7_530.0), (510.0, 8_075.0), (730.0, 10_500.0)];
        let ratio = f0 / (0.01 + f0);
        out.fill(0.0);
        for (pair, (fa, fb)) in self.oscillator.chunks_mut(2).zip(PAIRS.iter()) {
            let mut temp_1 = [0.0; MAX_BLOCK_SIZE];
            let mut temp_2 = [0.0; MAX_BLOCK_SIZE];
            let temp_1 = &mut temp_1[..out.len()];
            let temp_2 = &mut temp_2[..out.len()];
            pair[0].render(OscillatorShape::Square, fa * inv_sample_rate * ratio, 0.5, None, temp_1);
            pair[1].render(OscillatorShape::Saw, fb * inv_sample_rate * ratio, 0.5, None, temp_2);
            for ((y, a), b) in out.iter_mut().zip(temp_1.iter()).zip(temp_2.iter()) {
                *y += a * b;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HiHat {
    sample_rate: SampleRate,
    random: Random,

    envelope: f32,
    noise_clock: f32,
    noise_sample: f32,
    sustain_gain: f32,

    square_noise: SquareNoise,
    ring_mod_noise: RingModNoise,
    noise_coloration_svf: Svf,
    hpf: Svf,
}

impl HiHat {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            random: Random::new_with_seed(0x4a7),
            envelope: 0.0,
            noise_clock: 0.0,
            noise_sample: 0.0,
            sustain_gain: 0.0,
            square_noise: SquareNoise::default(),
            ring_mod_noise: RingModNoise::default(),
            noise_coloration_svf: Svf::new(),
            hpf: Svf::new(),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.noise_clock = 0.0;
        self.noise_sample = 0.0;
        self.sustain_gain = 0.0;
        self.square_noise = SquareNoise::default();
        self.ring_mod_noise = RingModNoise::default();
        self.noise_coloration_svf.reset();
        self.hpf.reset();
    }

    /// Renders into `out`; `temp` must be at least as long as `out`.
    ///
    /// `resonance` raises the Q of the coloration band-pass with `tone`.
    /// `two_stage_envelope` switches to a faster decay once the envelope
    /// drops below half, for a tighter closed hat.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        sustain: bool,
        trigger: bool,
        accent: f32,
        f0: f32,
        tone: f32,
        decay: f32,
        noisiness: f32,
        metallic_noise: MetallicNoise,
        vca: VcaType,
        resonance: bool,
        two_stage_envelope: bool,
        temp: &mut [f32],
        out: &mut [f32],
    ) {
        let size = out.len();
        let temp = &mut temp[..size];
        let envelope_decay = 1.0 - 0.003 * semitones_to_ratio(-decay * 84.0);
        let cut_decay = 1.0 - 0.0025 * semitones_to_ratio(-decay * 36.0);

        if trigger {
            self.envelope = (1.5 + 0.5 * (1.0 - decay)) * (0.3 + 0.7 * accent);
        }

        match metallic_noise {
            MetallicNoise::Square => self.square_noise.render(2.0 * f0, temp),
            MetallicNoise::RingMod => {
                for chunk in temp.chunks_mut(MAX_BLOCK_SIZE) {
                    self.ring_mod_noise
                        .render(2.0 * f0, self.sample_rate.inv_sample_rate, chunk);
                }
            }
        }

        let inv_sr = self.sample_rate.inv_sample_rate;
        let cutoff = (150.0 * inv_sr * semitones_to_ratio(tone * 72.0)).clamp(0.0, 16_000.0 * inv_sr);
        let q = if resonance { 3.0 + 6.0 * tone } else { 1.0 };
        self.noise_coloration_svf
            .set_f_q(cutoff, q, FrequencyApproximation::Accurate);
        self.noise_coloration_svf
            .process_buffer(temp, FilterMode::BandPass);

        let noisiness = noisiness * noisiness;
        let noise_f = (f0 * (16.0 + 16.0 * (1.0 - noisiness))).clamp(0.0, 0.5);
        for sample in temp.iter_mut() {
            self.noise_clock += noise_f;
            if self.noise_clock >= 1.0 {
                self.noise_clock -= 1.0;
                self.noise_sample = self.random.get_float() - 0.5;
            }
            *sample += noisiness * (self.noise_sample - *sample);
        }

        let mut sustain_gain = ParameterInterpolator::new(&mut self.sustain_gain, accent * decay, size);
        for sample in temp.iter_mut() {
            self.envelope *= if self.envelope > 0.5 || !two_stage_envelope {
                envelope_decay
            } else {
                cut_decay
            };
            let gain = if sustain { sustain_gain.next() } else { self.envelope };
            *sample = vca.apply(*sample, gain);
        }

        self.hpf.set_f_q(cutoff, 0.5, FrequencyApproximation::Accurate);
        for (y, x) in out.iter_mut().zip(temp.iter()) {
            *y = self.hpf.process(*x, FilterMode::HighPass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(noise: MetallicNoise, vca: VcaType, two_stage: bool, decay: f32) -> Vec<f32> {
        let sr = SampleRate::default();
        let mut hat = HiHat::new(&sr);
        let mut temp = [0.0; 24];
        let mut response = Vec::new();
        for n in 0..200 {
            let mut out = [0.0; 24];
            hat.render(
                false, n == 0, 0.8, 0.01, 0.5, decay, 0.2, noise, vca, true, two_stage, &mut temp,
                &mut out,
            );
            response.extend_from_slice(&out);
        }
        response
    }

    #[test]
    fn square_hat_rings_then_fades() {
        let response = hit(MetallicNoise::Square, VcaType::Swing, false, 0.5);
        assert!(response.iter().all(|x| x.is_finite()));
        let head: f32 = response[..480].iter().map(|x| x * x).sum();
        let tail: f32 = response[4_000..].iter().map(|x| x * x).sum();
        assert!(head > 1e-4);
        assert!(tail < head);
    }

    #[test]
    fn two_stage_envelope_closes_faster() {
        let open = hit(MetallicNoise::RingMod, VcaType::Linear, false, 0.2);
        let closed = hit(MetallicNoise::RingMod, VcaType::Linear, true, 0.2);
        let late = |x: &[f32]| x[2_400..].iter().map(|s| s * s).sum::<f32>();
        assert!(late(&closed) < late(&open));
    }

    #[test]
    fn swing_vca_is_asymmetric() {
        assert!(VcaType::Swing.apply(0.5, 1.0) > 1.5);
        assert!(VcaType::Swing.apply(-0.5, 1.0) > 0.9);
        assert_eq!(VcaType::Linear.apply(-0.5, 2.0), -1.0);
    }
}
