//! Filtered clocked noise.
//!
//! Two clocked noise sources, the second clocked at the ratio between the
//! two filter frequencies. `out` runs the first through a filter sweeping
//! from low-pass through band-pass to high-pass with `harmonics`; `aux` runs
//! both through band-passes a `harmonics`-controlled interval apart. Without
//! a trigger patched the clock can go down to sub-audio steps; a trigger
//! resyncs both clocks.

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::units::semitones_to_ratio;
use crate::dsp::ParameterInterpolator;
use crate::noise::ClockedNoise;

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct NoiseEngine {
    sample_rate: SampleRate,
    clocked_noise: [ClockedNoise; 2],
    lp_hp_filter: Svf,
    bp_filter: [Svf; 2],

    previous_f0: f32,
    previous_f1: f32,
    previous_q: f32,
    previous_mode: f32,
}

impl Default for NoiseEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            clocked_noise: [ClockedNoise::new(0x401e), ClockedNoise::new(0x401f)],
            lp_hp_filter: Svf::new(),
            bp_filter: [Svf::new(); 2],
            previous_f0: 0.0,
            previous_f1: 0.0,
            previous_q: 0.0,
            previous_mode: 0.0,
        }
    }
}

impl Engine for NoiseEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    fn reset(&mut self) {
        for noise in self.clocked_noise.iter_mut() {
            noise.reset();
        }
        self.lp_hp_filter.reset();
        for filter in self.bp_filter.iter_mut() {
            filter.reset();
        }
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let size = out.len();
        let sr = self.sample_rate;
        let f0 = sr.note_to_frequency(parameters.note);
        let f1 = sr.note_to_frequency(parameters.note + parameters.harmonics * 48.0 - 24.0);
        let clock_lowest_note = if parameters.trigger.is_unpatched() { 0.0 } else { -24.0 };
        let clock_f =
            sr.note_to_frequency(parameters.timbre * (128.0 - clock_lowest_note) + clock_lowest_note);
        let q = 0.5 * semitones_to_ratio(parameters.morph * 120.0);
        let sync = parameters.trigger.is_rising_edge();

        let second_source = scratch.first(size);
        self.clocked_noise[0].render(sync, clock_f, aux);
        self.clocked_noise[1].render(sync, clock_f * f1 / f0, second_source);

        let mut f0_modulation = ParameterInterpolator::new(&mut self.previous_f0, f0, size);
        let mut f1_modulation = ParameterInterpolator::new(&mut self.previous_f1, f1, size);
        let mut q_modulation = ParameterInterpolator::new(&mut self.previous_q, q, size);
        let mut mode_modulation = ParameterInterpolator::new(&mut self.previous_mode, parameters.harmonics, size);

        for ((o, a), &input_2) in out.iter_mut().zip(aux.iter_mut()).zip(second_source.iter()) {
            let f0 = f0_modulation.next();
            let f1 = f1_modulation.next();
            let q = q_modulation.next();
            let gain = 1.0 / ((0.5 + q) * 40.0 * f0).max(1e-6).sqrt();
            self.lp_hp_filter.set_f_q(f0, q, FrequencyApproximation::Accurate);
            self.bp_filter[0].set_f_q(f0, q, FrequencyApproximation::Accurate);
            self.bp_filter[1].set_f_q(f1, q, FrequencyApproximation::Accurate);

            let input_1 = *a * gain;
            let input_2 = input_2 * gain;
            *o = self.lp_hp_filter.process_multimode(input_1, mode_modulation.next());
            *a = self.bp_filter[0].process(input_1, FilterMode::BandPass)
                + self.bp_filter[1].process(input_2, FilterMode::BandPass);
        }
    }
}
