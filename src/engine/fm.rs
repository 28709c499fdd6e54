//! Two-operator phase modulation, rendered 4x oversampled.
//!
//! `harmonics` picks the modulator ratio from a table with wide plateaus on
//! musical ratios, `timbre` the modulation index and `morph` the feedback:
//! towards 0 the carrier modulates the modulator's frequency (chaotic),
//! towards 1 the modulator modulates its own phase (harsh, saw-like). `aux`
//! carries a sub-octave operator modulated by the carrier.

use crate::config::SampleRate;
use crate::dsp::downsampler::{Downsampler, OVERSAMPLING};
use crate::dsp::oscillator::sine_pm;
use crate::dsp::tables::FM_FREQUENCY_QUANTIZER;
use crate::dsp::units::{interpolate, one_pole};
use crate::dsp::ParameterInterpolator;

use super::{Engine, EngineParameters, ScratchBuffers};

#[derive(Debug, Clone)]
pub struct FmEngine {
    sample_rate: SampleRate,
    carrier_phase: u32,
    modulator_phase: u32,
    sub_phase: u32,

    previous_carrier_frequency: f32,
    previous_modulator_frequency: f32,
    previous_amount: f32,
    previous_feedback: f32,
    previous_sample: f32,

    sub_fir: f32,
    carrier_fir: f32,
}

impl Default for FmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FmEngine {
    pub fn new() -> Self {
        let sample_rate = SampleRate::default();
        Self {
            sample_rate,
            carrier_phase: 0,
            modulator_phase: 0,
            sub_phase: 0,
            previous_carrier_frequency: sample_rate.a0,
            previous_modulator_frequency: sample_rate.a0,
            previous_amount: 0.0,
            previous_feedback: 0.0,
            previous_sample: 0.0,
            sub_fir: 0.0,
            carrier_fir: 0.0,
        }
    }
}

impl Engine for FmEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        *self = Self {
            sample_rate: *sample_rate,
            previous_carrier_frequency: sample_rate.a0,
            previous_modulator_frequency: sample_rate.a0,
            ..Self::new()
        };
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let size = out.len();
        let note = parameters.note;
        let ratio = interpolate(
            &FM_FREQUENCY_QUANTIZER,
            parameters.harmonics,
            (FM_FREQUENCY_QUANTIZER.len() - 1) as f32,
        );
        let modulator_note = note + ratio;
        let target_modulator_frequency = self.sample_rate.note_to_frequency(modulator_note).clamp(0.0, 0.5);

        // Less modulation index for high notes, where the sidebands alias.
        let hf_taming = (1.0 - (modulator_note - 72.0) * 0.025).clamp(0.0, 1.0);
        let hf_taming = hf_taming * hf_taming;

        let mut carrier_frequency = ParameterInterpolator::new(
            &mut self.previous_carrier_frequency,
            self.sample_rate.note_to_frequency(note),
            size,
        );
        let mut modulator_frequency =
            ParameterInterpolator::new(&mut self.previous_modulator_frequency, target_modulator_frequency, size);
        let mut amount_modulation = ParameterInterpolator::new(
            &mut self.previous_amount,
            2.0 * parameters.timbre * parameters.timbre * hf_taming,
            size,
        );
        let mut feedback_modulation =
            ParameterInterpolator::new(&mut self.previous_feedback, 2.0 * parameters.morph - 1.0, size);

        let mut carrier_downsampler = Downsampler::new(&mut self.carrier_fir);
        let mut sub_downsampler = Downsampler::new(&mut self.sub_fir);
        let scale = 1.0 / OVERSAMPLING as f32;

        for (o, a) in out.iter_mut().zip(aux.iter_mut()) {
            let amount = amount_modulation.next();
            let feedback = feedback_modulation.next();
            let phase_feedback = if feedback < 0.0 { 0.5 * feedback * feedback } else { 0.0 };
            let modulator_fb = if feedback > 0.0 { 0.25 * feedback * feedback } else { 0.0 };
            let carrier_increment = (4_294_967_296.0 * carrier_frequency.next() * scale) as u32;
            let modulator_f = modulator_frequency.next() * scale;

            for j in 0..OVERSAMPLING {
                let modulator_increment =
                    (4_294_967_296.0 * modulator_f * (1.0 + self.previous_sample * phase_feedback)).max(0.0) as u32;
                self.modulator_phase = self.modulator_phase.wrapping_add(modulator_increment);
                self.carrier_phase = self.carrier_phase.wrapping_add(carrier_increment);
                self.sub_phase = self.sub_phase.wrapping_add(carrier_increment >> 1);

                let modulator = sine_pm(self.modulator_phase, modulator_fb * self.previous_sample);
                let carrier = sine_pm(self.carrier_phase, amount * modulator);
                let sub = sine_pm(self.sub_phase, amount * carrier * 0.25);
                one_pole(&mut self.previous_sample, carrier, 0.05);
                carrier_downsampler.accumulate(j, carrier);
                sub_downsampler.accumulate(j, sub);
            }
            *o = carrier_downsampler.read();
            *a = sub_downsampler.read();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn without_modulation_the_carrier_is_a_sine() {
        let mut engine = FmEngine::new();
        engine.init(&SampleRate::default());
        let mut p = parameters(60.0);
        p.timbre = 0.0;
        p.morph = 0.5;
        let (out, _) = render_blocks(&mut engine, p, false, 400);
        // A unit sine has an RMS of 1/sqrt(2).
        let level = rms(&out[1_200..]);
        assert!((level - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05, "rms {}", level);
    }

    #[test]
    fn extreme_feedback_stays_bounded() {
        for morph in [0.0, 1.0] {
            let mut engine = FmEngine::new();
            engine.init(&SampleRate::default());
            let mut p = parameters(36.0);
            p.timbre = 1.0;
            p.morph = morph;
            let (out, aux) = render_blocks(&mut engine, p, false, 200);
            assert!(out.iter().chain(aux.iter()).all(|x| x.is_finite() && x.abs() <= 1.1));
        }
    }
}
