//! Vowel synthesis through a formant filter bank.
//!
//! A band-limited glottal saw plus a little breath noise excites five
//! band-pass formants. `timbre` morphs the vowel through a, e, i, o, u and
//! `morph` shifts every formant up or down two octaves, from a giant to a
//! chipmunk.
//!
//! `harmonics` below 1/6 holds a steady vowel. Above it the engine turns
//! into a syllable generator: each trigger restarts an amplitude envelope
//! and a glide from a neighbouring vowel, and the syllable lengthens as
//! `harmonics` rises. With syllables fully on and a trigger patched, the
//! engine shapes its own amplitude and the voice skips its LPG.
//!
//! `aux` is a lo-fi rendition: a square source through the first two
//! formants, crushed to a handful of levels.

use crate::config::SampleRate;
use crate::dsp::envelope::DecayEnvelope;
use crate::dsp::filter::{FrequencyApproximation, OnePole};
use crate::dsp::oscillator::{Oscillator, OscillatorShape};
use crate::dsp::random::Random;
use crate::dsp::units::semitones_to_ratio;
use crate::dsp::ParameterInterpolator;
use crate::fx::formant_filter::NUM_FORMANTS;
use crate::fx::FormantFilter;

use super::{Engine, EngineParameters, ScratchBuffers};

const BREATH: f32 = 0.05;
const GLOTTIS_CUTOFF_HZ: f32 = 4_000.0;
const MAKEUP_GAIN: f32 = 2.5;
const CRUSH_LEVELS: f32 = 8.0;

/// Syllable amount for `harmonics`: 0 holds a steady vowel, 1 is fully
/// syllabic.
#[inline]
pub(crate) fn syllable_amount(harmonics: f32) -> f32 {
    1.0 - (2.0 - harmonics * 6.0).clamp(0.0, 1.0)
}

pub struct SpeechEngine {
    sample_rate: SampleRate,
    glottis: Oscillator,
    lofi_glottis: Oscillator,
    glottis_filter: OnePole,
    random: Random,
    formants: FormantFilter,
    lofi_formants: FormantFilter,
    envelope: DecayEnvelope,
    previous_gain: f32,
}

impl SpeechEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            glottis: Oscillator::new(),
            lofi_glottis: Oscillator::new(),
            glottis_filter: OnePole::new(),
            random: Random::new_with_seed(0x5eec),
            formants: FormantFilter::new(sample_rate),
            lofi_formants: FormantFilter::new(sample_rate),
            envelope: DecayEnvelope::new(),
            previous_gain: 0.0,
        }
    }
}

impl Engine for SpeechEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.formants.init(sample_rate);
        self.lofi_formants.init(sample_rate);
        self.glottis_filter
            .set_f(GLOTTIS_CUTOFF_HZ * sample_rate.inv_sample_rate, FrequencyApproximation::Accurate);
        self.reset();
    }

    fn reset(&mut self) {
        self.glottis.reset();
        self.lofi_glottis.reset();
        self.glottis_filter.reset();
        self.formants.reset();
        self.lofi_formants.reset();
        self.envelope.reset();
        self.previous_gain = 0.0;
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        already_enveloped: &mut bool,
    ) {
        let size = out.len();
        let sr = self.sample_rate;
        let f0 = sr.note_to_frequency(parameters.note);

        let syllable = syllable_amount(parameters.harmonics);
        let syllable_length = 0.25 * semitones_to_ratio((parameters.harmonics - 1.0 / 3.0).max(0.0) * 36.0);
        if parameters.trigger.is_rising_edge() {
            self.envelope.trigger();
        }
        self.envelope.process(size as f32 / sr.samples(syllable_length));
        let envelope = if parameters.trigger.is_unpatched() {
            1.0
        } else {
            self.envelope.value()
        };
        *already_enveloped = syllable >= 1.0 && !parameters.trigger.is_unpatched();

        // Syllables open from the vowel a step further along.
        let glide = syllable * (1.0 - envelope) * 0.25;
        let vowel = (parameters.timbre + glide).clamp(0.0, 1.0);
        let shift = semitones_to_ratio((parameters.morph - 0.5) * 24.0);
        self.formants.set_vowel(vowel, shift, NUM_FORMANTS);
        self.lofi_formants.set_vowel(vowel, shift, 2);

        let (source, lofi_source) = scratch.split(size);
        self.glottis.render(OscillatorShape::Saw, f0, 0.5, None, source);
        for sample in source.iter_mut() {
            *sample = self.glottis_filter.lowpass(*sample) + BREATH * self.random.get_bipolar();
        }
        self.lofi_glottis
            .render(OscillatorShape::Square, f0, 0.5, None, lofi_source);

        self.formants.process(source, out);
        self.lofi_formants.process(lofi_source, aux);

        let target_gain = 1.0 - syllable + syllable * envelope;
        let mut gain = ParameterInterpolator::new(&mut self.previous_gain, target_gain * MAKEUP_GAIN, size);
        for (o, a) in out.iter_mut().zip(aux.iter_mut()) {
            let g = gain.next();
            *o *= g;
            *a = (*a * g * CRUSH_LEVELS).round() / CRUSH_LEVELS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::TriggerState;
    use super::*;

    #[test]
    fn syllable_mode_starts_above_a_sixth() {
        assert_eq!(syllable_amount(0.0), 0.0);
        assert_eq!(syllable_amount(0.15), 0.0);
        assert_eq!(syllable_amount(0.5), 1.0);
    }

    #[test]
    fn steady_vowel_sustains() {
        let sr = SampleRate::default();
        let mut engine = SpeechEngine::new(&sr);
        engine.init(&sr);
        let mut p = parameters(48.0);
        p.harmonics = 0.0;
        let (out, aux) = render_blocks(&mut engine, p, false, 800);
        assert!(rms(&out[4_800..]) > 0.01);
        assert!(rms(&aux[4_800..]) > 0.01);
        assert!(out.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn syllables_fade_and_claim_the_envelope() {
        let sr = SampleRate::default();
        let mut engine = SpeechEngine::new(&sr);
        engine.init(&sr);
        let mut p = parameters(48.0);
        p.harmonics = 0.4;
        p.trigger = TriggerState::RisingEdge;
        let mut scratch = ScratchBuffers::new();
        let mut out = [0.0; 12];
        let mut aux = [0.0; 12];
        let mut already_enveloped = false;
        engine.render(&p, &mut scratch, &mut out, &mut aux, &mut already_enveloped);
        assert!(already_enveloped);

        let (out, _) = render_blocks(&mut engine, p, true, 8_000);
        let head = rms(&out[1_200..6_000]);
        let tail = rms(&out[90_000..]);
        assert!(tail < head * 0.2, "head {} tail {}", head, tail);
    }
}
