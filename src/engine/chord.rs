//! Divide-down string machine playing five-note chords.
//!
//! `harmonics` selects the chord, `morph` the organ/string registration and
//! `timbre` the brightness, which also drives the ensemble. Even chord notes
//! go to `out` and odd ones to `aux`; after the ensemble, `out` carries the
//! whole chord and `aux` the odd notes alone.

use crate::chords::{chord_ratios, ChordSelector, NOTES_PER_CHORD};
use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::units::one_pole;
use crate::fx::Ensemble;
use crate::oscillator::string_synth::NUM_REGISTRATION_STOPS;
use crate::oscillator::StringSynthOscillator;

use super::{Engine, EngineParameters, ScratchBuffers};

const NUM_REGISTRATIONS: usize = 11;

/// Footages 8', 8' square, 4', 4' square, 2', 2' square, 1', from a lone
/// saw (strings) to squares only (reedy organ).
const REGISTRATIONS: [[f32; NUM_REGISTRATION_STOPS]; NUM_REGISTRATIONS] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
    [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
    [0.5, 0.5, 0.5, 0.5, 0.5, 0.0, 0.5],
    [0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 1.0, 0.0, 0.5, 0.0, 0.5, 0.0],
    [0.0, 0.5, 0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
];

fn compute_registration(registration: f32) -> [f32; NUM_REGISTRATION_STOPS] {
    let position = registration.clamp(0.0, 1.0) * (NUM_REGISTRATIONS as f32 - 1.0001);
    let integral = position as usize;
    let fractional = position - integral as f32;
    let a = &REGISTRATIONS[integral];
    let b = &REGISTRATIONS[integral + 1];
    let mut stops = [0.0; NUM_REGISTRATION_STOPS];
    for (stop, (x, y)) in stops.iter_mut().zip(a.iter().zip(b.iter())) {
        *stop = x + (y - x) * fractional;
    }
    stops
}

pub struct ChordEngine {
    sample_rate: SampleRate,
    voices: [StringSynthOscillator; NOTES_PER_CHORD],
    chords: ChordSelector,
    filter: [Svf; 2],
    ensemble: Ensemble,

    morph_lp: f32,
    timbre_lp: f32,
}

impl ChordEngine {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            sample_rate: *sample_rate,
            voices: [StringSynthOscillator::new(); NOTES_PER_CHORD],
            chords: ChordSelector::new(),
            filter: [Svf::new(); 2],
            ensemble: Ensemble::new(sample_rate),
            morph_lp: 0.0,
            timbre_lp: 0.0,
        }
    }
}

impl Engine for ChordEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.ensemble.init(sample_rate);
        self.chords.reset();
        self.reset();
    }

    fn reset(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        for filter in self.filter.iter_mut() {
            filter.reset();
        }
        self.ensemble.reset();
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        one_pole(&mut self.morph_lp, parameters.morph, 0.1);
        one_pole(&mut self.timbre_lp, parameters.timbre, 0.1);

        let chord = self.chords.process(parameters.harmonics);
        let ratios = chord_ratios(chord);
        let registration = compute_registration(self.morph_lp);
        let f0 = self.sample_rate.note_to_frequency(parameters.note) * 0.998;

        out.fill(0.0);
        aux.fill(0.0);
        for (note, (voice, ratio)) in self.voices.iter_mut().zip(ratios.iter()).enumerate() {
            let destination: &mut [f32] = if note % 2 == 0 { &mut *out } else { &mut *aux };
            voice.render(f0 * ratio, &registration, 0.25, destination);
        }

        let cutoff = self
            .sample_rate
            .note_to_frequency(parameters.note + 24.0 + 84.0 * self.timbre_lp);
        for (filter, channel) in self.filter.iter_mut().zip([&mut *out, &mut *aux]) {
            filter.set_f_q(cutoff, 0.7, FrequencyApproximation::Dirty);
            filter.process_buffer(channel, FilterMode::LowPass);
        }

        self.ensemble.set_amount((self.timbre_lp - 0.5).abs() * 2.0);
        self.ensemble.set_depth(0.35 + 0.65 * self.timbre_lp);
        self.ensemble.process(out, aux);

        for (o, a) in out.iter_mut().zip(aux.iter()) {
            *o = 0.66 * *o + 0.33 * a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn registration_endpoints_match_the_table() {
        assert_eq!(compute_registration(0.0), REGISTRATIONS[0]);
        let last = compute_registration(1.0);
        for (x, y) in last.iter().zip(REGISTRATIONS[NUM_REGISTRATIONS - 1].iter()) {
            assert!((x - y).abs() < 1e-3);
        }
    }

    #[test]
    fn every_chord_is_audible() {
        let sr = SampleRate::default();
        for harmonics in [0.0, 0.35, 0.7, 1.0] {
            let mut engine = ChordEngine::new(&sr);
            engine.init(&sr);
            let mut p = parameters(48.0);
            p.harmonics = harmonics;
            let (out, aux) = render_blocks(&mut engine, p, false, 400);
            assert!(rms(&out[2_400..]) > 0.01, "chord at {}", harmonics);
            assert!(rms(&aux[2_400..]) > 0.01);
            assert!(out.iter().all(|x| x.is_finite() && x.abs() < 2.0));
        }
    }
}
