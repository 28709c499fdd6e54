//! Additive synthesis from a bumpy spectral envelope.
//!
//! `out` sums the first 24 harmonics; `aux` uses only the eight drawbar
//! harmonics of a tonewheel organ. Both follow the same envelope: a peak at
//! `timbre` (the centroid), falling off with a steepness set by `morph`, and
//! rippled by `harmonics`.

/*
Spectral envelope
=================

    gain
      │          centroid
      │             ▼
      │           ╱‾‾╲        slope: how fast gain falls either side
      │  ╱╲     ╱      ╲  ╱╲
      │ ╱  ╲  ╱          ╲╱  ╲    bumps: sine ripple along the harmonics
      └────────────────────────→ harmonic index

Amplitudes are smoothed with a slow one-pole and normalised so the harmonics
always sum to one, so the level does not jump when the envelope narrows.
*/

use crate::config::SampleRate;
use crate::dsp::tables::{SINE, SINE_SIZE};
use crate::dsp::units::{interpolate_wrap, one_pole};
use crate::oscillator::HarmonicOscillator;

use super::{Engine, EngineParameters, ScratchBuffers};

const HARMONIC_BATCH_SIZE: usize = 12;
const NUM_HARMONICS: usize = 36;
const NUM_INTEGER_HARMONICS: usize = 24;

const INTEGER_HARMONICS: [usize; NUM_INTEGER_HARMONICS] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
];

/// Drawbar footages from 16' down to 1 1/3', as zero-based harmonic
/// indices of the 16' fundamental.
const ORGAN_HARMONICS: [usize; 8] = [0, 1, 2, 3, 5, 7, 9, 11];

fn update_amplitudes(centroid: f32, slope: f32, bumps: f32, amplitudes: &mut [f32], harmonic_indices: &[usize]) {
    let n = harmonic_indices.len().saturating_sub(1) as f32;
    let margin = (1.0 / slope - 1.0) / (1.0 + bumps);
    let center = centroid * (n + margin) - 0.5 * margin;

    let mut sum = 0.001;
    for (i, &j) in harmonic_indices.iter().enumerate() {
        let order = (i as f32 - center).abs() * slope;
        let mut gain = 1.0 - order;
        gain += gain.abs();
        gain *= gain;

        let b = 0.25 + order * bumps;
        let bump_factor = 1.0 + interpolate_wrap(&SINE, b, SINE_SIZE as f32);
        gain *= bump_factor;
        gain *= gain;
        gain *= gain;

        one_pole(&mut amplitudes[j], gain, 0.001);
        sum += amplitudes[j];
    }

    let normalization = 1.0 / sum;
    for &j in harmonic_indices {
        amplitudes[j] *= normalization;
    }
}

#[derive(Debug, Clone)]
pub struct AdditiveEngine {
    sample_rate: SampleRate,
    harmonic_oscillator: [HarmonicOscillator<HARMONIC_BATCH_SIZE>; 3],
    amplitudes: [f32; NUM_HARMONICS],
}

impl Default for AdditiveEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AdditiveEngine {
    pub fn new() -> Self {
        Self {
            sample_rate: SampleRate::default(),
            harmonic_oscillator: [HarmonicOscillator::new(), HarmonicOscillator::new(), HarmonicOscillator::new()],
            amplitudes: [0.0; NUM_HARMONICS],
        }
    }
}

impl Engine for AdditiveEngine {
    fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.amplitudes = [0.0; NUM_HARMONICS];
        for oscillator in self.harmonic_oscillator.iter_mut() {
            oscillator.reset();
        }
    }

    fn render(
        &mut self,
        parameters: &EngineParameters,
        _scratch: &mut ScratchBuffers,
        out: &mut [f32],
        aux: &mut [f32],
        _already_enveloped: &mut bool,
    ) {
        let f0 = self.sample_rate.note_to_frequency(parameters.note);

        let centroid = parameters.timbre;
        let raw_bumps = parameters.harmonics;
        let raw_slope = (1.0 - 0.6 * raw_bumps) * parameters.morph;
        let slope = 0.01 + 1.99 * raw_slope * raw_slope * raw_slope;
        let bumps = 16.0 * raw_bumps * raw_bumps;

        let (integer, organ) = self.amplitudes.split_at_mut(NUM_INTEGER_HARMONICS);
        update_amplitudes(centroid, slope, bumps, integer, &INTEGER_HARMONICS);
        self.harmonic_oscillator[0].render(f0, &integer[..HARMONIC_BATCH_SIZE], 1, out);
        self.harmonic_oscillator[1].render(f0, &integer[HARMONIC_BATCH_SIZE..], HARMONIC_BATCH_SIZE + 1, out);

        update_amplitudes(centroid, slope, bumps, organ, &ORGAN_HARMONICS);
        self.harmonic_oscillator[2].render(f0, organ, 1, aux);
    }
}
