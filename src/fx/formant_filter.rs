//! Five-formant vowel filter.
//!
//! A bank of normalized band-pass filters tuned to the formants of a sung
//! vowel. The vowel control morphs continuously through a, e, i, o, u by
//! interpolating formant frequencies (in semitones) and gains; a shift
//! ratio moves every formant together, from a deep voice to a small one.

use once_cell::sync::Lazy;

use crate::config::SampleRate;
use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};

pub const NUM_FORMANTS: usize = 5;
pub const NUM_VOWELS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vowel {
    A,
    E,
    I,
    O,
    U,
}

impl Vowel {
    pub const ALL: [Vowel; NUM_VOWELS] = [Vowel::A, Vowel::E, Vowel::I, Vowel::O, Vowel::U];

    /// Position of this vowel on the 0..1 morph control.
    pub fn position(self) -> f32 {
        self as usize as f32 / (NUM_VOWELS - 1) as f32
    }
}

/// Formant centre frequencies in Hz.
const FREQUENCIES: [[f32; NUM_FORMANTS]; NUM_VOWELS] = [
    [600.0, 1040.0, 2250.0, 2450.0, 2750.0],
    [400.0, 1620.0, 2400.0, 2800.0, 3100.0],
    [250.0, 1750.0, 2600.0, 3050.0, 3340.0],
    [400.0, 750.0, 2400.0, 2600.0, 2900.0],
    [350.0, 600.0, 2400.0, 2675.0, 2950.0],
];

/// Formant levels in dB relative to the first.
const LEVELS_DB: [[f32; NUM_FORMANTS]; NUM_VOWELS] = [
    [0.0, -7.0, -9.0, -9.0, -20.0],
    [0.0, -12.0, -9.0, -12.0, -18.0],
    [0.0, -30.0, -16.0, -22.0, -28.0],
    [0.0, -11.0, -21.0, -20.0, -40.0],
    [0.0, -20.0, -32.0, -28.0, -36.0],
];

/// Formant bandwidths in Hz.
const BANDWIDTHS: [[f32; NUM_FORMANTS]; NUM_VOWELS] = [
    [60.0, 70.0, 110.0, 120.0, 130.0],
    [40.0, 80.0, 100.0, 120.0, 120.0],
    [60.0, 90.0, 100.0, 120.0, 120.0],
    [40.0, 80.0, 100.0, 120.0, 120.0],
    [40.0, 80.0, 100.0, 120.0, 120.0],
];

/// Linear formant gains.
pub static VOWEL_GAINS: Lazy<[[f32; NUM_FORMANTS]; NUM_VOWELS]> =
    Lazy::new(|| LEVELS_DB.map(|row| row.map(|db| 10.0f32.powf(db / 20.0))));

/// Formant frequencies as semitones above 1 Hz, for log-domain morphing.
pub static VOWEL_PITCHES: Lazy<[[f32; NUM_FORMANTS]; NUM_VOWELS]> =
    Lazy::new(|| FREQUENCIES.map(|row| row.map(|hz| 12.0 * hz.log2())));

/// Forces the vowel tables to be generated; returns their point count.
pub(crate) fn warm_up() -> usize {
    VOWEL_GAINS.len() * NUM_FORMANTS + VOWEL_PITCHES.len() * NUM_FORMANTS
}

/// One interpolated vowel: (frequency Hz, gain, bandwidth Hz) per formant.
pub fn vowel_formants(vowel: f32) -> [(f32, f32, f32); NUM_FORMANTS] {
    let position = vowel.clamp(0.0, 1.0) * (NUM_VOWELS - 1) as f32;
    let integral = (position as usize).min(NUM_VOWELS - 2);
    let fractional = position - integral as f32;
    let mut formants = [(0.0, 0.0, 0.0); NUM_FORMANTS];
    for (i, formant) in formants.iter_mut().enumerate() {
        let lerp = |table: &[[f32; NUM_FORMANTS]; NUM_VOWELS]| {
            let a = table[integral][i];
            let b = table[integral + 1][i];
            a + (b - a) * fractional
        };
        let pitch = lerp(&VOWEL_PITCHES);
        *formant = ((pitch / 12.0).exp2(), lerp(&VOWEL_GAINS), lerp(&BANDWIDTHS));
    }
    formants
}

#[derive(Debug, Clone)]
pub struct FormantFilter {
    sample_rate: SampleRate,
    filters: [Svf; NUM_FORMANTS],
    gains: [f32; NUM_FORMANTS],
}

impl FormantFilter {
    pub fn new(sample_rate: &SampleRate) -> Self {
        let mut filter = Self {
            sample_rate: *sample_rate,
            filters: [Svf::new(); NUM_FORMANTS],
            gains: [0.0; NUM_FORMANTS],
        };
        filter.init(sample_rate);
        filter
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        self.sample_rate = *sample_rate;
        self.reset();
    }

    pub fn reset(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.reset();
        }
    }

    /// Tunes the bank to `vowel` (0..1 across a, e, i, o, u), every formant
    /// multiplied by `shift`. Only the first `num_formants` are kept.
    pub fn set_vowel(&mut self, vowel: f32, shift: f32, num_formants: usize) {
        let num_formants = num_formants.min(NUM_FORMANTS);
        let shift = shift.clamp(0.25, 4.0);
        let formants = vowel_formants(vowel);
        for (i, ((filter, gain), (hz, level, bandwidth))) in
            self.filters.iter_mut().zip(self.gains.iter_mut()).zip(formants).enumerate()
        {
            let f = hz * shift * self.sample_rate.inv_sample_rate;
            let q = hz / bandwidth;
            filter.set_f_q(f, q, FrequencyApproximation::Fast);
            // Formants that would land above Nyquist are muted.
            *gain = if i < num_formants && f < 0.45 { level } else { 0.0 };
        }
    }

    /// Filters `input` and writes the summed formants into `out`.
    pub fn process(&mut self, input: &[f32], out: &mut [f32]) {
        for (&x, y) in input.iter().zip(out.iter_mut()) {
            let mut sum = 0.0;
            for (filter, &gain) in self.filters.iter_mut().zip(self.gains.iter()) {
                sum += gain * filter.process(x, FilterMode::BandPassNormalized);
            }
            *y = sum;
        }
    }
}
