//! A bank of sympathetic strings tuned to a chord.
//!
//! All strings hear the same excitation. Odd and even strings are split
//! between the two outputs, which spreads the chord across the stereo
//! field.

use crate::chords::{chord_ratios, NOTES_PER_CHORD};
use crate::config::SampleRate;
use crate::physical::string::WaveguideString;

pub struct ChordStrings {
    strings: Vec<WaveguideString>,
}

impl ChordStrings {
    pub fn new(sample_rate: &SampleRate) -> Self {
        Self {
            strings: (0..NOTES_PER_CHORD)
                .map(|_| WaveguideString::new(sample_rate))
                .collect(),
        }
    }

    pub fn init(&mut self, sample_rate: &SampleRate) {
        for string in self.strings.iter_mut() {
            string.init(sample_rate);
        }
    }

    pub fn reset(&mut self) {
        for string in self.strings.iter_mut() {
            string.reset();
        }
    }

    /// Rings every string of chord `chord` with `input` and adds them into
    /// `out` (even strings) and `aux` (odd strings).
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &mut self,
        f0: f32,
        chord: usize,
        non_linearity: f32,
        brightness: f32,
        damping: f32,
        input: &[f32],
        out: &mut [f32],
        aux: &mut [f32],
    ) {
        let ratios = chord_ratios(chord);
        for (i, (string, ratio)) in self.strings.iter_mut().zip(ratios.iter()).enumerate() {
            let f = (f0 * ratio).min(0.25);
            let destination: &mut [f32] = if i % 2 == 0 { &mut *out } else { &mut *aux };
            string.process(f, non_linearity, brightness, damping, input, destination);
        }
    }
}
