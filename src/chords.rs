//! Chord tables shared by the chord engine and the sympathetic strings.
//!
//! Every chord is five semitone offsets from the root, lowest first. The
//! octave chord detunes its unisons by a few cents so the strings beat
//! against each other instead of cancelling.

use crate::dsp::hysteresis::HysteresisQuantizer;
use crate::dsp::units::semitones_to_ratio;

pub const NUM_CHORDS: usize = 11;
pub const NOTES_PER_CHORD: usize = 5;

/// Switching to a neighbouring chord requires overshooting the boundary by
/// this fraction of a step.
pub const CHORD_HYSTERESIS: f32 = 0.1;

pub const CHORD_NAMES: [&str; NUM_CHORDS] = [
    "OCT", "5", "sus4", "m", "m7", "m9", "m11", "69", "M9", "M7", "M",
];

pub const CHORDS: [[f32; NOTES_PER_CHORD]; NUM_CHORDS] = [
    [-12.0, 0.0, 0.01, 0.02, 0.03],
    [-12.0, -5.0, 0.0, 6.99, 12.0],
    [-12.0, -5.0, 0.0, 5.0, 12.0],
    [-12.0, -5.0, 0.0, 3.0, 12.0],
    [-12.0, -5.0, 0.0, 3.0, 10.0],
    [-12.0, -5.0, 0.0, 3.0, 14.0],
    [-12.0, -5.0, 0.0, 3.0, 17.0],
    [-12.0, -5.0, 0.0, 9.0, 14.0],
    [-12.0, -5.0, 0.0, 11.0, 14.0],
    [-12.0, -5.0, 0.0, 4.0, 11.0],
    [-12.0, -5.0, 0.0, 4.0, 12.0],
];

/// Semitone offsets of chord `index`. Out-of-range indices read the last
/// chord rather than past the table.
#[inline]
pub fn chord(index: usize) -> &'static [f32; NOTES_PER_CHORD] {
    &CHORDS[index.min(NUM_CHORDS - 1)]
}

/// Frequency ratios of chord `index`.
pub fn chord_ratios(index: usize) -> [f32; NOTES_PER_CHORD] {
    chord(index).map(semitones_to_ratio)
}

/// Turns a continuous control into a stable chord index.
#[derive(Debug, Clone, Copy)]
pub struct ChordSelector {
    quantizer: HysteresisQuantizer,
}

impl Default for ChordSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChordSelector {
    pub fn new() -> Self {
        Self {
            quantizer: HysteresisQuantizer::new(NUM_CHORDS, CHORD_HYSTERESIS, true),
        }
    }

    pub fn reset(&mut self) {
        self.quantizer.reset();
    }

    /// `value` in [0, 1] spans every chord.
    #[inline]
    pub fn process(&mut self, value: f32) -> usize {
        self.quantizer.process(value.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.quantizer.quantized_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chords_are_sorted() {
        for chord in CHORDS.iter() {
            assert!(chord.windows(2).all(|w| w[1] >= w[0]));
        }
    }

    #[test]
    fn indexing_past_the_table_is_clamped() {
        assert_eq!(chord(NUM_CHORDS), chord(NUM_CHORDS - 1));
        assert_eq!(chord(usize::MAX), &CHORDS[NUM_CHORDS - 1]);
    }

    #[test]
    fn ratios_include_the_root() {
        for index in 0..NUM_CHORDS {
            assert!(chord_ratios(index).iter().any(|&r| (r - 1.0).abs() < 1e-6));
        }
    }

    #[test]
    fn selector_does_not_chatter_near_a_boundary() {
        let mut selector = ChordSelector::new();
        let step = 1.0 / (NUM_CHORDS - 1) as f32;
        // Boundary between chords 4 and 5.
        let boundary = 4.5 * step;
        selector.process(4.0 * step);
        for i in 0..200 {
            let offset = if i % 2 == 0 { 0.08 } else { -0.08 } * step;
            assert_eq!(selector.process(boundary + offset), 4);
        }
    }

    #[test]
    fn selector_follows_a_genuine_change() {
        let mut selector = ChordSelector::new();
        let step = 1.0 / (NUM_CHORDS - 1) as f32;
        selector.process(4.0 * step);
        assert_eq!(selector.process(4.7 * step), 5);
        assert_eq!(selector.process(4.45 * step), 5);
        assert_eq!(selector.process(4.3 * step), 4);
    }
}
