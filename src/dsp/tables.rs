//! Lookup tables, computed once on first use.
//!
//! Every table here is derived from a closed-form expression, so nothing
//! opaque ships with the crate. Call [`warm_up`] from a non-realtime context
//! (voice construction does) so the first audio block never pays for the
//! generation.

use once_cell::sync::Lazy;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Number of points in one sine period.
pub const SINE_SIZE: usize = 1024;
/// Points per waveshaper curve (plus one guard point).
pub const WAVESHAPER_SIZE: usize = 256;
/// Wavefolder resolution across its [0, 1] input range.
pub const FOLD_SIZE: usize = 512;
/// Number of waveshaper curves the waveshaping engine morphs between.
pub const NUM_WAVESHAPERS: usize = 5;
/// Resolution of the pulse-amplitude table used by the strike exciters.
pub const PULSE_AMPLITUDE_SIZE: usize = 256;
/// Semitone range covered by the string damping compensation table.
pub const SVF_SHIFT_SIZE: usize = 128;

/// One and a quarter sine periods, so that cosine lookups can reuse it.
pub static SINE: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..SINE_SIZE + SINE_SIZE / 4 + 1)
        .map(|i| (TAU * i as f32 / SINE_SIZE as f32).sin())
        .collect()
});

/// Sine wavefolder, one guard point before and three after.
pub static FOLD: Lazy<Vec<f32>> = Lazy::new(|| {
    fold_table(|gain| (FRAC_PI_2 * gain).sin())
});

/// Triangle folder, brighter than [`FOLD`].
pub static FOLD_2: Lazy<Vec<f32>> = Lazy::new(|| {
    fold_table(|gain| {
        let x = 0.25 * gain + 0.25;
        let x = x - x.floor();
        let tri = 1.0 - 4.0 * (x - 0.5).abs();
        // A little sine keeps the corners from getting too harsh.
        0.8 * tri + 0.2 * (FRAC_PI_2 * gain).sin()
    })
});

/// Waveshaper curves, each `WAVESHAPER_SIZE + 1` points over [-1, 1].
pub static WAVESHAPERS: Lazy<[Vec<f32>; NUM_WAVESHAPERS]> = Lazy::new(|| {
    let curve = |f: fn(f32) -> f32| -> Vec<f32> {
        (0..=WAVESHAPER_SIZE)
            .map(|i| {
                let x = (i as f32 - 128.0) / 128.0;
                f(x.clamp(-1.0, 1.0))
            })
            .collect()
    };
    [
        curve(|x| (8.0 * x).atan() / 8.0f32.atan()),
        curve(|x| x.asin() / FRAC_PI_2),
        curve(|x| x),
        curve(|x| (PI * x).sin() * 0.5 + 0.5 * x),
        curve(|x| (2.0 * PI * x).sin() * (1.0 - 0.5 * x.abs())),
    ]
});

/// Partial-stretching factor of a modal resonator against `structure`.
///
/// Below 0.25 partials are compressed, a flat zone sits around 0.3, and the
/// top of the range stretches towards bell-like spectra.
pub static STIFFNESS: Lazy<Vec<f32>> = Lazy::new(|| {
    let mut table: Vec<f32> = (0..=256)
        .map(|i| {
            let g = i as f32 / 256.0;
            if g < 0.25 {
                -(0.25 - g) * 0.25
            } else if g < 0.3 {
                0.0
            } else if g < 0.9 {
                let g = (g - 0.3) / 0.6;
                0.01 * 10.0f32.powf(g * 2.005) - 0.01
            } else {
                let g = (g - 0.9) / 0.1;
                let g = g * g;
                1.5 - (g * PI).cos() * 0.5
            }
        })
        .collect();
    let len = table.len();
    table[len - 1] = 2.0;
    table[len - 2] = 2.0;
    table
});

/// Frequency ratio (in semitones) for the FM engine's harmonics control.
///
/// Musical ratios get a wide flat plateau, joined by short ramps, so that
/// turning the knob slowly snaps to consonant ratios.
pub static FM_FREQUENCY_QUANTIZER: Lazy<Vec<f32>> = Lazy::new(|| {
    const RATIOS: [f32; 16] = [
        0.5, 0.5 * 1.414_213_5, 0.75, 1.0, 1.414_213_5, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0,
        7.0, 8.0, 9.0,
    ];
    let steps = 128usize;
    let plateau = 0.7f32;
    (0..=steps)
        .map(|i| {
            let x = i as f32 / steps as f32 * (RATIOS.len() - 1) as f32;
            let index = (x as usize).min(RATIOS.len() - 2);
            let fractional = x - index as f32;
            let ramp = ((fractional - plateau * 0.5) / (1.0 - plateau)).clamp(0.0, 1.0);
            let a = 12.0 * RATIOS[index].log2();
            let b = 12.0 * RATIOS[index + 1].log2();
            a + (b - a) * ramp
        })
        .collect()
});

/// Amplitude of a strike pulse against the exciter's brightness.
///
/// A darker post-filter takes more energy out of a single-sample pulse, so
/// the pulse grows as the cutoff drops.
pub static PULSE_AMPLITUDE: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..=PULSE_AMPLITUDE_SIZE)
        .map(|i| {
            let cutoff = i as f32 / PULSE_AMPLITUDE_SIZE as f32;
            let f = 0.0015 * 10.0f32.powf(cutoff * 2.3);
            (0.05 / f.min(0.4)).sqrt().clamp(0.35, 6.0)
        })
        .collect()
});

/// Delay compensation for a string loop's damping filter.
///
/// Index `i` is the filter cutoff, `i` semitones above the string's
/// fundamental. A two-pole low-pass at Q = 0.5 delays the fundamental by
/// `atan(f0 / fc) / pi` of a period, so the delay line is shortened by the
/// same fraction.
pub static SVF_SHIFT: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..=SVF_SHIFT_SIZE)
        .map(|i| 1.0 - crate::dsp::units::semitones_to_ratio(-(i as f32)).atan() / PI)
        .collect()
});

fn fold_table(f: impl Fn(f32) -> f32) -> Vec<f32> {
    (0..FOLD_SIZE + 4)
        .map(|i| {
            let position = (i as f32 - 1.0) / FOLD_SIZE as f32;
            // The lowest folder gain maps a full-scale input to +/-1.
            let gain = (position - 0.5) * 2.0 / 0.06;
            f(gain)
        })
        .collect()
}

/// Forces every table to be generated.
pub fn warm_up() {
    let points = SINE.len()
        + FOLD.len()
        + FOLD_2.len()
        + WAVESHAPERS.iter().map(Vec::len).sum::<usize>()
        + STIFFNESS.len()
        + FM_FREQUENCY_QUANTIZER.len()
        + PULSE_AMPLITUDE.len()
        + SVF_SHIFT.len()
        + crate::oscillator::wavetable::WAVES.len()
        + crate::exciter::samples::warm_up()
        + crate::fx::formant_filter::warm_up();
    log::debug!("lookup tables ready ({points} points)");
}

/// Table-driven sine of a phase in cycles; wraps.
#[inline]
pub fn sine(phase: f32) -> f32 {
    crate::dsp::units::interpolate_wrap(&SINE, phase, SINE_SIZE as f32)
}

/// Table-driven cosine of a phase in cycles; wraps.
#[inline]
pub fn cosine(phase: f32) -> f32 {
    sine(phase + 0.25)
}

/// Looks up the strike pulse amplitude for a brightness in [0, 1].
#[inline]
pub fn pulse_amplitude(cutoff: f32) -> f32 {
    let index = ((cutoff.clamp(0.0, 1.0) * PULSE_AMPLITUDE_SIZE as f32) as usize)
        .min(PULSE_AMPLITUDE_SIZE);
    PULSE_AMPLITUDE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_table_matches_sin() {
        for i in 0..64 {
            let phase = i as f32 / 64.0;
            let expected = (TAU * phase).sin();
            assert!(
                (sine(phase) - expected).abs() < 1e-3,
                "sine({}) = {}, expected {}",
                phase,
                sine(phase),
                expected
            );
        }
        assert!((cosine(0.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fold_is_unity_at_low_gain() {
        // Full-scale input at the minimum folder gain lands on the crest.
        let index = 1.0 * 0.03 + 0.5;
        let value = crate::dsp::units::interpolate_hermite(&FOLD, index, FOLD_SIZE as f32);
        assert!((value - 1.0).abs() < 0.01, "got {}", value);
    }

    #[test]
    fn stiffness_is_monotonic_above_flat_zone() {
        let s = &*STIFFNESS;
        for i in 80..255 {
            assert!(s[i + 1] >= s[i] - 1e-6, "stiffness dips at {}", i);
        }
        assert_eq!(s[256], 2.0);
    }

    #[test]
    fn fm_quantizer_has_unison_plateau() {
        let table = &*FM_FREQUENCY_QUANTIZER;
        assert!(table.iter().any(|&s| s.abs() < 1e-4));
        assert!(table.windows(2).all(|w| w[1] >= w[0] - 1e-5));
    }

    #[test]
    fn svf_shift_approaches_one_for_open_filters() {
        assert!((SVF_SHIFT[0] - 0.75).abs() < 1e-4);
        assert!(SVF_SHIFT[SVF_SHIFT_SIZE] > 0.999);
        assert!(SVF_SHIFT.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn pulse_amplitude_is_bounded() {
        assert!(PULSE_AMPLITUDE.iter().all(|&a| (0.35..=6.0).contains(&a)));
        assert_eq!(pulse_amplitude(0.99), PULSE_AMPLITUDE[253]);
    }
}
