//! Sample tables for the exciter's sample players.
//!
//! Nothing is recorded: each table is synthesized once from a seeded noise
//! source and a few filters, so the same crate always plays back the same
//! material.
//!
//! - [`NOISE_SAMPLE`]: a long loop of band-limited noise with slow level
//!   fluctuations, scrubbed by the granular player.
//! - [`SAMPLES`]: short percussive one-shots (stick, brush, felt, metal,
//!   wood, breath...) ordered from dark to bright, blended by the sample
//!   player.

use once_cell::sync::Lazy;
use std::f32::consts::TAU;

use crate::dsp::filter::{FilterMode, FrequencyApproximation, Svf};
use crate::dsp::random::Random;

pub const NOISE_SAMPLE_SIZE: usize = 16_384;
pub const SAMPLE_SIZE: usize = 4_096;
pub const NUM_SAMPLES: usize = 9;

pub static NOISE_SAMPLE: Lazy<Vec<f32>> = Lazy::new(|| {
    let mut random = Random::new_with_seed(0x9a1e);
    let mut filter = Svf::new();
    filter.set_f_q(0.12, 0.7, FrequencyApproximation::Accurate);
    let mut table: Vec<f32> = (0..NOISE_SAMPLE_SIZE)
        .map(|i| {
            let swell = 0.6 + 0.4 * (TAU * 5.0 * i as f32 / NOISE_SAMPLE_SIZE as f32).sin();
            swell * filter.process(random.get_bipolar(), FilterMode::LowPass)
        })
        .collect();
    normalize(&mut table);
    // One guard point so interpolated reads can wrap.
    table.push(table[0]);
    table
});

/// One-shots, each `SAMPLE_SIZE + 1` points (the last one silent).
pub static SAMPLES: Lazy<Vec<Vec<f32>>> = Lazy::new(|| {
    (0..NUM_SAMPLES)
        .map(|index| {
            let brightness = index as f32 / (NUM_SAMPLES - 1) as f32;
            one_shot(index as u64, brightness)
        })
        .collect()
});

fn one_shot(seed: u64, brightness: f32) -> Vec<f32> {
    let mut random = Random::new_with_seed(0x5a3 + seed);
    let mut body = Svf::new();
    let cutoff = 0.01 * 10.0f32.powf(brightness * 1.3);
    body.set_f_q(cutoff.min(0.45), 1.0 + 6.0 * brightness, FrequencyApproximation::Accurate);

    let decay = 1.0 - 1.0 / (150.0 + 1_500.0 * (1.0 - brightness));
    // Odd samples get a pitched component (wood, metal), even ones are pure
    // noise bursts (brush, breath).
    let tone = if seed % 2 == 1 { 0.5 } else { 0.0 };
    let tone_frequency = 0.004 + 0.03 * brightness;

    let mut envelope = 1.0;
    let mut table: Vec<f32> = (0..SAMPLE_SIZE)
        .map(|i| {
            let attack = (i as f32 / 16.0).min(1.0);
            let noise = body.process(random.get_bipolar(), FilterMode::BandPassNormalized);
            let partial = (TAU * tone_frequency * i as f32).sin();
            let s = attack * envelope * (noise * (1.0 - tone) + partial * tone);
            envelope *= decay;
            s
        })
        .collect();
    normalize(&mut table);
    table.push(0.0);
    table
}

fn normalize(table: &mut [f32]) {
    let peak = table.iter().fold(0.0f32, |acc, x| acc.max(x.abs())).max(1e-6);
    for x in table.iter_mut() {
        *x /= peak;
    }
}

/// Forces generation; returns the number of points.
pub fn warm_up() -> usize {
    NOISE_SAMPLE.len() + SAMPLES.iter().map(Vec::len).sum::<usize>()
}
