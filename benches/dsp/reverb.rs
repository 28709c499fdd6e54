//! Benchmarks for the reverb and chorus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::fx::{Chorus, Reverb};
use saavy_macro::SampleRate;

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");
    let sample_rate = SampleRate::default();

    for &size in BLOCK_SIZES {
        // Generate a test signal (impulse-like with some content)
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 4 {
                    1.0 - (i as f32 / 4.0) // Initial impulse
                } else {
                    (i as f32 * 0.05).sin() * 0.1 // Quiet tail
                }
            })
            .collect();
        let mut left = input.clone();
        let mut right = input.clone();

        // Long, bright tail
        let mut reverb = Reverb::new(&sample_rate);
        reverb.set_amount(0.5);
        reverb.set_time(0.9);
        reverb.set_lp(0.9);
        group.bench_with_input(BenchmarkId::new("large_room", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                reverb.process(black_box(&mut left), black_box(&mut right));
            })
        });

        let mut chorus = Chorus::new(&sample_rate);
        chorus.set_amount(0.5);
        chorus.set_depth(0.5);
        group.bench_with_input(BenchmarkId::new("chorus", size), &size, |b, _| {
            b.iter(|| {
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                chorus.process(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
