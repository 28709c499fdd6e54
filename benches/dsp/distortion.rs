//! Benchmarks for the limiter and overdrive.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::dsp::distortion::{Limiter, Overdrive};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.3).sin() * 2.0).collect();
        let mut buffer = input.clone();

        let mut limiter = Limiter::new();
        group.bench_with_input(BenchmarkId::new("limiter", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                limiter.process(black_box(1.5), black_box(&mut buffer));
            })
        });

        let mut overdrive = Overdrive::new();
        group.bench_with_input(BenchmarkId::new("overdrive", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                overdrive.process(black_box(0.8), black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
