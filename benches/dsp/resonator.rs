//! Benchmarks for modal and waveguide resonators.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::physical::{Resonator, WaveguideString, MAX_NUM_MODES};
use saavy_macro::SampleRate;

use crate::BLOCK_SIZES;

pub fn bench_resonator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/resonator");
    let sample_rate = SampleRate::default();
    let f0 = 110.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut input = vec![0.0f32; size];
        input[0] = 1.0;
        let mut buffer = vec![0.0f32; size];

        // Every mode active - the costliest setting
        let mut resonator = Resonator::new(0.3, MAX_NUM_MODES);
        group.bench_with_input(BenchmarkId::new("modal_24", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                resonator.process(black_box(f0), 0.4, 0.5, 0.5, black_box(&input), &mut buffer);
            })
        });

        // Dispersive string (positive non-linearity path)
        let mut string = WaveguideString::new(&sample_rate);
        group.bench_with_input(BenchmarkId::new("string", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                string.process(black_box(f0), 0.3, 0.5, 0.5, black_box(&input), &mut buffer);
            })
        });
    }

    group.finish();
}
