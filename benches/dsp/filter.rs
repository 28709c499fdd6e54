//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::dsp::filter::{FilterMode, FrequencyApproximation, Svf};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Coefficients computed once per block
        let mut filter = Svf::new();
        filter.set_f_q(1_000.0 / 48_000.0, 2.0, FrequencyApproximation::Dirty);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.process_buffer(black_box(&mut buffer), FilterMode::LowPass);
            })
        });

        // Coefficients recomputed every sample, as the LPG and noise engine do
        let mut filter = Svf::new();
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("swept_bandpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let f = 0.01 + 0.001 * i as f32;
                    filter.set_f_q(f, 4.0, FrequencyApproximation::Accurate);
                    *sample = filter.process(black_box(*sample), FilterMode::BandPass);
                }
            })
        });
    }

    group.finish();
}
