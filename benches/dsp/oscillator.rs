//! Benchmarks for band-limited oscillator kernels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_macro::dsp::oscillator::{Oscillator, OscillatorShape, SineOscillator};
use saavy_macro::oscillator::VariableShapeOscillator;

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let frequency = 440.0 / 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - table lookup, accumulating
        let mut osc = SineOscillator::new();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                osc.render_add(black_box(frequency), 0.5, black_box(&mut buffer));
            })
        });

        // Saw - one BLEP per cycle
        let mut osc = Oscillator::new();
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| {
                osc.render(OscillatorShape::Saw, black_box(frequency), 0.5, None, black_box(&mut buffer));
            })
        });

        // Square - two BLEPs per cycle
        let mut osc = Oscillator::new();
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| {
                osc.render(OscillatorShape::Square, black_box(frequency), 0.3, None, black_box(&mut buffer));
            })
        });

        // Variable shape with hard sync - the most discontinuities per cycle
        let mut osc = VariableShapeOscillator::new();
        group.bench_with_input(BenchmarkId::new("variable_shape_sync", size), &size, |b, _| {
            b.iter(|| {
                osc.render::<true>(
                    black_box(frequency),
                    black_box(frequency * 2.7),
                    0.4,
                    0.6,
                    black_box(&mut buffer),
                );
            })
        });
    }

    group.finish();
}
