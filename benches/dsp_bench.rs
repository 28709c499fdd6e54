//! Benchmarks for DSP primitives and complete voices.
//!
//! Run with: cargo bench
//!
//! Engines render in blocks of at most 24 samples, so these measure the
//! per-block cost at the sizes a host would configure.
//!
//! Reference timing at 48kHz sample rate:
//!   - 8 samples  = 167us deadline
//!   - 12 samples = 250us deadline
//!   - 24 samples = 500us deadline
//!
//! Benchmark groups:
//!   - dsp/*        Low-level kernels (oscillators, filters, resonators, fx)
//!   - scenarios/*  Every engine through the voice, and the resonator voice

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Block sizes a host would configure.
pub const BLOCK_SIZES: &[usize] = &[8, 12, 24];

criterion_group!(
    benches,
    // Low-level DSP kernels
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_distortion,
    dsp::bench_resonator,
    dsp::bench_reverb,
    // Complete voices
    scenarios::bench_engines,
    scenarios::bench_resonator_voice,
);
criterion_main!(benches);
